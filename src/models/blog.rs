//! Blog posts.

use serde::{Deserialize, Serialize};

use super::record::{impl_resource, Record};
use crate::resource::ResourceKind;

/// A blog post with a cover photo and up to five body photos.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blog {
    #[serde(flatten)]
    pub record: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        rename = "readTime",
        alias = "read_time",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub read_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<serde_json::Value>,
    #[serde(
        alias = "categoryName",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_photo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo1: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo2: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo3: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo4: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo5: Option<String>,
}

impl Blog {
    /// Body photos in slot order, skipping empty slots.
    pub fn photos(&self) -> Vec<&str> {
        [
            &self.photo1,
            &self.photo2,
            &self.photo3,
            &self.photo4,
            &self.photo5,
        ]
        .into_iter()
        .filter_map(|p| p.as_deref())
        .filter(|p| !p.is_empty())
        .collect()
    }
}

impl_resource!(Blog, ResourceKind::Blog);

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accepts_form_and_store_field_names() {
        let blog: Blog = serde_json::from_value(json!({
            "_id": "b1",
            "active": true,
            "title": "Wedding season",
            "read_time": "4 min",
            "categoryName": "Weddings",
            "photo1": "AAA",
            "photo3": ""
        }))
        .unwrap();

        assert_eq!(blog.read_time.as_deref(), Some("4 min"));
        assert_eq!(blog.category.as_deref(), Some("Weddings"));
        assert_eq!(blog.photos(), vec!["AAA"]);
    }
}
