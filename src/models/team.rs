//! Team members.

use serde::{Deserialize, Serialize};

use super::record::{impl_resource, Record};
use crate::resource::ResourceKind;

/// A person shown on the About page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamMember {
    #[serde(flatten)]
    pub record: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram_link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
}

impl_resource!(TeamMember, ResourceKind::TeamMember);
