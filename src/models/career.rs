//! Career postings and the applications they receive.

use serde::{Deserialize, Serialize};

use super::record::{impl_resource, Record};
use crate::resource::ResourceKind;

/// An open position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerPosting {
    #[serde(flatten)]
    pub record: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<String>,
}

impl_resource!(CareerPosting, ResourceKind::Career);

/// One candidate's application to a posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    #[serde(rename = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(alias = "mobileno", default)]
    pub mobile: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position_id: Option<String>,
}
