//! Inbound messages: service enquiries and contact-form queries.
//!
//! Both start open (`active`) and are resolved once by an admin.

use serde::{Deserialize, Serialize};

use super::record::{impl_resource, Record};
use crate::resource::ResourceKind;

/// A request for a specific service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Enquiry {
    #[serde(flatten)]
    pub record: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobileno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl_resource!(Enquiry, ResourceKind::Enquiry);

/// A message from the Contact Us form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactQuery {
    #[serde(flatten)]
    pub record: Record,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobileno: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purpose: Option<String>,
}

impl_resource!(ContactQuery, ResourceKind::ContactQuery);
