//! Fields every stored item carries, and the trait tying a model to its kind.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::resource::ResourceKind;

/// Identity, ownership and status shared by all resource items.
///
/// The store hands out `_id` for most kinds and `id` for services; whichever is
/// present is the item's identifier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Record {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub object_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "user_id", default, skip_serializing_if = "Option::is_none")]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(rename = "uploadedOn", default, skip_serializing_if = "Option::is_none")]
    pub uploaded_on: Option<String>,
    #[serde(rename = "resolvedOn", default, skip_serializing_if = "Option::is_none")]
    pub resolved_on: Option<String>,
}

impl Record {
    pub fn with_id(id: impl Into<String>, active: bool) -> Self {
        Self {
            object_id: Some(id.into()),
            active,
            ..Default::default()
        }
    }

    pub fn id(&self) -> &str {
        self.object_id
            .as_deref()
            .or(self.id.as_deref())
            .unwrap_or_default()
    }
}

/// A model managed through a resource list.
pub trait Resource: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn record(&self) -> &Record;

    fn record_mut(&mut self) -> &mut Record;

    fn id(&self) -> &str {
        self.record().id()
    }

    fn is_active(&self) -> bool {
        self.record().active
    }

    fn set_active(&mut self, active: bool) {
        self.record_mut().active = active;
    }

    fn uploaded_on(&self) -> Option<&str> {
        self.record().uploaded_on.as_deref()
    }
}

/// Implements [`Resource`] for a model with a flattened `record` field.
macro_rules! impl_resource {
    ($model:ty, $kind:expr) => {
        impl $crate::models::Resource for $model {
            const KIND: $crate::resource::ResourceKind = $kind;

            fn record(&self) -> &$crate::models::Record {
                &self.record
            }

            fn record_mut(&mut self) -> &mut $crate::models::Record {
                &mut self.record
            }
        }
    };
}

pub(crate) use impl_resource;
