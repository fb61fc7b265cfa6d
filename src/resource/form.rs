//! Pending form state for the create and edit dialogs.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::kinds::EndpointConfig;
use crate::errors::AppError;
use crate::ingest::EncodedImage;

/// Shown when an edit is submitted without a fresh image.
pub const IMAGE_AGAIN: &str = "Please upload a image again.";

/// Field values and images entered but not yet submitted.
///
/// The form outlives a failed submit so the user can retry; a successful submit
/// resets it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PendingForm {
    fields: BTreeMap<String, String>,
    images: BTreeMap<String, EncodedImage>,
    /// Previews of the images already stored on an item being edited
    stored_previews: BTreeMap<String, String>,
    editing: Option<String>,
}

impl PendingForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_field(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.fields.insert(name.into(), value.into());
    }

    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_field(name, value);
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn set_image(&mut self, slot: impl Into<String>, image: EncodedImage) {
        self.images.insert(slot.into(), image);
    }

    pub fn with_image(mut self, slot: impl Into<String>, image: EncodedImage) -> Self {
        self.set_image(slot, image);
        self
    }

    pub fn clear_image(&mut self, slot: &str) {
        self.images.remove(slot);
    }

    pub fn image(&self, slot: &str) -> Option<&EncodedImage> {
        self.images.get(slot)
    }

    /// Preview for a slot: the freshly attached image, else the stored one.
    pub fn preview(&self, slot: &str) -> Option<&str> {
        self.images
            .get(slot)
            .map(|image| image.preview.as_str())
            .or_else(|| self.stored_previews.get(slot).map(String::as_str))
    }

    /// Id of the item being edited, `None` for a new item.
    pub fn editing(&self) -> Option<&str> {
        self.editing.as_deref()
    }

    /// Mark the form as editing the item `id`.
    pub fn set_editing(&mut self, id: impl Into<String>) {
        self.editing = Some(id.into());
    }

    /// Pre-fill from an existing item's JSON.
    ///
    /// Text fields are copied; stored images only become previews. The payload
    /// stays empty, so an edit needs a fresh image.
    pub fn prefill_from(id: &str, item: &Value, config: &EndpointConfig) -> Self {
        let mut form = Self {
            editing: Some(id.to_string()),
            ..Self::default()
        };

        for name in config.text_fields {
            let aliases = config
                .prefill_aliases
                .iter()
                .filter(|(field, _)| field == name)
                .map(|(_, source)| *source);
            let value = std::iter::once(*name)
                .chain(aliases)
                .filter_map(|source| item.get(source).and_then(text_value))
                .find(|value| !value.is_empty());
            if let Some(value) = value {
                form.fields.insert(name.to_string(), value);
            }
        }

        for slot in config.image_slots {
            if let Some(stored) = item.get(*slot).and_then(Value::as_str) {
                if !stored.is_empty() {
                    form.stored_previews.insert(slot.to_string(), stored.to_string());
                }
            }
        }
        // Services keep their picture under `image` in older records.
        if form.stored_previews.is_empty() {
            if let (Some(slot), Some(stored)) = (
                config.image_slots.first(),
                item.get("image").and_then(Value::as_str),
            ) {
                form.stored_previews.insert(slot.to_string(), stored.to_string());
            }
        }

        form
    }

    /// Check required fields and images.
    pub fn validate(&self, config: &EndpointConfig) -> Result<(), AppError> {
        let missing_field = config.required_fields.iter().any(|name| {
            self.field(name)
                .map(|value| value.trim().is_empty())
                .unwrap_or(true)
        });
        if missing_field {
            return Err(AppError::Validation(config.missing_fields_message.to_string()));
        }

        let missing_image = config.required_images.iter().any(|slot| {
            self.image(slot)
                .map(|image| image.payload.is_empty())
                .unwrap_or(true)
        });
        if missing_image {
            let message = if self.editing.is_some() {
                IMAGE_AGAIN
            } else {
                config.missing_image_message
            };
            return Err(AppError::Validation(message.to_string()));
        }

        Ok(())
    }

    /// Request body for create or update.
    ///
    /// Image slots without an attached image are sent as empty strings.
    pub fn to_payload(&self, config: &EndpointConfig, user_id: &str) -> Value {
        let mut body = Map::new();
        for (name, value) in &self.fields {
            body.insert(name.clone(), Value::String(value.clone()));
        }
        for slot in config.image_slots {
            let payload = self
                .image(slot)
                .map(|image| image.payload.clone())
                .unwrap_or_default();
            body.insert(slot.to_string(), Value::String(payload));
        }
        if config.create_sends_active && self.editing.is_none() {
            body.insert("active".to_string(), Value::Bool(true));
        }
        if let Some(id) = &self.editing {
            body.insert("id".to_string(), Value::String(id.clone()));
        }
        body.insert("user_id".to_string(), Value::String(user_id.to_string()));
        Value::Object(body)
    }

    /// Back to an empty form.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

fn text_value(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .collect::<Vec<_>>()
                .join(", "),
        ),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::ResourceKind;
    use serde_json::json;

    fn image() -> EncodedImage {
        EncodedImage::from_data_uri("data:image/png;base64,AAAA").unwrap()
    }

    #[test]
    fn test_missing_photo_uses_kind_message() {
        let config = ResourceKind::Gallery.endpoints();
        let form = PendingForm::new().with_field("name", "Stage");

        let err = form.validate(config).unwrap_err();
        assert_eq!(err.message(), "Please upload a photo.");
    }

    #[test]
    fn test_blank_required_field_rejected() {
        let config = ResourceKind::Career.endpoints();
        let form = PendingForm::new()
            .with_field("position_name", "Designer")
            .with_field("description", "  ")
            .with_field("requirements", "Portfolio");

        let err = form.validate(config).unwrap_err();
        assert_eq!(err.message(), "Please fill in all fields.");
    }

    #[test]
    fn test_payload_carries_fields_images_and_user() {
        let config = ResourceKind::Client.endpoints();
        let form = PendingForm::new()
            .with_field("name", "Acme")
            .with_image("photo", image());

        form.validate(config).unwrap();
        assert_eq!(
            form.to_payload(config, "u1"),
            json!({ "name": "Acme", "photo": "AAAA", "active": true, "user_id": "u1" })
        );
    }

    #[test]
    fn test_blog_optional_slots_sent_empty() {
        let config = ResourceKind::Blog.endpoints();
        let form = PendingForm::new()
            .with_field("title", "Launch")
            .with_field("description", "Recap")
            .with_image("photo1", image());

        form.validate(config).unwrap();
        let payload = form.to_payload(config, "u1");
        assert_eq!(payload["photo1"], "AAAA");
        assert_eq!(payload["photo3"], "");
        assert_eq!(payload["profile_photo"], "");
    }

    #[test]
    fn test_edit_requires_fresh_image() {
        let config = ResourceKind::Service.endpoints();
        let stored = json!({
            "id": "s1",
            "name": "Catering",
            "description": "Food",
            "photo": "https://cdn.test/s1.jpg"
        });
        let mut form = PendingForm::prefill_from("s1", &stored, config);

        assert_eq!(form.editing(), Some("s1"));
        assert_eq!(form.field("name"), Some("Catering"));
        assert_eq!(form.preview("photo"), Some("https://cdn.test/s1.jpg"));
        assert_eq!(form.validate(config).unwrap_err().message(), IMAGE_AGAIN);

        form.set_image("photo", image());
        form.validate(config).unwrap();
        assert_eq!(form.to_payload(config, "u1")["id"], "s1");

        form.reset();
        assert_eq!(form, PendingForm::new());
    }

    #[test]
    fn test_service_prefill_reads_title_and_status() {
        let config = ResourceKind::Service.endpoints();
        let stored = json!({
            "id": "s1",
            "title": "Catering",
            "status": "Weddings: full service",
            "image": "https://cdn.test/s1.jpg"
        });
        let form = PendingForm::prefill_from("s1", &stored, config);

        assert_eq!(form.field("name"), Some("Catering"));
        assert_eq!(form.field("description"), Some("Weddings: full service"));
        assert_eq!(form.preview("photo"), Some("https://cdn.test/s1.jpg"));
    }
}
