//! Generic list manager shared by every dashboard screen.
//!
//! One manager owns one screen's list. Every operation checks the session before
//! touching the network, reports its outcome through the screen's notifier, and
//! patches the local list in place on success. A background re-fetch then
//! reconciles with the server when enabled.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;

use super::form::PendingForm;
use super::grouping::{group_by_status, Grouped};
use super::kinds::{EndpointConfig, ToggleMode};
use crate::api::{ApiClient, MessageResponse};
use crate::errors::AppError;
use crate::ingest::{ImageFile, ImagePipeline, IMAGE_FAILURE};
use crate::models::{Application, CareerPosting, Resource};
use crate::notify::Notifier;
use crate::session::SessionStore;

/// Progress of the list fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Ready,
    Failed(String),
}

struct ListState<T> {
    items: Vec<T>,
    load: LoadState,
}

struct Shared<T> {
    api: ApiClient,
    session: SessionStore,
    notifier: Notifier,
    images: ImagePipeline,
    background_refresh: bool,
    state: RwLock<ListState<T>>,
    /// Bumped by every fetch; only the latest fetch settles the load state
    fetch_seq: AtomicU64,
    /// Bumped by every acknowledged mutation; a fetch started before one is stale
    mutation_epoch: AtomicU64,
    refresh: Mutex<Option<JoinHandle<()>>>,
}

/// List, create, toggle and edit items of one kind.
///
/// Cloning yields a handle to the same list.
pub struct ResourceListManager<T: Resource> {
    shared: Arc<Shared<T>>,
}

impl<T: Resource> Clone for ResourceListManager<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T: Resource> ResourceListManager<T> {
    pub fn new(
        api: ApiClient,
        session: SessionStore,
        notifier: Notifier,
        images: ImagePipeline,
        background_refresh: bool,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                api,
                session,
                notifier,
                images,
                background_refresh,
                state: RwLock::new(ListState {
                    items: Vec::new(),
                    load: LoadState::Idle,
                }),
                fetch_seq: AtomicU64::new(0),
                mutation_epoch: AtomicU64::new(0),
                refresh: Mutex::new(None),
            }),
        }
    }

    pub fn endpoints(&self) -> &'static EndpointConfig {
        T::KIND.endpoints()
    }

    pub fn notifier(&self) -> &Notifier {
        &self.shared.notifier
    }

    /// Snapshot of the current list.
    pub async fn items(&self) -> Vec<T> {
        self.shared.state.read().await.items.clone()
    }

    pub async fn item(&self, id: &str) -> Option<T> {
        self.shared
            .state
            .read()
            .await
            .items
            .iter()
            .find(|item| item.id() == id)
            .cloned()
    }

    pub async fn state(&self) -> LoadState {
        self.shared.state.read().await.load.clone()
    }

    pub async fn is_loading(&self) -> bool {
        self.state().await == LoadState::Loading
    }

    /// Items split into open and resolved, newest first.
    pub async fn grouped(&self) -> Grouped<T> {
        group_by_status(&self.shared.state.read().await.items)
    }

    /// Load the list for the signed-in user.
    ///
    /// Without a session this notifies and returns before any request is made.
    pub async fn fetch_list(&self) -> Result<(), AppError> {
        self.load(false).await
    }

    async fn load(&self, quiet: bool) -> Result<(), AppError> {
        let user_id = self.require_user().await?;
        let config = self.endpoints();

        let seq = self.shared.fetch_seq.fetch_add(1, Ordering::SeqCst) + 1;
        let epoch = self.shared.mutation_epoch.load(Ordering::SeqCst);
        self.shared.state.write().await.load = LoadState::Loading;
        tracing::debug!(kind = %T::KIND, seq, "Fetching list");

        let result = self.request_list(&user_id).await;

        let mut state = self.shared.state.write().await;
        let latest = self.shared.fetch_seq.load(Ordering::SeqCst) == seq;
        match result {
            Ok(items) => {
                if self.shared.mutation_epoch.load(Ordering::SeqCst) == epoch {
                    state.items = items;
                } else {
                    tracing::debug!(kind = %T::KIND, seq, "Discarding list fetched before a mutation");
                }
                if latest {
                    state.load = LoadState::Ready;
                }
                Ok(())
            }
            Err(err) => {
                let text = err.notification_text(&format!("Failed to load {}.", config.plural));
                if latest {
                    state.load = LoadState::Failed(text.clone());
                }
                drop(state);
                if quiet {
                    tracing::warn!(kind = %T::KIND, error = %err, "Background refresh failed");
                } else {
                    self.shared.notifier.notify_error(text);
                }
                Err(err)
            }
        }
    }

    async fn request_list(&self, user_id: &str) -> Result<Vec<T>, AppError> {
        let config = self.endpoints();
        let body: Value = self
            .shared
            .api
            .post(config.list_path, &json!({ "user_id": user_id }))
            .await?;

        match body.get(config.list_field) {
            Some(list @ Value::Array(_)) => Ok(serde_json::from_value(list.clone())?),
            Some(Value::Null) | None => Ok(Vec::new()),
            Some(other) => Err(AppError::BadRequest(format!(
                "Expected a list under '{}', got {}",
                config.list_field, other
            ))),
        }
    }

    /// Submit a pending form: create when new, update when editing.
    pub async fn submit(&self, form: &mut PendingForm) -> Result<Option<T>, AppError> {
        match form.editing().map(str::to_string) {
            Some(id) => self.edit(&id, form).await,
            None => self.create(form).await,
        }
    }

    /// Create an item from the form.
    ///
    /// On success the server's copy (when returned) is appended, the form is reset
    /// and the created item is returned. On failure the form is left untouched.
    pub async fn create(&self, form: &mut PendingForm) -> Result<Option<T>, AppError> {
        let config = self.endpoints();
        let user_id = self.require_user().await?;
        let Some(path) = config.create_path else {
            return Err(self.report(
                AppError::Unsupported(format!("New {} cannot be added here.", config.plural)),
                "",
            ));
        };
        form.validate(config).map_err(|err| self.report(err, ""))?;

        let payload = form.to_payload(config, &user_id);
        let body: Value = self
            .shared
            .api
            .post(path, &payload)
            .await
            .map_err(|err| self.report(err, &format!("Failed to add {}.", config.label)))?;
        self.begin_mutation();

        let created = self.created_item(&body);
        if let Some(item) = &created {
            self.shared.state.write().await.items.push(item.clone());
        }
        tracing::info!(kind = %T::KIND, created = created.is_some(), "Item added");

        form.reset();
        self.shared
            .notifier
            .notify(success_message(&body, || format!("{} added successfully!", capitalize(config.label))));
        self.reconcile().await;
        Ok(created)
    }

    /// Open an existing item for editing.
    pub async fn begin_edit(&self, id: &str) -> Result<PendingForm, AppError> {
        let config = self.endpoints();
        if config.update_path.is_none() {
            return Err(self.report(
                AppError::Unsupported(format!("{} cannot be edited.", capitalize(config.plural))),
                "",
            ));
        }
        let Some(item) = self.item(id).await else {
            return Err(self.report(
                AppError::Validation(format!("No {} with id {}.", config.label, id)),
                "",
            ));
        };
        let value = serde_json::to_value(&item)?;
        Ok(PendingForm::prefill_from(id, &value, config))
    }

    /// Replace an item's fields. The image must be uploaded again.
    ///
    /// Once the server accepts the update the edit counts as done. The returned
    /// item is `None` when neither the response nor the local list holds it; the
    /// background refresh then picks it up.
    pub async fn edit(&self, id: &str, form: &mut PendingForm) -> Result<Option<T>, AppError> {
        let config = self.endpoints();
        let user_id = self.require_user().await?;
        let Some(path) = config.update_path else {
            return Err(self.report(
                AppError::Unsupported(format!("{} cannot be edited.", capitalize(config.plural))),
                "",
            ));
        };
        if form.editing() != Some(id) {
            form.set_editing(id);
        }
        form.validate(config).map_err(|err| self.report(err, ""))?;

        let payload = form.to_payload(config, &user_id);
        let body: Value = self
            .shared
            .api
            .post(path, &payload)
            .await
            .map_err(|err| self.report(err, &format!("Failed to update {}.", config.label)))?;
        self.begin_mutation();

        let updated = {
            let mut state = self.shared.state.write().await;
            let position = state.items.iter().position(|item| item.id() == id);
            let merged = match (self.created_item(&body), position) {
                (Some(server_copy), _) => Some(server_copy),
                (None, Some(index)) => merge_payload(&state.items[index], &payload),
                (None, None) => None,
            };
            match (merged, position) {
                (Some(item), Some(index)) => {
                    state.items[index] = item.clone();
                    Some(item)
                }
                (Some(item), None) => {
                    state.items.push(item.clone());
                    Some(item)
                }
                (None, _) => None,
            }
        };
        tracing::info!(kind = %T::KIND, %id, in_list = updated.is_some(), "Item updated");

        form.reset();
        self.shared
            .notifier
            .notify(success_message(&body, || format!("{} updated successfully!", capitalize(config.label))));
        self.reconcile().await;
        Ok(updated)
    }

    /// Flip an item's active flag, or resolve an open query.
    ///
    /// `current` is the status the user saw. Returns the new status.
    pub async fn toggle_active(&self, id: &str, current: bool) -> Result<bool, AppError> {
        let config = self.endpoints();
        let user_id = self.require_user().await?;
        if config.toggle_mode == ToggleMode::Resolve && !current {
            return Err(self.report(
                AppError::Validation("This query is already resolved.".to_string()),
                "",
            ));
        }

        let next = !current;
        let mut body = serde_json::Map::new();
        body.insert(config.toggle_id_field.to_string(), Value::String(id.to_string()));
        body.insert("user_id".to_string(), Value::String(user_id));
        if config.toggle_mode == ToggleMode::Flip {
            body.insert("status".to_string(), Value::Bool(next));
        }

        let response: MessageResponse = self
            .shared
            .api
            .post(config.toggle_path, &body)
            .await
            .map_err(|err| {
                self.report(err, &format!("Failed to update {} status.", config.label))
            })?;
        self.begin_mutation();

        {
            let mut state = self.shared.state.write().await;
            if let Some(item) = state.items.iter_mut().find(|item| item.id() == id) {
                item.set_active(next);
                if config.toggle_mode == ToggleMode::Resolve {
                    item.record_mut().resolved_on = Some(chrono::Utc::now().to_rfc3339());
                }
            }
        }
        tracing::info!(kind = %T::KIND, %id, active = next, "Status changed");

        let fallback = match (config.toggle_mode, next) {
            (ToggleMode::Resolve, _) => "Query resolved successfully!".to_string(),
            (ToggleMode::Flip, true) => format!("{} activated successfully!", capitalize(config.label)),
            (ToggleMode::Flip, false) => format!("{} deactivated successfully!", capitalize(config.label)),
        };
        self.shared
            .notifier
            .notify(response.message.unwrap_or(fallback));
        self.reconcile().await;
        Ok(next)
    }

    /// Mark an open query resolved.
    pub async fn resolve(&self, id: &str) -> Result<(), AppError> {
        if self.endpoints().toggle_mode != ToggleMode::Resolve {
            return Err(self.report(
                AppError::Unsupported(format!(
                    "{} are activated, not resolved.",
                    capitalize(self.endpoints().plural)
                )),
                "",
            ));
        }
        let current = self.item(id).await.map(|item| item.is_active()).unwrap_or(true);
        self.toggle_active(id, current).await.map(|_| ())
    }

    /// Remove an item.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let config = self.endpoints();
        let user_id = self.require_user().await?;
        let Some(path) = config.delete_path else {
            return Err(self.report(
                AppError::Unsupported(format!("{} cannot be deleted.", capitalize(config.plural))),
                "",
            ));
        };

        let response: MessageResponse = self
            .shared
            .api
            .post(path, &json!({ "event_id": id, "user_id": user_id }))
            .await
            .map_err(|err| self.report(err, &format!("Failed to delete {}.", config.label)))?;
        self.begin_mutation();

        self.shared
            .state
            .write()
            .await
            .items
            .retain(|item| item.id() != id);
        tracing::info!(kind = %T::KIND, %id, "Item deleted");

        self.shared.notifier.notify(
            response
                .message
                .unwrap_or_else(|| format!("{} deleted successfully!", capitalize(config.label))),
        );
        self.reconcile().await;
        Ok(())
    }

    /// Run a selected file through the image pipeline into a form slot.
    ///
    /// On failure the slot is left unset and the image failure message is shown.
    pub async fn attach_image(
        &self,
        form: &mut PendingForm,
        slot: &str,
        file: ImageFile,
    ) -> Result<(), AppError> {
        let config = self.endpoints();
        if !config.image_slots.contains(&slot) {
            return Err(self.report(
                AppError::Validation(format!("{} has no image field '{}'.", capitalize(config.label), slot)),
                "",
            ));
        }

        form.clear_image(slot);
        match self.shared.images.ingest(file).await {
            Ok(image) => {
                form.set_image(slot, image);
                Ok(())
            }
            Err(err) => {
                tracing::warn!(kind = %T::KIND, %slot, error = %err, "Image rejected");
                self.shared.notifier.notify_error(IMAGE_FAILURE);
                Err(err)
            }
        }
    }

    /// Wait for a pending background refresh to finish.
    pub async fn settle(&self) {
        let handle = self.shared.refresh.lock().await.take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                tracing::warn!(kind = %T::KIND, error = %err, "Background refresh task failed");
            }
        }
    }

    async fn require_user(&self) -> Result<String, AppError> {
        self.shared
            .session
            .require_user_id()
            .await
            .map_err(|err| self.report(err, "Failed to read session."))
    }

    /// Show the failure and hand the error back.
    fn report(&self, err: AppError, context: &str) -> AppError {
        self.shared
            .notifier
            .notify_error(err.notification_text(context).trim().to_string());
        err
    }

    /// Called once the server has acknowledged a change, before the local patch.
    fn begin_mutation(&self) {
        self.shared.mutation_epoch.fetch_add(1, Ordering::SeqCst);
    }

    fn created_item(&self, body: &Value) -> Option<T> {
        let field = self.endpoints().created_field?;
        let value = body.get(field).filter(|v| !v.is_null())?;
        match serde_json::from_value(value.clone()) {
            Ok(item) => Some(item),
            Err(err) => {
                tracing::warn!(kind = %T::KIND, error = %err, "Ignoring undecodable item in response");
                None
            }
        }
    }

    /// Re-fetch in the background so the list converges on the server's copy.
    async fn reconcile(&self) {
        if !self.shared.background_refresh {
            return;
        }
        let manager = self.clone();
        let handle = tokio::spawn(async move {
            let _ = manager.load(true).await;
        });
        if let Some(previous) = self.shared.refresh.lock().await.replace(handle) {
            previous.abort();
        }
    }
}

impl ResourceListManager<CareerPosting> {
    /// Applications received for one posting.
    pub async fn applications(&self, position_id: &str) -> Result<Vec<Application>, AppError> {
        let user_id = self.require_user().await?;
        let body: Value = self
            .shared
            .api
            .post(
                "career/applications",
                &json!({ "user_id": user_id, "position_id": position_id }),
            )
            .await
            .map_err(|err| self.report(err, "Failed to load applications."))?;

        let list = match body {
            Value::Array(items) => Value::Array(items),
            Value::Object(mut map) => map.remove("applications").unwrap_or(Value::Array(Vec::new())),
            _ => Value::Array(Vec::new()),
        };
        serde_json::from_value(list).map_err(|err| self.report(err.into(), "Failed to load applications."))
    }
}

/// Item after applying the submitted text fields locally.
fn merge_payload<T: Resource>(item: &T, payload: &Value) -> Option<T> {
    let mut value = serde_json::to_value(item).ok()?;
    if let (Some(target), Some(source)) = (value.as_object_mut(), payload.as_object()) {
        for (key, field) in source {
            if key == "id" || key == "user_id" {
                continue;
            }
            target.insert(key.clone(), field.clone());
        }
    }
    serde_json::from_value(value).ok()
}

fn success_message(body: &Value, fallback: impl FnOnce() -> String) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .filter(|m| !m.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(fallback)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("service"), "Service");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_success_message_prefers_server_text() {
        let body = json!({ "message": "Client added" });
        assert_eq!(success_message(&body, || "fallback".to_string()), "Client added");
        assert_eq!(success_message(&json!({}), || "fallback".to_string()), "fallback");
    }
}
