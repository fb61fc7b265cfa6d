//! Public site feeds and forms.
//!
//! These calls need no session. Feeds return whatever the server lists as
//! visible; failures are logged and shown like any other request failure.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::api::{ApiClient, MessageResponse};
use crate::errors::AppError;
use crate::models::{
    Achievement, Blog, CareerPosting, Client, GalleryPhoto, Resource, Service, TeamMember,
};
use crate::notify::Notifier;

/// Number of achievements shown on the home page.
pub const HOME_ACHIEVEMENTS: usize = 6;

pub const ENQUIRY_SENT: &str = "Your inquiry has been successfully submitted!";
pub const MESSAGE_SENT: &str = "Your message has been sent successfully!";
pub const APPLICATION_SENT: &str = "Application submitted successfully!";
pub const CONTACT_REQUIRED: &str = "Please fill in all the fields";

/// Service enquiry from the public inquiry page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct EnquirySubmission {
    pub name: String,
    pub mobileno: String,
    pub email: String,
    pub purpose_id: String,
    pub purpose_name: String,
    pub message: String,
}

/// Contact Us form.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub mobileno: String,
    pub purpose: String,
}

/// Job application from the careers page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ApplicationSubmission {
    pub name: String,
    pub email: String,
    pub mobileno: String,
    pub position_id: String,
}

/// A purpose option for the enquiry form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Purpose {
    pub purpose_id: String,
    pub purpose_name: String,
}

/// Read-only catalogue and submission forms of the public site.
#[derive(Clone)]
pub struct PublicSite {
    api: ApiClient,
    notifier: Notifier,
}

impl PublicSite {
    pub fn new(api: ApiClient, notifier: Notifier) -> Self {
        Self { api, notifier }
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    pub async fn active_services(&self) -> Result<Vec<Service>, AppError> {
        let body = self.fetch(Method::Get, "service/get-active-services", "services").await?;
        self.decode(body, "services")
    }

    /// Services page listing.
    pub async fn services(&self) -> Result<Vec<Service>, AppError> {
        let body = self.fetch(Method::Get, "service/services", "services").await?;
        self.decode_field(body, "events", "services")
    }

    /// Enquiry purposes, one per active service.
    pub async fn purposes(&self) -> Result<Vec<Purpose>, AppError> {
        Ok(self
            .active_services()
            .await?
            .into_iter()
            .map(|service| Purpose {
                purpose_id: service.id().to_string(),
                purpose_name: service.display_name().to_string(),
            })
            .collect())
    }

    pub async fn clients(&self) -> Result<Vec<Client>, AppError> {
        let body = self.fetch(Method::Post, "client/get-all-client", "clients").await?;
        self.decode_field(body, "clients", "clients")
    }

    pub async fn gallery(&self) -> Result<Vec<GalleryPhoto>, AppError> {
        let body = self.fetch(Method::Post, "gallery/get-all-photos", "photos").await?;
        self.decode_field(body, "clients", "photos")
    }

    /// Published blog posts; inactive posts are dropped.
    pub async fn blogs(&self) -> Result<Vec<Blog>, AppError> {
        let body = self.fetch(Method::Post, "blogs/get-all-blogs", "blogs").await?;
        let blogs: Vec<Blog> = self.decode_field(body, "blogs", "blogs")?;
        Ok(blogs.into_iter().filter(|blog| blog.is_active()).collect())
    }

    pub async fn team(&self) -> Result<Vec<TeamMember>, AppError> {
        let body = self.fetch(Method::Post, "team/get-active-members", "team members").await?;
        self.decode_field(body, "events", "team members")
    }

    /// All achievements, newest first.
    pub async fn achievements(&self) -> Result<Vec<Achievement>, AppError> {
        let body = self
            .fetch(Method::Post, "achievements/get-all-achievements", "achievements")
            .await?;
        let mut achievements: Vec<Achievement> =
            self.decode_field(body, "events", "achievements")?;
        achievements.sort_by(|a, b| b.event_date.cmp(&a.event_date));
        Ok(achievements)
    }

    /// The latest achievements for the home page.
    pub async fn achievement_highlights(&self) -> Result<Vec<Achievement>, AppError> {
        let mut achievements = self.achievements().await?;
        achievements.truncate(HOME_ACHIEVEMENTS);
        Ok(achievements)
    }

    /// Open positions.
    pub async fn jobs(&self) -> Result<Vec<CareerPosting>, AppError> {
        let body = self.fetch(Method::Post, "career/jobs", "positions").await?;
        self.decode_field(body, "events", "positions")
    }

    pub async fn submit_enquiry(&self, enquiry: &EnquirySubmission) -> Result<String, AppError> {
        self.require(&[&enquiry.name, &enquiry.email, &enquiry.mobileno])?;
        self.submit("enquiry/add-enquiry", enquiry, ENQUIRY_SENT, "Failed to send enquiry.")
            .await
    }

    pub async fn submit_contact(&self, contact: &ContactSubmission) -> Result<String, AppError> {
        self.require(&[&contact.name, &contact.email, &contact.mobileno])?;
        self.submit("contactus/add-queries", contact, MESSAGE_SENT, "Failed to send message.")
            .await
    }

    pub async fn apply(&self, application: &ApplicationSubmission) -> Result<String, AppError> {
        self.require(&[&application.name, &application.email, &application.mobileno])?;
        self.submit(
            "career/apply",
            application,
            APPLICATION_SENT,
            "Failed to submit application.",
        )
        .await
    }

    fn require(&self, values: &[&String]) -> Result<(), AppError> {
        if values.iter().any(|value| value.trim().is_empty()) {
            self.notifier.notify_error(CONTACT_REQUIRED);
            return Err(AppError::Validation(CONTACT_REQUIRED.to_string()));
        }
        Ok(())
    }

    async fn submit<B: Serialize>(
        &self,
        path: &str,
        body: &B,
        fallback: &str,
        context: &str,
    ) -> Result<String, AppError> {
        match self.api.post::<_, MessageResponse>(path, body).await {
            Ok(response) => {
                let message = response
                    .message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| fallback.to_string());
                tracing::info!(%path, "Submission accepted");
                self.notifier.notify(message.as_str());
                Ok(message)
            }
            Err(err) => {
                self.notifier.notify_error(err.notification_text(context));
                Err(err)
            }
        }
    }

    async fn fetch(&self, method: Method, path: &str, noun: &str) -> Result<Value, AppError> {
        let reply = match method {
            Method::Get => self.api.get::<Value>(path).await,
            Method::Post => self.api.post_empty::<Value>(path).await,
        };
        reply.map_err(|err| {
            self.notifier
                .notify_error(err.notification_text(&format!("Failed to load {}.", noun)));
            err
        })
    }

    fn decode<T: DeserializeOwned>(&self, body: Value, field: &str) -> Result<Vec<T>, AppError> {
        self.decode_field(body, field, field)
    }

    fn decode_field<T: DeserializeOwned>(
        &self,
        body: Value,
        field: &str,
        noun: &str,
    ) -> Result<Vec<T>, AppError> {
        let list = match body {
            Value::Array(items) => Value::Array(items),
            Value::Object(mut map) => map.remove(field).unwrap_or(Value::Array(Vec::new())),
            _ => Value::Array(Vec::new()),
        };
        if list.is_null() {
            return Ok(Vec::new());
        }
        serde_json::from_value(list).map_err(|err| {
            let err = AppError::from(err);
            self.notifier
                .notify_error(err.notification_text(&format!("Failed to load {}.", noun)));
            err
        })
    }
}

#[derive(Clone, Copy)]
enum Method {
    Get,
    Post,
}
