//! Session store.
//!
//! Holds the signed-in account's identifiers in persistent storage. Every list fetch
//! and mutation asks this store for the current user id first; a missing id stops
//! the action before any request is made.

use serde::{Deserialize, Serialize};

use crate::db::Repository;
use crate::errors::AppError;

/// Storage keys, shared with the web dashboard.
pub mod keys {
    pub const TOKEN: &str = "token";
    pub const USER_ID: &str = "userid";
    pub const EMAIL: &str = "emailid";
    pub const MOBILE: &str = "mobileno";
    pub const NAME: &str = "name";
    pub const ACTIVE_COMPONENT: &str = "activeComponent";
}

/// Keys that survive logout.
pub const PRESERVED_ON_LOGOUT: &[&str] = &[keys::ACTIVE_COMPONENT];

/// Dashboard section shown when no preference is stored.
pub const DEFAULT_SECTION: &str = "ManageServices";

/// Message shown when an action needs a session and none exists.
pub const NOT_AUTHENTICATED: &str = "User not authenticated.";

/// The authenticated account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub email: String,
    pub mobile: String,
    pub name: String,
}

/// Read/write surface over the persisted session.
#[derive(Clone)]
pub struct SessionStore {
    repo: Repository,
}

impl SessionStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Persist all session fields, replacing whatever was stored.
    pub async fn set_session(&self, session: &Session) -> Result<(), AppError> {
        self.repo
            .set_many(&[
                (keys::TOKEN, session.token.as_str()),
                (keys::USER_ID, session.user_id.as_str()),
                (keys::EMAIL, session.email.as_str()),
                (keys::MOBILE, session.mobile.as_str()),
                (keys::NAME, session.name.as_str()),
            ])
            .await?;
        tracing::info!(user_id = %session.user_id, "Session established");
        Ok(())
    }

    /// Wipe storage and then persist the session, atomically.
    ///
    /// Preferences listed in [`PRESERVED_ON_LOGOUT`] are kept.
    pub async fn replace_session(&self, session: &Session) -> Result<(), AppError> {
        self.repo
            .replace_all(
                PRESERVED_ON_LOGOUT,
                &[
                    (keys::TOKEN, session.token.as_str()),
                    (keys::USER_ID, session.user_id.as_str()),
                    (keys::EMAIL, session.email.as_str()),
                    (keys::MOBILE, session.mobile.as_str()),
                    (keys::NAME, session.name.as_str()),
                ],
            )
            .await?;
        tracing::info!(user_id = %session.user_id, "Session established");
        Ok(())
    }

    /// The stored session, if both token and user id are present.
    pub async fn current(&self) -> Result<Option<Session>, AppError> {
        let (Some(token), Some(user_id)) = (
            self.non_empty(keys::TOKEN).await?,
            self.non_empty(keys::USER_ID).await?,
        ) else {
            return Ok(None);
        };

        Ok(Some(Session {
            token,
            user_id,
            email: self.repo.get(keys::EMAIL).await?.unwrap_or_default(),
            mobile: self.repo.get(keys::MOBILE).await?.unwrap_or_default(),
            name: self.repo.get(keys::NAME).await?.unwrap_or_default(),
        }))
    }

    /// The stored user id, or `None` when signed out.
    pub async fn current_user_id(&self) -> Result<Option<String>, AppError> {
        self.non_empty(keys::USER_ID).await
    }

    /// The stored user id, or `Unauthorized`.
    pub async fn require_user_id(&self) -> Result<String, AppError> {
        self.current_user_id()
            .await?
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.to_string()))
    }

    /// The stored bearer token, if any.
    pub async fn token(&self) -> Result<Option<String>, AppError> {
        self.non_empty(keys::TOKEN).await
    }

    /// Guard for dashboard navigation: a session with token and user id.
    pub async fn require(&self) -> Result<Session, AppError> {
        self.current()
            .await?
            .ok_or_else(|| AppError::Unauthorized(NOT_AUTHENTICATED.to_string()))
    }

    /// Remove every session field. The dashboard section preference is kept.
    pub async fn clear_session(&self) -> Result<(), AppError> {
        self.repo.clear_except(PRESERVED_ON_LOGOUT).await?;
        tracing::info!("Session cleared");
        Ok(())
    }

    /// Email waiting for OTP verification.
    pub async fn pending_email(&self) -> Result<Option<String>, AppError> {
        self.non_empty(keys::EMAIL).await
    }

    pub async fn set_pending_email(&self, email: &str) -> Result<(), AppError> {
        self.repo.set(keys::EMAIL, email).await
    }

    /// Dashboard section last shown.
    pub async fn active_section(&self) -> Result<String, AppError> {
        Ok(self
            .non_empty(keys::ACTIVE_COMPONENT)
            .await?
            .unwrap_or_else(|| DEFAULT_SECTION.to_string()))
    }

    pub async fn set_active_section(&self, section: &str) -> Result<(), AppError> {
        self.repo.set(keys::ACTIVE_COMPONENT, section).await
    }

    async fn non_empty(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.repo.get(key).await?.filter(|v| !v.trim().is_empty()))
    }
}
