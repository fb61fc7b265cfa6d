//! Moox Events admin client.
//!
//! Session persistence, the generic resource list manager, image ingestion and the
//! sign-in flow for the Moox Events back-office API.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod ingest;
pub mod models;
pub mod notify;
pub mod public;
pub mod resource;
pub mod session;


use std::sync::Arc;

use api::ApiClient;
use auth::AuthFlow;
use config::Config;
use db::Repository;
use errors::AppError;
use ingest::ImagePipeline;
use models::Resource;
use notify::Notifier;
use public::PublicSite;
use resource::ResourceListManager;
use session::SessionStore;

/// Everything a screen needs, opened once per process.
#[derive(Clone)]
pub struct AdminContext {
    pub config: Arc<Config>,
    pub session: SessionStore,
    pub api: ApiClient,
    pub images: ImagePipeline,
}

impl AdminContext {
    /// Open the session database and build the API client.
    pub async fn open(config: Config) -> Result<Self, AppError> {
        let pool = db::init_database(&config.session_db_path).await?;
        Self::with_repository(config, Repository::new(pool))
    }

    pub fn with_repository(config: Config, repo: Repository) -> Result<Self, AppError> {
        let session = SessionStore::new(repo);
        let api = ApiClient::new(config.clone())?.with_session(session.clone());
        let images = ImagePipeline::from_config(&config);

        Ok(Self {
            config: Arc::new(config),
            session,
            api,
            images,
        })
    }

    /// A fresh notification slot for one screen.
    pub fn notifier(&self) -> Notifier {
        Notifier::new(self.config.notification_duration)
    }

    /// List manager for one screen, with its own notification slot.
    pub fn manager<T: Resource>(&self) -> ResourceListManager<T> {
        ResourceListManager::new(
            self.api.clone(),
            self.session.clone(),
            self.notifier(),
            self.images.clone(),
            self.config.background_refresh,
        )
    }

    pub fn auth(&self) -> AuthFlow {
        AuthFlow::new(self.api.clone(), self.session.clone(), self.notifier())
    }

    pub fn public_site(&self) -> PublicSite {
        PublicSite::new(self.api.clone(), self.notifier())
    }
}
