//! HTTP client for the remote API.
//!
//! Every endpoint is a JSON POST (a few are GET) under one base URL and path prefix.
//! Non-success responses are decoded for their `message` field so the caller can
//! show what the server said.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::Instrument;

use crate::config::Config;
use crate::errors::AppError;
use crate::session::SessionStore;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Acknowledgement body returned by most mutations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// Client bound to one API host.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    config: Config,
    session: Option<SessionStore>,
}

impl ApiClient {
    pub fn new(config: Config) -> Result<Self, AppError> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            config,
            session: None,
        })
    }

    /// Attach the stored bearer token to every request while a session exists.
    pub fn with_session(mut self, session: SessionStore) -> Self {
        self.session = Some(session);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// POST a JSON body and decode the JSON reply.
    pub async fn post<B, R>(&self, path: &str, body: &B) -> Result<R, AppError>
    where
        B: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let request = self.http.post(self.config.endpoint(path)).json(body);
        self.send(path, request).await
    }

    /// POST with no body.
    pub async fn post_empty<R: DeserializeOwned>(&self, path: &str) -> Result<R, AppError> {
        let request = self.http.post(self.config.endpoint(path));
        self.send(path, request).await
    }

    /// GET and decode the JSON reply.
    pub async fn get<R: DeserializeOwned>(&self, path: &str) -> Result<R, AppError> {
        let request = self.http.get(self.config.endpoint(path));
        self.send(path, request).await
    }

    async fn send<R: DeserializeOwned>(
        &self,
        path: &str,
        request: RequestBuilder,
    ) -> Result<R, AppError> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::debug_span!("api_request", %path, %request_id);

        async move {
            let mut request = request.header(REQUEST_ID_HEADER, &request_id);
            if let Some(session) = &self.session {
                if let Some(token) = session.token().await? {
                    request = request.bearer_auth(token);
                }
            }

            let response = request.send().await?;
            tracing::debug!(status = response.status().as_u16(), "Response received");
            decode(response).await
        }
        .instrument(span)
        .await
    }
}

/// Decode a success body, or turn a failure body into `AppError::Api`.
async fn decode<R: DeserializeOwned>(response: Response) -> Result<R, AppError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let message = response
        .json::<MessageResponse>()
        .await
        .ok()
        .and_then(|body| body.message)
        .filter(|m| !m.trim().is_empty());

    tracing::warn!(status = status.as_u16(), ?message, "API call rejected");
    Err(AppError::Api { status, message })
}
