//! Error handling module for the admin client.
//!
//! Every failure an admin action can hit is one `AppError`. Callers never see a raw
//! transport or storage error: each variant knows how to render itself as the short
//! text shown in the notification bubble.

use reqwest::StatusCode;

/// Error codes as constants to avoid stringly-typed errors.
#[allow(dead_code)]
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const VALIDATION_ERROR: &str = "VALIDATION_ERROR";
    pub const API_ERROR: &str = "API_ERROR";
    pub const NETWORK_ERROR: &str = "NETWORK_ERROR";
    pub const IMAGE_ERROR: &str = "IMAGE_ERROR";
    pub const STORAGE_ERROR: &str = "STORAGE_ERROR";
    pub const UNSUPPORTED: &str = "UNSUPPORTED";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
}

/// Text shown when a request fails without a server supplied message.
pub const GENERIC_FAILURE: &str = "Something went wrong. Please try again.";

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// No session, or the session lacks a user id
    Unauthorized(String),
    /// A required field or image is missing
    Validation(String),
    /// The remote API answered with a non-success status
    Api {
        status: StatusCode,
        message: Option<String>,
    },
    /// The request never produced a response
    Network(String),
    /// Image compression, decoding or reading failed
    Image(String),
    /// Session database error
    Storage(String),
    /// The resource kind does not offer this operation
    Unsupported(String),
    /// Malformed request or response payload
    BadRequest(String),
    /// Invalid configuration value
    Config(String),
}

impl AppError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Validation(_) => codes::VALIDATION_ERROR,
            AppError::Api { .. } => codes::API_ERROR,
            AppError::Network(_) => codes::NETWORK_ERROR,
            AppError::Image(_) => codes::IMAGE_ERROR,
            AppError::Storage(_) => codes::STORAGE_ERROR,
            AppError::Unsupported(_) => codes::UNSUPPORTED,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::Config(_) => codes::CONFIG_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> String {
        match self {
            AppError::Unauthorized(msg) => msg.clone(),
            AppError::Validation(msg) => msg.clone(),
            AppError::Api { status, message } => message
                .clone()
                .unwrap_or_else(|| format!("Request failed with status {}", status.as_u16())),
            AppError::Network(msg) => msg.clone(),
            AppError::Image(msg) => msg.clone(),
            AppError::Storage(msg) => msg.clone(),
            AppError::Unsupported(msg) => msg.clone(),
            AppError::BadRequest(msg) => msg.clone(),
            AppError::Config(msg) => msg.clone(),
        }
    }

    /// Message the server attached to a rejected call, if any.
    pub fn server_message(&self) -> Option<&str> {
        match self {
            AppError::Api { message, .. } => message.as_deref(),
            _ => None,
        }
    }

    /// Text for the notification bubble.
    ///
    /// Auth, validation and image errors are already phrased for the user and are
    /// shown verbatim. Request failures are prefixed with `context`
    /// ("Failed to load services.") and followed by the server message when there
    /// is one, else the generic fallback.
    pub fn notification_text(&self, context: &str) -> String {
        match self {
            AppError::Unauthorized(msg) | AppError::Validation(msg) | AppError::Image(msg) => {
                msg.clone()
            }
            AppError::Api {
                message: Some(msg), ..
            } => format!("{} {}", context, msg),
            AppError::Api { message: None, .. } => format!("{} {}", context, GENERIC_FAILURE),
            other => format!("{} {}", context, other.message()),
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Storage error: {:?}", err);
        AppError::Storage(format!("Storage error: {}", err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            tracing::warn!("Undecodable response: {:?}", err);
            return AppError::BadRequest(format!("Unexpected response: {}", err));
        }
        tracing::warn!("Request error: {:?}", err);
        AppError::Network(format!("Network error: {}", err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        tracing::error!("JSON error: {:?}", err);
        AppError::BadRequest(format!("JSON error: {}", err))
    }
}

impl From<image::ImageError> for AppError {
    fn from(err: image::ImageError) -> Self {
        tracing::warn!("Image error: {:?}", err);
        AppError::Image(format!("Failed to process image: {}", err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        tracing::warn!("IO error: {:?}", err);
        AppError::Image(format!("Failed to read file: {}", err))
    }
}
