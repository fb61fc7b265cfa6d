//! Configuration module for the admin client.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::AppError;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Host of the remote API, without the path prefix
    pub api_url: String,
    /// Path prefix every endpoint lives under
    pub api_prefix: String,
    /// Path to the SQLite file holding the session
    pub session_db_path: PathBuf,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    /// How long a notification stays visible
    pub notification_duration: Duration,
    /// Files larger than this are compressed before upload
    pub image_threshold_bytes: u64,
    /// Longest edge of a compressed image
    pub image_max_dimension: u32,
    /// Size a compressed image should fit in
    pub image_target_bytes: u64,
    /// Per-request timeout; `None` keeps the HTTP client default
    pub request_timeout: Option<Duration>,
    /// Re-fetch the list in the background after each mutation
    pub background_refresh: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: "http://127.0.0.1:5000".to_string(),
            api_prefix: "/moox_events/api".to_string(),
            session_db_path: "./data/session.sqlite".into(),
            log_level: "info".to_string(),
            log_json: false,
            notification_duration: Duration::from_millis(2000),
            image_threshold_bytes: 51_200,
            image_max_dimension: 1024,
            image_target_bytes: 51_200,
            request_timeout: None,
            background_refresh: true,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let api_url = env::var("MOOX_API_URL")
            .map(|url| url.trim_end_matches('/').to_string())
            .unwrap_or(defaults.api_url);

        let api_prefix = env::var("MOOX_API_PREFIX").unwrap_or(defaults.api_prefix);

        let session_db_path = env::var("MOOX_SESSION_DB")
            .map(PathBuf::from)
            .unwrap_or(defaults.session_db_path);

        let log_level = env::var("MOOX_LOG_LEVEL").unwrap_or(defaults.log_level);

        let log_json = parse_var("MOOX_LOG_JSON")?.unwrap_or(defaults.log_json);

        let notification_duration = parse_var::<u64>("MOOX_NOTIFICATION_MS")?
            .map(Duration::from_millis)
            .unwrap_or(defaults.notification_duration);

        let image_threshold_bytes =
            parse_var("MOOX_IMAGE_THRESHOLD_BYTES")?.unwrap_or(defaults.image_threshold_bytes);

        let image_max_dimension =
            parse_var("MOOX_IMAGE_MAX_DIMENSION")?.unwrap_or(defaults.image_max_dimension);

        let image_target_bytes =
            parse_var("MOOX_IMAGE_TARGET_BYTES")?.unwrap_or(defaults.image_target_bytes);

        let request_timeout =
            parse_var::<u64>("MOOX_REQUEST_TIMEOUT_SECS")?.map(Duration::from_secs);

        let background_refresh =
            parse_var("MOOX_BACKGROUND_REFRESH")?.unwrap_or(defaults.background_refresh);

        Ok(Self {
            api_url,
            api_prefix,
            session_db_path,
            log_level,
            log_json,
            notification_duration,
            image_threshold_bytes,
            image_max_dimension,
            image_target_bytes,
            request_timeout,
            background_refresh,
        })
    }

    /// Full URL of an endpoint path such as `service/get-service`.
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}/{}",
            self.api_url,
            self.api_prefix.trim_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

fn parse_var<T: FromStr>(name: &str) -> Result<Option<T>, AppError> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| AppError::Config(format!("Invalid {} value: {}", name, raw))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARS: &[&str] = &[
        "MOOX_API_URL",
        "MOOX_API_PREFIX",
        "MOOX_SESSION_DB",
        "MOOX_LOG_LEVEL",
        "MOOX_LOG_JSON",
        "MOOX_NOTIFICATION_MS",
        "MOOX_IMAGE_THRESHOLD_BYTES",
        "MOOX_IMAGE_MAX_DIMENSION",
        "MOOX_IMAGE_TARGET_BYTES",
        "MOOX_REQUEST_TIMEOUT_SECS",
        "MOOX_BACKGROUND_REFRESH",
    ];

    // Both cases share one test so they never race on the process environment.
    #[test]
    fn test_config_from_env() {
        for var in VARS {
            env::remove_var(var);
        }

        let config = Config::from_env().unwrap();
        assert_eq!(config.api_url, "http://127.0.0.1:5000");
        assert_eq!(config.api_prefix, "/moox_events/api");
        assert_eq!(config.session_db_path, PathBuf::from("./data/session.sqlite"));
        assert_eq!(config.log_level, "info");
        assert_eq!(config.notification_duration, Duration::from_millis(2000));
        assert_eq!(config.image_threshold_bytes, 51_200);
        assert_eq!(config.image_max_dimension, 1024);
        assert!(config.request_timeout.is_none());
        assert!(config.background_refresh);

        env::set_var("MOOX_API_URL", "https://api.example.com/");
        env::set_var("MOOX_NOTIFICATION_MS", "1500");
        let config = Config::from_env().unwrap();
        assert_eq!(config.api_url, "https://api.example.com");
        assert_eq!(config.notification_duration, Duration::from_millis(1500));

        env::set_var("MOOX_IMAGE_MAX_DIMENSION", "huge");
        let err = Config::from_env().unwrap_err();
        assert!(matches!(err, AppError::Config(_)));

        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_endpoint_joins_prefix() {
        let config = Config::default();
        assert_eq!(
            config.endpoint("service/get-service"),
            "http://127.0.0.1:5000/moox_events/api/service/get-service"
        );
        assert_eq!(
            config.endpoint("/auth/login"),
            "http://127.0.0.1:5000/moox_events/api/auth/login"
        );
    }
}
