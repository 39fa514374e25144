//! Gateway configuration, read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use coachdesk_auth::ScopePolicy;

use crate::GatewayError;

pub const API_URL_VAR: &str = "COACHDESK_API_URL";
pub const SESSION_FILE_VAR: &str = "COACHDESK_SESSION_FILE";
pub const UNSCOPED_RESOURCES_VAR: &str = "COACHDESK_UNSCOPED_RESOURCES";
pub const REQUEST_TIMEOUT_VAR: &str = "COACHDESK_REQUEST_TIMEOUT_SECS";

pub const DEFAULT_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_SESSION_FILE: &str = ".coachdesk/session.json";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayConfig {
    pub api_url: String,
    pub session_file: PathBuf,
    pub policy: ScopePolicy,
    pub request_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            session_file: PathBuf::from(DEFAULT_SESSION_FILE),
            policy: ScopePolicy::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Result<Self, GatewayError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Unset or blank variables fall
    /// back to defaults; malformed ones are rejected.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, GatewayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(url) = var(API_URL_VAR) {
            let url = url.trim().trim_end_matches('/').to_string();
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(GatewayError::Config(format!(
                    "{API_URL_VAR} must be an http(s) URL, got '{url}'"
                )));
            }
            config.api_url = url;
        }

        if let Some(path) = var(SESSION_FILE_VAR) {
            config.session_file = PathBuf::from(path.trim());
        }

        if let Some(list) = var(UNSCOPED_RESOURCES_VAR) {
            config.policy = ScopePolicy::from_unscoped_list(&list)?;
            tracing::warn!(
                resources = %list,
                "resources exempted from organization scoping"
            );
        }

        if let Some(secs) = var(REQUEST_TIMEOUT_VAR) {
            let secs: u64 = secs.trim().parse().map_err(|_| {
                GatewayError::Config(format!("{REQUEST_TIMEOUT_VAR} must be whole seconds, got '{secs}'"))
            })?;
            config.request_timeout = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
