use std::{env, path::PathBuf, time::Duration};

use crate::error::PortalError;

/// AppConfig
///
/// Holds the portal's configuration. Loaded once at startup and cloned into the
/// HTTP state and into client-side components (token store, session store,
/// validation client).
#[derive(Clone, Debug)]
pub struct AppConfig {
    // Runtime environment marker. Selects log format and fail-fast rules.
    pub env: Env,
    // Address the access-policy HTTP service binds to.
    pub bind_addr: String,
    // Base URL of the SchoolMule REST API (hosts the session validation endpoint).
    pub api_base_url: String,
    // Directory holding the durable token and the persisted session.
    pub state_dir: PathBuf,
    // Timeout applied to every outbound call to the REST API.
    pub request_timeout: Duration,
}

/// Env
///
/// Runtime context. `Local` allows defaults for everything; `Production` demands
/// explicit infrastructure settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_LOCAL_API_URL: &str = "http://localhost:8080/api";
pub const DEFAULT_STATE_DIR: &str = ".schoolmule";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

const SESSION_FILE: &str = "session.json";
const TOKEN_FILE: &str = "token";

impl Default for AppConfig {
    /// Safe values for test scaffolding; never reads the environment.
    fn default() -> Self {
        Self {
            env: Env::Local,
            bind_addr: "127.0.0.1:0".to_string(),
            api_base_url: DEFAULT_LOCAL_API_URL.to_string(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        }
    }
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from environment variables.
    ///
    /// # Errors
    /// Fails fast with `PortalError::Config` when `SCHOOLMULE_API_URL` is missing in
    /// production or when `PORTAL_REQUEST_TIMEOUT_SECS` is not a positive integer.
    pub fn load() -> Result<Self, PortalError> {
        let env_str = env::var("APP_ENV").unwrap_or_else(|_| "local".to_string());
        let env = match env_str.as_str() {
            "production" => Env::Production,
            _ => Env::Local,
        };

        let api_base_url = match env {
            Env::Production => env::var("SCHOOLMULE_API_URL").map_err(|_| {
                PortalError::Config("SCHOOLMULE_API_URL must be set in production".to_string())
            })?,
            Env::Local => env::var("SCHOOLMULE_API_URL")
                .unwrap_or_else(|_| DEFAULT_LOCAL_API_URL.to_string()),
        };

        let request_timeout = match env::var("PORTAL_REQUEST_TIMEOUT_SECS") {
            Ok(raw) => parse_timeout(&raw)?,
            Err(_) => Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
        };

        Ok(Self {
            env,
            bind_addr: env::var("PORTAL_BIND_ADDR")
                .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string()),
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            state_dir: env::var("PORTAL_STATE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_STATE_DIR)),
            request_timeout,
        })
    }

    /// Where the persisted session lives.
    pub fn session_file(&self) -> PathBuf {
        self.state_dir.join(SESSION_FILE)
    }

    /// Where the durable token lives.
    pub fn token_file(&self) -> PathBuf {
        self.state_dir.join(TOKEN_FILE)
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, PortalError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        _ => Err(PortalError::Config(format!(
            "PORTAL_REQUEST_TIMEOUT_SECS must be a positive integer, got {raw:?}"
        ))),
    }
}
