use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use crate::{
    config::AppConfig,
    error::PortalError,
    models::{ValidateSessionResponse, ValidatedProfile},
    token::TokenState,
};

/// Path of the validation endpoint, relative to the API base URL.
pub const VALIDATE_SESSION_PATH: &str = "/auth/validate-session";

// 1. SessionValidator Contract
/// SessionValidator
///
/// Verifies a bearer token server-side and returns the canonical profile. The
/// controller and the HTTP service depend on this trait, so the real client can
/// be swapped for `MockSessionValidator` in tests.
#[async_trait]
pub trait SessionValidator: Send + Sync {
    async fn validate_session(&self, token: &str) -> Result<ValidateSessionResponse, PortalError>;
}

/// ValidatorState
///
/// Shared handle to the validation service.
pub type ValidatorState = Arc<dyn SessionValidator>;

// 2. The Real Implementation
/// HttpSessionValidator
///
/// Calls `GET {api}/auth/validate-session` with the token as bearer credential.
/// When attached to a token store it also owns expired-token handling: a 401
/// from the API clears the durable token.
#[derive(Clone)]
pub struct HttpSessionValidator {
    client: reqwest::Client,
    base_url: String,
    tokens: Option<TokenState>,
}

impl HttpSessionValidator {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, PortalError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            tokens: None,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, PortalError> {
        Self::new(&config.api_base_url, config.request_timeout)
    }

    /// Clears `tokens` whenever the API rejects a token as expired.
    pub fn with_token_store(mut self, tokens: TokenState) -> Self {
        self.tokens = Some(tokens);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn on_unauthorized(&self) {
        let Some(tokens) = &self.tokens else {
            return;
        };
        tracing::info!("validation service rejected the token, clearing it");
        if let Err(e) = tokens.clear_token() {
            tracing::warn!(error = %e, "failed to clear expired token");
        }
    }
}

#[async_trait]
impl SessionValidator for HttpSessionValidator {
    async fn validate_session(&self, token: &str) -> Result<ValidateSessionResponse, PortalError> {
        let url = format!("{}{}", self.base_url, VALIDATE_SESSION_PATH);

        let response = self
            .client
            .get(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(url = %url, error = %e, "session validation request failed");
                PortalError::Http(e)
            })?;

        match response.status() {
            StatusCode::UNAUTHORIZED => {
                self.on_unauthorized();
                Err(PortalError::Unauthorized)
            }
            status if !status.is_success() => Err(PortalError::Upstream(status.as_u16())),
            _ => Ok(response.json::<ValidateSessionResponse>().await?),
        }
    }
}

// 3. The Mock Implementation (For Tests)
/// MockSessionValidator
///
/// Returns a canned profile (or a failure) and counts calls. An optional delay
/// keeps a call in flight long enough to observe overlapping evaluations.
pub struct MockSessionValidator {
    profile: Option<ValidatedProfile>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    tokens_seen: Mutex<Vec<String>>,
}

impl MockSessionValidator {
    /// Every call succeeds with `profile`.
    pub fn new(profile: ValidatedProfile) -> Self {
        Self {
            profile: Some(profile),
            delay: None,
            calls: AtomicUsize::new(0),
            tokens_seen: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with `PortalError::Unauthorized`.
    pub fn new_failing() -> Self {
        Self {
            profile: None,
            delay: None,
            calls: AtomicUsize::new(0),
            tokens_seen: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen
            .lock()
            .map(|seen| seen.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl SessionValidator for MockSessionValidator {
    async fn validate_session(&self, token: &str) -> Result<ValidateSessionResponse, PortalError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut seen) = self.tokens_seen.lock() {
            seen.push(token.to_string());
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.profile {
            Some(profile) => Ok(ValidateSessionResponse {
                success: true,
                data: Some(profile.clone()),
                message: None,
            }),
            None => Err(PortalError::Unauthorized),
        }
    }
}
