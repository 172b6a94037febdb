use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::task::JoinHandle;

use crate::{
    api::{HttpSessionValidator, ValidatorState},
    config::AppConfig,
    error::PortalError,
    guard::{self, GuardInput},
    models::Session,
    navigation::Navigator,
    session::SessionStore,
    token::{FileTokenStore, TokenState},
};

/// Outcome
///
/// What the page shell should do after one evaluation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// The store has not hydrated yet; render nothing.
    Pending,
    /// Render the requested path.
    Render(String),
    /// The controller replaced the location with `to`.
    Redirect { from: String, to: &'static str },
}

/// RouteAccessController
///
/// Applies the guard's decision table to the live session, token and location.
/// `evaluate` is one synchronous pass; `run` re-evaluates whenever the path, the
/// session or the hydration flag changes.
#[derive(Clone)]
pub struct RouteAccessController {
    store: SessionStore,
    tokens: TokenState,
    validator: ValidatorState,
    navigator: Navigator,
    validation_in_flight: Arc<AtomicBool>,
}

impl RouteAccessController {
    pub fn new(
        store: SessionStore,
        tokens: TokenState,
        validator: ValidatorState,
        navigator: Navigator,
    ) -> Self {
        Self {
            store,
            tokens,
            validator,
            navigator,
            validation_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// from_config
    ///
    /// Wires the file-backed token store, the persisted session store and the HTTP
    /// validation client described by `config`. The store still needs `hydrate()`.
    pub fn from_config(config: &AppConfig, initial_path: &str) -> Result<Self, PortalError> {
        let tokens = Arc::new(FileTokenStore::new(config.token_file())) as TokenState;
        let validator = Arc::new(
            HttpSessionValidator::from_config(config)?.with_token_store(tokens.clone()),
        ) as ValidatorState;

        Ok(Self::new(
            SessionStore::persistent(config.session_file()),
            tokens,
            validator,
            Navigator::new(initial_path),
        ))
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    pub fn navigator(&self) -> &Navigator {
        &self.navigator
    }

    pub fn tokens(&self) -> &TokenState {
        &self.tokens
    }

    /// evaluate
    ///
    /// One pass of the rule table against the current inputs. Performs at most one
    /// redirect. Running it again with unchanged inputs changes nothing.
    pub fn evaluate(&self) -> Outcome {
        if !self.store.has_hydrated() {
            return Outcome::Pending;
        }

        let path = self.navigator.current();
        let session = self.store.user();
        let has_token = self.tokens.get_token().is_some();

        let decision = guard::evaluate(&GuardInput {
            path: &path,
            has_token,
            session: &session,
        });

        if decision.clear_session {
            tracing::info!(user_id = ?session.id, "token is gone, clearing stale session");
            self.store.clear_user();
        }
        if decision.validate_session {
            self.start_validation();
        }

        match decision.redirect {
            Some(to) => {
                tracing::info!(from = %path, redirect_to = to, "redirecting");
                self.navigator.replace(to);
                Outcome::Redirect { from: path, to }
            }
            None => Outcome::Render(path),
        }
    }

    /// Fire-and-forget session validation. Only one call is in flight at a time.
    fn start_validation(&self) {
        if self.validation_in_flight.swap(true, Ordering::SeqCst) {
            tracing::debug!("session validation already in flight");
            return;
        }

        let (Some(token), Ok(runtime)) = (
            self.tokens.get_token(),
            tokio::runtime::Handle::try_current(),
        ) else {
            tracing::warn!("cannot start session validation");
            self.validation_in_flight.store(false, Ordering::SeqCst);
            return;
        };

        let validator = self.validator.clone();
        let store = self.store.clone();
        let in_flight = self.validation_in_flight.clone();

        runtime.spawn(async move {
            match validator.validate_session(&token).await {
                Ok(response) if response.success => match response.data.map(Session::from) {
                    Some(session) if session.is_authenticated() => store.set_user(session),
                    _ => tracing::warn!("validation succeeded without a user id, ignoring"),
                },
                Ok(response) => {
                    tracing::debug!(message = ?response.message, "session validation reported failure");
                }
                // Expired tokens are handled by the API layer.
                Err(e) => tracing::warn!(error = %e, "session validation failed"),
            }
            in_flight.store(false, Ordering::SeqCst);
        });
    }

    /// sign_in
    ///
    /// Stores the durable token and populates the session after a successful login.
    pub fn sign_in(&self, token: &str, session: Session) -> Result<(), PortalError> {
        self.tokens.set_token(token)?;
        self.store.set_user(session);
        Ok(())
    }

    /// sign_out
    ///
    /// Logout and account deletion: drops the token and the session.
    pub fn sign_out(&self) -> Result<(), PortalError> {
        self.tokens.clear_token()?;
        self.store.clear_user();
        Ok(())
    }

    /// run
    ///
    /// Evaluates once, then again after every change of path, session or hydration
    /// flag. Never returns while the controller's channels are alive; abort the
    /// task to stop it.
    pub async fn run(self) {
        let mut path_rx = self.navigator.subscribe();
        let mut user_rx = self.store.subscribe_user();
        let mut hydration_rx = self.store.subscribe_hydration();

        loop {
            self.evaluate();

            let changed = tokio::select! {
                changed = path_rx.changed() => changed,
                changed = user_rx.changed() => changed,
                changed = hydration_rx.changed() => changed,
            };
            if changed.is_err() {
                break;
            }
        }
    }

    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
