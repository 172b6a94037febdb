use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{Arc, RwLock},
};

use crate::error::PortalError;

/// TokenStore
///
/// Durable credential storage. The controller only ever asks whether a token is
/// present; the validation client also reads it for the bearer header and clears
/// it when the API reports it expired.
pub trait TokenStore: Send + Sync {
    /// Returns the stored token. Empty or whitespace-only values count as absent.
    fn get_token(&self) -> Option<String>;

    fn set_token(&self, token: &str) -> Result<(), PortalError>;

    /// Idempotent: clearing an absent token succeeds.
    fn clear_token(&self) -> Result<(), PortalError>;
}

/// TokenState
///
/// Shared handle used by the controller and the validation client.
pub type TokenState = Arc<dyn TokenStore>;

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// FileTokenStore
///
/// Keeps the token in a single file so it survives restarts.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStore for FileTokenStore {
    fn get_token(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => non_blank(&raw),
            Err(e) if e.kind() == io::ErrorKind::NotFound => None,
            Err(e) => {
                // Unreadable storage behaves like "no token".
                tracing::warn!(path = %self.path.display(), error = %e, "failed to read token file");
                None
            }
        }
    }

    fn set_token(&self, token: &str) -> Result<(), PortalError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token.trim())?;
        Ok(())
    }

    fn clear_token(&self) -> Result<(), PortalError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// MemoryTokenStore
///
/// In-process token storage for tests and embedding.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    token: RwLock<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            token: RwLock::new(non_blank(token)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn get_token(&self) -> Option<String> {
        self.token
            .read()
            .map(|guard| guard.clone())
            .unwrap_or_else(|poisoned| poisoned.into_inner().clone())
    }

    fn set_token(&self, token: &str) -> Result<(), PortalError> {
        let mut guard = self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = non_blank(token);
        Ok(())
    }

    fn clear_token(&self) -> Result<(), PortalError> {
        let mut guard = self
            .token
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
        Ok(())
    }
}
