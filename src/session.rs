use std::{
    io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::{error::PortalError, models::Session};

/// Version tag written into the persisted snapshot.
pub const SNAPSHOT_VERSION: u32 = 1;

/// SessionSnapshot
///
/// On-disk shape of the persisted session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub state: SnapshotState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SnapshotState {
    #[serde(default)]
    pub user: Session,
}

/// SessionStore
///
/// The observable session plus its hydration flag. Cheap to clone; every clone
/// shares the same state. Mutations notify subscribers through `watch` channels,
/// which is what drives the controller's re-evaluation.
///
/// Persistent stores write snapshots from a background task started by
/// `hydrate()`, so `set_user` never blocks on the filesystem. Changes made before
/// hydration are not written; hydration replaces them anyway. `flush()` waits
/// until the latest change is on disk.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    user: watch::Sender<Session>,
    hydrated: watch::Sender<bool>,
    // None keeps the session in memory only.
    snapshot_path: Option<PathBuf>,
    // Bumped after every change of `user`.
    revision: Arc<AtomicU64>,
    // Last revision the writer has put on disk.
    persisted: Arc<watch::Sender<u64>>,
}

impl SessionStore {
    /// A store persisted to `path` as JSON.
    pub fn persistent(path: impl Into<PathBuf>) -> Self {
        Self::build(Some(path.into()))
    }

    /// A store that never touches the filesystem.
    pub fn in_memory() -> Self {
        Self::build(None)
    }

    fn build(snapshot_path: Option<PathBuf>) -> Self {
        let (user, _) = watch::channel(Session::default());
        let (hydrated, _) = watch::channel(false);
        let (persisted, _) = watch::channel(0);
        Self {
            inner: Arc::new(StoreInner {
                user,
                hydrated,
                snapshot_path,
                revision: Arc::new(AtomicU64::new(0)),
                persisted: Arc::new(persisted),
            }),
        }
    }

    pub fn user(&self) -> Session {
        self.inner.user.borrow().clone()
    }

    pub fn has_hydrated(&self) -> bool {
        *self.inner.hydrated.borrow()
    }

    pub fn subscribe_user(&self) -> watch::Receiver<Session> {
        self.inner.user.subscribe()
    }

    pub fn subscribe_hydration(&self) -> watch::Receiver<bool> {
        self.inner.hydrated.subscribe()
    }

    /// set_user
    ///
    /// Replaces the session. Subscribers (and the snapshot writer) are only
    /// notified when the value actually changes.
    pub fn set_user(&self, user: Session) {
        let changed = self.inner.user.send_if_modified(|current| {
            if *current == user {
                return false;
            }
            *current = user.clone();
            // Bumped under the channel lock so readers see value and revision together.
            self.inner.revision.fetch_add(1, Ordering::SeqCst);
            true
        });
        if changed {
            tracing::debug!(user_id = ?user.id, "session updated");
        }
    }

    /// clear_user
    ///
    /// Resets to the anonymous session (logout, account deletion, stale state).
    pub fn clear_user(&self) {
        self.set_user(Session::default());
    }

    /// hydrate
    ///
    /// Restores the persisted session and flips the hydration flag. Only the first
    /// call does any work; the flag never goes back to false. A missing snapshot
    /// yields the anonymous session and an unreadable one is logged and ignored.
    /// Must run inside a Tokio runtime when the store is persistent.
    pub async fn hydrate(&self) {
        if self.has_hydrated() {
            return;
        }

        // An in-memory store has nothing to restore and keeps what it holds.
        if let Some(path) = &self.inner.snapshot_path {
            let restored = match read_snapshot(path).await {
                Ok(Some(snapshot)) => snapshot.state.user,
                Ok(None) => Session::default(),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "discarding unreadable session snapshot");
                    Session::default()
                }
            };

            // Restoring must not rewrite the snapshot it was just read from.
            self.inner.user.send_if_modified(|current| {
                if *current == restored {
                    return false;
                }
                *current = restored;
                true
            });

            self.spawn_writer(path.clone());
        }

        let first = self.inner.hydrated.send_if_modified(|flag| {
            let was = *flag;
            *flag = true;
            !was
        });
        if first {
            tracing::info!(authenticated = self.user().is_authenticated(), "session store hydrated");
        }
    }

    /// flush
    ///
    /// Resolves once every change made so far is written. Returns immediately for
    /// in-memory or not yet hydrated stores, which have no writer.
    pub async fn flush(&self) {
        if self.inner.snapshot_path.is_none() || !self.has_hydrated() {
            return;
        }
        let target = self.inner.revision.load(Ordering::SeqCst);
        let mut persisted = self.inner.persisted.subscribe();
        // Err only when the store itself is gone.
        let _ = persisted.wait_for(|written| *written >= target).await;
    }

    /// Writes a snapshot after each change. The task ends when the last clone of
    /// the store is dropped, because it only holds a receiver.
    fn spawn_writer(&self, path: PathBuf) {
        let mut user_rx = self.inner.user.subscribe();
        let revision = self.inner.revision.clone();
        let persisted = self.inner.persisted.clone();
        persisted.send_replace(revision.load(Ordering::SeqCst));

        tokio::spawn(async move {
            while user_rx.changed().await.is_ok() {
                let (user, written) = {
                    let current = user_rx.borrow_and_update();
                    (current.clone(), revision.load(Ordering::SeqCst))
                };
                if let Err(e) = write_snapshot(&path, &user).await {
                    tracing::warn!(path = %path.display(), error = %e, "failed to persist session");
                }
                persisted.send_replace(written);
            }
        });
    }
}

async fn read_snapshot(path: &Path) -> Result<Option<SessionSnapshot>, PortalError> {
    let raw = match tokio::fs::read_to_string(path).await {
        Ok(raw) => raw,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    Ok(Some(serde_json::from_str(&raw)?))
}

async fn write_snapshot(path: &Path, user: &Session) -> Result<(), PortalError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let snapshot = SessionSnapshot {
        version: SNAPSHOT_VERSION,
        saved_at: Utc::now(),
        state: SnapshotState { user: user.clone() },
    };
    tokio::fs::write(path, serde_json::to_vec_pretty(&snapshot)?).await?;
    Ok(())
}
