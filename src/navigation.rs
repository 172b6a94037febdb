use std::sync::Arc;

use tokio::sync::watch;

use crate::access::paths;

/// Navigator
///
/// The current location as an observable value. `push` is a user navigation,
/// `replace` is what the controller uses for redirects. Both are no-ops when the
/// path does not change, so redirecting to the current page never re-triggers
/// evaluation.
#[derive(Clone)]
pub struct Navigator {
    current: Arc<watch::Sender<String>>,
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new(paths::ROOT)
    }
}

impl Navigator {
    pub fn new(initial: &str) -> Self {
        let (current, _) = watch::channel(initial.to_string());
        Self {
            current: Arc::new(current),
        }
    }

    pub fn current(&self) -> String {
        self.current.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.current.subscribe()
    }

    pub fn push(&self, path: &str) -> bool {
        self.go(path, "push")
    }

    pub fn replace(&self, path: &str) -> bool {
        self.go(path, "replace")
    }

    fn go(&self, path: &str, kind: &'static str) -> bool {
        let changed = self.current.send_if_modified(|current| {
            if current.as_str() == path {
                return false;
            }
            *current = path.to_string();
            true
        });
        if changed {
            tracing::debug!(path, kind, "navigated");
        }
        changed
    }
}
