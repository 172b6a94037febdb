use schoolmule_portal::{
    FileTokenStore, MemoryTokenStore, Role, Session, SessionStore, TokenStore,
    session::SessionSnapshot,
};
use std::fs;
use tempfile::TempDir;

fn signed_in() -> Session {
    Session {
        id: Some("u1".to_string()),
        username: "jdoe".to_string(),
        email: "jdoe@example.com".to_string(),
        role: Some(Role::Teacher),
        is_verified_email: true,
        ..Session::default()
    }
}

#[cfg(test)]
mod session_tests {
    use super::*;

    #[tokio::test]
    async fn test_store_starts_empty_and_unhydrated() {
        let store = SessionStore::in_memory();
        assert!(!store.has_hydrated());
        assert_eq!(store.user(), Session::default());

        store.hydrate().await;
        assert!(store.has_hydrated());
        assert_eq!(store.user(), Session::default());
    }

    #[tokio::test]
    async fn test_session_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state").join("session.json");

        let first = SessionStore::persistent(&path);
        first.hydrate().await;
        first.set_user(signed_in());
        first.flush().await;

        let snapshot: SessionSnapshot =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(snapshot.version, 1);
        assert_eq!(snapshot.state.user, signed_in());

        let second = SessionStore::persistent(&path);
        assert_eq!(second.user(), Session::default());
        second.hydrate().await;
        assert_eq!(second.user(), signed_in());
    }

    #[tokio::test]
    async fn test_clear_user_persists_anonymous_session() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::persistent(&path);
        store.hydrate().await;
        store.set_user(signed_in());
        store.clear_user();
        store.flush().await;

        let restored = SessionStore::persistent(&path);
        restored.hydrate().await;
        assert!(!restored.user().is_authenticated());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_hydrates_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "{ not json").unwrap();

        let store = SessionStore::persistent(&path);
        store.hydrate().await;

        assert!(store.has_hydrated());
        assert_eq!(store.user(), Session::default());
    }

    #[tokio::test]
    async fn test_hydration_happens_once() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::persistent(&path);
        let mut hydration = store.subscribe_hydration();
        store.hydrate().await;
        assert!(hydration.has_changed().unwrap());
        hydration.borrow_and_update();

        // A later snapshot on disk is not picked up again.
        let writer = SessionStore::persistent(&path);
        writer.hydrate().await;
        writer.set_user(signed_in());
        writer.flush().await;
        store.hydrate().await;

        assert!(!hydration.has_changed().unwrap());
        assert_eq!(store.user(), Session::default());
    }

    #[tokio::test]
    async fn test_flush_writes_last_of_a_burst() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::persistent(&path);
        store.hydrate().await;
        for i in 0..20 {
            store.set_user(Session {
                id: Some(format!("u{i}")),
                ..signed_in()
            });
            store.clear_user();
        }
        store.set_user(signed_in());
        store.flush().await;

        let snapshot: SessionSnapshot =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(snapshot.state.user, signed_in());
    }

    #[tokio::test]
    async fn test_changes_before_hydration_are_not_written() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let store = SessionStore::persistent(&path);
        store.set_user(signed_in());
        store.flush().await;

        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_subscribers_only_see_real_changes() {
        let store = SessionStore::in_memory();
        let mut user_rx = store.subscribe_user();

        store.set_user(signed_in());
        assert!(user_rx.has_changed().unwrap());
        user_rx.borrow_and_update();

        store.set_user(signed_in());
        assert!(!user_rx.has_changed().unwrap());
    }
}

#[cfg(test)]
mod token_tests {
    use super::*;

    #[test]
    fn test_file_token_round_trip() {
        let dir = TempDir::new().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token"));

        assert_eq!(store.get_token(), None);
        store.set_token("abc.def.ghi\n").unwrap();
        assert_eq!(store.get_token().as_deref(), Some("abc.def.ghi"));

        store.clear_token().unwrap();
        assert_eq!(store.get_token(), None);
        // Clearing twice is fine.
        store.clear_token().unwrap();
    }

    #[test]
    fn test_blank_file_counts_as_no_token() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "  \n").unwrap();

        assert_eq!(FileTokenStore::new(path).get_token(), None);
    }

    #[test]
    fn test_memory_token_store() {
        let store = MemoryTokenStore::with_token("t1");
        assert_eq!(store.get_token().as_deref(), Some("t1"));

        store.set_token("").unwrap();
        assert_eq!(store.get_token(), None);

        store.set_token("t2").unwrap();
        store.clear_token().unwrap();
        assert_eq!(store.get_token(), None);
    }
}
