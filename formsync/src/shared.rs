//! Shared handle to a [`Session`] for views that call back into it.
//!
//! Views are usually wired as listeners that dispatch edits back to the
//! session. When a listener re-enters while a transition is still being
//! applied, the session is locked and the edit is dropped as
//! [`SyncOutcome::Suppressed`], which breaks any notification loop.

use std::sync::{Arc, Mutex, TryLockError, Weak};

use serde_json::Value;

use crate::{
    codec::Format,
    data::path::FieldPath,
    export::ExportArtifact,
    sync::{Session, Snapshot, SyncOutcome},
};

#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

/// Non-owning handle, for listeners stored inside the session itself.
#[derive(Debug, Clone)]
pub struct WeakSession {
    inner: Weak<Mutex<Session>>,
}

impl WeakSession {
    pub fn upgrade(&self) -> Option<SharedSession> {
        self.inner.upgrade().map(|inner| SharedSession { inner })
    }
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    pub fn downgrade(&self) -> WeakSession {
        WeakSession {
            inner: Arc::downgrade(&self.inner),
        }
    }

    /// Runs `f` on the session, or returns `None` while a transition holds
    /// it.
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> Option<R> {
        match self.inner.try_lock() {
            Ok(mut session) => Some(f(&mut session)),
            Err(TryLockError::WouldBlock) => None,
            Err(TryLockError::Poisoned(poisoned)) => {
                // A listener panicked mid-transition. Fields are assigned
                // whole, so only the transition marker is stale.
                warn!("session lock poisoned, recovering");
                let mut session = poisoned.into_inner();
                session.recover();
                Some(f(&mut session))
            }
        }
    }

    fn dispatch(&self, f: impl FnOnce(&mut Session) -> SyncOutcome) -> SyncOutcome {
        self.with(f).unwrap_or_else(|| {
            debug!("re-entrant edit suppressed");
            SyncOutcome::Suppressed
        })
    }

    pub fn text_changed(&self, text: impl Into<String>) -> SyncOutcome {
        self.dispatch(|s| s.text_changed(text))
    }

    pub fn structured_changed(&self, value: Value) -> SyncOutcome {
        self.dispatch(|s| s.structured_changed(value))
    }

    pub fn edit_field(&self, path: &FieldPath, value: Value) -> SyncOutcome {
        self.dispatch(|s| s.edit_field(path, value))
    }

    pub fn insert_item(&self, path: &FieldPath, value: Value) -> SyncOutcome {
        self.dispatch(|s| s.insert_item(path, value))
    }

    pub fn append_item(&self, array_path: &FieldPath) -> SyncOutcome {
        self.dispatch(|s| s.append_item(array_path))
    }

    pub fn remove_field(&self, path: &FieldPath) -> SyncOutcome {
        self.dispatch(|s| s.remove_field(path))
    }

    pub fn convert(&self, format: Format) -> SyncOutcome {
        self.dispatch(|s| s.convert(format))
    }

    /// Current state, or `None` while a transition is in progress.
    pub fn snapshot(&self) -> Option<Snapshot> {
        self.with(|s| s.snapshot())
    }

    pub fn export(&self) -> Option<ExportArtifact> {
        self.with(|s| s.export())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde_json::json;

    use crate::{
        config::SyncConfig,
        data::schema::{FieldSchema, Schema},
    };

    fn shared() -> SharedSession {
        let schema = Schema::new(
            FieldSchema::object()
                .with_property("title", FieldSchema::string())
                .with_required(["title"]),
        );
        SharedSession::new(Session::new("title: A\n", schema, SyncConfig::default()).unwrap())
    }

    #[test]
    fn test_listener_echo_is_suppressed() {
        let _ = env_logger::builder().is_test(true).try_init();
        let session = shared();
        let echoes = Arc::new(Mutex::new(Vec::new()));
        let text_updates = Arc::new(AtomicUsize::new(0));

        // A naive structured view that writes every value it receives back.
        let weak = session.downgrade();
        let sink = echoes.clone();
        session
            .with(|s| {
                s.on_value_derived(move |v| {
                    if let Some(handle) = weak.upgrade() {
                        sink.lock().unwrap().push(handle.structured_changed(v.clone()));
                    }
                })
            })
            .unwrap();
        // A naive text view doing the same.
        let weak = session.downgrade();
        let counter = text_updates.clone();
        session
            .with(|s| {
                s.on_text_derived(move |t| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    if let Some(handle) = weak.upgrade() {
                        let _ = handle.text_changed(t);
                    }
                })
            })
            .unwrap();

        assert!(session.text_changed("title: B\n").is_applied());
        assert_eq!(*echoes.lock().unwrap(), vec![SyncOutcome::Suppressed]);
        assert_eq!(text_updates.load(Ordering::SeqCst), 0);

        assert!(session.edit_field(&"title".parse().unwrap(), json!("C")).is_applied());
        assert_eq!(text_updates.load(Ordering::SeqCst), 1);
        assert_eq!(echoes.lock().unwrap().len(), 1);

        let snapshot = session.snapshot().unwrap();
        assert_eq!(snapshot.raw_text, "title: C\n");
        assert_eq!(snapshot.value, json!({"title": "C"}));
        assert_eq!(snapshot.version, 2);
    }

    #[test]
    fn test_snapshot_unavailable_during_transition() {
        let session = shared();
        let seen = Arc::new(Mutex::new(None));
        let weak = session.downgrade();
        let sink = seen.clone();
        session
            .with(|s| {
                s.on_validated(move |_| {
                    let handle = weak.upgrade().unwrap();
                    *sink.lock().unwrap() = Some(handle.snapshot().is_none());
                })
            })
            .unwrap();

        assert!(session.text_changed("title: Z\n").is_applied());
        assert_eq!(*seen.lock().unwrap(), Some(true));
        assert!(session.snapshot().is_some());
    }

    #[test]
    fn test_weak_handle_does_not_keep_session_alive() {
        let session = shared();
        let weak = session.downgrade();
        assert!(weak.upgrade().is_some());
        drop(session);
        assert!(weak.upgrade().is_none());
    }
}
