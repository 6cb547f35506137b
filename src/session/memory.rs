use super::{Session, SessionStore};
use std::sync::{Arc, PoisonError, RwLock};

/// In-memory session repository. Clones share the same session.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Session>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            inner: Arc::new(RwLock::new(session)),
        }
    }
}

impl SessionStore for MemoryStore {
    fn get(&self) -> Session {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn set(&self, session: &Session) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = session.clone();
    }

    fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Session::default();
    }
}
