use std::collections::HashMap;
use std::sync::Mutex;

use super::SessionContext;
use crate::error::Error;

/// Persistence for session state between requests.
///
/// Implementations are keyed by an opaque session id (the value a client
/// presents in its session cookie).
pub trait SessionStore: Send + Sync {
    /// The saved session for `id`, or `None` for an unknown id.
    fn load(&self, id: &str) -> Result<Option<SessionContext>, Error>;

    /// Stores `session` under `id`, replacing what was there.
    fn save(&self, id: &str, session: &SessionContext) -> Result<(), Error>;

    /// Forgets `id`.
    fn remove(&self, id: &str) -> Result<(), Error>;
}

/// A fresh random session id.
pub fn new_session_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Process-local session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    sessions: Mutex<HashMap<String, SessionContext>>,
}

impl MemorySessionStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of sessions held.
    pub fn len(&self) -> usize {
        self.sessions.lock().map(|s| s.len()).unwrap_or(0)
    }

    /// Whether no sessions are held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn with_sessions<T>(
        &self,
        f: impl FnOnce(&mut HashMap<String, SessionContext>) -> T,
    ) -> Result<T, Error> {
        let mut guard = self
            .sessions
            .lock()
            .map_err(|_| Error::Session("session map lock poisoned".to_string()))?;
        Ok(f(&mut guard))
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self, id: &str) -> Result<Option<SessionContext>, Error> {
        self.with_sessions(|s| s.get(id).cloned())
    }

    fn save(&self, id: &str, session: &SessionContext) -> Result<(), Error> {
        self.with_sessions(|s| {
            s.insert(id.to_string(), session.clone());
        })
    }

    fn remove(&self, id: &str) -> Result<(), Error> {
        self.with_sessions(|s| {
            s.remove(id);
        })
    }
}
