//! Per-client authentication state.
//!
//! A [`SessionContext`] is loaded from a [`SessionStore`] at the start of a
//! request, handed to the page through `Ctx`, and saved back at the end. It
//! is written wholesale at login, read by every authorization check, and
//! cleared entirely at logout.

mod store;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::policy::Permission;
use crate::storage::{Record, Value};

pub use store::{new_session_id, MemorySessionStore, SessionStore};

/// Session key: `true` once a user has logged in.
pub const LOGGED_IN: &str = "loggedin";
/// Session key: permission tier of the logged-in user.
pub const PERMISSIONS: &str = "permissions";
/// Session key: primary key of the logged-in user.
pub const UID: &str = "uid";
/// Session key: username of the logged-in user.
pub const USERNAME: &str = "username";
/// Session key: token the last rendered form was issued with.
pub const FORM_TOKEN: &str = "rand";

/// Columns never copied from a user row into the session.
const PRIVATE_COLUMNS: &[&str] = &["password"];

/// The logged-in user as seen by authorization checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    /// `users.uid`
    pub uid: i64,
    /// `users.username`
    pub username: String,
    /// Permission tier
    pub permission: Permission,
}

/// Key/value state kept for one client between requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionContext {
    values: BTreeMap<String, Value>,
}

impl SessionContext {
    /// An empty session, as every new client starts with.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw value for `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// Text value for `key`.
    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_text)
    }

    /// Sets `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    /// Removes `key`, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    /// Drops every key (logout).
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Whether the session holds no keys at all.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether a user is logged in on this session.
    pub fn is_logged_in(&self) -> bool {
        self.get(LOGGED_IN).is_some_and(Value::as_bool)
    }

    /// Stored permission tier; unknown values read as [`Permission::User`].
    pub fn permission(&self) -> Option<Permission> {
        self.get(PERMISSIONS)
            .and_then(Value::as_integer)
            .map(|tier| Permission::try_from(tier).unwrap_or(Permission::User))
    }

    /// The logged-in user, if the session describes one completely.
    pub fn principal(&self) -> Option<Principal> {
        if !self.is_logged_in() {
            return None;
        }
        Some(Principal {
            uid: self.get(UID).and_then(Value::as_integer)?,
            username: self.text(USERNAME)?.to_string(),
            permission: self.permission().unwrap_or(Permission::User),
        })
    }

    /// Copies a user row into the session and marks it logged in.
    ///
    /// Numeric keys and the password hash are skipped. Empty values are
    /// copied but logged, since every user column is expected to be set.
    pub fn populate_from(&mut self, row: &Record) {
        for (key, value) in row {
            let numeric = !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit());
            if numeric || PRIVATE_COLUMNS.contains(&key.as_str()) {
                continue;
            }
            if value.is_empty() {
                tracing::warn!(column = %key, "session value is empty");
            }
            self.values.insert(key.clone(), value.clone());
        }
        self.set(LOGGED_IN, true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::record;

    fn user_row(permissions: i64) -> Record {
        record([
            ("uid", 7.into()),
            ("username", "bobby".into()),
            ("firstname", "Bobby".into()),
            ("email", "bobby@example.com".into()),
            ("password", "$2b$04$hash".into()),
            ("permissions", permissions.into()),
        ])
    }

    #[test]
    fn new_session_is_anonymous() {
        let session = SessionContext::new();
        assert!(!session.is_logged_in());
        assert!(session.principal().is_none());
    }

    #[test]
    fn populate_sets_login_and_skips_password() {
        let mut session = SessionContext::new();
        session.populate_from(&user_row(0));
        assert!(session.is_logged_in());
        assert_eq!(session.text("firstname"), Some("Bobby"));
        assert!(session.get("password").is_none());
    }

    #[test]
    fn populate_skips_numeric_keys() {
        let mut session = SessionContext::new();
        let mut row = user_row(0);
        row.insert("0".to_string(), 7.into());
        session.populate_from(&row);
        assert!(session.get("0").is_none());
    }

    #[test]
    fn principal_reflects_row() {
        let mut session = SessionContext::new();
        session.populate_from(&user_row(2));
        let principal = session.principal().unwrap();
        assert_eq!(principal.uid, 7);
        assert_eq!(principal.username, "bobby");
        assert_eq!(principal.permission, Permission::Sysadmin);
    }

    #[test]
    fn zero_permission_is_a_real_tier() {
        let mut session = SessionContext::new();
        session.populate_from(&user_row(0));
        assert_eq!(session.permission(), Some(Permission::User));
    }

    #[test]
    fn clear_logs_out() {
        let mut session = SessionContext::new();
        session.populate_from(&user_row(1));
        session.clear();
        assert!(session.is_empty());
        assert!(!session.is_logged_in());
    }
}
