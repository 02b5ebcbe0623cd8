use std::fmt;

/// A wrapper that keeps a sensitive value out of logs and pages.
///
/// Submitted passwords are wrapped in `Secret<String>` as soon as they are
/// read from a form, and the stored bcrypt hash is never copied into a
/// session. The wrapped value is only reachable through
/// [`expose_secret`](Self::expose_secret).
///
/// `Secret` deliberately has no `Clone`, `Deref`, `AsRef` or `Serialize`.
///
/// # Examples
///
/// ```
/// use newsdesk::Secret;
///
/// let password = Secret::new("correct horse".to_string());
/// assert_eq!(format!("{password:?}"), "[REDACTED]");
/// assert_eq!(password.to_string(), "[REDACTED]");
/// assert_eq!(password.expose_secret(), "correct horse");
/// ```
pub struct Secret<T> {
    // Must stay private: a public field bypasses redaction.
    inner: T,
}

impl<T> Secret<T> {
    /// Wraps a sensitive value.
    pub fn new(value: T) -> Self {
        Self { inner: value }
    }

    /// Explicitly exposes the secret value.
    ///
    /// Callers must not log or render what this returns.
    pub fn expose_secret(&self) -> &T {
        &self.inner
    }
}

impl<T> fmt::Debug for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl<T> fmt::Display for Secret<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}
