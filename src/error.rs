use std::fmt;

/// Message shown to the visitor whenever a request fails for a reason
/// other than invalid form input.
pub const GENERIC_FAILURE: &str = "We could not process your request. Please try again later.";

/// Errors that can occur while serving a request.
///
/// Form validation failures are not represented here: they are recovered
/// locally by the page that ran the checks (see
/// [`ValidationErrors`](crate::ValidationErrors)). Everything in this enum
/// propagates to [`Site::handle`](crate::web::Site::handle), which logs it and
/// serves the generic failure page.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A programmer-level fault: empty lookup keys, unknown columns, an
    /// invalid sort direction, a malformed route registry.
    #[error("invalid argument: {0}")]
    Argument(String),

    /// The storage driver rejected or failed a statement.
    #[error("storage failure on `{table}` during {operation}: {source}")]
    Storage {
        /// Table the statement targeted.
        table: &'static str,
        /// Gateway operation that failed.
        operation: &'static str,
        /// Underlying driver error.
        #[source]
        source: rusqlite::Error,
    },

    /// A policy requirement was not met.
    #[error("policy violation: {0}")]
    Violation(#[from] Violation),

    /// Hashing or verifying a password failed.
    #[error("password hashing failed: {0}")]
    Password(#[from] bcrypt::BcryptError),

    /// The session store could not load or save session state.
    #[error("session store failure: {0}")]
    Session(String),

    /// Configuration could not be read, parsed or validated.
    #[error("configuration error: {0}")]
    Config(String),

    /// A filesystem operation failed (upload writes and removals).
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Builds an [`Error::Argument`].
    pub fn argument(message: impl Into<String>) -> Self {
        Error::Argument(message.into())
    }

    pub(crate) fn storage(
        table: &'static str,
        operation: &'static str,
    ) -> impl FnOnce(rusqlite::Error) -> Self {
        move |source| Error::Storage {
            table,
            operation,
            source,
        }
    }
}

/// A policy violation with details about what failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// The kind of violation that occurred
    pub kind: ViolationKind,
    /// Human-readable message explaining the violation
    pub message: String,
}

impl Violation {
    /// Creates a new violation.
    pub fn new(kind: ViolationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for Violation {}

/// The kind of policy violation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViolationKind {
    /// Nobody is logged in on this session
    Unauthenticated,
    /// The logged-in user's tier is too low for the operation
    InsufficientPermission,
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationKind::Unauthenticated => write!(f, "Unauthenticated"),
            ViolationKind::InsufficientPermission => write!(f, "Insufficient permission"),
        }
    }
}
