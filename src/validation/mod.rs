//! Form validation.
//!
//! Every check is an independent function that returns
//! `Option<ValidationError>`: `None` on success, a structured error naming the
//! offending field otherwise. A form runs all of its checks through
//! [`Checks`], which keeps the failures in order and never short-circuits, so
//! the visitor sees every problem at once.
//!
//! ```
//! use newsdesk::validation::{rules, Checks};
//!
//! let mut checks = Checks::new();
//! checks.push(rules::required(&[("Username", Some("bo")), ("Password", Some(""))]));
//! checks.push(rules::length("Username", "bo", 4, 32));
//! checks.push(rules::uk_phone("+447222555555"));
//!
//! let errors = checks.finish().unwrap_err();
//! assert_eq!(errors.len(), 2);
//! assert_eq!(errors.messages()[0], "Password field is required.");
//! ```

mod duplicates;
pub mod rules;

use std::fmt;

use serde::Serialize;

pub use duplicates::{duplicate_email, duplicate_username};

/// A single failed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    field: String,
    kind: ValidationErrorKind,
}

impl ValidationError {
    /// Creates a validation error for `field`.
    pub fn new(field: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field: field.into(),
            kind,
        }
    }

    /// Display name of the field that failed.
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Why it failed.
    pub fn kind(&self) -> ValidationErrorKind {
        self.kind
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = &self.field;
        match self.kind {
            ValidationErrorKind::Required => write!(f, "{field} field is required."),
            ValidationErrorKind::ContainsSpaces => {
                write!(f, "{field} field should not contain spaces.")
            }
            ValidationErrorKind::Length { min, max } => {
                write!(f, "{field} must be between {min} and {max} characters.")
            }
            ValidationErrorKind::NotAlphabetic => {
                write!(f, "{field} may only contain alphabetic values.")
            }
            ValidationErrorKind::InvalidEmail => f.write_str(
                "Invalid email address. Make sure it is in a valid format, e.g., dexter.morgan@mdpd.us",
            ),
            ValidationErrorKind::InvalidPhone => {
                f.write_str("Phone number you provided is not a valid format.")
            }
            ValidationErrorKind::DuplicateUsername => {
                f.write_str("We are sorry, that username was already used.")
            }
            ValidationErrorKind::DuplicateEmail => {
                f.write_str("We are sorry, that email was already used.")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

impl Serialize for ValidationError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut s = serializer.serialize_struct("ValidationError", 2)?;
        s.serialize_field("field", &self.field)?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

/// Category of a failed check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationErrorKind {
    /// Absent or blank.
    Required,
    /// Contains a space character.
    ContainsSpaces,
    /// Character count outside the inclusive range.
    Length {
        /// Shortest accepted length
        min: usize,
        /// Longest accepted length
        max: usize,
    },
    /// Not purely alphabetic once spaces are removed.
    NotAlphabetic,
    /// Not a syntactically valid email address.
    InvalidEmail,
    /// Not a recognised UK phone number.
    InvalidPhone,
    /// Username already registered.
    DuplicateUsername,
    /// Email already registered.
    DuplicateEmail,
}

/// Ordered list of failures from one form submission. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationError>);

impl ValidationErrors {
    /// Number of failures.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates the failures in the order the checks ran.
    pub fn iter(&self) -> std::slice::Iter<'_, ValidationError> {
        self.0.iter()
    }

    /// Display text of every failure.
    pub fn messages(&self) -> Vec<String> {
        self.0.iter().map(ToString::to_string).collect()
    }

    /// Whether any failure is of `kind`.
    pub fn contains(&self, kind: ValidationErrorKind) -> bool {
        self.0.iter().any(|e| e.kind == kind)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl<'a> IntoIterator for &'a ValidationErrors {
    type Item = &'a ValidationError;
    type IntoIter = std::slice::Iter<'a, ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Collects check outcomes for one form.
#[derive(Debug, Default)]
pub struct Checks {
    errors: Vec<ValidationError>,
}

impl Checks {
    /// An empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a check outcome; successes are dropped.
    pub fn push(&mut self, outcome: Option<ValidationError>) -> &mut Self {
        self.errors.extend(outcome);
        self
    }

    /// `Ok` when every check passed, otherwise the failures in order.
    pub fn finish(self) -> Result<(), ValidationErrors> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationErrors(self.errors))
        }
    }
}
