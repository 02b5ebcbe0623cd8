use crate::error::Error;
use crate::storage::{Record, RecordExt, Table, TableGateway};

use super::{ValidationError, ValidationErrorKind};

/// Fails if another account already uses `username`.
///
/// The comparison is case-insensitive. When `current` is the record being
/// edited and its own username matches, the check passes. The lookup and the
/// later insert are separate statements; the `UNIQUE` constraint on
/// `users.username` catches anything that slips between them.
pub fn duplicate_username(
    users: &TableGateway<'_>,
    candidate: &str,
    current: Option<&Record>,
) -> Result<Option<ValidationError>, Error> {
    duplicate(
        users,
        "username",
        "Username",
        ValidationErrorKind::DuplicateUsername,
        candidate,
        current,
    )
}

/// Fails if another account already uses `email`. Same rules as
/// [`duplicate_username`].
pub fn duplicate_email(
    users: &TableGateway<'_>,
    candidate: &str,
    current: Option<&Record>,
) -> Result<Option<ValidationError>, Error> {
    duplicate(
        users,
        "email",
        "Email",
        ValidationErrorKind::DuplicateEmail,
        candidate,
        current,
    )
}

fn duplicate(
    users: &TableGateway<'_>,
    column: &str,
    field: &str,
    kind: ValidationErrorKind,
    candidate: &str,
    current: Option<&Record>,
) -> Result<Option<ValidationError>, Error> {
    debug_assert_eq!(users.table(), Table::Users);
    if candidate.trim().is_empty() {
        return Ok(None);
    }
    let candidate = candidate.to_lowercase();
    let unchanged = current
        .and_then(|record| record.text(column))
        .is_some_and(|own| own.to_lowercase() == candidate);
    if unchanged {
        return Ok(None);
    }
    let taken = !users.find(column, candidate.as_str(), None, None)?.is_empty();
    Ok(taken.then(|| ValidationError::new(field, kind)))
}
