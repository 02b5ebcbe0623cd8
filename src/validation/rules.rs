//! Stateless field checks.

use std::sync::OnceLock;

use regex::Regex;

use super::{ValidationError, ValidationErrorKind};

static EMAIL: OnceLock<Regex> = OnceLock::new();
static UK_PHONE: OnceLock<Regex> = OnceLock::new();

fn email_regex() -> &'static Regex {
    EMAIL.get_or_init(|| {
        Regex::new(
            r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+(\.[A-Za-z0-9!#$%&'*+/=?^_`{|}~-]+)*@([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?\.)+[A-Za-z]{2,63}$",
        )
        .expect("email pattern is valid")
    })
}

// Accepts +447222555555, +44 7222 555 555, (0722) 5555555 #2222.
fn uk_phone_regex() -> &'static Regex {
    UK_PHONE.get_or_init(|| {
        Regex::new(
            r"^(((\+44\s?[0-9]{4}|\(?0[0-9]{4}\)?)\s?[0-9]{3}\s?[0-9]{3})|((\+44\s?[0-9]{3}|\(?0[0-9]{3}\)?)\s?[0-9]{3}\s?[0-9]{4})|((\+44\s?[0-9]{2}|\(?0[0-9]{2}\)?)\s?[0-9]{4}\s?[0-9]{4}))(\s?#([0-9]{4}|[0-9]{3}))?$",
        )
        .expect("phone pattern is valid")
    })
}

/// First field that is absent or blank.
///
/// `"0"` is a present value.
pub fn required(fields: &[(&str, Option<&str>)]) -> Option<ValidationError> {
    fields
        .iter()
        .find(|(_, value)| value.map_or(true, |v| v.trim().is_empty()))
        .map(|(field, _)| ValidationError::new(*field, ValidationErrorKind::Required))
}

/// First field whose value contains a space.
pub fn no_spaces(fields: &[(&str, &str)]) -> Option<ValidationError> {
    fields
        .iter()
        .find(|(_, value)| value.contains(' '))
        .map(|(field, _)| ValidationError::new(*field, ValidationErrorKind::ContainsSpaces))
}

/// Character count of `value` must lie in `min..=max`.
pub fn length(field: &str, value: &str, min: usize, max: usize) -> Option<ValidationError> {
    let n = value.chars().count();
    (n < min || n > max).then(|| ValidationError::new(field, ValidationErrorKind::Length { min, max }))
}

/// First field that is not purely ASCII letters once spaces are removed.
/// An empty value fails.
pub fn alphabetic(fields: &[(&str, &str)]) -> Option<ValidationError> {
    fields
        .iter()
        .find(|(_, value)| {
            let mut letters = value.chars().filter(|c| *c != ' ').peekable();
            letters.peek().is_none() || !letters.all(|c| c.is_ascii_alphabetic())
        })
        .map(|(field, _)| ValidationError::new(*field, ValidationErrorKind::NotAlphabetic))
}

/// Email address syntax.
pub fn email(value: &str) -> Option<ValidationError> {
    (!email_regex().is_match(value))
        .then(|| ValidationError::new("Email", ValidationErrorKind::InvalidEmail))
}

/// UK landline or mobile number, with an optional 3 or 4 digit extension.
pub fn uk_phone(value: &str) -> Option<ValidationError> {
    (!uk_phone_regex().is_match(value))
        .then(|| ValidationError::new("Phone Number", ValidationErrorKind::InvalidPhone))
}
