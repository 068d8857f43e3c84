//! crates/habit_tracker_core/src/validator.rs
//!
//! Field-level validation primitives. A `Validator` collects at most one
//! message per field; the first message registered for a field wins.

use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Field name to error message, ordered by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Pattern for email-shaped strings.
pub static EMAIL_RX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^[a-zA-Z0-9.!#$%&'*+/=?^_`{|}~-]+@[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(?:\.[a-zA-Z0-9](?:[a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)*$"#,
    )
    .expect("email pattern is a valid regular expression")
});

#[derive(Debug, Clone, Default)]
pub struct Validator {
    errors: FieldErrors,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// True when no errors have been recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Records `message` for `field` unless the field already has one.
    pub fn add_error(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    /// Records `message` for `field` only when `ok` is false.
    pub fn check(&mut self, ok: bool, field: &str, message: impl Into<String>) {
        if !ok {
            self.add_error(field, message);
        }
    }

    pub fn error(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

pub fn not_blank(value: &str) -> bool {
    !value.trim().is_empty()
}

/// Length is measured in Unicode scalar values, not bytes.
pub fn min_length(value: &str, n: usize) -> bool {
    value.chars().count() >= n
}

/// Length is measured in Unicode scalar values, not bytes.
pub fn max_length(value: &str, n: usize) -> bool {
    value.chars().count() <= n
}

/// Byte-length cap, for inputs bounded by an underlying primitive.
pub fn max_bytes(value: &str, n: usize) -> bool {
    value.len() <= n
}

pub fn permitted_value<T: PartialEq + ?Sized>(value: &T, permitted: &[&T]) -> bool {
    permitted.iter().any(|candidate| *candidate == value)
}

pub fn matches(value: &str, rx: &Regex) -> bool {
    rx.is_match(value)
}

pub fn is_valid_email(value: &str) -> bool {
    matches(value, &EMAIL_RX)
}
