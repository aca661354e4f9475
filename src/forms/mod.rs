//! Form binding and validation
//!
//! Every form follows the same shape:
//! - start from blank values (create) or from an existing record (update)
//! - `bind` the submitted [`FormData`]; fields absent from the body keep
//!   their current values
//! - `validate` into a typed input or a set of [`FormErrors`]
//!
//! Checks that need the store (unique usernames, existing topics) are done by
//! the services, which add their findings to the same error map.

mod login;
mod newspaper;
mod redactor;
mod topic;

pub use login::LoginForm;
pub use newspaper::NewspaperForm;
pub use redactor::{AdminRedactorForm, RedactorCreationForm, RedactorInfoForm, RedactorRegistration};
pub use topic::TopicForm;

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Key under which errors not tied to a single field are reported
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// Longest accepted search term; longer values disable the filter
pub const SEARCH_MAX_LEN: usize = 255;

pub(crate) const MSG_REQUIRED: &str = "This field is required.";
pub(crate) const MSG_INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Statically declared field names of a form, in display order
pub trait FormFields {
    const FIELDS: &'static [&'static str];
}

/// Submitted `application/x-www-form-urlencoded` body.
///
/// Keeps every pair so multi-valued fields (`redactors=1&redactors=2`)
/// survive decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Last value submitted for `key`
    pub fn value(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Every value submitted for `key`, in order
    pub fn values(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.pairs.iter().any(|(k, _)| k == key)
    }

    /// Overwrite `target` with the trimmed submitted value, if any
    pub(crate) fn bind_text(&self, key: &str, target: &mut String) {
        if let Some(value) = self.value(key) {
            *target = value.trim().to_string();
        }
    }
}

impl From<Vec<(String, String)>> for FormData {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::new(pairs)
    }
}

impl<'a> FromIterator<(&'a str, &'a str)> for FormData {
    fn from_iter<I: IntoIterator<Item = (&'a str, &'a str)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }
}

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Error map holding a single message
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Messages for one field
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `Ok(value)` when no error was recorded
    pub fn into_result<T>(self, value: T) -> Result<T, FormErrors> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{}: {}", field, message)?;
                first = false;
            }
        }
        Ok(())
    }
}

/// One selectable option of a relation field
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Choice {
    pub value: i64,
    pub label: String,
}

impl Choice {
    pub fn new(value: i64, label: impl fmt::Display) -> Self {
        Self {
            value,
            label: label.to_string(),
        }
    }
}

/// Normalize a raw search parameter.
///
/// Blank or overlong values yield `None`, meaning "do not filter".
pub fn search_term(raw: Option<&str>) -> Option<String> {
    let term = raw?.trim();
    if term.is_empty() || term.chars().count() > SEARCH_MAX_LEN {
        return None;
    }
    Some(term.to_string())
}

/// Required single-line text with a length limit
pub(crate) fn check_text(errors: &mut FormErrors, field: &str, value: &str, required: bool, max: usize) {
    if value.is_empty() {
        if required {
            errors.add(field, MSG_REQUIRED);
        }
        return;
    }
    let len = value.chars().count();
    if len > max {
        errors.add(
            field,
            format!(
                "Ensure this value has at most {} characters (it has {}).",
                max, len
            ),
        );
    }
}

/// Parse a primary-key choice such as a topic or redactor id
pub(crate) fn parse_id(raw: &str) -> Option<i64> {
    raw.trim().parse::<i64>().ok().filter(|id| *id > 0)
}
