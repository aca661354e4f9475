//! Redactor model
//!
//! A redactor is a staff account: an author or editor who can be credited on
//! newspapers. Staff redactors may also use the administrative console.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::NewspaperWithTopic;

/// Maximum length of a username
pub const USERNAME_MAX_LEN: usize = 150;
/// Maximum length of first and last names
pub const PERSON_NAME_MAX_LEN: usize = 150;

/// Redactor entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Redactor {
    pub id: i64,
    pub username: String,
    /// Argon2id PHC string, never serialized
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub years_of_experience: u32,
    pub is_staff: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl Redactor {
    /// Create a new Redactor. The ID is assigned by the database.
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        years_of_experience: u32,
    ) -> Self {
        Self {
            id: 0,
            username: username.into(),
            password_hash: password_hash.into(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            years_of_experience,
            is_staff: false,
            is_superuser: false,
            date_joined: Utc::now(),
        }
    }

    /// Whether this redactor may use the administrative console
    pub fn can_access_admin(&self) -> bool {
        self.is_staff || self.is_superuser
    }

    /// First and last name joined by a space, trimmed
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

impl fmt::Display for Redactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.username, self.first_name, self.last_name)
    }
}

/// Redactor with the newspapers credited to them
#[derive(Debug, Clone, Serialize)]
pub struct RedactorDetail {
    #[serde(flatten)]
    pub redactor: Redactor,
    pub newspapers: Vec<NewspaperWithTopic>,
}

/// Fields written by create and update operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedactorProfile {
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub years_of_experience: u32,
}

/// Staff flags, editable only from the administrative console
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RedactorFlags {
    pub is_staff: bool,
    pub is_superuser: bool,
}
