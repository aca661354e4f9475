//! Newspaper model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::{Redactor, Topic};

/// Maximum length of a newspaper title
pub const TITLE_MAX_LEN: usize = 255;

/// Newspaper entity: an article filed under one topic and credited to
/// any number of redactors.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Newspaper {
    pub id: i64,
    pub title: String,
    pub content: String,
    /// Set once when the newspaper is created
    pub published_date: DateTime<Utc>,
    pub topic_id: i64,
}

impl fmt::Display for Newspaper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.title, self.content)
    }
}

/// Newspaper joined with its topic, as shown in lists
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewspaperWithTopic {
    #[serde(flatten)]
    pub newspaper: Newspaper,
    pub topic: Topic,
}

/// Newspaper with its topic and credited redactors
#[derive(Debug, Clone, Serialize)]
pub struct NewspaperDetail {
    #[serde(flatten)]
    pub newspaper: Newspaper,
    pub topic: Topic,
    pub redactors: Vec<Redactor>,
}

/// Validated input for creating or updating a newspaper
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewspaperInput {
    pub title: String,
    pub content: String,
    pub topic_id: i64,
    pub redactor_ids: Vec<i64>,
}
