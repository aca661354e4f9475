//! Topic model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum length of a topic name
pub const TOPIC_NAME_MAX_LEN: usize = 255;

/// Subject category a newspaper is filed under.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Topic {
    pub id: i64,
    pub name: String,
}

impl Topic {
    /// Create a new Topic. The ID is assigned by the database.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Topic with the number of newspapers filed under it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicWithCount {
    #[serde(flatten)]
    pub topic: Topic,
    pub newspaper_count: i64,
}
