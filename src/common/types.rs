use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Domain model đại diện một tin nhắn chat.
///
/// A message is never mutated after it is built; the server only stores and
/// copies it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub author: String,
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    /// Build a message stamped with the current time.
    pub fn new(author: impl Into<String>, text: impl Into<String>) -> Self {
        Self::at(author, text, Utc::now())
    }

    pub fn at(author: impl Into<String>, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            author: author.into(),
            text: text.into(),
            timestamp,
        }
    }
}
