//! Question summary data structure.

use serde::{Deserialize, Serialize};

/// A question summary scraped from a tagged-question listing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Question {
    /// Numeric question id parsed from the permalink
    pub qid: u64,

    /// Absolute permalink
    pub link: String,

    /// Question title
    pub title: String,

    /// Tags in display order
    pub tags: Vec<String>,
}

impl Question {
    /// Tags joined with commas, as stored in object attributes.
    pub fn joined_tags(&self) -> String {
        self.tags.join(",")
    }
}
