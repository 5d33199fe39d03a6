//! Output types for record browsing and search
//!
//! These types are serialized to JSON by the HTTP server and the `search`
//! command, and can be deserialized in tests for type-safe validation.

use serde::{Deserialize, Serialize};

use crate::corpus::RecordSummary;
use crate::search::fuzzy::{SearchHit, SearchOutcome};

/// Output from a search request
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchOutput {
    pub query: String,
    /// Number of matching records
    pub total: usize,
    pub hits: Vec<SearchHit>,
}

impl SearchOutput {
    pub fn new(query: impl Into<String>, outcome: SearchOutcome) -> Self {
        Self {
            query: query.into(),
            total: outcome.total,
            hits: outcome.hits,
        }
    }

    /// Convert to a pretty JSON string for terminal output
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self)
            .unwrap_or_else(|_| r#"{"error":"Failed to serialize search results"}"#.to_string())
    }

    /// Check if there are any results
    pub fn has_results(&self) -> bool {
        !self.hits.is_empty()
    }
}

/// Output from listing the corpus directory
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListOutput {
    pub records: Vec<RecordSummary>,
    /// Number of files that looked like records but failed to load
    pub skipped: usize,
}

/// Service status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthOutput {
    pub status: String,
    pub version: String,
    /// Records in the search index
    pub indexed: u64,
    /// Records skipped when the index was built
    pub skipped: usize,
}
