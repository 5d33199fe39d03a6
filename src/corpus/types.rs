//! Type definitions for decision records
//!
//! [`RecordId`] wraps the file name a record was loaded from so that it can
//! only ever name a file directly inside the corpus directory.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// Validate that a file name is safe to join onto the corpus directory
fn validate_file_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::NotFound("empty record identifier".to_string()));
    }

    // Check for path traversal attempts
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(Error::NotFound(format!(
            "invalid record identifier '{}': contains path separators or traversal sequences",
            name
        )));
    }

    if name.chars().any(char::is_control) {
        return Err(Error::NotFound(format!(
            "invalid record identifier '{}': contains control characters",
            name
        )));
    }

    Ok(())
}

/// Stable handle to the file backing a record
///
/// The default value is the empty identifier, which is what records
/// reconstructed from search hits carry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Create an identifier from a bare file name
    pub fn from_file_name(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        validate_file_name(&name)?;
        Ok(Self(name))
    }

    /// The file name as found on disk
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-normalized form used as the primary key in the search index
    pub fn index_key(&self) -> String {
        self.0.to_lowercase()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A single decision record
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Empty when the document was reconstructed from a search hit
    #[serde(default, skip_serializing_if = "RecordId::is_empty")]
    pub identifier: RecordId,
    pub number: i64,
    pub title: String,
    /// `None` when the header omits it or the document came from a search hit
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    pub status: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub body: String,
}

/// Metadata-only view of a record, used for listings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSummary {
    pub identifier: RecordId,
    pub number: i64,
    pub title: String,
    pub date: Option<DateTime<Utc>>,
    pub status: String,
}

impl From<&Document> for RecordSummary {
    fn from(doc: &Document) -> Self {
        Self {
            identifier: doc.identifier.clone(),
            number: doc.number,
            title: doc.title.clone(),
            date: doc.date,
            status: doc.status.clone(),
        }
    }
}
