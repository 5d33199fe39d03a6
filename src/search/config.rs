//! # Search Configuration Module
//!
//! Provides configuration constants for search indexing and querying.

/// Memory budget for the single index writer thread (50MB)
pub const WRITER_BUFFER_SIZE: usize = 50_000_000;

/// The index is built by exactly one writer thread so that a rebuild from
/// the same corpus produces the same segment and the same scores
pub const WRITER_THREADS: usize = 1;

/// Maximum allowed query length in characters
pub const MAX_QUERY_LENGTH: usize = 1000;

/// Default fuzzy distance for typo tolerance
pub const DEFAULT_FUZZY_DISTANCE: u8 = 1;

/// Maximum fuzzy distance allowed
pub const MAX_FUZZY_DISTANCE: u8 = 2;

/// Default score multiplier for matches in the title field
pub const DEFAULT_TITLE_BOOST: f32 = 2.0;

/// Maximum length of a highlighted body fragment, in bytes
pub const SNIPPET_MAX_LEN: usize = 150;

/// Bytes of context kept before the first highlighted term in a fragment
pub const SNIPPET_LEADING_CONTEXT: usize = 40;
