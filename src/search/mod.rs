//! # Search Module
//!
//! This module provides fuzzy full-text search over decision records using
//! the Tantivy full-text search engine. The index lives in memory, is built
//! once from a corpus snapshot and is only read afterwards.
//!
//! ## Key Components
//!
//! - [`indexer`] - Builds the in-memory index from loaded records
//! - [`fuzzy`] - Fuzzy query construction, ranking and total counts
//! - [`highlight`] - Edit-distance matching of tokens and snippet fragments
//! - [`projector`] - Decodes stored hits back into documents
//! - [`outputs`] - Serializable output types
//! - [`config`] - Configuration constants for search functionality

pub mod config;
pub mod fuzzy;
pub mod highlight;
pub mod indexer;
pub mod outputs;
pub mod projector;

pub use fuzzy::{FuzzySearchOptions, FuzzySearcher, SearchHit, SearchOutcome};
pub use highlight::FieldHighlight;
pub use indexer::{RecordIndex, RecordIndexer, build_index};
pub use projector::project_hit;
