//! # Corpus Module
//!
//! Reads decision records from a directory.
//!
//! ## Key Components
//!
//! - [`record`] - Splits a record into its front matter header and body
//! - [`loader`] - Enumerates record files and isolates per-record failures
//! - [`types`] - [`Document`] and the [`RecordId`] file handle
//! - [`constants`] - File extension and delimiter constants

pub mod constants;
pub mod loader;
pub mod record;
pub mod types;

pub use loader::{Corpus, LoadFailure, LoadOptions, load_corpus, load_record};
pub use record::{parse_record, read_record};
pub use types::{Document, RecordId, RecordSummary};
