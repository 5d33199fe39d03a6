//! Corpus loading
//!
//! Enumerates record files in a directory and parses each one. A record that
//! cannot be read or parsed is reported as a [`LoadFailure`] and skipped,
//! unless [`LoadOptions::strict`] asks for the first failure to abort the load.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use crate::corpus::constants::DEFAULT_RECORD_EXTENSION;
use crate::corpus::record::parse_record;
use crate::corpus::types::{Document, RecordId};
use crate::error::{Error, Result};

/// Options controlling which files are loaded and how failures are handled
#[derive(Debug, Clone)]
pub struct LoadOptions {
    /// Record file extension, without the leading dot
    pub extension: String,
    /// Abort on the first record that fails instead of skipping it
    pub strict: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            extension: DEFAULT_RECORD_EXTENSION.to_string(),
            strict: false,
        }
    }
}

/// A record that was skipped during loading
#[derive(Debug)]
pub struct LoadFailure {
    pub path: PathBuf,
    pub error: Error,
}

/// Snapshot of a corpus directory
#[derive(Debug, Default)]
pub struct Corpus {
    pub documents: Vec<Document>,
    pub failures: Vec<LoadFailure>,
}

impl Corpus {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn skipped(&self) -> usize {
        self.failures.len()
    }
}

fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

/// List eligible record files in `dir`, sorted by file name
fn eligible_files(dir: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let entries = fs::read_dir(dir).map_err(|e| Error::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| Error::io(dir, e))?;
        let path = entry.path();
        if !has_extension(&path, extension) {
            continue;
        }
        // Follows symlinks; directories and dangling links are skipped
        match fs::metadata(&path) {
            Ok(metadata) if metadata.is_file() => files.push(path),
            Ok(_) => continue,
            Err(e) => {
                tracing::debug!("Skipping unreadable entry {}: {}", path.display(), e);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Read and parse one record file, attaching its identifier
fn load_file(path: &Path) -> Result<Document> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| Error::NotFound(format!("non UTF-8 file name: {}", path.display())))?;
    let identifier = RecordId::from_file_name(file_name)?;

    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let mut doc = parse_record(&bytes).map_err(|e| Error::parse(path, e))?;
    doc.identifier = identifier;
    Ok(doc)
}

/// Load every eligible record in `dir`.
///
/// Fails as a whole only when the directory itself cannot be listed, or in
/// strict mode when any record fails.
pub fn load_corpus(dir: &Path, options: &LoadOptions) -> Result<Corpus> {
    let files = eligible_files(dir, &options.extension)?;

    let mut corpus = Corpus::default();
    let mut seen_keys = HashSet::new();

    for path in files {
        let result = load_file(&path).and_then(|doc| {
            if seen_keys.insert(doc.identifier.index_key()) {
                Ok(doc)
            } else {
                Err(Error::DuplicateIdentifier(doc.identifier.index_key()))
            }
        });

        match result {
            Ok(doc) => corpus.documents.push(doc),
            Err(error) if options.strict => return Err(error),
            Err(error) => {
                tracing::warn!("Skipping record {}: {}", path.display(), error);
                corpus.failures.push(LoadFailure { path, error });
            }
        }
    }

    tracing::debug!(
        "Loaded {} records from {} ({} skipped)",
        corpus.len(),
        dir.display(),
        corpus.skipped()
    );
    Ok(corpus)
}

/// Load a single record by file name.
///
/// Any name that does not resolve to a readable record file in `dir` is
/// reported as [`Error::NotFound`]; a file that exists but does not parse is
/// an [`Error::Parse`].
pub fn load_record(dir: &Path, file_name: &str, extension: &str) -> Result<Document> {
    let identifier = RecordId::from_file_name(file_name)?;
    let path = dir.join(identifier.as_str());

    if !has_extension(&path, extension) {
        return Err(Error::NotFound(file_name.to_string()));
    }

    let bytes = match fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::debug!("Record {} unreadable: {}", path.display(), e);
            return Err(Error::NotFound(file_name.to_string()));
        }
    };

    let mut doc = parse_record(&bytes).map_err(|e| Error::parse(&path, e))?;
    doc.identifier = identifier;
    Ok(doc)
}
