use anyhow::{Context, Result};

use crate::config::Config;
use crate::corpus::{Document, LoadOptions, RecordSummary, load_corpus, load_record};
use crate::error::Error;
use crate::search::outputs::{HealthOutput, ListOutput, SearchOutput};
use crate::search::{FuzzySearcher, build_index};

/// Owns the search index built at startup and answers browse and search
/// requests against it
///
/// Browsing reads the corpus directory afresh on every call; searching only
/// ever sees the snapshot the index was built from.
pub struct RecordService {
    config: Config,
    searcher: FuzzySearcher,
    skipped: usize,
}

impl RecordService {
    /// Load the corpus and build the search index
    pub fn build(config: Config) -> Result<Self> {
        config.validate()?;

        let base_dir = &config.corpus.base_dir;
        let corpus = load_corpus(base_dir, &config.load_options())
            .with_context(|| format!("Failed to load records from {}", base_dir.display()))?;
        if corpus.skipped() > 0 {
            tracing::warn!(
                "{} of {} record files were skipped; run `adr-browser check` for details",
                corpus.skipped(),
                corpus.len() + corpus.skipped()
            );
        }

        let index = build_index(&corpus.documents).context("Failed to build search index")?;
        let searcher = FuzzySearcher::new(index, config.search_options())?;

        Ok(Self {
            config,
            searcher,
            skipped: corpus.skipped(),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Summaries of every record currently in the corpus directory
    pub fn list(&self) -> Result<ListOutput, Error> {
        let options = LoadOptions {
            strict: false,
            ..self.config.load_options()
        };
        let corpus = load_corpus(&self.config.corpus.base_dir, &options)?;

        Ok(ListOutput {
            records: corpus.documents.iter().map(RecordSummary::from).collect(),
            skipped: corpus.skipped(),
        })
    }

    /// One record, read fresh from disk
    pub fn detail(&self, item: &str) -> Result<Document, Error> {
        load_record(&self.config.corpus.base_dir, item, &self.config.corpus.extension)
    }

    pub fn search(&self, query: &str) -> Result<SearchOutput, Error> {
        let outcome = self.searcher.search(query)?;
        Ok(SearchOutput::new(query, outcome))
    }

    pub fn health(&self) -> HealthOutput {
        HealthOutput {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            indexed: self.searcher.index().num_docs(),
            skipped: self.skipped,
        }
    }
}
