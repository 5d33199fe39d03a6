use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tantivy::{
    Document as _, Searcher, TantivyDocument, TantivyError, Term,
    collector::{Count, TopDocs},
    query::{BooleanQuery, BoostQuery, FuzzyTermQuery, Occur, Query, TermQuery},
    schema::{Field, IndexRecordOption, Schema, Value},
    tokenizer::{TextAnalyzer, TokenStream},
};

use crate::corpus::Document;
use crate::error::{Error, Result};
use crate::search::config::{
    DEFAULT_FUZZY_DISTANCE, DEFAULT_TITLE_BOOST, MAX_FUZZY_DISTANCE, MAX_QUERY_LENGTH,
};
use crate::search::highlight::{FieldHighlight, QueryTerm, highlight_field, within_distance};
use crate::search::indexer::RecordIndex;
use crate::search::projector::project_hit;

/// Tuning knobs for fuzzy queries
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FuzzySearchOptions {
    /// Edit distance for fuzzy matching (0-2)
    pub fuzzy_distance: u8,
    /// Score multiplier for matches in the title
    pub title_boost: f32,
}

impl Default for FuzzySearchOptions {
    fn default() -> Self {
        Self {
            fuzzy_distance: DEFAULT_FUZZY_DISTANCE,
            title_boost: DEFAULT_TITLE_BOOST,
        }
    }
}

/// One ranked search hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Relevance score
    pub score: f32,
    /// Document reconstructed from the stored fields of the hit
    pub document: Document,
    /// Highlighted matches per field, in title, status, body, number order
    pub highlights: Vec<FieldHighlight>,
}

/// Result of a search: the number of matching records and every hit
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchOutcome {
    pub total: usize,
    pub hits: Vec<SearchHit>,
}

/// Fuzzy search over a committed [`RecordIndex`]
///
/// Holds no mutable state; `search` can be called from many threads at once.
pub struct FuzzySearcher {
    index: RecordIndex,
    schema: Schema,
    analyzer: TextAnalyzer,
    options: FuzzySearchOptions,
}

impl FuzzySearcher {
    /// Create a searcher over `index`
    pub fn new(index: RecordIndex, options: FuzzySearchOptions) -> Result<Self> {
        if options.fuzzy_distance > MAX_FUZZY_DISTANCE {
            return Err(Error::Query(format!(
                "fuzzy distance must be between 0 and {}",
                MAX_FUZZY_DISTANCE
            )));
        }

        // Queries are analyzed the way the body was, so both sides agree on
        // token boundaries and case
        let analyzer = index.index().tokenizer_for_field(index.fields().body)?;
        let schema = index.schema();

        Ok(Self {
            index,
            schema,
            analyzer,
            options,
        })
    }

    pub fn index(&self) -> &RecordIndex {
        &self.index
    }

    /// Split a query string into distinct normalized terms
    pub fn query_terms(&self, query: &str) -> Vec<QueryTerm> {
        let mut analyzer = self.analyzer.clone();
        let mut stream = analyzer.token_stream(query);

        let mut terms: Vec<QueryTerm> = Vec::new();
        while stream.advance() {
            let text = &stream.token().text;
            if !terms.iter().any(|term| &term.text == text) {
                terms.push(QueryTerm::new(text.clone(), self.options.fuzzy_distance));
            }
        }
        terms
    }

    /// Every term is matched fuzzily against every searchable field and the
    /// clauses are OR-ed together.
    ///
    /// A fuzzy term query only says whether a field matched, with a constant
    /// score. Next to it, each dictionary term within reach of the query term
    /// gets a BM25 scored term query, so records that use the term more often
    /// rank higher.
    fn build_query(&self, searcher: &Searcher, terms: &[QueryTerm]) -> Result<Box<dyn Query>> {
        let fields = self.index.fields();
        let weighted_fields = [
            (fields.title, self.options.title_boost, false),
            (fields.status, 1.0, false),
            (fields.body, 1.0, false),
            (fields.number_text, 1.0, true),
        ];

        let mut clauses: Vec<(Occur, Box<dyn Query>)> = Vec::new();
        for term in terms {
            for (field, boost, numeric) in weighted_fields {
                let term = if numeric { term.numeric() } else { term.clone() };

                let fuzzy_query: Box<dyn Query> = Box::new(FuzzyTermQuery::new(
                    Term::from_field_text(field, &term.text),
                    term.distance,
                    true, // transpose_cost_one
                ));
                clauses.push((Occur::Should, boosted(fuzzy_query, boost)));

                for matched in expand_term(searcher, field, &term)? {
                    let term_query: Box<dyn Query> = Box::new(TermQuery::new(
                        Term::from_field_text(field, &matched),
                        IndexRecordOption::WithFreqs,
                    ));
                    clauses.push((Occur::Should, boosted(term_query, boost)));
                }
            }
        }

        Ok(Box::new(BooleanQuery::new(clauses)))
    }

    /// Run a fuzzy query and return every hit.
    ///
    /// Hits are ordered by score, ties broken by the record's index key. An
    /// empty query (or one with no searchable terms) matches nothing.
    pub fn search(&self, query: &str) -> Result<SearchOutcome> {
        if query.chars().count() > MAX_QUERY_LENGTH {
            return Err(Error::Query(format!(
                "query must not exceed {} characters",
                MAX_QUERY_LENGTH
            )));
        }

        let terms = self.query_terms(query);
        if terms.is_empty() {
            return Ok(SearchOutcome::default());
        }

        let searcher = self.index.reader().searcher();
        let search_query = self.build_query(&searcher, &terms)?;

        // No pagination: collect every match
        let limit = usize::try_from(searcher.num_docs()).unwrap_or(usize::MAX).max(1);
        let (total, top_docs) =
            searcher.search(&*search_query, &(Count, TopDocs::with_limit(limit)))?;

        let id_field = self.index.fields().id;
        let mut ranked = Vec::with_capacity(top_docs.len());
        for (score, doc_address) in top_docs {
            let doc: TantivyDocument = searcher.doc(doc_address)?;
            let key = text_value(&doc, id_field).unwrap_or_default().to_string();
            ranked.push((score, key, doc));
        }
        ranked.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(&b.1)));

        let mut analyzer = self.analyzer.clone();
        let mut hits = Vec::with_capacity(ranked.len());
        for (score, _, doc) in ranked {
            let document = project_hit(&doc.to_named_doc(&self.schema))?;
            let highlights = self.highlights(&mut analyzer, &doc, &terms);
            hits.push(SearchHit {
                score,
                document,
                highlights,
            });
        }

        tracing::debug!("Query {:?} matched {} records", query, total);
        Ok(SearchOutcome { total, hits })
    }

    fn highlights(
        &self,
        analyzer: &mut TextAnalyzer,
        doc: &TantivyDocument,
        terms: &[QueryTerm],
    ) -> Vec<FieldHighlight> {
        let fields = self.index.fields();
        let mut highlights: Vec<FieldHighlight> = [
            ("title", fields.title),
            ("status", fields.status),
            ("body", fields.body),
        ]
        .into_iter()
        .filter_map(|(name, field)| {
            let text = text_value(doc, field)?;
            highlight_field(analyzer, name, text, terms)
        })
        .collect();

        if let Some(number) = doc.get_first(fields.number).and_then(|value| value.as_i64()) {
            let numeric_terms: Vec<QueryTerm> = terms.iter().map(QueryTerm::numeric).collect();
            if let Some(highlight) =
                highlight_field(analyzer, "number", &number.to_string(), &numeric_terms)
            {
                highlights.push(highlight);
            }
        }
        highlights
    }
}

fn boosted(query: Box<dyn Query>, boost: f32) -> Box<dyn Query> {
    if boost == 1.0 {
        query
    } else {
        Box::new(BoostQuery::new(query, boost))
    }
}

/// Indexed terms of `field` within the edit distance of `term`, in
/// dictionary order
fn expand_term(searcher: &Searcher, field: Field, term: &QueryTerm) -> Result<BTreeSet<String>> {
    let mut matched = BTreeSet::new();
    for segment_reader in searcher.segment_readers() {
        let inverted_index = segment_reader
            .inverted_index(field)
            .map_err(TantivyError::from)?;
        let mut stream = inverted_index.terms().stream().map_err(TantivyError::from)?;
        while stream.advance() {
            let Ok(text) = std::str::from_utf8(stream.key()) else {
                continue;
            };
            if within_distance(&term.text, text, term.distance as usize) {
                matched.insert(text.to_string());
            }
        }
    }
    Ok(matched)
}

fn text_value(doc: &TantivyDocument, field: Field) -> Option<&str> {
    doc.get_first(field).and_then(|value| value.as_str())
}
