//! Integration tests for adr-browser
//!
//! These tests run the whole pipeline against corpora written to temporary
//! directories: loading, index building, fuzzy search and the HTTP server.

use adr_browser::RecordService;
use adr_browser::config::Config;
use adr_browser::corpus::{Corpus, LoadOptions, load_corpus};
use adr_browser::search::outputs::{HealthOutput, ListOutput, SearchOutput};
use adr_browser::search::{FuzzySearchOptions, FuzzySearcher, build_index};
use anyhow::Result;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const MARKDOWN_RECORD: &str = "---\nnumber: 1\ntitle: \"Use Markdown\"\ndate: 2021-05-03\nstatus: \"accepted\"\n---\nWe decided to use Markdown for records.\n";

fn write(dir: &Path, name: &str, content: &str) {
    fs::write(dir.join(name), content).unwrap();
}

/// Helper to create a corpus with a handful of records
fn create_test_corpus() -> TempDir {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path();
    write(dir, "0001-use-markdown.yaml", MARKDOWN_RECORD);
    write(
        dir,
        "0002-record-architecture-decisions.yaml",
        "---\nnumber: 2\ntitle: Record architecture decisions\ndate: 2021-05-04\nstatus: accepted\n---\nWe will keep a log of decisions in plain files.\n",
    );
    write(
        dir,
        "0003-choose-a-database.yaml",
        "---\nnumber: 3\ntitle: Choose a database\nstatus: proposed\n---\nPostgres and SQLite are the candidates. Decisions are pending.\n",
    );
    write(
        dir,
        "0004-deprecate-wiki.yaml",
        "+++\nnumber = 4\ntitle = \"Deprecate the wiki\"\nstatus = \"superseded\"\ndate = 2020-01-10\n+++\nThe wiki was replaced by decision records.\n",
    );
    write(dir, "README.md", "# Not a record\n");
    temp_dir
}

fn load(dir: &Path) -> Corpus {
    load_corpus(dir, &LoadOptions::default()).unwrap()
}

fn searcher_for(corpus: &Corpus) -> FuzzySearcher {
    let index = build_index(&corpus.documents).unwrap();
    FuzzySearcher::new(index, FuzzySearchOptions::default()).unwrap()
}

fn ranked_numbers(searcher: &FuzzySearcher, query: &str) -> (usize, Vec<i64>) {
    let outcome = searcher.search(query).unwrap();
    let numbers = outcome.hits.iter().map(|h| h.document.number).collect();
    (outcome.total, numbers)
}

#[test]
fn test_single_record_scenario() {
    let temp_dir = TempDir::new().unwrap();
    write(temp_dir.path(), "0001-use-markdown.yaml", MARKDOWN_RECORD);

    let corpus = load(temp_dir.path());
    assert_eq!(corpus.len(), 1);
    let doc = &corpus.documents[0];
    assert_eq!(doc.number, 1);
    assert_eq!(doc.title, "Use Markdown");
    assert_eq!(doc.status, "accepted");
    assert_eq!(doc.identifier.as_str(), "0001-use-markdown.yaml");

    let searcher = searcher_for(&corpus);

    let outcome = searcher.search("markdown").unwrap();
    assert_eq!(outcome.total, 1);
    let body = outcome.hits[0]
        .highlights
        .iter()
        .find(|h| h.field == "body")
        .expect("body highlight");
    assert!(body.fragment.contains("<b>Markdown</b>"));
    let text = "We decided to use Markdown for records.\n";
    assert_eq!(&text[body.spans[0].clone()], "Markdown");

    assert!(searcher.search("markdwon").unwrap().total >= 1);
    assert_eq!(searcher.search("nonexistentterm").unwrap().total, 0);
}

#[test]
fn test_identifiers_are_unique() {
    let temp_dir = create_test_corpus();
    let corpus = load(temp_dir.path());
    assert_eq!(corpus.len(), 4);

    let keys: HashSet<String> = corpus
        .documents
        .iter()
        .map(|d| d.identifier.index_key())
        .collect();
    assert_eq!(keys.len(), corpus.len());
}

#[test]
fn test_rebuild_is_idempotent() {
    let temp_dir = create_test_corpus();
    let first = searcher_for(&load(temp_dir.path()));
    let second = searcher_for(&load(temp_dir.path()));

    for query in ["decisions", "markdown", "databse", "wiki records", "accepted", ""] {
        assert_eq!(
            ranked_numbers(&first, query),
            ranked_numbers(&second, query),
            "query {query:?} differs between builds"
        );
    }
}

#[test]
fn test_one_substitution_in_title_term_still_matches() {
    let temp_dir = create_test_corpus();
    let searcher = searcher_for(&load(temp_dir.path()));

    for (query, number) in [
        ("Markdoqn", 1),
        ("archjtecture", 2),
        ("databasr", 3),
        ("deprecatx", 4),
    ] {
        let (_, numbers) = ranked_numbers(&searcher, query);
        assert!(numbers.contains(&number), "{query} should match record {number}");
    }
}

#[test]
fn test_one_substitution_in_one_letter_title_term() {
    let temp_dir = create_test_corpus();
    write(
        temp_dir.path(),
        "0005-plan-b.yaml",
        "---\nnumber: 5\ntitle: Plan B\nstatus: proposed\n---\nKeep a fallback.\n",
    );
    let searcher = searcher_for(&load(temp_dir.path()));

    // "c" is one substitution away from the "b" in "Plan B"
    let (_, numbers) = ranked_numbers(&searcher, "c");
    assert!(numbers.contains(&5));
}

#[test]
fn test_repeated_queries_are_deterministic() {
    let temp_dir = create_test_corpus();
    let searcher = searcher_for(&load(temp_dir.path()));

    // "decisions" hits several records, some with equal scores
    let expected = searcher.search("decisions").unwrap();
    assert!(expected.total >= 3);
    for _ in 0..20 {
        assert_eq!(searcher.search("decisions").unwrap(), expected);
    }
}

#[test]
fn test_search_projection_drops_identifier_and_date() {
    let temp_dir = create_test_corpus();
    let corpus = load(temp_dir.path());
    assert!(corpus.documents.iter().all(|d| !d.identifier.is_empty()));

    let searcher = searcher_for(&corpus);
    let outcome = searcher.search("wiki").unwrap();
    assert_eq!(outcome.total, 1);

    let doc = &outcome.hits[0].document;
    assert_eq!(doc.number, 4);
    assert_eq!(doc.title, "Deprecate the wiki");
    assert_eq!(doc.status, "superseded");
    assert!(doc.identifier.is_empty());
    assert!(doc.date.is_none());
    assert!(doc.body.is_empty());

    // The browse path still has both
    let original = corpus.documents.iter().find(|d| d.number == 4).unwrap();
    assert_eq!(original.identifier.as_str(), "0004-deprecate-wiki.yaml");
    assert!(original.date.is_some());
}

#[test]
fn test_empty_query_returns_no_hits() {
    let temp_dir = create_test_corpus();
    let searcher = searcher_for(&load(temp_dir.path()));
    let outcome = searcher.search("").unwrap();
    assert_eq!(outcome.total, 0);
    assert!(outcome.hits.is_empty());
}

#[test]
fn test_bad_records_do_not_block_the_rest() {
    let temp_dir = create_test_corpus();
    write(temp_dir.path(), "0005-broken.yaml", "---\nnumber: five\ntitle: Broken\nstatus: draft\n---\n");
    write(temp_dir.path(), "0006-no-header.yaml", "Just text.\n");

    let corpus = load(temp_dir.path());
    assert_eq!(corpus.len(), 4);
    assert_eq!(corpus.skipped(), 2);

    let strict = LoadOptions {
        strict: true,
        ..LoadOptions::default()
    };
    assert!(load_corpus(temp_dir.path(), &strict).is_err());
}

mod http {
    use super::*;
    use adr_browser::server::{AppState, serve};
    use tokio::sync::oneshot;

    struct TestServer {
        base_url: String,
        shutdown: Option<oneshot::Sender<()>>,
        handle: tokio::task::JoinHandle<anyhow::Result<()>>,
    }

    impl TestServer {
        async fn start(dir: &Path) -> Result<Self> {
            let mut config = Config::default();
            config.corpus.base_dir = dir.to_path_buf();
            let service = RecordService::build(config)?;

            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
            let base_url = format!("http://{}", listener.local_addr()?);
            let (tx, rx) = oneshot::channel::<()>();
            let handle = tokio::spawn(serve(listener, AppState::new(service), async move {
                let _ = rx.await;
            }));

            Ok(Self {
                base_url,
                shutdown: Some(tx),
                handle,
            })
        }

        fn url(&self, path: &str) -> String {
            format!("{}{}", self.base_url, path)
        }

        async fn stop(mut self) -> Result<()> {
            if let Some(tx) = self.shutdown.take() {
                let _ = tx.send(());
            }
            self.handle.await??;
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_http_endpoints() -> Result<()> {
        let temp_dir = create_test_corpus();
        let server = TestServer::start(temp_dir.path()).await?;
        let client = reqwest::Client::new();

        let list: ListOutput = client.get(server.url("/")).send().await?.json().await?;
        assert_eq!(list.records.len(), 4);
        assert_eq!(list.skipped, 0);
        assert_eq!(list.records[0].identifier.as_str(), "0001-use-markdown.yaml");

        let response = client.get(server.url("/0001-use-markdown.yaml")).send().await?;
        assert_eq!(response.status(), reqwest::StatusCode::OK);
        let doc: serde_json::Value = response.json().await?;
        assert_eq!(doc["title"], "Use Markdown");
        assert_eq!(doc["body"], "We decided to use Markdown for records.\n");

        let response = client.get(server.url("/9999-missing.yaml")).send().await?;
        assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
        let error: serde_json::Value = response.json().await?;
        assert_eq!(error["error"]["code"], "not_found");

        let results: SearchOutput = client
            .get(server.url("/search"))
            .query(&[("q", "markdwon")])
            .send()
            .await?
            .json()
            .await?;
        assert_eq!(results.query, "markdwon");
        assert_eq!(results.total, 1);
        assert_eq!(results.hits[0].document.number, 1);

        let results: SearchOutput = client.get(server.url("/search")).send().await?.json().await?;
        assert_eq!(results.total, 0);

        let long_query = "a".repeat(2000);
        let response = client
            .get(server.url("/search"))
            .query(&[("q", long_query.as_str())])
            .send()
            .await?;
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);

        let response = client.get(server.url("/favicon.ico")).send().await?;
        assert_eq!(response.status(), reqwest::StatusCode::NO_CONTENT);

        let health: HealthOutput = client.get(server.url("/health")).send().await?.json().await?;
        assert_eq!(health.status, "ok");
        assert_eq!(health.indexed, 4);

        server.stop().await
    }
}
