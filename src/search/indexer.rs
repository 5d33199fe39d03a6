use tantivy::{
    Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument, Term,
    schema::{Field, STORED, STRING, Schema, TEXT},
};

use crate::corpus::Document;
use crate::error::{Error, Result};
use crate::search::config::{WRITER_BUFFER_SIZE, WRITER_THREADS};

/// Field handles of the record index schema
#[derive(Debug, Clone, Copy)]
pub struct IndexFields {
    /// Lowercased file name, the primary key
    pub id: Field,
    pub number: Field,
    /// `number` rendered as text so free-text queries can hit it
    pub number_text: Field,
    pub title: Field,
    pub status: Field,
    pub body: Field,
}

fn build_schema() -> (Schema, IndexFields) {
    let mut schema_builder = Schema::builder();

    let id = schema_builder.add_text_field("id", STRING | STORED);
    // Searched through `number_text`; stored for projection only
    let number = schema_builder.add_i64_field("number", STORED);
    let number_text = schema_builder.add_text_field("number_text", TEXT);
    let title = schema_builder.add_text_field("title", TEXT | STORED);
    let status = schema_builder.add_text_field("status", TEXT | STORED);
    let body = schema_builder.add_text_field("body", TEXT | STORED);

    let fields = IndexFields {
        id,
        number,
        number_text,
        title,
        status,
        body,
    };
    (schema_builder.build(), fields)
}

/// Builds the in-memory record index in a single pass
pub struct RecordIndexer {
    index: Index,
    fields: IndexFields,
    writer: IndexWriter,
    indexed: usize,
}

impl RecordIndexer {
    /// Create an empty in-memory index and its writer
    pub fn new() -> Result<Self> {
        let (schema, fields) = build_schema();
        let index = Index::create_in_ram(schema);
        let writer = index.writer_with_num_threads(WRITER_THREADS, WRITER_BUFFER_SIZE)?;

        Ok(Self {
            index,
            fields,
            writer,
            indexed: 0,
        })
    }

    /// Add a record, replacing any earlier record with the same index key
    pub fn add_document(&mut self, doc: &Document) -> Result<()> {
        let key = doc.identifier.index_key();
        self.writer
            .delete_term(Term::from_field_text(self.fields.id, &key));

        let tantivy_doc = self.create_tantivy_document(&key, doc);
        self.writer
            .add_document(tantivy_doc)
            .map_err(|source| Error::IndexBuild {
                identifier: doc.identifier.to_string(),
                source,
            })?;
        self.indexed += 1;
        Ok(())
    }

    fn create_tantivy_document(&self, key: &str, doc: &Document) -> TantivyDocument {
        let mut tantivy_doc = TantivyDocument::default();
        tantivy_doc.add_text(self.fields.id, key);
        tantivy_doc.add_i64(self.fields.number, doc.number);
        tantivy_doc.add_text(self.fields.number_text, doc.number.to_string());
        tantivy_doc.add_text(self.fields.title, &doc.title);
        tantivy_doc.add_text(self.fields.status, &doc.status);
        tantivy_doc.add_text(self.fields.body, &doc.body);
        tantivy_doc
    }

    /// Commit everything added so far and hand over a read-only index
    pub fn finish(mut self) -> Result<RecordIndex> {
        self.writer.commit()?;
        self.writer.wait_merging_threads()?;

        let reader = self
            .index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()?;

        tracing::debug!("Committed {} records to the search index", self.indexed);
        Ok(RecordIndex {
            index: self.index,
            reader,
            fields: self.fields,
        })
    }
}

/// Committed, read-only record index
///
/// Nothing writes to it after [`RecordIndexer::finish`], so it can be shared
/// between concurrent searches without locking.
#[derive(Clone)]
pub struct RecordIndex {
    index: Index,
    reader: IndexReader,
    fields: IndexFields,
}

impl RecordIndex {
    pub fn index(&self) -> &Index {
        &self.index
    }

    pub fn reader(&self) -> &IndexReader {
        &self.reader
    }

    pub fn fields(&self) -> &IndexFields {
        &self.fields
    }

    pub fn schema(&self) -> Schema {
        self.index.schema()
    }

    /// Number of live documents in the index
    pub fn num_docs(&self) -> u64 {
        self.reader.searcher().num_docs()
    }
}

/// Build the search index for a set of records.
///
/// The first record the index rejects aborts the build.
pub fn build_index(documents: &[Document]) -> Result<RecordIndex> {
    tracing::info!("Building search index...");

    let mut indexer = RecordIndexer::new()?;
    for doc in documents {
        indexer.add_document(doc)?;
    }
    let index = indexer.finish()?;

    tracing::info!("Search index built from {} documents.", index.num_docs());
    Ok(index)
}
