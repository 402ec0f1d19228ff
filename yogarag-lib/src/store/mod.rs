//! Corpus storage backends
//!
//! The retriever only needs a full scan over the corpus. Stores hand entries
//! out lazily and in a stable order so ranking ties resolve the same way on
//! every query.
//!
//! # Storage Model
//!
//! Each stored entry consists of:
//! - Title and source: where the passage came from
//! - Content: the passage text
//! - Embedding: the passage vector, computed at ingestion time
//!
//! # Usage
//!
//! ```ignore
//! use yogarag_lib::store::{CorpusStore, JsonlStore};
//!
//! let mut store = JsonlStore::new("corpus.jsonl");
//! store.insert(entries)?;
//!
//! for entry in store.scan()? {
//!     let entry = entry?;
//!     println!("{} ({} dims)", entry.title, entry.embedding.len());
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::embed::Embedding;
use crate::Result;

/// A pre-chunked passage waiting to be embedded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Passage {
    /// Human readable title, e.g. the pose name or "manual - page 4"
    pub title: String,
    /// Origin document identifier
    pub source: String,
    /// Passage text
    pub content: String,
}

/// A stored passage together with its embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub title: String,
    pub source: String,
    pub content: String,
    pub embedding: Embedding,
}

impl CorpusEntry {
    /// Attach an embedding to a passage.
    #[must_use]
    pub fn new(passage: Passage, embedding: Embedding) -> Self {
        Self {
            title: passage.title,
            source: passage.source,
            content: passage.content,
            embedding,
        }
    }
}

/// A passage that passed retrieval, with its similarity to the query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub title: String,
    pub source: String,
    pub content: String,
    /// Similarity score (higher is more similar)
    /// For cosine similarity: -1.0 to 1.0
    pub score: f32,
}

impl ScoredResult {
    /// Score a corpus entry, dropping its embedding.
    #[must_use]
    pub fn new(entry: CorpusEntry, score: f32) -> Self {
        Self {
            title: entry.title,
            source: entry.source,
            content: entry.content,
            score,
        }
    }

    /// Citation label in the form "title – source".
    #[must_use]
    pub fn citation(&self) -> String {
        format!("{} – {}", self.title, self.source)
    }
}

/// Lazy sequence of corpus entries. A bad record is yielded as an error so
/// the consumer can skip it and keep scanning.
pub type EntryIter<'a> = Box<dyn Iterator<Item = Result<CorpusEntry>> + 'a>;

/// Trait for corpus storage backends
pub trait CorpusStore: Send + Sync {
    /// Append entries to the corpus
    fn insert(&mut self, entries: Vec<CorpusEntry>) -> Result<()>;

    /// Scan every entry in insertion order
    ///
    /// Fails only when the store as a whole cannot be read.
    fn scan(&self) -> Result<EntryIter<'_>>;

    /// Get total number of stored entries
    fn len(&self) -> Result<usize>;

    /// Check if store is empty
    fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Remove all stored entries
    fn clear(&mut self) -> Result<()>;
}

mod jsonl;
mod memory;

pub use jsonl::*;
pub use memory::*;
