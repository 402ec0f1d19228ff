//! Deterministic fixtures shared by unit tests

use std::collections::HashMap;

use crate::embed::{Embedder, Embedding};
use crate::store::CorpusEntry;
use crate::{Error, Result};

/// Embedder that returns pre-assigned vectors for known texts.
pub struct LookupEmbedder {
    vectors: HashMap<String, Embedding>,
    dimension: usize,
}

impl LookupEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self {
            vectors: HashMap::new(),
            dimension,
        }
    }

    pub fn with(mut self, text: &str, vector: Embedding) -> Self {
        self.vectors.insert(text.to_string(), vector);
        self
    }

    fn lookup(&self, text: &str) -> Result<Embedding> {
        self.vectors
            .get(text)
            .cloned()
            .ok_or_else(|| Error::Embedding(format!("no vector for {text:?}")))
    }
}

impl Embedder for LookupEmbedder {
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        texts.iter().map(|t| self.lookup(t)).collect()
    }

    fn embed_query(&self, text: &str) -> Result<Embedding> {
        self.lookup(text)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    fn model_name(&self) -> &str {
        "lookup"
    }
}

/// Unit vector in the plane whose cosine with `[1, 0]` is `score`.
pub fn at_score(score: f32) -> Embedding {
    vec![score, (1.0 - score * score).sqrt()]
}

pub fn entry(title: &str, content: &str, embedding: Embedding) -> CorpusEntry {
    CorpusEntry {
        title: title.to_string(),
        source: "asanas.json".to_string(),
        content: content.to_string(),
        embedding,
    }
}
