use std::fmt;
use std::str::FromStr;
use std::sync::Mutex;

use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
use serde::{Deserialize, Serialize};

use crate::embed::{finish_embedding, Embedder, Embedding};
use crate::{Error, Result};

/// Embedding models the retriever knows how to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelChoice {
    #[default]
    #[serde(rename = "all-MiniLM-L6-v2")]
    AllMiniLmL6V2,
    #[serde(rename = "bge-small-en-v1.5")]
    BgeSmallEnV15,
    #[serde(rename = "bge-large-en-v1.5")]
    BgeLargeEnV15,
}

impl ModelChoice {
    const ALL: [ModelChoice; 3] = [
        ModelChoice::AllMiniLmL6V2,
        ModelChoice::BgeSmallEnV15,
        ModelChoice::BgeLargeEnV15,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            ModelChoice::AllMiniLmL6V2 => "all-MiniLM-L6-v2",
            ModelChoice::BgeSmallEnV15 => "bge-small-en-v1.5",
            ModelChoice::BgeLargeEnV15 => "bge-large-en-v1.5",
        }
    }

    #[must_use]
    pub fn dimension(self) -> usize {
        match self {
            ModelChoice::AllMiniLmL6V2 | ModelChoice::BgeSmallEnV15 => 384,
            ModelChoice::BgeLargeEnV15 => 1024,
        }
    }

    /// BGE models expect queries to carry an instruction prefix
    #[must_use]
    pub fn query_prefix(self) -> Option<&'static str> {
        match self {
            ModelChoice::AllMiniLmL6V2 => None,
            ModelChoice::BgeSmallEnV15 | ModelChoice::BgeLargeEnV15 => {
                Some("Represent this sentence for searching relevant passages: ")
            }
        }
    }

    fn fastembed_model(self) -> EmbeddingModel {
        match self {
            ModelChoice::AllMiniLmL6V2 => EmbeddingModel::AllMiniLML6V2,
            ModelChoice::BgeSmallEnV15 => EmbeddingModel::BGESmallENV15,
            ModelChoice::BgeLargeEnV15 => EmbeddingModel::BGELargeENV15,
        }
    }
}

impl fmt::Display for ModelChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ModelChoice {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|m| m.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::InvalidInput(format!("unknown embedding model: {s}")))
    }
}

/// Local ONNX embedder backed by fastembed.
///
/// The model sits behind a mutex so a single instance can serve concurrent
/// queries through `&self`.
pub struct LocalEmbedder {
    model: Mutex<TextEmbedding>,
    choice: ModelChoice,
}

impl fmt::Debug for LocalEmbedder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalEmbedder")
            .field("model", &self.choice.name())
            .field("dimension", &self.choice.dimension())
            .finish()
    }
}

impl LocalEmbedder {
    /// Load an embedding model.
    ///
    /// Downloads the model on first use.
    pub fn new(choice: ModelChoice) -> Result<Self> {
        let opts = InitOptions::new(choice.fastembed_model()).with_show_download_progress(true);

        let model = TextEmbedding::try_new(opts).map_err(|e| Error::Embedding(e.to_string()))?;
        tracing::info!(model = choice.name(), dimension = choice.dimension(), "loaded embedding model");

        Ok(Self {
            model: Mutex::new(model),
            choice,
        })
    }

    fn embed_raw(&self, texts: Vec<String>) -> Result<Vec<Embedding>> {
        let mut model = self
            .model
            .lock()
            .map_err(|_| Error::Embedding("embedding model lock poisoned".to_string()))?;

        model
            .embed(texts, None)
            .map_err(|e| Error::Embedding(e.to_string()))
    }
}

impl Embedder for LocalEmbedder {
    fn model_name(&self) -> &str {
        self.choice.name()
    }

    fn dimension(&self) -> usize {
        self.choice.dimension()
    }

    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>> {
        let texts = texts.iter().map(|t| (*t).to_string()).collect();

        self.embed_raw(texts)?
            .into_iter()
            .map(|e| finish_embedding(e, self.dimension()))
            .collect()
    }

    fn embed_query(&self, text: &str) -> Result<Embedding> {
        let query_text = match self.choice.query_prefix() {
            Some(prefix) => format!("{prefix}{text}"),
            None => text.to_string(),
        };

        let embedding = self
            .embed_raw(vec![query_text])?
            .into_iter()
            .next()
            .ok_or_else(|| Error::Embedding("model returned no embeddings".to_string()))?;

        finish_embedding(embedding, self.dimension())
    }
}
