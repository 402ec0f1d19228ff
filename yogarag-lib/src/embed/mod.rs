//! Text embedding using local models
//!
//! The default model is sentence-transformers/all-MiniLM-L6-v2 via the
//! fastembed crate (ONNX runtime), matching the model the corpus is embedded
//! with at ingestion time.
//!
//! # Model Details
//!
//! - Dimensions: 384
//! - Max tokens: 256
//! - Output: L2-normalized, so cosine similarity reduces to a dot product
//!
//! # Usage
//!
//! ```ignore
//! use yogarag_lib::embed::{Embedder, LocalEmbedder, ModelChoice};
//!
//! let embedder = LocalEmbedder::new(ModelChoice::AllMiniLmL6V2)?;
//!
//! // Embed passages (for indexing)
//! let doc_embeddings = embedder.embed_documents(&["Sit on your heels...", "Lie flat..."])?;
//!
//! // Embed query (for retrieval)
//! let query_embedding = embedder.embed_query("how long should I hold shavasana")?;
//! ```

use crate::similarity::normalize;
use crate::{Error, Result};

/// A vector embedding - fixed size array of floats
pub type Embedding = Vec<f32>;

/// Trait for text embedding models
///
/// Implementations must be deterministic for identical input and return
/// vectors of exactly [`dimension`](Embedder::dimension) floats.
pub trait Embedder: Send + Sync {
    /// Embed multiple passages for indexing
    fn embed_documents(&self, texts: &[&str]) -> Result<Vec<Embedding>>;

    /// Embed a single query for retrieval
    ///
    /// Note: Some models (like BGE) use different prompts for queries vs documents.
    /// This method handles that distinction.
    fn embed_query(&self, text: &str) -> Result<Embedding>;

    /// Returns the embedding dimension
    fn dimension(&self) -> usize;

    /// Returns the model name/identifier
    fn model_name(&self) -> &str;
}

/// Check a raw model output against the expected dimension and scale it to unit length.
pub fn finish_embedding(mut embedding: Embedding, dimension: usize) -> Result<Embedding> {
    if embedding.len() != dimension {
        return Err(Error::DimensionMismatch {
            expected: dimension,
            actual: embedding.len(),
        });
    }
    normalize(&mut embedding)?;
    Ok(embedding)
}

mod local;
pub use local::*;
