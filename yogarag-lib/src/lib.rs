//! YogaRAG - retrieval library for grounded yoga question answering
//!
//! # Architecture
//!
//! ```text
//! Passages -> Embedder -> Store
//!                           |
//! Query -> Embedder -> Retriever (score, threshold, rank, pose filter)
//!                           |
//!            Safety -> Assistant -> Generator
//!                           |
//!                        Answer
//! ```
//!
//! # Example
//!
//! ```ignore
//! use yogarag_lib::{
//!     answer::Assistant, config::Settings, embed::LocalEmbedder, retrieve::Retriever,
//!     store::JsonlStore,
//! };
//!
//! let settings = Settings::load(None)?;
//! let embedder = LocalEmbedder::new(settings.embedding.model)?;
//! let store = JsonlStore::new(&settings.corpus.path);
//!
//! let retriever = Retriever::new(embedder, store)
//!     .with_metric(settings.retrieval.metric)
//!     .with_threshold(settings.retrieval.threshold)
//!     .with_poses(settings.disambiguation.poses);
//!
//! // Ranked passages
//! let passages = retriever.retrieve("how to relax in corpse pose", 4)?;
//!
//! // Full answer with safety screening
//! let assistant = Assistant::new(retriever, settings.safety, settings.retrieval.top_k);
//! let answer = assistant.ask("how to relax in corpse pose")?;
//! ```

pub mod answer;
pub mod config;
pub mod disambiguate;
pub mod embed;
pub mod error;
pub mod retrieve;
pub mod safety;
pub mod similarity;
pub mod store;
pub mod threshold;

#[cfg(test)]
mod testing;

pub use error::{Error, Result};
