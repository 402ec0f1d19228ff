//! Grounded answer composition
//!
//! Ties the safety screen, the retriever and an optional text generator
//! together into the response shown to the user.
//!
//! # Usage
//!
//! ```ignore
//! use yogarag_lib::answer::Assistant;
//!
//! // Extractive answers (no generator)
//! let assistant = Assistant::new(retriever, SafetyScreen::default(), 4);
//!
//! // Answers written by a language model
//! let assistant = Assistant::with_generator(retriever, SafetyScreen::default(), 4, llm);
//!
//! let answer = assistant.ask("how long should I hold shavasana?")?;
//! ```

use serde::{Deserialize, Serialize};

use crate::embed::Embedder;
use crate::retrieve::Retriever;
use crate::safety::SafetyScreen;
use crate::store::{CorpusStore, ScoredResult};
use crate::{Error, Result};

pub const UNSAFE_ANSWER: &str = "Your question touches on an area that can be risky without \
personalized guidance. Please consult a doctor or certified yoga therapist before attempting \
any practices.";

pub const NO_CONTEXT_ANSWER: &str = "I do not have enough information to answer this question.";

pub const UNSAFE_WARNING: &str = "Consult a professional";

/// Writes an answer from retrieved passages, typically by calling a language model.
///
/// Only called with at least one passage.
pub trait Generator {
    fn generate(&self, query: &str, contexts: &[ScoredResult]) -> Result<String>;
}

/// Placeholder generator type for assistants that answer extractively.
pub struct NoGenerator;

impl Generator for NoGenerator {
    fn generate(&self, _query: &str, _contexts: &[ScoredResult]) -> Result<String> {
        Err(Error::Generation("no generator configured".to_string()))
    }
}

/// Response to a user question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub answer: String,
    /// "title – source" for every retrieved passage
    pub sources: Vec<String>,
    pub is_unsafe: bool,
    /// Empty unless the question was flagged by the safety screen
    pub warning: String,
}

/// Answers questions from the corpus.
pub struct Assistant<E: Embedder, S: CorpusStore, G: Generator = NoGenerator> {
    retriever: Retriever<E, S>,
    safety: SafetyScreen,
    top_k: usize,
    generator: Option<G>,
}

// Constructor for extractive assistants
impl<E: Embedder, S: CorpusStore> Assistant<E, S, NoGenerator> {
    /// Create an assistant that answers with the retrieved passages themselves.
    #[must_use]
    pub fn new(retriever: Retriever<E, S>, safety: SafetyScreen, top_k: usize) -> Self {
        Self {
            retriever,
            safety,
            top_k,
            generator: None,
        }
    }
}

impl<E: Embedder, S: CorpusStore, G: Generator> Assistant<E, S, G> {
    /// Create an assistant that hands retrieved passages to a generator.
    #[must_use]
    pub fn with_generator(
        retriever: Retriever<E, S>,
        safety: SafetyScreen,
        top_k: usize,
        generator: G,
    ) -> Self {
        Self {
            retriever,
            safety,
            top_k,
            generator: Some(generator),
        }
    }

    /// Answer a question.
    ///
    /// Passages are retrieved even for flagged questions so the response
    /// still lists relevant sources.
    pub fn ask(&self, query: &str) -> Result<Answer> {
        let query = query.trim();
        let is_unsafe = self.safety.is_unsafe(query);
        let contexts = self.retriever.retrieve(query, self.top_k)?;
        let sources = contexts.iter().map(ScoredResult::citation).collect();

        let answer = if is_unsafe {
            UNSAFE_ANSWER.to_string()
        } else if contexts.is_empty() {
            NO_CONTEXT_ANSWER.to_string()
        } else {
            match &self.generator {
                Some(generator) => generator.generate(query, &contexts)?.trim().to_string(),
                None => extractive_answer(&contexts),
            }
        };

        tracing::info!(
            is_unsafe,
            passages = contexts.len(),
            generated = self.generator.is_some(),
            "answered question"
        );

        Ok(Answer {
            answer,
            sources,
            is_unsafe,
            warning: if is_unsafe {
                UNSAFE_WARNING.to_string()
            } else {
                String::new()
            },
        })
    }

    /// Returns a reference to the retriever.
    #[must_use]
    pub fn retriever(&self) -> &Retriever<E, S> {
        &self.retriever
    }
}

fn extractive_answer(contexts: &[ScoredResult]) -> String {
    contexts
        .iter()
        .map(|c| c.content.trim())
        .filter(|c| !c.is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}
