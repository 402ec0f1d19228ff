//! Adaptive score threshold
//!
//! Short keyword queries ("vajrasana benefits") embed to sharp vectors but
//! rarely reach high similarity, so they get a looser bar. Longer natural
//! language questions produce more diffuse embeddings and need a tighter one
//! to keep loosely related passages out.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Picks the minimum acceptance score for a query based on its length.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdPolicy {
    /// Queries with at most this many whitespace-separated tokens count as short
    pub short_query_max_tokens: usize,
    /// Minimum score for short queries
    pub short_query_min_score: f32,
    /// Minimum score for longer queries
    pub long_query_min_score: f32,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            short_query_max_tokens: 5,
            short_query_min_score: 0.60,
            long_query_min_score: 0.75,
        }
    }
}

impl ThresholdPolicy {
    /// Minimum similarity a passage must reach to be kept for `query`.
    #[must_use]
    pub fn min_score(&self, query: &str) -> f32 {
        if query.split_whitespace().count() <= self.short_query_max_tokens {
            self.short_query_min_score
        } else {
            self.long_query_min_score
        }
    }

    /// Check that both cutoffs are valid similarity scores.
    pub fn validate(&self) -> Result<()> {
        for (name, score) in [
            ("short_query_min_score", self.short_query_min_score),
            ("long_query_min_score", self.long_query_min_score),
        ] {
            if !(-1.0..=1.0).contains(&score) {
                return Err(Error::Config(format!(
                    "{name} must be within [-1, 1], got {score}"
                )));
            }
        }
        Ok(())
    }
}
