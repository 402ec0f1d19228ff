//! Layered configuration
//!
//! Settings are resolved from, in increasing priority:
//! - Built-in defaults
//! - A TOML file (`yogarag.toml` in the working directory, or an explicit path)
//! - Environment variables
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `YOGARAG_` and use double
//! underscores to separate nested levels:
//! - `YOGARAG_RETRIEVAL__TOP_K=6` sets `retrieval.top_k`
//! - `YOGARAG_RETRIEVAL__METRIC=dot` sets `retrieval.metric`
//! - `YOGARAG_RETRIEVAL__THRESHOLD__LONG_QUERY_MIN_SCORE=0.7` sets
//!   `retrieval.threshold.long_query_min_score`
//! - `YOGARAG_CORPUS__PATH=/data/corpus.jsonl` sets `corpus.path`
//!
//! Pose tables merge with the built-in one, so a config file only needs to
//! list additional poses. Pose names are case-insensitive: a `Vajrasana`
//! entry adds its variants to the built-in `vajrasana` one.

use std::path::{Path, PathBuf};

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::disambiguate::PoseSynonyms;
use crate::embed::ModelChoice;
use crate::safety::SafetyScreen;
use crate::similarity::Metric;
use crate::threshold::ThresholdPolicy;
use crate::{Error, Result};

/// Config file looked up in the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "yogarag.toml";

const ENV_PREFIX: &str = "YOGARAG_";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub disambiguation: DisambiguationConfig,

    #[serde(default)]
    pub safety: SafetyScreen,

    #[serde(default)]
    pub corpus: CorpusConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// Model used for both ingestion and queries
    #[serde(default)]
    pub model: ModelChoice,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Passages handed to answer composition
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default)]
    pub metric: Metric,

    #[serde(default)]
    pub threshold: ThresholdPolicy,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            metric: Metric::default(),
            threshold: ThresholdPolicy::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DisambiguationConfig {
    #[serde(default)]
    pub poses: PoseSynonyms,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusConfig {
    /// JSONL file holding the embedded corpus
    #[serde(default = "default_corpus_path")]
    pub path: PathBuf,
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            path: default_corpus_path(),
        }
    }
}

fn default_top_k() -> usize {
    4
}

fn default_corpus_path() -> PathBuf {
    PathBuf::from("corpus.jsonl")
}

impl Settings {
    /// Load configuration from all sources.
    ///
    /// With `path` set the file must exist; otherwise [`DEFAULT_CONFIG_FILE`]
    /// is used if present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config_path = match path {
            Some(path) if !path.is_file() => {
                return Err(Error::Config(format!(
                    "config file not found: {}",
                    path.display()
                )));
            }
            Some(path) => path.to_path_buf(),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Settings::default()))
                .merge(Toml::file(config_path))
                .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                    key.as_str()
                        .to_lowercase()
                        .replace("__", ".")
                        .into()
                })),
        )
    }

    fn from_figment(figment: Figment) -> Result<Self> {
        let settings: Settings = figment
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        settings.validate()?;

        tracing::debug!(?settings, "loaded settings");
        Ok(settings)
    }

    /// Reject values the retriever cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be at least 1".to_string()));
        }
        self.retrieval.threshold.validate()
    }
}
