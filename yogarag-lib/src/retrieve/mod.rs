//! Query-time retrieval
//!
//! Combines an embedder and a corpus store into a ranked passage lookup.
//!
//! # Pipeline
//!
//! ```text
//! query -> trim -> embed -> normalize
//!                              |
//! corpus scan -> dimension check -> score -> threshold -> rank -> pose filter -> top k
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use yogarag_lib::retrieve::Retriever;
//!
//! let retriever = Retriever::new(embedder, store)
//!     .with_threshold(settings.retrieval.threshold)
//!     .with_poses(settings.disambiguation.poses);
//!
//! let results = retriever.retrieve("how to relax in corpse pose", 4)?;
//! ```
//!
//! The corpus is scanned in full on every query. That is fine for a few
//! thousand passages; larger corpora would need an approximate nearest
//! neighbour index in front of the store.

use crate::disambiguate::PoseSynonyms;
use crate::embed::Embedder;
use crate::similarity::{normalize, Metric};
use crate::store::{CorpusEntry, CorpusStore, Passage, ScoredResult};
use crate::threshold::ThresholdPolicy;
use crate::{Error, Result};

/// Retrieval engine over an embedder and a corpus store.
///
/// Holds no per-query state: [`retrieve`](Self::retrieve) only reads the
/// store, so one instance can serve overlapping queries.
pub struct Retriever<E: Embedder, S: CorpusStore> {
    embedder: E,
    store: S,
    metric: Metric,
    threshold: ThresholdPolicy,
    poses: PoseSynonyms,
}

impl<E: Embedder, S: CorpusStore> Retriever<E, S> {
    /// Create a retriever with the default metric, threshold and pose table.
    #[must_use]
    pub fn new(embedder: E, store: S) -> Self {
        Self {
            embedder,
            store,
            metric: Metric::default(),
            threshold: ThresholdPolicy::default(),
            poses: PoseSynonyms::default(),
        }
    }

    #[must_use]
    pub fn with_metric(mut self, metric: Metric) -> Self {
        self.metric = metric;
        self
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: ThresholdPolicy) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_poses(mut self, poses: PoseSynonyms) -> Self {
        self.poses = poses;
        self
    }

    /// Embed passages into corpus entries without touching the store.
    pub fn embed_passages(&self, passages: Vec<Passage>) -> Result<Vec<CorpusEntry>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let texts: Vec<&str> = passages.iter().map(|p| p.content.as_str()).collect();
        let embeddings = self.embedder.embed_documents(&texts)?;
        if embeddings.len() != passages.len() {
            return Err(Error::Embedding(format!(
                "expected {} embeddings, model returned {}",
                passages.len(),
                embeddings.len()
            )));
        }

        Ok(passages
            .into_iter()
            .zip(embeddings)
            .map(|(passage, embedding)| CorpusEntry::new(passage, embedding))
            .collect())
    }

    /// Embed passages and add them to the store.
    ///
    /// Returns the number of entries written.
    pub fn index(&mut self, passages: Vec<Passage>) -> Result<usize> {
        let entries = self.embed_passages(passages)?;
        self.store_entries(entries, false)
    }

    /// Replace the whole corpus with `passages`.
    ///
    /// Everything is embedded before the store is cleared, so a failed
    /// embedding leaves the existing corpus in place.
    pub fn reindex(&mut self, passages: Vec<Passage>) -> Result<usize> {
        let entries = self.embed_passages(passages)?;
        self.store_entries(entries, true)
    }

    fn store_entries(&mut self, entries: Vec<CorpusEntry>, replace: bool) -> Result<usize> {
        if replace {
            self.store.clear()?;
        }

        let count = entries.len();
        self.store.insert(entries)?;

        tracing::info!(count, replace, model = self.embedder.model_name(), "indexed passages");
        Ok(count)
    }

    /// Find the passages most similar to `query`.
    ///
    /// Results are sorted by score, highest first, with ties kept in corpus
    /// order. At most `top_k` results are returned; an empty corpus or a
    /// query nothing passes simply yields an empty list.
    ///
    /// Corpus entries with the wrong dimension, a zero-norm vector, or an
    /// unreadable record are skipped. Problems with the query itself (empty
    /// text, bad embedding) fail the call.
    pub fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<ScoredResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidInput("query is empty".to_string()));
        }
        if top_k == 0 {
            return Err(Error::InvalidInput("top_k must be at least 1".to_string()));
        }

        let dimension = self.embedder.dimension();
        let mut query_embedding = self.embedder.embed_query(query)?;
        if query_embedding.len() != dimension {
            return Err(Error::DimensionMismatch {
                expected: dimension,
                actual: query_embedding.len(),
            });
        }
        normalize(&mut query_embedding)?;

        let min_score = self.threshold.min_score(query);

        let mut results = Vec::new();
        let mut skipped = 0usize;
        for entry in self.store.scan()? {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    tracing::warn!(error = %e, "skipping unreadable corpus entry");
                    skipped += 1;
                    continue;
                }
            };

            if entry.embedding.len() != dimension {
                tracing::debug!(
                    title = %entry.title,
                    expected = dimension,
                    actual = entry.embedding.len(),
                    "skipping corpus entry with mismatched dimension"
                );
                skipped += 1;
                continue;
            }

            let score = match self.metric.score(&query_embedding, &entry.embedding) {
                Ok(score) => score,
                Err(e) => {
                    tracing::debug!(title = %entry.title, error = %e, "skipping unscorable corpus entry");
                    skipped += 1;
                    continue;
                }
            };

            if score >= min_score {
                results.push(ScoredResult::new(entry, score));
            }
        }

        // stable sort keeps scan order among equal scores
        results.sort_by(|a, b| b.score.total_cmp(&a.score));
        let matched = results.len();

        let mut results = self.poses.filter(query, results);
        results.truncate(top_k);

        tracing::debug!(
            query,
            min_score,
            matched,
            returned = results.len(),
            skipped,
            "retrieval complete"
        );
        Ok(results)
    }

    /// Returns the number of stored entries.
    pub fn len(&self) -> Result<usize> {
        self.store.len()
    }

    /// Returns `true` if the store holds no entries.
    pub fn is_empty(&self) -> Result<bool> {
        self.store.is_empty()
    }

    /// Returns a reference to the embedder.
    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    /// Returns a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Returns a mutable reference to the store.
    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{JsonlStore, MemoryStore};
    use crate::testing::{at_score, entry, LookupEmbedder};

    const SHORT: &str = "vajrasana benefits";
    const LONG: &str = "what are the benefits of practicing vajrasana daily";

    fn embedder() -> LookupEmbedder {
        LookupEmbedder::new(2)
            .with(SHORT, vec![1.0, 0.0])
            .with(LONG, vec![1.0, 0.0])
            .with("vajrasana breathing", vec![1.0, 0.0])
            .with("how to relax in corpse pose", vec![1.0, 0.0])
            .with("downward dog", vec![1.0, 0.0])
    }

    fn retriever(entries: Vec<CorpusEntry>) -> Retriever<LookupEmbedder, MemoryStore> {
        Retriever::new(embedder(), MemoryStore::from(entries))
    }

    fn titles(results: &[ScoredResult]) -> Vec<&str> {
        results.iter().map(|r| r.title.as_str()).collect()
    }

    #[test]
    fn test_empty_corpus_returns_nothing() {
        let retriever = retriever(Vec::new());

        for k in [1, 3, 100] {
            assert!(retriever.retrieve(SHORT, k).unwrap().is_empty());
            assert!(retriever.retrieve(LONG, k).unwrap().is_empty());
        }
    }

    #[test]
    fn test_short_query_threshold_boundary() {
        let retriever = retriever(vec![
            entry("above", "vajrasana", at_score(0.61)),
            entry("below", "vajrasana", at_score(0.59)),
        ]);

        let results = retriever.retrieve(SHORT, 5).unwrap();
        assert_eq!(titles(&results), vec!["above"]);
    }

    #[test]
    fn test_long_query_threshold_boundary() {
        let retriever = retriever(vec![
            entry("short-only", "vajrasana", at_score(0.61)),
            entry("above", "vajrasana", at_score(0.76)),
            entry("below", "vajrasana", at_score(0.74)),
        ]);

        let results = retriever.retrieve(LONG, 5).unwrap();
        assert_eq!(titles(&results), vec!["above"]);
    }

    #[test]
    fn test_custom_threshold() {
        let retriever = retriever(vec![
            entry("a", "a", at_score(0.55)),
            entry("b", "b", at_score(0.45)),
        ])
        .with_threshold(ThresholdPolicy {
            short_query_min_score: 0.5,
            ..Default::default()
        });

        let results = retriever.retrieve("downward dog", 5).unwrap();
        assert_eq!(titles(&results), vec!["a"]);
    }

    #[test]
    fn test_results_sorted_by_score() {
        let retriever = retriever(vec![
            entry("medium", "x", at_score(0.8)),
            entry("low", "x", at_score(0.65)),
            entry("high", "x", at_score(0.95)),
        ]);

        let results = retriever.retrieve("downward dog", 3).unwrap();
        assert_eq!(titles(&results), vec!["high", "medium", "low"]);
        for window in results.windows(2) {
            assert!(
                window[0].score >= window[1].score,
                "Results should be sorted by score descending"
            );
        }
    }

    #[test]
    fn test_ties_keep_corpus_order() {
        let retriever = retriever(vec![
            entry("first", "x", at_score(0.7)),
            entry("second", "x", at_score(0.9)),
            entry("third", "x", at_score(0.7)),
        ]);

        let results = retriever.retrieve("downward dog", 3).unwrap();
        assert_eq!(titles(&results), vec!["second", "first", "third"]);
    }

    #[test]
    fn test_respects_top_k() {
        let entries = (0..5)
            .map(|i| entry(&i.to_string(), "x", at_score(0.9 - i as f32 * 0.05)))
            .collect();
        let retriever = retriever(entries);

        assert_eq!(retriever.retrieve("downward dog", 3).unwrap().len(), 3);
        assert_eq!(retriever.retrieve("downward dog", 5).unwrap().len(), 5);
        assert_eq!(retriever.retrieve("downward dog", 100).unwrap().len(), 5);
    }

    #[test]
    fn test_idempotent() {
        let retriever = retriever(vec![
            entry("a", "x", at_score(0.9)),
            entry("b", "x", at_score(0.7)),
            entry("c", "x", at_score(0.7)),
        ]);

        let first = retriever.retrieve("downward dog", 3).unwrap();
        let second = retriever.retrieve("downward dog", 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_query_is_trimmed() {
        let retriever = retriever(vec![entry("a", "x", at_score(0.9))]);

        let results = retriever.retrieve("  downward dog \n", 1).unwrap();
        assert_eq!(titles(&results), vec!["a"]);
    }

    #[test]
    fn test_skips_entries_with_wrong_dimension() {
        let retriever = retriever(vec![
            entry("bad", "x", vec![1.0, 0.0, 0.0]),
            entry("good", "x", at_score(0.9)),
        ]);

        let results = retriever.retrieve("downward dog", 5).unwrap();
        assert_eq!(titles(&results), vec!["good"]);
    }

    #[test]
    fn test_skips_zero_norm_entries() {
        let retriever = retriever(vec![
            entry("zero", "x", vec![0.0, 0.0]),
            entry("good", "x", at_score(0.9)),
        ]);

        let results = retriever.retrieve("downward dog", 5).unwrap();
        assert_eq!(titles(&results), vec!["good"]);
    }

    #[test]
    fn test_skips_unreadable_records() {
        use std::io::Write;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("corpus.jsonl");
        let mut store = JsonlStore::new(&path);
        store.insert(vec![entry("first", "x", at_score(0.9))]).unwrap();
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "garbage").unwrap();
        drop(file);
        store.insert(vec![entry("last", "x", at_score(0.8))]).unwrap();

        let retriever = Retriever::new(embedder(), store);
        let results = retriever.retrieve("downward dog", 5).unwrap();
        assert_eq!(titles(&results), vec!["first", "last"]);
    }

    #[test]
    fn test_unnormalized_query_is_normalized() {
        let embedder = LookupEmbedder::new(2).with("downward dog", vec![10.0, 0.0]);
        let store = MemoryStore::from(vec![entry("a", "x", at_score(0.9))]);
        let retriever = Retriever::new(embedder, store).with_metric(Metric::Dot);

        let results = retriever.retrieve("downward dog", 1).unwrap();
        assert_eq!(results.len(), 1);
        assert!((results[0].score - 0.9).abs() < 1e-5);
    }

    #[test]
    fn test_query_dimension_mismatch_is_fatal() {
        let embedder = LookupEmbedder::new(2).with("downward dog", vec![1.0, 0.0, 0.0]);
        let retriever = Retriever::new(embedder, MemoryStore::new());

        let err = retriever.retrieve("downward dog", 1).unwrap_err();
        assert!(matches!(err, Error::DimensionMismatch { expected: 2, actual: 3 }));
    }

    #[test]
    fn test_empty_query_rejected() {
        let retriever = retriever(vec![entry("a", "x", at_score(0.9))]);

        assert!(matches!(retriever.retrieve("", 1), Err(Error::InvalidInput(_))));
        assert!(matches!(retriever.retrieve("   \t", 1), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_zero_top_k_rejected() {
        let retriever = retriever(Vec::new());
        assert!(matches!(retriever.retrieve(SHORT, 0), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn test_pose_filter_applied() {
        let retriever = retriever(vec![
            entry("virasana", "sit between the heels for steady breathing", at_score(0.9)),
            entry("vajrasana", "vajrasana supports slow breathing", at_score(0.8)),
        ]);

        let results = retriever.retrieve("vajrasana breathing", 5).unwrap();
        assert_eq!(titles(&results), vec!["vajrasana"]);
    }

    #[test]
    fn test_pose_filter_runs_before_truncation() {
        let retriever = retriever(vec![
            entry("hero", "hero pose", at_score(0.95)),
            entry("thunderbolt", "vajrasana is also called thunderbolt pose", at_score(0.7)),
        ]);

        let results = retriever.retrieve("vajrasana breathing", 1).unwrap();
        assert_eq!(titles(&results), vec!["thunderbolt"]);
    }

    #[test]
    fn test_corpse_pose_scenario() {
        let retriever = retriever(vec![entry(
            "Shavasana",
            "lie flat on the back in corpse pose relaxation for the whole body",
            at_score(0.81),
        )]);

        let results = retriever.retrieve("how to relax in corpse pose", 1).unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].title, "Shavasana");
        assert!((results[0].score - 0.81).abs() < 1e-5);
    }

    #[test]
    fn test_index_embeds_and_stores() {
        let embedder = LookupEmbedder::new(2)
            .with("kneel and sit back on the heels", at_score(0.9))
            .with("downward dog", vec![1.0, 0.0]);
        let mut retriever = Retriever::new(embedder, MemoryStore::new());

        let count = retriever
            .index(vec![Passage {
                title: "Vajrasana".to_string(),
                source: "asanas.json".to_string(),
                content: "kneel and sit back on the heels".to_string(),
            }])
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(retriever.len().unwrap(), 1);

        let results = retriever.retrieve("downward dog", 1).unwrap();
        assert_eq!(results[0].citation(), "Vajrasana – asanas.json");
    }

    #[test]
    fn test_reindex_replaces_corpus() {
        let embedder = LookupEmbedder::new(2).with("new passage", at_score(0.9));
        let store = MemoryStore::from(vec![entry("old", "old passage", at_score(0.8))]);
        let mut retriever = Retriever::new(embedder, store);

        let count = retriever
            .reindex(vec![Passage {
                title: "new".to_string(),
                source: "asanas.json".to_string(),
                content: "new passage".to_string(),
            }])
            .unwrap();
        assert_eq!(count, 1);

        let titles: Vec<String> = retriever
            .store()
            .scan()
            .unwrap()
            .map(|e| e.unwrap().title)
            .collect();
        assert_eq!(titles, vec!["new"]);
    }

    #[test]
    fn test_failed_reindex_keeps_existing_corpus() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut store = JsonlStore::new(dir.path().join("corpus.jsonl"));
        store.insert(vec![entry("old", "old passage", at_score(0.8))]).unwrap();

        // no vector registered for the new passage, so embedding fails
        let mut retriever = Retriever::new(LookupEmbedder::new(2), store);
        let err = retriever
            .reindex(vec![Passage {
                title: "new".to_string(),
                source: "asanas.json".to_string(),
                content: "unknown".to_string(),
            }])
            .unwrap_err();

        assert!(matches!(err, Error::Embedding(_)));
        assert_eq!(retriever.len().unwrap(), 1);
        let entry = retriever.store().scan().unwrap().next().unwrap().unwrap();
        assert_eq!(entry.title, "old");
    }

    #[test]
    fn test_index_empty_is_noop() {
        let mut retriever = retriever(Vec::new());
        assert_eq!(retriever.index(Vec::new()).unwrap(), 0);
        assert!(retriever.is_empty().unwrap());
    }
}
