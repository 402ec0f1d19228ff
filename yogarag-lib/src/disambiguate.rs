//! Pose name disambiguation
//!
//! Pose names such as "vajrasana" and "virasana" sit close together in
//! embedding space, so a query about one pose can pull in passages about
//! another. When the query names a known pose, ranked results are narrowed to
//! passages that literally mention one of its variants.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::store::ScoredResult;

/// Canonical pose name to the lexical variants that identify it in passage text.
///
/// All names and variants are stored lowercase. Names that collide once
/// lowercased share one entry holding the variants of both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    from = "BTreeMap<String, Vec<String>>",
    into = "BTreeMap<String, Vec<String>>"
)]
pub struct PoseSynonyms {
    poses: BTreeMap<String, Vec<String>>,
}

impl From<BTreeMap<String, Vec<String>>> for PoseSynonyms {
    fn from(poses: BTreeMap<String, Vec<String>>) -> Self {
        Self::new(poses)
    }
}

impl From<PoseSynonyms> for BTreeMap<String, Vec<String>> {
    fn from(table: PoseSynonyms) -> Self {
        table.poses
    }
}

impl Default for PoseSynonyms {
    fn default() -> Self {
        Self::new([
            ("vajrasana", vec!["vajrasana", "vajrāsana"]),
            (
                "shavasana",
                vec!["shavasana", "savasana", "śavāsana", "corpse pose", "corpse posture"],
            ),
        ])
    }
}

impl PoseSynonyms {
    /// Build a table from (pose, variants) pairs.
    pub fn new<I, P, V, S>(poses: I) -> Self
    where
        I: IntoIterator<Item = (P, V)>,
        P: AsRef<str>,
        V: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut table: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (pose, variants) in poses {
            let entry = table.entry(pose.as_ref().to_lowercase()).or_default();
            for variant in variants {
                let variant = variant.as_ref().to_lowercase();
                if !entry.contains(&variant) {
                    entry.push(variant);
                }
            }
        }
        Self { poses: table }
    }

    /// A table that never filters anything.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            poses: BTreeMap::new(),
        }
    }

    /// Number of poses in the table
    #[must_use]
    pub fn len(&self) -> usize {
        self.poses.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.poses.is_empty()
    }

    /// Variants of every pose whose name appears in the query.
    #[must_use]
    pub fn variants_for(&self, query: &str) -> Vec<&str> {
        let query = query.to_lowercase();
        self.poses
            .iter()
            .filter(|(pose, _)| query.contains(pose.as_str()))
            .flat_map(|(_, variants)| variants.iter().map(String::as_str))
            .collect()
    }

    /// Narrow ranked results to those mentioning a pose named in the query.
    ///
    /// Variants from all matched poses are pooled, so a result survives if it
    /// mentions any of them. If no result mentions one, the ranking is
    /// returned untouched. Order is preserved and nothing is ever added.
    #[must_use]
    pub fn filter(&self, query: &str, results: Vec<ScoredResult>) -> Vec<ScoredResult> {
        let variants = self.variants_for(query);
        if variants.is_empty() {
            return results;
        }

        let mentions = |r: &ScoredResult| {
            let content = r.content.to_lowercase();
            variants.iter().any(|v| content.contains(v))
        };

        if !results.iter().any(mentions) {
            tracing::debug!(?variants, "no result mentions the queried pose, skipping filter");
            return results;
        }

        let before = results.len();
        let filtered: Vec<_> = results.into_iter().filter(|r| mentions(r)).collect();
        tracing::debug!(?variants, before, after = filtered.len(), "applied pose filter");
        filtered
    }
}
