//! Medical safety screen
//!
//! Questions that mention pregnancy, recent surgery or similar conditions
//! should not be answered from general yoga material. The screen flags them
//! so the assistant can refer the user to a professional instead.

use serde::{Deserialize, Serialize};

/// Keywords at or below this length must match a whole word ("bp" but not "bpm").
const WHOLE_WORD_MAX_LEN: usize = 3;

/// Flags queries that touch on conditions needing personal guidance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SafetyScreen {
    pub unsafe_keywords: Vec<String>,
}

impl Default for SafetyScreen {
    fn default() -> Self {
        Self::new([
            "pregnant",
            "pregnancy",
            "trimester",
            "hernia",
            "glaucoma",
            "high blood pressure",
            "bp",
            "recent surgery",
            "post surgery",
            "knee injury",
            "back injury",
            "heart condition",
        ])
    }
}

impl SafetyScreen {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            unsafe_keywords: keywords
                .into_iter()
                .map(|k| k.as_ref().trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Returns `true` if the query mentions any unsafe keyword.
    #[must_use]
    pub fn is_unsafe(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        let words: Vec<&str> = query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| !w.is_empty())
            .collect();

        self.unsafe_keywords.iter().any(|keyword| {
            let keyword = keyword.trim().to_lowercase();
            if keyword.is_empty() {
                false
            } else if keyword.chars().count() <= WHOLE_WORD_MAX_LEN {
                words.contains(&keyword.as_str())
            } else {
                query.contains(keyword.as_str())
            }
        })
    }
}
