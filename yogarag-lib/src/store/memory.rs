use crate::store::{CorpusEntry, CorpusStore, EntryIter};
use crate::{Error, Result};

/// In-memory corpus store for development and testing.
///
/// Entries are kept in insertion order and scanned by brute force, which is
/// fine for corpora in the low thousands of passages.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Vec<CorpusEntry>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl From<Vec<CorpusEntry>> for MemoryStore {
    fn from(entries: Vec<CorpusEntry>) -> Self {
        Self { entries }
    }
}

impl CorpusStore for MemoryStore {
    fn insert(&mut self, entries: Vec<CorpusEntry>) -> Result<()> {
        self.entries.extend(entries);
        Ok(())
    }

    fn scan(&self) -> Result<EntryIter<'_>> {
        Ok(Box::new(self.entries.iter().cloned().map(Ok::<_, Error>)))
    }

    fn len(&self) -> Result<usize> {
        Ok(self.entries.len())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        Ok(())
    }
}
