use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::store::{CorpusEntry, CorpusStore, EntryIter};
use crate::{Error, Result};

/// File-backed corpus store with one JSON entry per line.
///
/// Scans stream the file line by line, so the corpus never has to fit in
/// memory. A missing file is treated as an empty corpus.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(&self) -> Result<Option<BufReader<File>>> {
        match File::open(&self.path) {
            Ok(file) => Ok(Some(BufReader::new(file))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Store(format!("{}: {e}", self.path.display()))),
        }
    }
}

impl CorpusStore for JsonlStore {
    fn insert(&mut self, entries: Vec<CorpusEntry>) -> Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| Error::Store(format!("{}: {e}", self.path.display())))?;
        let mut writer = BufWriter::new(file);

        for entry in &entries {
            serde_json::to_writer(&mut writer, entry)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;

        Ok(())
    }

    fn scan(&self) -> Result<EntryIter<'_>> {
        let Some(reader) = self.open()? else {
            return Ok(Box::new(std::iter::empty::<Result<CorpusEntry>>()));
        };

        let path = self.path.as_path();
        let entries = reader.lines().enumerate().filter_map(move |(i, line)| {
            let line = match line {
                Ok(line) => line,
                Err(e) => return Some(Err(Error::Io(e))),
            };
            if line.trim().is_empty() {
                return None;
            }
            Some(serde_json::from_str::<CorpusEntry>(&line).map_err(|e| {
                Error::Store(format!("{}:{}: {e}", path.display(), i + 1))
            }))
        });

        Ok(Box::new(entries))
    }

    fn len(&self) -> Result<usize> {
        let Some(reader) = self.open()? else {
            return Ok(0);
        };

        let mut count = 0;
        for line in reader.lines() {
            if !line?.trim().is_empty() {
                count += 1;
            }
        }
        Ok(count)
    }

    fn clear(&mut self) -> Result<()> {
        File::create(&self.path)
            .map(drop)
            .map_err(|e| Error::Store(format!("{}: {e}", self.path.display())))
    }
}
