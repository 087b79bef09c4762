use std::io::Write;
use std::path::{Path, PathBuf};

use bookmover_model::FixAttempt;

use crate::error::{Error, Result};

/// The fix-history file of §6: "append-mostly list of FixAttempt records".
/// Newline-delimited JSON, one record per line, matching the per-worker
/// progress file's "JSON-like, human readable" requirement but append-only
/// rather than rewrite-in-place since individual attempts are never edited.
pub struct FixHistoryStore {
    path: PathBuf,
}

impl FixHistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn append(&self, attempt: &FixAttempt) -> Result<()> {
        let line = serde_json::to_string(attempt)?;
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|source| Error::FixHistoryIo { path: self.path.clone(), source })?;
        writeln!(file, "{line}").map_err(|source| Error::FixHistoryIo { path: self.path.clone(), source })?;
        Ok(())
    }

    /// Malformed trailing lines (a write interrupted mid-flush) are skipped
    /// rather than failing the whole read, the same tolerance the progress
    /// store extends to a corrupt tail.
    pub fn load_all(&self) -> Result<Vec<FixAttempt>> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(source) => return Err(Error::FixHistoryIo { path: self.path.clone(), source }),
        };
        Ok(contents
            .lines()
            .filter_map(|line| match serde_json::from_str::<FixAttempt>(line) {
                Ok(attempt) => Some(attempt),
                Err(error) => {
                    tracing::warn!(%error, "skipping malformed fix-history line");
                    None
                }
            })
            .collect())
    }

    pub fn for_worker(&self, worker_id: u32) -> Result<Vec<FixAttempt>> {
        Ok(self.load_all()?.into_iter().filter(|a| a.worker_id == worker_id).collect())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmover_model::{FixOutcome, FixType};
    use tempfile::tempdir;

    fn attempt(worker_id: u32, attempt_index: u32) -> FixAttempt {
        FixAttempt {
            worker_id,
            ts: chrono::Utc::now(),
            root_cause: "connection reset".to_string(),
            fix_type: FixType::Restart,
            params: String::new(),
            outcome: FixOutcome::NotRecovered,
            attempt_index,
        }
    }

    #[test]
    fn appended_records_round_trip() {
        let dir = tempdir().unwrap();
        let store = FixHistoryStore::new(dir.path().join("fix-history.jsonl"));
        store.append(&attempt(1, 1)).unwrap();
        store.append(&attempt(1, 2)).unwrap();
        store.append(&attempt(2, 1)).unwrap();

        assert_eq!(store.load_all().unwrap().len(), 3);
        assert_eq!(store.for_worker(1).unwrap().len(), 2);
    }

    #[test]
    fn missing_file_loads_as_empty() {
        let dir = tempdir().unwrap();
        let store = FixHistoryStore::new(dir.path().join("absent.jsonl"));
        assert!(store.load_all().unwrap().is_empty());
    }

    #[test]
    fn malformed_trailing_line_is_skipped_not_fatal() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("fix-history.jsonl");
        let store = FixHistoryStore::new(&path);
        store.append(&attempt(1, 1)).unwrap();
        let mut file = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(file, "{{not json").unwrap();

        assert_eq!(store.load_all().unwrap().len(), 1);
    }
}
