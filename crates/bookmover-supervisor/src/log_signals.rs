use once_cell::sync::Lazy;
use regex::RegexSet;

/// Source of recent log output for a worker. Abstracted behind a trait so
/// tests can supply canned lines instead of tailing a real file, the same
/// seam `SourceCatalog`/`TargetService` use for their external dependencies.
pub trait LogSource: Send + Sync {
    /// Returns up to `limit` of the most recent log lines for `worker_id`.
    fn recent_lines(&self, worker_id: u32, limit: usize) -> Vec<String>;
}

/// Reads a worker's log file from disk, one line per call, tailing the last
/// `limit` lines. The file naming convention (`worker-<id>.log`) mirrors the
/// progress file's `worker-<id>.progress.json`.
pub struct FileLogSource {
    dir: std::path::PathBuf,
}

impl FileLogSource {
    pub fn new(dir: impl Into<std::path::PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl LogSource for FileLogSource {
    fn recent_lines(&self, worker_id: u32, limit: usize) -> Vec<String> {
        let path = self.dir.join(format!("worker-{worker_id}.log"));
        let Ok(contents) = std::fs::read_to_string(&path) else {
            return Vec::new();
        };
        let lines: Vec<String> = contents.lines().map(str::to_string).collect();
        let start = lines.len().saturating_sub(limit);
        lines[start..].to_vec()
    }
}

static PROGRESS_SIGNAL_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)processed batch",
        r"(?i)found \d+ new files?",
        r"(?i)select .* from",
        r"(?i)query executed",
        r"(?i)extract(?:ing|ed) archive",
    ])
    .expect("progress signal patterns are valid")
});

static ERROR_PATTERNS: Lazy<RegexSet> = Lazy::new(|| {
    RegexSet::new([
        r"(?i)connection (?:reset|refused|timed? ?out)",
        r"(?i)(?:read|write) timeout",
        r"(?i)server error",
        r"(?i)disk (?:full|i/?o error)",
        r"(?i)panic(?:ked)?",
    ])
    .expect("error patterns are valid")
});

/// §4.8 step A: "progress signals in logs that reset the activity timer".
pub fn has_recent_progress_signal(lines: &[String]) -> bool {
    lines.iter().any(|line| PROGRESS_SIGNAL_PATTERNS.is_match(line))
}

/// Error substrings observed in `lines`, for the diagnostics bundle handed
/// to the oracle (§4.8 step D.1) and the recurrence-detection keyword set.
pub fn extract_error_patterns(lines: &[String]) -> Vec<String> {
    lines
        .iter()
        .filter(|line| ERROR_PATTERNS.is_match(line))
        .cloned()
        .collect()
}
