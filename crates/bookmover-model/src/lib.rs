//! Shared domain types for the migration pipeline: the data model of §3,
//! nothing else. Every other crate in the workspace depends on this one and
//! none of it depends back, so it stays a plain-data leaf.

mod fingerprint;
mod fix;
mod outcome;
mod progress;
mod record;
mod sanitize;

pub use fingerprint::Fingerprint;
pub use fix::{FixAttempt, FixOutcome, FixType};
pub use outcome::UploadOutcome;
pub use progress::{ArchiveSummary, CompletedFile, FileStatus, WorkerProgress, WorkerStatus};
pub use record::{FormatTag, Metadata, SourceRecord};
pub use sanitize::{sanitize, sanitize_and_truncate};
