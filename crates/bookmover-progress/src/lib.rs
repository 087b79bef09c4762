//! C4: the durable per-worker progress store.

mod commit_gate;
mod error;
mod recovery;
mod store;

pub use commit_gate::CommitGate;
pub use error::{Error, Result};
pub use store::{is_progress_file, progress_file_name, ProgressStore};
