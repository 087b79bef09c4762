//! Archive format detection, sanitized extraction, and extraction-folder
//! reuse backing the archive worker (C7).

mod error;
mod extract;
mod format;
mod reuse;
mod sanitize;

pub use error::{Error, Result};
pub use extract::{extract_archive, ArchiveReport};
pub use format::{detect_format, ArchiveFormat, Compression};
pub use reuse::{find_reusable_folder, new_extraction_path, ReusableFolder};
pub use sanitize::{sanitize_path, sanitize_symlink_target};
