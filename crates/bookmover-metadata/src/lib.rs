//! C2: external ebook metadata extraction, sanitization, filename fallback.

mod error;
mod extract;
mod language;
mod tool;

pub use error::{Error, Result};
pub use extract::extract_metadata;
pub use language::normalize as normalize_language;
pub use tool::{ExternalTool, MetadataTool, RawMetadata};
