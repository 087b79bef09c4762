use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Format tag derived from extension or magic bytes (§4.1). `Unknown` is a
/// first-class member rather than an `Option` wrapper so callers can log or
/// route it without unwrapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatTag {
    Epub,
    Mobi,
    Pdf,
    Fb2,
    Azw3,
    Cbz,
    Cbr,
    Djvu,
    Lit,
    Unknown,
}

impl FormatTag {
    /// Matches a lowercased file extension (without the leading dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        Some(match ext.to_ascii_lowercase().as_str() {
            "epub" => Self::Epub,
            "mobi" => Self::Mobi,
            "pdf" => Self::Pdf,
            "fb2" => Self::Fb2,
            "azw3" => Self::Azw3,
            "cbz" => Self::Cbz,
            "cbr" => Self::Cbr,
            "djvu" => Self::Djvu,
            "lit" => Self::Lit,
            _ => return None,
        })
    }
}

/// Prefetched metadata the source catalog may already carry for a record,
/// sparing C2 an extraction pass when present.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    pub title: String,
    pub authors: Vec<String>,
    pub language: Option<String>,
    pub series: Option<String>,
    pub series_index: Option<f64>,
}

/// Identity of one candidate item from the source catalog (§3).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceRecord {
    pub shard_key: i64,
    pub path: PathBuf,
    pub format_hint: FormatTag,
    pub prefetched_metadata: Option<Metadata>,
}

impl SourceRecord {
    pub fn new(shard_key: i64, path: PathBuf, format_hint: FormatTag) -> Self {
        Self {
            shard_key,
            path,
            format_hint,
            prefetched_metadata: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_lookup_is_case_insensitive() {
        assert_eq!(FormatTag::from_extension("EPUB"), Some(FormatTag::Epub));
        assert_eq!(FormatTag::from_extension("Pdf"), Some(FormatTag::Pdf));
    }

    #[test]
    fn unrecognized_extension_yields_none() {
        assert_eq!(FormatTag::from_extension("docx"), None);
    }

    #[test]
    fn source_record_defaults_to_no_prefetched_metadata() {
        let record = SourceRecord::new(7, PathBuf::from("/lib/a.epub"), FormatTag::Epub);
        assert!(record.prefetched_metadata.is_none());
        assert_eq!(record.shard_key, 7);
    }
}
