use std::path::Path;

use bookmover_model::{sanitize_and_truncate, Metadata};

use crate::language::normalize as normalize_language;
use crate::tool::MetadataTool;

const TITLE_LIMIT: usize = 1024;
const AUTHOR_LIMIT: usize = 512;

/// Extracts a metadata record for `path` (§4.2). Never fails the caller:
/// a tool error of any kind falls back to a record derived from the
/// filename, as the pipeline must keep moving past unreadable or
/// unsupported files.
pub async fn extract_metadata(tool: &dyn MetadataTool, path: &Path) -> Metadata {
    match tool.extract(path).await {
        Ok(raw) => Metadata {
            title: sanitize_and_truncate(
                raw.title.as_deref().unwrap_or_else(|| fallback_title(path)),
                TITLE_LIMIT,
            ),
            authors: raw
                .authors
                .iter()
                .map(|a| sanitize_and_truncate(a, AUTHOR_LIMIT))
                .collect(),
            language: raw.language.as_deref().map(normalize_language),
            series: raw.series.map(|s| sanitize_and_truncate(&s, TITLE_LIMIT)),
            series_index: raw.series_index,
        },
        Err(error) => {
            tracing::warn!(?path, %error, "metadata extraction failed, using filename fallback");
            fallback_metadata(path)
        }
    }
}

fn fallback_title(path: &Path) -> &str {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("unknown")
}

fn fallback_metadata(path: &Path) -> Metadata {
    Metadata {
        title: sanitize_and_truncate(fallback_title(path), TITLE_LIMIT),
        authors: vec!["Unknown".to_string()],
        language: None,
        series: None,
        series_index: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::tool::RawMetadata;
    use std::path::PathBuf;

    struct FixedTool(Result<RawMetadata, Error>);

    #[async_trait::async_trait]
    impl MetadataTool for FixedTool {
        async fn extract(&self, _path: &Path) -> crate::error::Result<RawMetadata> {
            match &self.0 {
                Ok(raw) => Ok(RawMetadata {
                    title: raw.title.clone(),
                    authors: raw.authors.clone(),
                    language: raw.language.clone(),
                    series: raw.series.clone(),
                    series_index: raw.series_index,
                }),
                Err(_) => Err(Error::NonZeroExit(1)),
            }
        }
    }

    #[tokio::test]
    async fn successful_extraction_sanitizes_and_normalizes() {
        let tool = FixedTool(Ok(RawMetadata {
            title: Some("Title\u{0}With Nul".to_string()),
            authors: vec!["Author One".to_string()],
            language: Some("eng".to_string()),
            series: None,
            series_index: None,
        }));
        let meta = extract_metadata(&tool, Path::new("/lib/book.epub")).await;
        assert_eq!(meta.title, "TitleWith Nul");
        assert_eq!(meta.language.as_deref(), Some("en"));
    }

    #[tokio::test]
    async fn failed_extraction_falls_back_to_filename() {
        let tool = FixedTool(Err(Error::NonZeroExit(1)));
        let meta = extract_metadata(&tool, Path::new("/lib/My Book.epub")).await;
        assert_eq!(meta.title, "My Book");
        assert_eq!(meta.authors, vec!["Unknown".to_string()]);
        assert!(meta.language.is_none());
    }

    #[tokio::test]
    async fn long_title_is_truncated_to_limit() {
        let long_title = "x".repeat(2000);
        let tool = FixedTool(Ok(RawMetadata {
            title: Some(long_title),
            authors: vec![],
            language: None,
            series: None,
            series_index: None,
        }));
        let meta = extract_metadata(&tool, Path::new("/lib/book.epub")).await;
        assert_eq!(meta.title.chars().count(), TITLE_LIMIT);
    }
}
