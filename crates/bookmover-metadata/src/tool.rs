use std::path::Path;

use serde::Deserialize;
use tokio::process::Command;

use crate::error::{Error, Result};

/// Raw shape of the external ebook tool's output, before sanitization and
/// truncation are applied.
#[derive(Debug, Deserialize)]
pub struct RawMetadata {
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<String>,
    pub language: Option<String>,
    pub series: Option<String>,
    pub series_index: Option<f64>,
}

/// Seam over the external metadata tool, so tests can substitute a
/// fixture-backed implementation instead of spawning a real process:
/// a narrow trait at the subprocess boundary.
#[async_trait::async_trait]
pub trait MetadataTool: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<RawMetadata>;
}

/// Invokes a configured external binary with the file path as its sole
/// argument and parses its stdout as JSON.
pub struct ExternalTool {
    pub binary: std::path::PathBuf,
}

impl ExternalTool {
    pub fn new(binary: impl Into<std::path::PathBuf>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

#[async_trait::async_trait]
impl MetadataTool for ExternalTool {
    async fn extract(&self, path: &Path) -> Result<RawMetadata> {
        let output = Command::new(&self.binary)
            .arg(path)
            .output()
            .await
            .map_err(Error::Spawn)?;

        if !output.status.success() {
            return Err(Error::NonZeroExit(output.status.code().unwrap_or(-1)));
        }

        serde_json::from_slice(&output.stdout).map_err(Error::Parse)
    }
}
