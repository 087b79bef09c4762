use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bookmover_model::Fingerprint;
use futures_util::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The target service's documented "already exists" status code. Its exact
/// value is version-specific (open question in the source design); pinned
/// here as a named constant so a deployment targeting a different server
/// version only has to change this one place.
pub const ALREADY_EXISTS_STATUS: u16 = 409;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadStatus {
    New,
    Duplicate,
    SizeRejected,
    ValidationRejected,
    ServerError,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadResponse {
    pub status: UploadStatus,
    pub server_fingerprint: Option<String>,
}

/// What gets sent to the target service (§4.5 step 2). `ByReference` is
/// symlink mode: only the path is sent, no bytes cross the wire.
pub enum UploadPayload<'a> {
    ByValue {
        metadata_json: &'a [u8],
        file_path: &'a std::path::Path,
        /// Incremented by each chunk as the file streams out, so a caller
        /// can watch upload progress without buffering the file itself.
        bytes_sent: Option<Arc<AtomicU64>>,
    },
    ByReference { metadata_json: &'a [u8], file_path: &'a std::path::Path },
}

pub type FingerprintStream = Pin<Box<dyn Stream<Item = Result<Fingerprint>> + Send>>;

/// Narrow interface over the target ingestion service (§6).
#[async_trait::async_trait]
pub trait TargetService: Send + Sync {
    async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool>;
    async fn all_fingerprints(&self) -> Result<FingerprintStream>;
    async fn upload(&self, payload: UploadPayload<'_>) -> Result<UploadResponse>;
}

#[derive(Debug, Deserialize)]
struct ExistsResponse {
    exists: bool,
}

#[derive(Debug, Deserialize)]
struct RawFingerprint {
    hash: String,
    size: u64,
}

pub struct HttpTargetService {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTargetService {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into(),
        }
    }
}

#[async_trait::async_trait]
impl TargetService for HttpTargetService {
    async fn exists(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let url = format!("{}/fingerprints/{}", self.base_url, fingerprint.cache_key());
        let response = self.client.get(url).send().await?;
        if response.status().as_u16() == ALREADY_EXISTS_STATUS {
            return Ok(true);
        }
        if let Err(error) = response.error_for_status_ref() {
            tracing::warn!(%error, fingerprint = %fingerprint.cache_key(), "existence check against target failed");
        }
        let response = response.error_for_status()?;
        Ok(response.json::<ExistsResponse>().await?.exists)
    }

    async fn all_fingerprints(&self) -> Result<FingerprintStream> {
        let url = format!("{}/fingerprints", self.base_url);
        let response = self.client.get(url).send().await?.error_for_status()?;
        // Newline-delimited JSON: one {hash,size} object per line.
        let bytes = response.bytes().await?;
        let items: Vec<Result<Fingerprint>> = bytes
            .split(|&b| b == b'\n')
            .filter(|line| !line.is_empty())
            .map(|line| {
                serde_json::from_slice::<RawFingerprint>(line)
                    .map(|raw| Fingerprint::new(raw.hash, raw.size))
                    .map_err(Error::Parse)
            })
            .collect();
        Ok(Box::pin(futures_util::stream::iter(items)))
    }

    async fn upload(&self, payload: UploadPayload<'_>) -> Result<UploadResponse> {
        let url = format!("{}/uploads", self.base_url);
        let request = match payload {
            UploadPayload::ByValue { metadata_json, file_path, bytes_sent } => {
                let file = tokio::fs::File::open(file_path).await.map_err(Error::Io)?;
                let len = file.metadata().await.map_err(Error::Io)?.len();
                let stream = tokio_util::io::ReaderStream::new(file).map(move |chunk| {
                    if let (Ok(bytes), Some(counter)) = (&chunk, &bytes_sent) {
                        counter.fetch_add(bytes.len() as u64, Ordering::Relaxed);
                    }
                    chunk
                });
                let body = reqwest::Body::wrap_stream(stream);
                self.client
                    .post(&url)
                    .header("x-bookmover-metadata", String::from_utf8_lossy(metadata_json).into_owned())
                    .header("content-length", len)
                    .body(body)
            }
            UploadPayload::ByReference { metadata_json, file_path } => self
                .client
                .post(&url)
                .header("x-bookmover-metadata", String::from_utf8_lossy(metadata_json).into_owned())
                .header("x-bookmover-path", file_path.to_string_lossy().into_owned()),
        };

        let response = request.send().await?;
        if response.status().as_u16() == ALREADY_EXISTS_STATUS {
            return Ok(UploadResponse {
                status: UploadStatus::Duplicate,
                server_fingerprint: None,
            });
        }
        if let Err(error) = response.error_for_status_ref() {
            tracing::warn!(%error, "upload request rejected by target");
        }
        let response = response.error_for_status()?;
        Ok(response.json::<UploadResponse>().await?)
    }
}
