#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("progress store: {0}")]
    Progress(#[from] bookmover_progress::Error),
    #[error("oracle: {0}")]
    Oracle(#[from] bookmover_oracle::Error),
    #[error("fix history I/O at {path}: {source}")]
    FixHistoryIo { path: std::path::PathBuf, source: std::io::Error },
    #[error("fix history record serialization: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("lifecycle action failed: {0}")]
    Lifecycle(String),
}

pub type Result<T> = std::result::Result<T, Error>;
