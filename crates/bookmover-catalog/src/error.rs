#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("request failed")]
    Request(#[from] reqwest::Error),

    #[error("failed to parse response body")]
    Parse(#[from] serde_json::Error),

    #[error("server returned status {0}")]
    UnexpectedStatus(u16),

    #[error("failed to read local file for upload")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
