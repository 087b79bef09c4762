#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("oracle request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("oracle returned unexpected status {0}")]
    UnexpectedStatus(u16),
}

pub type Result<T> = std::result::Result<T, Error>;
