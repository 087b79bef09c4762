#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to spawn metadata tool")]
    Spawn(#[source] std::io::Error),

    #[error("metadata tool exited with status {0}")]
    NonZeroExit(i32),

    #[error("failed to parse metadata tool output")]
    Parse(#[source] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
