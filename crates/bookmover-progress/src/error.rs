use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Fs(#[from] bookmover_fs::Error),

    #[error("failed to serialize progress for shard {shard_id}")]
    Serialize {
        shard_id: u32,
        #[source]
        source: serde_json::Error,
    },

    #[error("progress file {path:?} is absent and could not be created")]
    CreationFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
