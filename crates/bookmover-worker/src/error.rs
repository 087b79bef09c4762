#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("progress store: {0}")]
    Progress(#[from] bookmover_progress::Error),
    #[error("catalog: {0}")]
    Catalog(#[from] bookmover_catalog::Error),
    #[error("archive: {0}")]
    Archive(#[from] bookmover_archive::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
