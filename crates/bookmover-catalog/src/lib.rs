//! External interfaces (§6): the read-only source catalog query and the
//! target ingestion service, each a narrow trait plus a `reqwest`-backed
//! implementation.

mod error;
mod source;
mod target;

pub use error::{Error, Result};
pub use source::{HttpSourceCatalog, SourceCatalog};
pub use target::{
    FingerprintStream, HttpTargetService, TargetService, UploadPayload, UploadResponse,
    UploadStatus, ALREADY_EXISTS_STATUS,
};
