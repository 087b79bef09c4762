//! C1: content fingerprinting and format detection. Pure functions of file
//! contents; no metadata side effects (§4.1).

mod detect;
mod error;
mod fingerprint;
mod hasher;
mod reader;

pub use detect::detect_format;
pub use error::{Error, Result};
pub use fingerprint::fingerprint;
pub use hasher::{Hasher, Sha1Hasher};
pub use reader::HashingReader;
