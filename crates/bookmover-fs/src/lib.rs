//! Atomic file primitives shared by the progress store (C4) and the
//! archive worker's staging directory (C7).

mod atomic_write;
mod error;

pub use atomic_write::{atomic_read, atomic_write, AtomicWriteOptions, WriteMode};
pub use error::{Error, Result};
