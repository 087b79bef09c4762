//! C3: the three-layer dedup cache (local progress, peer progress, remote
//! mirror) and its refresh triggers.

mod cache;
mod trigger;

pub use cache::{DedupCache, DedupMatch};
pub use trigger::RefreshTrigger;
