//! C9: the Advisory Oracle client. Purely advisory — every caller of
//! [`OracleClient::analyze`] must validate the recommendation before acting
//! on it; this crate never applies anything itself.

mod client;
mod diagnostics;
mod error;
mod patch;
mod response;

pub use client::{HttpOracleClient, OracleClient};
pub use diagnostics::{Diagnostics, RecurrenceInfo};
pub use error::{Error, Result};
pub use patch::PatchSpec;
pub use response::{parse_recommendation, Recommendation};
