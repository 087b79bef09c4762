use serde::{Deserialize, Serialize};

/// Result of one upload attempt (§3, §4.5). Modeled as a sum type rather than
/// an exception path: every branch of C5's classification step maps onto
/// exactly one variant here, and both success variants are terminal for the
/// worker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum UploadOutcome {
    NewUploaded,
    AlreadyPresent,
    TransientFailure(String),
    PermanentFailure(String),
}

impl UploadOutcome {
    /// Both success branches end the record's lifecycle for this worker.
    pub fn is_terminal_success(&self) -> bool {
        matches!(self, Self::NewUploaded | Self::AlreadyPresent)
    }

    pub fn is_new_upload(&self) -> bool {
        matches!(self, Self::NewUploaded)
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::TransientFailure(_))
    }
}
