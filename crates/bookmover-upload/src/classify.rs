use bookmover_catalog::{Error as CatalogError, UploadResponse, UploadStatus};
use bookmover_model::UploadOutcome;

/// Maps a target-service response (or the error it failed with) onto the
/// retry-governing outcome (§4.5). Transport errors are split on whether
/// the underlying status looks transient (timeouts, connection failures,
/// 5xx) or permanent (anything else, including well-formed 4xx rejections
/// the target already classified for us).
pub fn classify(result: Result<UploadResponse, CatalogError>) -> UploadOutcome {
    match result {
        Ok(response) => match response.status {
            UploadStatus::New => UploadOutcome::NewUploaded,
            UploadStatus::Duplicate => UploadOutcome::AlreadyPresent,
            UploadStatus::SizeRejected | UploadStatus::ValidationRejected => {
                UploadOutcome::PermanentFailure(format!("{:?}", response.status))
            }
            UploadStatus::ServerError => UploadOutcome::TransientFailure("server error".into()),
        },
        Err(CatalogError::Request(e)) => {
            if e.is_timeout() || e.is_connect() {
                UploadOutcome::TransientFailure(e.to_string())
            } else if e.status().is_some_and(|s| s.is_server_error()) {
                UploadOutcome::TransientFailure(e.to_string())
            } else {
                UploadOutcome::PermanentFailure(e.to_string())
            }
        }
        Err(CatalogError::UnexpectedStatus(code)) if (500..600).contains(&code) => {
            UploadOutcome::TransientFailure(format!("unexpected status {code}"))
        }
        Err(other) => UploadOutcome::PermanentFailure(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bookmover_catalog::UploadResponse;

    fn response(status: UploadStatus) -> UploadResponse {
        UploadResponse {
            status,
            server_fingerprint: None,
        }
    }

    #[test]
    fn new_upload_is_terminal_success() {
        let outcome = classify(Ok(response(UploadStatus::New)));
        assert!(outcome.is_new_upload());
        assert!(outcome.is_terminal_success());
    }

    #[test]
    fn duplicate_is_already_present() {
        let outcome = classify(Ok(response(UploadStatus::Duplicate)));
        assert_eq!(outcome, UploadOutcome::AlreadyPresent);
        assert!(outcome.is_terminal_success());
    }

    #[test]
    fn size_rejected_is_permanent_and_not_retryable() {
        let outcome = classify(Ok(response(UploadStatus::SizeRejected)));
        assert!(matches!(outcome, UploadOutcome::PermanentFailure(_)));
        assert!(!outcome.is_retryable());
    }

    #[test]
    fn server_error_status_is_transient_and_retryable() {
        let outcome = classify(Ok(response(UploadStatus::ServerError)));
        assert!(matches!(outcome, UploadOutcome::TransientFailure(_)));
        assert!(outcome.is_retryable());
    }

    #[test]
    fn unexpected_5xx_status_is_transient() {
        let outcome = classify(Err(CatalogError::UnexpectedStatus(503)));
        assert!(matches!(outcome, UploadOutcome::TransientFailure(_)));
    }

    #[test]
    fn unexpected_4xx_status_is_permanent() {
        let outcome = classify(Err(CatalogError::UnexpectedStatus(400)));
        assert!(matches!(outcome, UploadOutcome::PermanentFailure(_)));
    }
}
