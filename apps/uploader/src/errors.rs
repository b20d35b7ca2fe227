use thiserror::Error;

use crate::files_client::FilesError;

/// Application-level error type returned by the command handlers.
/// Rejected files are not errors; they come back as validation buckets.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Files API error: {0}")]
    Files(FilesError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<FilesError> for AppError {
    fn from(e: FilesError) -> Self {
        match e {
            FilesError::Api { status: 404, message } => AppError::NotFound(message),
            FilesError::Api {
                status: 401 | 403,
                message,
            } => AppError::Unauthorized(message),
            other => AppError::Files(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_maps_from_404() {
        let err: AppError = FilesError::Api {
            status: 404,
            message: "File not found".into(),
        }
        .into();
        assert!(matches!(err, AppError::NotFound(m) if m == "File not found"));
    }

    #[test]
    fn test_forbidden_maps_to_unauthorized() {
        let err: AppError = FilesError::Api {
            status: 403,
            message: "Not authorized".into(),
        }
        .into();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[test]
    fn test_other_errors_pass_through() {
        let err: AppError = FilesError::Cancelled.into();
        assert_eq!(err.to_string(), "Files API error: Upload cancelled");
    }
}
