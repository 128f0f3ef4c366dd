//! Error types for the upload workflow.

use std::time::Duration;

/// Coarse classification of an [`UploadError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Missing or invalid input, or no project for the API key.
    Validation,
    /// A backend answered 401.
    Auth,
    /// A backend answered with a status outside the accepted set.
    UnexpectedStatus,
    /// Local file I/O failed.
    Io,
    /// The request could not be sent or its response could not be read.
    Transport,
    /// Polling ran out of budget before a terminal status.
    Timeout,
    /// The backend reported the upload as failed.
    RemoteProcessing,
}

/// Upload errors.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The request is incomplete or points at something that is not a file.
    #[error("{0}")]
    Validation(String),

    /// The metadata service knows no project for this API key.
    #[error("No projects found for the API Key: {api_key}")]
    ProjectNotFound { api_key: String },

    /// The token was rejected.
    #[error("The provided token is expired or invalid ({operation} was unauthorized)")]
    Unauthorized { operation: &'static str },

    #[error("Request failed: {operation} returned {status}. Response Body: {body}")]
    UnexpectedStatus {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("{context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("HTTP request failed during {operation}")]
    Http {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Invalid response from {operation}: {message}")]
    InvalidResponse {
        operation: &'static str,
        message: String,
    },

    #[error("Upload not processed after {}s", .waited.as_secs())]
    Timeout { waited: Duration },

    #[error("Upload processing failed: {reason}")]
    ProcessingFailed { reason: String },
}

impl UploadError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) | Self::ProjectNotFound { .. } => ErrorKind::Validation,
            Self::Unauthorized { .. } => ErrorKind::Auth,
            Self::UnexpectedStatus { .. } => ErrorKind::UnexpectedStatus,
            Self::Io { .. } => ErrorKind::Io,
            Self::Http { .. } | Self::InvalidResponse { .. } => ErrorKind::Transport,
            Self::Timeout { .. } => ErrorKind::Timeout,
            Self::ProcessingFailed { .. } => ErrorKind::RemoteProcessing,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.kind() == ErrorKind::Validation
    }

    /// Build a mapper attaching `context` to an I/O error, for use with `map_err`.
    pub(crate) fn io(context: impl Into<String>) -> impl FnOnce(std::io::Error) -> Self {
        let context = context.into();
        move |source| Self::Io { context, source }
    }

    /// Build a mapper attaching the failing operation to a reqwest error.
    pub(crate) fn http(operation: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| Self::Http { operation, source }
    }
}

/// Result type for upload operations.
pub type UploadResult<T> = Result<T, UploadError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_not_found_is_a_validation_failure() {
        let err = UploadError::ProjectNotFound {
            api_key: "KEY".into(),
        };
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "No projects found for the API Key: KEY");
    }

    #[test]
    fn test_kind() {
        assert_eq!(
            UploadError::Unauthorized {
                operation: "project lookup"
            }
            .kind(),
            ErrorKind::Auth
        );
        assert_eq!(
            UploadError::Timeout {
                waited: Duration::from_secs(60)
            }
            .kind(),
            ErrorKind::Timeout
        );
        assert_eq!(
            UploadError::ProcessingFailed {
                reason: "bad symbols".into()
            }
            .kind(),
            ErrorKind::RemoteProcessing
        );
    }

    #[test]
    fn test_timeout_message() {
        let err = UploadError::Timeout {
            waited: Duration::from_millis(90_500),
        };
        assert_eq!(err.to_string(), "Upload not processed after 90s");
    }

    #[test]
    fn test_io_mapper_keeps_source() {
        let err = UploadError::io("Failed to read mapping.txt")(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "missing",
        ));
        assert_eq!(err.to_string(), "Failed to read mapping.txt");
        assert_eq!(err.kind(), ErrorKind::Io);
        assert!(std::error::Error::source(&err).is_some());
    }
}
