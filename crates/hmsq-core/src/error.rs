//! Error types for the metastore connector.
//!
//! Every fallible operation in this crate returns [`Result`]. Errors carry a
//! classification code, a human message, and optional diagnostic detail; the
//! retryable flag is derived from the classification. No error path relies on
//! panicking or unwinding across the connector boundary.

use thiserror::Error;

/// Result type alias for metastore operations.
pub type Result<T> = std::result::Result<T, MetastoreError>;

/// Error classification for connector operations.
///
/// `Ok` exists for diagnostic rendering of the "no error" state; a successful
/// operation is represented by `Result::Ok`, never by an error value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// No error
    Ok,
    /// The remote confirmed the entity does not exist
    NotFound,
    /// The remote rejected the caller's credentials or grants
    PermissionDenied,
    /// Network failure, protocol mismatch, truncated payload, or remote
    /// application exception
    Transient,
    /// Bad endpoint or missing local configuration; the caller must fix input
    InvalidConfig,
    /// Recognized but unhandled remote format or feature
    Unsupported,
}

impl ErrorCode {
    /// Stable string form, used in logs and CLI output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Ok => "Ok",
            ErrorCode::NotFound => "NotFound",
            ErrorCode::PermissionDenied => "PermissionDenied",
            ErrorCode::Transient => "Transient",
            ErrorCode::InvalidConfig => "InvalidConfig",
            ErrorCode::Unsupported => "Unsupported",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error type for metastore operations.
///
/// Variants map one-to-one onto [`ErrorCode`]. `detail` carries only the
/// remote message text or a redacted local description; secrets never appear
/// in either field.
#[derive(Error, Debug, Clone)]
pub enum MetastoreError {
    /// Entity does not exist on the remote
    #[error("not found: {message}")]
    NotFound {
        /// Human-readable description
        message: String,
        /// Optional diagnostic detail
        detail: Option<String>,
    },

    /// Access denied by the remote
    #[error("permission denied: {message}")]
    PermissionDenied {
        /// Human-readable description
        message: String,
        /// Optional diagnostic detail
        detail: Option<String>,
    },

    /// Possibly-recoverable failure (network, protocol, remote exception)
    #[error("transient metastore failure: {message}")]
    Transient {
        /// Human-readable description
        message: String,
        /// Optional diagnostic detail
        detail: Option<String>,
    },

    /// Invalid local configuration
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Human-readable description
        message: String,
        /// Optional diagnostic detail
        detail: Option<String>,
    },

    /// Recognized but unhandled remote feature
    #[error("unsupported: {message}")]
    Unsupported {
        /// Human-readable description
        message: String,
        /// Optional diagnostic detail
        detail: Option<String>,
    },
}

impl MetastoreError {
    /// Construct a `NotFound` error.
    pub fn not_found(message: impl Into<String>) -> Self {
        MetastoreError::NotFound {
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a `PermissionDenied` error.
    pub fn permission_denied(message: impl Into<String>) -> Self {
        MetastoreError::PermissionDenied {
            message: message.into(),
            detail: None,
        }
    }

    /// Construct a `Transient` error.
    pub fn transient(message: impl Into<String>) -> Self {
        MetastoreError::Transient {
            message: message.into(),
            detail: None,
        }
    }

    /// Construct an `InvalidConfig` error.
    pub fn invalid_config(message: impl Into<String>) -> Self {
        MetastoreError::InvalidConfig {
            message: message.into(),
            detail: None,
        }
    }

    /// Construct an `Unsupported` error.
    pub fn unsupported(message: impl Into<String>) -> Self {
        MetastoreError::Unsupported {
            message: message.into(),
            detail: None,
        }
    }

    /// Attach diagnostic detail (remote message text or a redacted local
    /// description).
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        let d = detail.into();
        match &mut self {
            MetastoreError::NotFound { detail, .. }
            | MetastoreError::PermissionDenied { detail, .. }
            | MetastoreError::Transient { detail, .. }
            | MetastoreError::InvalidConfig { detail, .. }
            | MetastoreError::Unsupported { detail, .. } => *detail = Some(d),
        }
        self
    }

    /// The classification code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            MetastoreError::NotFound { .. } => ErrorCode::NotFound,
            MetastoreError::PermissionDenied { .. } => ErrorCode::PermissionDenied,
            MetastoreError::Transient { .. } => ErrorCode::Transient,
            MetastoreError::InvalidConfig { .. } => ErrorCode::InvalidConfig,
            MetastoreError::Unsupported { .. } => ErrorCode::Unsupported,
        }
    }

    /// Whether a caller-side retry loop may re-attempt the operation.
    ///
    /// Only `Transient` failures are retryable; this includes protocol-level
    /// failures such as version or correlation mismatches, which keep their
    /// historical transient classification.
    pub fn retryable(&self) -> bool {
        matches!(self, MetastoreError::Transient { .. })
    }

    /// Diagnostic detail, if any.
    pub fn detail(&self) -> Option<&str> {
        match self {
            MetastoreError::NotFound { detail, .. }
            | MetastoreError::PermissionDenied { detail, .. }
            | MetastoreError::Transient { detail, .. }
            | MetastoreError::InvalidConfig { detail, .. }
            | MetastoreError::Unsupported { detail, .. } => detail.as_deref(),
        }
    }
}

impl From<std::io::Error> for MetastoreError {
    fn from(err: std::io::Error) -> Self {
        MetastoreError::transient(format!("I/O error: {}", err))
    }
}

impl From<toml::de::Error> for MetastoreError {
    fn from(err: toml::de::Error) -> Self {
        MetastoreError::invalid_config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = MetastoreError::invalid_config("bad endpoint");
        assert_eq!(err.to_string(), "invalid configuration: bad endpoint");
        assert_eq!(err.code(), ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_retryable_classification() {
        assert!(MetastoreError::transient("socket reset").retryable());
        assert!(!MetastoreError::not_found("no such table").retryable());
        assert!(!MetastoreError::permission_denied("denied").retryable());
        assert!(!MetastoreError::invalid_config("bad uri").retryable());
        assert!(!MetastoreError::unsupported("delta").retryable());
    }

    #[test]
    fn test_detail_attachment() {
        let err = MetastoreError::transient("remote exception")
            .with_detail("Internal error processing get_table");
        assert_eq!(err.detail(), Some("Internal error processing get_table"));
    }

    #[test]
    fn test_io_error_maps_to_transient() {
        let io = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "short read");
        let err: MetastoreError = io.into();
        assert_eq!(err.code(), ErrorCode::Transient);
        assert!(err.retryable());
    }

    #[test]
    fn test_code_strings() {
        assert_eq!(ErrorCode::Ok.as_str(), "Ok");
        assert_eq!(ErrorCode::Transient.to_string(), "Transient");
    }
}
