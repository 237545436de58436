//! Error types for filevault.

use thiserror::Error;

/// Common error type for filevault.
///
/// The first four variants are the caller-visible outcomes of the storage
/// core. Everything coming out of the store itself collapses into
/// [`VaultError::Database`].
#[derive(Error, Debug)]
pub enum VaultError {
    /// The referenced entity does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// The entity exists but the requester is not its owner.
    #[error("permission denied: {0}")]
    Permission(String),

    /// Validation error for caller input (missing name, empty upload, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// A referenced folder does not resolve, or the assignment would break
    /// the ownership or acyclicity rules of the hierarchy.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// API token authentication error.
    #[error("authentication error: {0}")]
    Auth(String),

    /// Database error.
    ///
    /// Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl VaultError {
    /// Whether this error is one of the caller-facing outcomes
    /// (as opposed to an internal failure).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            VaultError::NotFound(_)
                | VaultError::Permission(_)
                | VaultError::Validation(_)
                | VaultError::InvalidReference(_)
                | VaultError::Auth(_)
        )
    }
}

impl From<sqlx::Error> for VaultError {
    fn from(e: sqlx::Error) -> Self {
        VaultError::Database(e.to_string())
    }
}

impl From<validator::ValidationErrors> for VaultError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .into_iter()
            .map(|(field, errs)| {
                let messages: Vec<String> = errs
                    .iter()
                    .map(|e| {
                        e.message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| e.code.to_string())
                    })
                    .collect();
                format!("{field}: {}", messages.join(", "))
            })
            .collect();
        fields.sort();
        VaultError::Validation(fields.join("; "))
    }
}

/// Result type alias for filevault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_display() {
        let err = VaultError::NotFound("folder".to_string());
        assert_eq!(err.to_string(), "folder not found");
    }

    #[test]
    fn test_permission_error_display() {
        let err = VaultError::Permission("folder belongs to another user".to_string());
        assert_eq!(
            err.to_string(),
            "permission denied: folder belongs to another user"
        );
    }

    #[test]
    fn test_validation_error_display() {
        let err = VaultError::Validation("no selected file".to_string());
        assert_eq!(err.to_string(), "validation error: no selected file");
    }

    #[test]
    fn test_invalid_reference_display() {
        let err = VaultError::InvalidReference("folder 7".to_string());
        assert_eq!(err.to_string(), "invalid reference: folder 7");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: VaultError = io_err.into();
        assert!(matches!(err, VaultError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_sqlx_error_conversion() {
        let err: VaultError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, VaultError::Database(_)));
        assert!(!err.is_client_error());
    }

    #[test]
    fn test_is_client_error() {
        assert!(VaultError::NotFound("x".into()).is_client_error());
        assert!(VaultError::Permission("x".into()).is_client_error());
        assert!(VaultError::Validation("x".into()).is_client_error());
        assert!(VaultError::InvalidReference("x".into()).is_client_error());
        assert!(!VaultError::Config("x".into()).is_client_error());
    }

    #[test]
    fn test_validation_errors_conversion() {
        let mut errors = validator::ValidationErrors::new();
        errors.add(
            "username",
            validator::ValidationError::new("length").with_message("too short".into()),
        );
        let err: VaultError = errors.into();
        match err {
            VaultError::Validation(msg) => assert_eq!(msg, "username: too short"),
            other => panic!("Expected Validation error, got {other:?}"),
        }
    }
}
