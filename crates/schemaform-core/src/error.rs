//! Error types for the schemaform workspace.
//!
//! Two kinds of failure exist in this system. Structural errors (a schema
//! defined twice, a choice widget without an option source, an unknown form
//! style) are caller mistakes and surface as [`FormError`] values returned
//! from construction or rendering. Per-field validation failures are part of
//! normal form processing: they are represented by [`ValidationError`] and
//! accumulate into a per-field error map on the form instance.

use std::fmt;

use thiserror::Error;

/// A single validation failure reported by a validator.
///
/// Carries a human-readable message and a short machine-readable code
/// (e.g. `"invalid"`, `"too_long"`, `"not_in_set"`).
///
/// # Examples
///
/// ```
/// use schemaform_core::error::ValidationError;
///
/// let err = ValidationError::new("Enter a whole number.", "invalid");
/// assert_eq!(err.to_string(), "Enter a whole number.");
/// assert_eq!(err.code, "invalid");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// The error message shown next to the offending control.
    pub message: String,
    /// A short code identifying the kind of failure.
    pub code: String,
}

impl ValidationError {
    /// Creates a new `ValidationError` with a message and code.
    pub fn new(message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code: code.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ValidationError {}

/// The primary error type for the schemaform workspace.
///
/// Every variant except [`FormError::Validation`] is structural: the schema
/// or form was misconfigured and the request cannot proceed. Validation
/// failures are recoverable and normally travel through the per-field error
/// map rather than this enum; the variant exists for callers that want to
/// promote a single validator failure into a hard error.
#[derive(Error, Debug)]
pub enum FormError {
    /// A field name was registered twice in the same schema.
    #[error("duplicate field definition: {0}")]
    DuplicateField(String),

    /// A field name contains characters outside `[0-9A-Za-z_]`.
    #[error("invalid field name: {0} (only letters, digits and underscores are allowed)")]
    InvalidFieldName(String),

    /// A choice widget was asked to render a field whose validators expose
    /// no option set.
    #[error("widget cannot determine options for field {0}")]
    UnresolvedOptions(String),

    /// The requested form layout style is not recognized.
    #[error("unsupported form style: {0}")]
    UnknownFormStyle(String),

    /// An upload field had a new file but neither a custom handler nor a
    /// file store was configured.
    #[error("no storage target configured for upload field {0}")]
    MissingStorageTarget(String),

    /// A stored-file reference token could not be parsed back into its
    /// original filename.
    #[error("unrecognized stored file reference: {0}")]
    BadStoredReference(String),

    /// A validator rejected a value.
    #[error("validation failed: {0}")]
    Validation(ValidationError),

    /// A configuration value is missing or invalid.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// An I/O error from the file store.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A convenience type alias for `Result<T, FormError>`.
pub type FormResult<T> = Result<T, FormError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::new("This field is required.", "required");
        assert_eq!(err.to_string(), "This field is required.");
    }

    #[test]
    fn test_form_error_display() {
        let err = FormError::DuplicateField("name".into());
        assert_eq!(err.to_string(), "duplicate field definition: name");

        let err = FormError::UnresolvedOptions("color".into());
        assert!(err.to_string().contains("cannot determine options"));

        let err = FormError::UnknownFormStyle("grid".into());
        assert_eq!(err.to_string(), "unsupported form style: grid");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file missing");
        let err: FormError = io_err.into();
        assert!(err.to_string().contains("file missing"));
    }

    #[test]
    fn test_validation_variant_carries_code() {
        let err = FormError::Validation(ValidationError::new("bad", "invalid"));
        if let FormError::Validation(inner) = &err {
            assert_eq!(inner.code, "invalid");
        } else {
            panic!("expected Validation variant");
        }
    }
}
