use storefront_core::{AppError, UploadConfig};

/// Validation errors raised before and after an upload is written
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("File too small: {size} bytes (min: {min} bytes)")]
    FileTooSmall { size: u64, min: u64 },

    #[error("File too large: {size} bytes (max: {max} bytes)")]
    FileTooLarge { size: u64, max: u64 },

    #[error("Invalid content type: {content_type} (allowed: {allowed:?})")]
    InvalidContentType {
        content_type: String,
        allowed: Vec<String>,
    },
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::FileTooSmall { size, min } => AppError::FileTooSmall { size, min },
            ValidationError::FileTooLarge { max, .. } => AppError::PayloadTooLarge { max },
            // A refused type is reported exactly like a missing file.
            ValidationError::InvalidContentType { .. } => AppError::NoFileAttached,
        }
    }
}

/// Upload validator
///
/// Holds the type allow-set and the size window. The type check runs before
/// anything is written and compares the declared type verbatim: no case
/// folding, no parameter stripping. The size window is applied to the bytes
/// that actually reached disk.
#[derive(Debug, Clone)]
pub struct UploadValidator {
    min_file_size: u64,
    max_file_size: u64,
    allowed_content_types: Vec<String>,
}

impl UploadValidator {
    pub fn new(min_file_size: u64, max_file_size: u64, allowed_content_types: Vec<String>) -> Self {
        Self {
            min_file_size,
            max_file_size,
            allowed_content_types,
        }
    }

    pub fn from_config(config: &UploadConfig) -> Self {
        Self::new(
            config.min_file_size_bytes,
            config.max_file_size_bytes,
            config.allowed_content_types.clone(),
        )
    }

    pub fn max_file_size(&self) -> u64 {
        self.max_file_size
    }

    /// Whether a declared content type passes the type filter
    pub fn admits(&self, content_type: &str) -> bool {
        self.validate_content_type(content_type).is_ok()
    }

    /// Validate content type
    pub fn validate_content_type(&self, content_type: &str) -> Result<(), ValidationError> {
        if !self
            .allowed_content_types
            .iter()
            .any(|ct| ct == content_type)
        {
            return Err(ValidationError::InvalidContentType {
                content_type: content_type.to_string(),
                allowed: self.allowed_content_types.clone(),
            });
        }

        Ok(())
    }

    /// Reject a size the client announced up front if it is already over the ceiling.
    /// The floor is not checked here; only bytes at rest count for that.
    pub fn validate_declared_size(&self, size: u64) -> Result<(), ValidationError> {
        if size > self.max_file_size {
            return Err(ValidationError::FileTooLarge {
                size,
                max: self.max_file_size,
            });
        }
        Ok(())
    }

    /// Validate the number of bytes written
    pub fn validate_file_size(&self, size: u64) -> Result<(), ValidationError> {
        if size < self.min_file_size {
            return Err(ValidationError::FileTooSmall {
                size,
                min: self.min_file_size,
            });
        }

        self.validate_declared_size(size)
    }
}
