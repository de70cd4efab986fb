//! Error types for the translation engine

use crate::resource::ResourceType;
use thiserror::Error;

/// Result type for translation operations
pub type TranslateResult<T> = Result<T, TranslateError>;

/// Errors that can occur while translating a resource
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslateError {
    /// No resource was supplied
    #[error("Validation failed: resource is nil")]
    MissingResource,

    /// Resource handed to a translator for another type
    #[error("Validation failed: expected resource type {expected}, got {actual}")]
    TypeMismatch {
        expected: ResourceType,
        actual: ResourceType,
    },

    /// Resource has an empty id
    #[error("Validation failed: resource ID is required")]
    MissingId,

    /// No translator registered for a resource type
    #[error("No mapper registered for resource type: {0}")]
    TranslatorNotFound(ResourceType),

    /// Translation was cancelled before it started
    #[error("Translation cancelled")]
    Cancelled,

    /// Translator-specific failure
    #[error("Translation failed: {0}")]
    Translation(String),
}

impl TranslateError {
    /// Whether this error comes from the shared structural validation
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            TranslateError::MissingResource
                | TranslateError::TypeMismatch { .. }
                | TranslateError::MissingId
        )
    }
}
