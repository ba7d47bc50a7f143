//! Error types for OpenAPI synthesis.
//!
//! A synthesis error aborts the build of one OpenAPI document. Errors carry
//! an HTTP status and a stable code so the hosting server can render them as
//! JSON:API error documents.

use thiserror::Error;

/// Errors raised while synthesizing an OpenAPI document.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// A schema was requested for a document type that cannot be built.
    #[error("Unreachable configuration: {0}")]
    UnreachableConfiguration(String),

    /// A schema name is already bound to a different body or identity.
    #[error("Conflicting definition for schema '{name}': {message}")]
    ConflictingDefinition { name: String, message: String },

    /// A forward reference was never given a body.
    #[error("Schema '{0}' was referenced but never defined")]
    UnresolvedHandle(String),

    /// No document with this name is configured.
    #[error("OpenAPI document '{0}' is not configured")]
    DocumentNotFound(String),
}

impl SynthesisError {
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::UnreachableConfiguration(message.into())
    }

    pub fn conflict(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConflictingDefinition {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn status_code(&self) -> u16 {
        match self {
            Self::DocumentNotFound(_) => 404,
            Self::UnreachableConfiguration(_)
            | Self::ConflictingDefinition { .. }
            | Self::UnresolvedHandle(_) => 500,
        }
    }

    /// Returns the stable error code used in error documents.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::UnreachableConfiguration(_) => "UNREACHABLE_CONFIGURATION",
            Self::ConflictingDefinition { .. } => "CONFLICTING_DEFINITION",
            Self::UnresolvedHandle(_) => "UNRESOLVED_SCHEMA",
            Self::DocumentNotFound(_) => "DOCUMENT_NOT_FOUND",
        }
    }

    /// Renders the error as a JSON:API error document.
    #[must_use]
    pub fn to_error_document(&self) -> serde_json::Value {
        let title = match self {
            Self::DocumentNotFound(_) => "Not Found",
            _ => "OpenAPI document generation failed",
        };

        serde_json::json!({
            "errors": [{
                "status": self.status_code().to_string(),
                "code": self.error_code(),
                "title": title,
                "detail": self.to_string()
            }]
        })
    }
}

pub type Result<T> = std::result::Result<T, SynthesisError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(SynthesisError::DocumentNotFound("v2".into()).status_code(), 404);
        assert_eq!(SynthesisError::unreachable("x").status_code(), 500);
        assert_eq!(SynthesisError::conflict("meta", "x").status_code(), 500);
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(
            SynthesisError::conflict("people", "different body").error_code(),
            "CONFLICTING_DEFINITION"
        );
        assert_eq!(
            SynthesisError::UnresolvedHandle("people".into()).error_code(),
            "UNRESOLVED_SCHEMA"
        );
    }

    #[test]
    fn test_error_document() {
        let doc = SynthesisError::DocumentNotFound("v9".into()).to_error_document();
        assert_eq!(doc["errors"][0]["status"], "404");
        assert_eq!(doc["errors"][0]["code"], "DOCUMENT_NOT_FOUND");
        assert_eq!(doc["errors"][0]["title"], "Not Found");
    }
}
