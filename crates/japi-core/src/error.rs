use thiserror::Error;

/// Core error types for resource graph construction
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Duplicate resource type: {0}")]
    DuplicateResourceType(String),

    #[error("Duplicate public name '{public_name}' (declared by {first} and {second})")]
    DuplicatePublicName {
        public_name: String,
        first: String,
        second: String,
    },

    #[error("Unknown resource type: {0}")]
    UnknownResourceType(String),

    #[error("Relationship {resource_type}.{relationship} targets unknown resource type '{target}'")]
    UnknownRelationshipTarget {
        resource_type: String,
        relationship: String,
        target: String,
    },

    #[error("Invalid type hierarchy for {resource_type}: {message}")]
    InvalidHierarchy {
        resource_type: String,
        message: String,
    },

    #[error("Duplicate field '{field}' on resource type {resource_type}")]
    DuplicateField {
        resource_type: String,
        field: String,
    },

    #[error("Invalid resource model: {message}")]
    InvalidModel { message: String },

    #[error("JSON model parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("TOML model parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("I/O error reading model: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a new UnknownResourceType error
    pub fn unknown_resource_type(name: impl Into<String>) -> Self {
        Self::UnknownResourceType(name.into())
    }

    /// Create a new InvalidHierarchy error
    pub fn invalid_hierarchy(resource_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidHierarchy {
            resource_type: resource_type.into(),
            message: message.into(),
        }
    }

    /// Create a new DuplicateField error
    pub fn duplicate_field(resource_type: impl Into<String>, field: impl Into<String>) -> Self {
        Self::DuplicateField {
            resource_type: resource_type.into(),
            field: field.into(),
        }
    }

    /// Create a new InvalidModel error
    pub fn invalid_model(message: impl Into<String>) -> Self {
        Self::InvalidModel {
            message: message.into(),
        }
    }

    /// Get error category for logging/monitoring
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::DuplicateResourceType(_)
            | Self::DuplicatePublicName { .. }
            | Self::DuplicateField { .. } => ErrorCategory::Conflict,
            Self::UnknownResourceType(_) | Self::UnknownRelationshipTarget { .. } => {
                ErrorCategory::NotFound
            }
            Self::InvalidHierarchy { .. } | Self::InvalidModel { .. } => ErrorCategory::Validation,
            Self::JsonError(_) | Self::TomlError(_) => ErrorCategory::Serialization,
            Self::Io(_) => ErrorCategory::System,
        }
    }
}

/// Error categories for monitoring and classification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    NotFound,
    Conflict,
    Serialization,
    System,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation => write!(f, "validation"),
            Self::NotFound => write!(f, "not_found"),
            Self::Conflict => write!(f, "conflict"),
            Self::Serialization => write!(f, "serialization"),
            Self::System => write!(f, "system"),
        }
    }
}

/// Convenience result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
