//! OpenAPI configuration.
//!
//! Configuration is read from `japi.toml` under the `[openapi]` section.
//!
//! # Example Configuration
//!
//! ```toml
//! [openapi]
//! enabled = true
//! title = "Shop API"
//! include_jsonapi_object = true
//! default_client_id_generation = "forbidden"
//!
//! [[openapi.documents]]
//! name = "v1"
//!
//! [[openapi.documents]]
//! name = "catalog"
//! title = "Catalog API"
//! resources = ["products", "categories"]
//! ```

use japi_core::ClientIdGeneration;
use serde::{Deserialize, Serialize};

use crate::schema::SynthesisOptions;

/// OpenAPI generation configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenApiConfig {
    /// Serve generated documents over HTTP.
    /// Default: true
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// `info.title` of every generated document unless a document overrides it.
    #[serde(default = "default_title")]
    pub title: String,

    /// `info.version` of every generated document.
    #[serde(default = "default_api_version")]
    pub api_version: String,

    /// Value of the top-level `openapi` field.
    /// Default: "3.0.4"
    #[serde(default = "default_openapi_version")]
    pub openapi_version: String,

    /// Emit the `jsonapi` top-level member in document schemas.
    /// Default: true
    #[serde(default = "default_include_jsonapi_object")]
    pub include_jsonapi_object: bool,

    /// Client id policy for resource types that do not declare their own.
    #[serde(default)]
    pub default_client_id_generation: ClientIdGeneration,

    /// Named documents that can be requested.
    /// Default: a single document named "v1" covering every resource type.
    #[serde(default = "default_documents")]
    pub documents: Vec<DocumentConfig>,
}

/// One named OpenAPI document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentConfig {
    pub name: String,

    /// Overrides the global title.
    #[serde(default)]
    pub title: Option<String>,

    /// Public names of the resource types to include. Empty means all.
    #[serde(default)]
    pub resources: Vec<String>,
}

impl DocumentConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            title: None,
            resources: Vec::new(),
        }
    }

    /// Whether the resource type with this public name belongs to the document.
    pub fn includes(&self, public_name: &str) -> bool {
        self.resources.is_empty() || self.resources.iter().any(|r| r == public_name)
    }
}

fn default_enabled() -> bool {
    true
}

fn default_title() -> String {
    "JSON:API".to_string()
}

fn default_api_version() -> String {
    "1.0".to_string()
}

fn default_openapi_version() -> String {
    "3.0.4".to_string()
}

fn default_include_jsonapi_object() -> bool {
    true
}

fn default_documents() -> Vec<DocumentConfig> {
    vec![DocumentConfig::new("v1")]
}

impl Default for OpenApiConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            title: default_title(),
            api_version: default_api_version(),
            openapi_version: default_openapi_version(),
            include_jsonapi_object: default_include_jsonapi_object(),
            default_client_id_generation: ClientIdGeneration::default(),
            documents: default_documents(),
        }
    }
}

impl OpenApiConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration values are invalid.
    pub fn validate(&self) -> Result<(), String> {
        if !self.openapi_version.starts_with("3.") {
            return Err(format!(
                "openapi.openapi_version must be a 3.x version, got '{}'",
                self.openapi_version
            ));
        }
        if self.title.trim().is_empty() {
            return Err("openapi.title must not be empty".into());
        }

        let mut seen = std::collections::HashSet::new();
        for document in &self.documents {
            if document.name.is_empty()
                || !document
                    .name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.')
            {
                return Err(format!(
                    "openapi.documents: invalid document name '{}'",
                    document.name
                ));
            }
            if !seen.insert(document.name.as_str()) {
                return Err(format!(
                    "openapi.documents: duplicate document name '{}'",
                    document.name
                ));
            }
        }
        Ok(())
    }

    pub fn find_document(&self, name: &str) -> Option<&DocumentConfig> {
        self.documents.iter().find(|d| d.name == name)
    }

    /// Converts this config to the options consumed by the synthesizer.
    #[must_use]
    pub fn to_synthesis_options(&self) -> SynthesisOptions {
        SynthesisOptions {
            default_client_id_generation: self.default_client_id_generation,
            include_jsonapi_object: self.include_jsonapi_object,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = OpenApiConfig::default();
        assert!(config.enabled);
        assert_eq!(config.openapi_version, "3.0.4");
        assert!(config.include_jsonapi_object);
        assert_eq!(config.default_client_id_generation, ClientIdGeneration::Forbidden);
        assert_eq!(config.documents, vec![DocumentConfig::new("v1")]);
    }

    #[test]
    fn test_valid_config() {
        assert!(OpenApiConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_openapi_version() {
        let config = OpenApiConfig {
            openapi_version: "2.0".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_document_names() {
        let config = OpenApiConfig {
            documents: vec![DocumentConfig::new("v1"), DocumentConfig::new("v1")],
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.contains("duplicate"));
    }

    #[test]
    fn test_invalid_document_name() {
        let config = OpenApiConfig {
            documents: vec![DocumentConfig::new("v1/../x")],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_document_resource_filter() {
        let mut document = DocumentConfig::new("catalog");
        assert!(document.includes("anything"));
        document.resources = vec!["products".into()];
        assert!(document.includes("products"));
        assert!(!document.includes("orders"));
    }

    #[test]
    fn test_deserialize_from_toml() {
        let toml = r#"
            title = "Shop API"
            include_jsonapi_object = false
            default_client_id_generation = "allowed"

            [[documents]]
            name = "catalog"
            resources = ["products"]
        "#;

        let config: OpenApiConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.title, "Shop API");
        assert!(!config.include_jsonapi_object);
        assert_eq!(config.default_client_id_generation, ClientIdGeneration::Allowed);
        assert_eq!(config.documents.len(), 1);
        assert_eq!(config.find_document("catalog").unwrap().resources, vec!["products"]);
        assert!(config.find_document("v1").is_none());

        let options = config.to_synthesis_options();
        assert!(!options.include_jsonapi_object);
    }
}
