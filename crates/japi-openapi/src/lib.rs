//! # japi-openapi
//!
//! OpenAPI 3.0 document synthesis for JSON:API resource graphs.
//!
//! Given a [`japi_core::ResourceGraph`], this crate produces an OpenAPI
//! document whose component schemas describe the exact JSON:API request and
//! response bodies of every exposed endpoint: primary, secondary and
//! identifier documents, resource objects per direction, relationship
//! objects, discriminated type hierarchies, and the error document.
//!
//! ## Layout
//!
//! - [`schema`]: the synthesis engine. All components of one build share a
//!   [`schema::SynthesisContext`].
//! - [`paths`] and [`ordering`]: endpoints and their stable order.
//! - [`cache`]: per `(document, host, base path)` memoization.
//! - [`service`]: [`OpenApiGenerator`] and the cached [`OpenApiService`].
//!
//! ## Example
//!
//! ```ignore
//! let graph = Arc::new(definition.build()?);
//! let service = OpenApiService::new(graph, OpenApiConfig::default());
//! let document = service.document("v1", "https", "api.example.com", "")?;
//! println!("{}", document.to_json_pretty()?);
//! ```

pub mod cache;
pub mod config;
pub mod error;
pub mod model;
pub mod openapi;
pub mod ordering;
pub mod paths;
pub mod schema;
pub mod service;

pub use cache::{DocumentCache, DocumentKey};
pub use config::{DocumentConfig, OpenApiConfig};
pub use error::{Result, SynthesisError};
pub use model::Schema;
pub use openapi::{JSONAPI_MEDIA_TYPE, OpenApiDocument};
pub use ordering::{EndpointOrderingPass, EndpointSortKey};
pub use paths::{PathEntry, PathGenerator};
pub use schema::{SynthesisContext, SynthesisOptions};
pub use service::{OpenApiGenerator, OpenApiService};
