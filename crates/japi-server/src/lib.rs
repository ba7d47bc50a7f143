//! # japi-server
//!
//! HTTP host for generated OpenAPI descriptions. Loads the application
//! configuration and the resource model at startup and serves one OpenAPI
//! document per configured name at `/openapi/{document}/openapi.json`.

pub mod config;
pub mod handlers;
pub mod observability;
pub mod server;

pub use server::{AppState, JapiServer, ServerBuilder, StartupError, build_app, load_graph};
