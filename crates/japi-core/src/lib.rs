//! # japi-core
//!
//! Resource graph model for the japi JSON:API description server.
//!
//! The graph is the registry of every resource type the API exposes: public
//! names, attributes, relationships, capability flags, type hierarchies and
//! the endpoints each resource controller offers. It is resolved once from a
//! model file (see [`definition`]) and consumed read-only by the schema
//! synthesis in `japi-openapi`.

pub mod definition;
pub mod error;
pub mod graph;
pub mod naming;
pub mod resource;

pub use definition::{
    AttributeDefinition, EndpointPreset, EndpointsDefinition, RelationshipDefinition,
    ResourceDefinition, ResourceGraphDefinition, ValueTypeDefinition,
};
pub use error::{CoreError, ErrorCategory, Result};
pub use graph::{ResourceGraph, ResourceGraphBuilder};
pub use naming::NamingConvention;
pub use resource::{
    AttributeField, Capabilities, Capability, Cardinality, ClientIdGeneration, EndpointSet,
    EnumType, JsonApiEndpoint, ObjectMember, ObjectType, RelationshipField, ResourceTypeDescriptor,
    ResourceTypeId, ValueType,
};
