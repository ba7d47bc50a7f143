//! JSON:API schema synthesis.
//!
//! Every component of one document build operates on an explicit
//! [`SynthesisContext`]: the resource graph being described, the structural
//! generator, and the per-build state (schema repository, literal and
//! identifier caches, relationship shapes and discriminator maps). The
//! context is created for a single build, used sequentially, and consumed
//! into the finished `components.schemas` map.

pub mod discriminator;
pub mod document;
pub mod identifier;
pub mod literal;
pub mod normalizer;
pub mod relationship;
pub mod repository;
pub mod resource_object;
pub mod structural;

use indexmap::IndexMap;
use japi_core::{ClientIdGeneration, NamingConvention, ResourceGraph, ResourceTypeDescriptor, ResourceTypeId, ValueType};

pub use discriminator::DiscriminatorRegistry;
pub use document::{DocumentCategory, DocumentSchemaSynthesizer, DocumentType};
pub use identifier::ResourceIdentifierSchemaFactory;
pub use literal::ResourceTypeLiteralCache;
pub use normalizer::NullabilityNormalizer;
pub use relationship::{Direction, RelationshipSchemaFactory, RelationshipShape};
pub use repository::{Reservation, SchemaHandle, SchemaKey, SchemaRepository};
pub use resource_object::{ResourceObjectSchemaBuilder, ResourceRole};
pub use structural::{DefaultStructuralGenerator, MemberType, ObjectShape, StructuralGenerator};

use crate::error::{Result, SynthesisError};
use crate::model::Schema;

/// Settings that shape generated schemas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Client id policy for types that do not declare one.
    pub default_client_id_generation: ClientIdGeneration,
    /// Emit the `jsonapi` top-level member.
    pub include_jsonapi_object: bool,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            default_client_id_generation: ClientIdGeneration::Forbidden,
            include_jsonapi_object: true,
        }
    }
}

/// State of one document build.
pub struct SynthesisContext<'g> {
    graph: &'g ResourceGraph,
    generator: &'g dyn StructuralGenerator,
    options: SynthesisOptions,
    pub(crate) repository: SchemaRepository,
    pub(crate) literals: ResourceTypeLiteralCache,
    pub(crate) identifiers: ResourceIdentifierSchemaFactory,
    pub(crate) relationships: RelationshipSchemaFactory,
    pub(crate) discriminators: DiscriminatorRegistry,
}

impl<'g> SynthesisContext<'g> {
    pub fn new(graph: &'g ResourceGraph, generator: &'g dyn StructuralGenerator, options: SynthesisOptions) -> Self {
        Self {
            graph,
            generator,
            options,
            repository: SchemaRepository::new(),
            literals: ResourceTypeLiteralCache::default(),
            identifiers: ResourceIdentifierSchemaFactory::default(),
            relationships: RelationshipSchemaFactory::default(),
            discriminators: DiscriminatorRegistry::default(),
        }
    }

    pub fn graph(&self) -> &'g ResourceGraph {
        self.graph
    }

    pub fn options(&self) -> SynthesisOptions {
        self.options
    }

    pub fn repository(&self) -> &SchemaRepository {
        &self.repository
    }

    /// Resolves a type id, failing the build if the graph does not know it.
    pub fn resource_type(&self, id: ResourceTypeId) -> Result<&'g ResourceTypeDescriptor> {
        self.graph
            .get_resource_type(id)
            .ok_or_else(|| SynthesisError::unreachable(format!("resource type {id} is not part of the graph")))
    }

    /// Client id policy of a type, falling back to the configured default.
    pub fn client_id_generation(&self, resource_type: &ResourceTypeDescriptor) -> ClientIdGeneration {
        resource_type
            .client_id_generation
            .unwrap_or(self.options.default_client_id_generation)
    }

    /// Memoized construction with access to the whole context.
    ///
    /// The slot is allocated before `build` runs, so re-entrant requests for
    /// `key` receive the forward handle.
    pub fn get_or_create<F>(&mut self, key: SchemaKey, name: &str, build: F) -> Result<SchemaHandle>
    where
        F: FnOnce(&mut Self, &SchemaHandle) -> Result<Schema>,
    {
        match self.repository.reserve(key, name)? {
            Reservation::Existing(handle) => Ok(handle),
            Reservation::New(handle) => {
                let body = build(self, &handle)?;
                self.repository.fill(&handle, body)?;
                Ok(handle)
            }
        }
    }

    pub fn generate_object(&mut self, shape: &ObjectShape) -> Result<Schema> {
        self.generator.generate_object(shape, &mut self.repository)
    }

    pub fn generate_value(&mut self, value_type: &ValueType) -> Result<Schema> {
        self.generator.generate_value(value_type, &mut self.repository)
    }

    pub fn define_shape(&mut self, shape: &ObjectShape) -> Result<Schema> {
        self.generator.define_shape(shape, &mut self.repository)
    }

    /// Finishes the build.
    ///
    /// # Errors
    ///
    /// Fails if any reserved schema was never given a body.
    pub fn into_components(self) -> Result<IndexMap<String, Schema>> {
        self.repository.into_components()
    }
}

/// Joins name parts into a camel-cased component name, e.g.
/// `["blog-posts", "DataInResponse"]` becomes `blogPostsDataInResponse`.
pub(crate) fn schema_name(parts: &[&str]) -> String {
    let mut name = String::new();
    for (i, part) in parts.iter().enumerate() {
        if i == 0 {
            name.push_str(&NamingConvention::CamelCase.apply(part));
        } else {
            name.push_str(&NamingConvention::PascalCase.apply(part));
        }
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_name() {
        assert_eq!(schema_name(&["blog-posts", "DataInResponse"]), "blogPostsDataInResponse");
        assert_eq!(schema_name(&["nullable", "toOne", "people", "InResponse"]), "nullableToOnePeopleInResponse");
        assert_eq!(schema_name(&["order_lines", "Identifier"]), "orderLinesIdentifier");
    }

    #[test]
    fn test_unknown_type_is_unreachable() {
        let other = japi_core::ResourceGraphBuilder::new()
            .resource(japi_core::ResourceDefinition::new("Widget"))
            .build()
            .unwrap();
        let foreign_id = other.list_resource_types()[0].id;

        let graph = ResourceGraph::empty();
        let generator = DefaultStructuralGenerator;
        let ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());
        let err = ctx.resource_type(foreign_id).unwrap_err();
        assert!(matches!(err, SynthesisError::UnreachableConfiguration(_)));
    }
}
