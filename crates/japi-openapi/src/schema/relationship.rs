//! Relationship objects (the members under `relationships`).

use std::collections::HashMap;

use japi_core::{Cardinality, RelationshipField, ResourceTypeId};
use tracing::trace;

use super::structural::relationship_object_shape;
use super::{DocumentCategory, ResourceIdentifierSchemaFactory, SchemaHandle, SchemaKey, SynthesisContext, schema_name};
use crate::error::Result;
use crate::model::Schema;

/// Whether a schema describes a response or a request body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Response,
    Request,
}

impl Direction {
    fn suffix(self) -> &'static str {
        match self {
            Self::Response => "InResponse",
            Self::Request => "InRequest",
        }
    }
}

/// Everything a relationship object's shape depends on.
///
/// Two relationships with the same target, cardinality, direction and
/// nullability share one schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RelationshipShape {
    pub target: ResourceTypeId,
    pub cardinality: Cardinality,
    pub direction: Direction,
    pub nullable: bool,
}

#[derive(Debug, Default)]
pub struct RelationshipSchemaFactory {
    handles: HashMap<RelationshipShape, SchemaHandle>,
}

impl RelationshipSchemaFactory {
    pub fn build(
        ctx: &mut SynthesisContext<'_>,
        relationship: &RelationshipField,
        category: DocumentCategory,
    ) -> Result<SchemaHandle> {
        let direction = category.direction();
        let shape = RelationshipShape {
            target: relationship.target,
            cardinality: relationship.cardinality,
            direction,
            nullable: relationship.is_nullable(),
        };
        if let Some(handle) = ctx.relationships.handles.get(&shape) {
            return Ok(handle.clone());
        }

        let target = ctx.resource_type(relationship.target)?;
        let cardinality = match shape.cardinality {
            Cardinality::ToOne => "toOne",
            Cardinality::ToMany => "toMany",
        };
        let name = if shape.nullable {
            schema_name(&["nullable", cardinality, &target.public_name, direction.suffix()])
        } else {
            schema_name(&[cardinality, &target.public_name, direction.suffix()])
        };
        trace!(relationship = %relationship.name, schema = %name, "relationship shape");

        let handle = ctx.get_or_create(SchemaKey::Relationship(shape), &name, |ctx, _| {
            let identifier = ResourceIdentifierSchemaFactory::get(ctx, target)?;
            let data = match shape.cardinality {
                Cardinality::ToOne if shape.nullable => identifier.to_reference().into_nullable(),
                Cardinality::ToOne => identifier.to_reference(),
                Cardinality::ToMany => Schema::array(identifier.to_reference()),
            };

            let mut body = ctx.generate_object(&relationship_object_shape(direction == Direction::Response))?;
            body.properties.insert("data".into(), data);
            if direction == Direction::Request {
                body.require("data");
            }
            Ok(body)
        })?;
        ctx.relationships.handles.insert(shape, handle.clone());
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DefaultStructuralGenerator, SynthesisOptions};
    use japi_core::{RelationshipDefinition, ResourceDefinition, ResourceGraphBuilder};

    fn graph() -> japi_core::ResourceGraph {
        ResourceGraphBuilder::new()
            .resource(
                ResourceDefinition::new("Article")
                    .relationship(RelationshipDefinition::to_one("author", "Person"))
                    .relationship(RelationshipDefinition::to_one("reviewer", "Person"))
                    .relationship(RelationshipDefinition::to_one("editor", "Person").required())
                    .relationship(RelationshipDefinition::to_many("tags", "Tag")),
            )
            .resource(ResourceDefinition::new("Person"))
            .resource(ResourceDefinition::new("Tag"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_shapes_are_shared_between_relationships() {
        let graph = graph();
        let article = graph.find_by_type_name("Article").unwrap();
        let generator = DefaultStructuralGenerator;
        let mut ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());

        let author = article.find_relationship("author").unwrap();
        let reviewer = article.find_relationship("reviewer").unwrap();
        let editor = article.find_relationship("editor").unwrap();

        let a = RelationshipSchemaFactory::build(&mut ctx, author, DocumentCategory::ResponseSingle).unwrap();
        let b = RelationshipSchemaFactory::build(&mut ctx, reviewer, DocumentCategory::ResponseCollection).unwrap();
        let c = RelationshipSchemaFactory::build(&mut ctx, editor, DocumentCategory::ResponseSingle).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.name(), "nullableToOnePersonsInResponse");
        assert_eq!(c.name(), "toOnePersonsInResponse");
    }

    #[test]
    fn test_data_required_only_in_requests() {
        let graph = graph();
        let article = graph.find_by_type_name("Article").unwrap();
        let generator = DefaultStructuralGenerator;
        let mut ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());
        let tags = article.find_relationship("tags").unwrap();

        let response = RelationshipSchemaFactory::build(&mut ctx, tags, DocumentCategory::ResponseSingle).unwrap();
        let request = RelationshipSchemaFactory::build(&mut ctx, tags, DocumentCategory::UpdateRequest).unwrap();
        assert_eq!(request.name(), "toManyTagsInRequest");

        let response_body = ctx.repository().body(&response).unwrap();
        assert!(response_body.required.is_empty());
        assert!(response_body.properties.contains_key("links"));
        assert_eq!(
            response_body.properties["data"].items.as_deref().and_then(Schema::referenced_name),
            Some("tagsIdentifier")
        );

        let request_body = ctx.repository().body(&request).unwrap();
        assert_eq!(request_body.required, vec!["data"]);
        assert!(!request_body.properties.contains_key("links"));
    }

    #[test]
    fn test_nullable_to_one_data() {
        let graph = graph();
        let article = graph.find_by_type_name("Article").unwrap();
        let generator = DefaultStructuralGenerator;
        let mut ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());
        let author = article.find_relationship("author").unwrap();

        let handle = RelationshipSchemaFactory::build(&mut ctx, author, DocumentCategory::CreateRequest).unwrap();
        let data = &ctx.repository().body(&handle).unwrap().properties["data"];
        assert!(data.is_nullable());
        assert_eq!(data.referenced_name(), Some("personsIdentifier"));
    }
}
