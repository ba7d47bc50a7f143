//! Top-level document schemas.
//!
//! A [`DocumentType`] is the closed classification of everything an endpoint
//! sends or receives: a category plus the resource type it is about. The
//! [`DocumentSchemaSynthesizer`] turns one into a named component, priming
//! the discriminator maps first and running the nullability repair last.

use japi_core::{ResourceTypeDescriptor, ResourceTypeId};
use tracing::debug;

use super::structural::{TopLevelLinks, document_shape, error_document_shape};
use super::{
    DiscriminatorRegistry, Direction, NullabilityNormalizer, ResourceIdentifierSchemaFactory,
    ResourceObjectSchemaBuilder, ResourceRole, SchemaHandle, SchemaKey, SynthesisContext, schema_name,
};
use crate::error::{Result, SynthesisError};
use crate::model::{Discriminator, Schema};

/// What a document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocumentCategory {
    ResponseSingle,
    ResponseCollection,
    CreateRequest,
    UpdateRequest,
    IdentifierResponseSingle,
    IdentifierResponseCollection,
    RelationshipRequestToOne,
    RelationshipRequestToMany,
    ErrorResponse,
}

impl DocumentCategory {
    pub const ALL: [Self; 9] = [
        Self::ResponseSingle,
        Self::ResponseCollection,
        Self::CreateRequest,
        Self::UpdateRequest,
        Self::IdentifierResponseSingle,
        Self::IdentifierResponseCollection,
        Self::RelationshipRequestToOne,
        Self::RelationshipRequestToMany,
        Self::ErrorResponse,
    ];

    pub fn direction(self) -> Direction {
        match self {
            Self::CreateRequest
            | Self::UpdateRequest
            | Self::RelationshipRequestToOne
            | Self::RelationshipRequestToMany => Direction::Request,
            _ => Direction::Response,
        }
    }

    pub fn is_collection(self) -> bool {
        matches!(
            self,
            Self::ResponseCollection | Self::IdentifierResponseCollection | Self::RelationshipRequestToMany
        )
    }

    /// Whether `data` holds resource identifiers rather than resource objects.
    pub fn carries_identifiers(self) -> bool {
        matches!(
            self,
            Self::IdentifierResponseSingle
                | Self::IdentifierResponseCollection
                | Self::RelationshipRequestToOne
                | Self::RelationshipRequestToMany
        )
    }

    /// Whether `data` may be `null` in this category at all.
    pub fn allows_null_data(self) -> bool {
        matches!(
            self,
            Self::ResponseSingle | Self::IdentifierResponseSingle | Self::RelationshipRequestToOne
        )
    }

    fn top_level_links(self) -> Option<TopLevelLinks> {
        match self {
            Self::ResponseSingle => Some(TopLevelLinks::Resource),
            Self::ResponseCollection => Some(TopLevelLinks::ResourceCollection),
            Self::IdentifierResponseSingle => Some(TopLevelLinks::ResourceIdentifier),
            Self::IdentifierResponseCollection => Some(TopLevelLinks::ResourceIdentifierCollection),
            Self::ErrorResponse => Some(TopLevelLinks::Error),
            _ => None,
        }
    }
}

/// A document category together with its element type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DocumentType {
    pub category: DocumentCategory,
    pub element: Option<ResourceTypeId>,
    /// `data` may be `null`; only honoured by single-resource categories.
    pub nullable_data: bool,
}

impl DocumentType {
    pub fn new(category: DocumentCategory, element: ResourceTypeId) -> Self {
        Self {
            category,
            element: Some(element),
            nullable_data: false,
        }
    }

    pub fn error() -> Self {
        Self {
            category: DocumentCategory::ErrorResponse,
            element: None,
            nullable_data: false,
        }
    }

    pub fn with_nullable_data(mut self, nullable: bool) -> Self {
        self.nullable_data = nullable;
        self
    }

    /// The element type of a resource-parameterized document.
    ///
    /// # Errors
    ///
    /// Fails for error documents carrying an element and for resource
    /// documents without one.
    pub fn element_type(&self) -> Result<Option<ResourceTypeId>> {
        match (self.category, self.element) {
            (DocumentCategory::ErrorResponse, None) => Ok(None),
            (DocumentCategory::ErrorResponse, Some(_)) => Err(SynthesisError::unreachable(
                "error documents are not parameterized by a resource type",
            )),
            (category, None) => Err(SynthesisError::unreachable(format!(
                "{category:?} documents need an element resource type"
            ))),
            (_, Some(element)) => Ok(Some(element)),
        }
    }

    fn schema_name(&self, element: &ResourceTypeDescriptor) -> String {
        let name = element.public_name.as_str();
        let nullable = self.nullable_data && self.category.allows_null_data();
        match self.category {
            DocumentCategory::ResponseSingle if nullable => schema_name(&["nullable", name, "SecondaryResponseDocument"]),
            DocumentCategory::ResponseSingle => schema_name(&[name, "PrimaryResponseDocument"]),
            DocumentCategory::ResponseCollection => schema_name(&[name, "CollectionResponseDocument"]),
            DocumentCategory::CreateRequest => schema_name(&[name, "PostRequestDocument"]),
            DocumentCategory::UpdateRequest => schema_name(&[name, "PatchRequestDocument"]),
            DocumentCategory::IdentifierResponseSingle if nullable => {
                schema_name(&["nullable", name, "IdentifierResponseDocument"])
            }
            DocumentCategory::IdentifierResponseSingle => schema_name(&[name, "IdentifierResponseDocument"]),
            DocumentCategory::IdentifierResponseCollection => {
                schema_name(&[name, "IdentifierCollectionResponseDocument"])
            }
            DocumentCategory::RelationshipRequestToOne if nullable => {
                schema_name(&["nullable", "toOne", name, "RequestDocument"])
            }
            DocumentCategory::RelationshipRequestToOne => schema_name(&["toOne", name, "RequestDocument"]),
            DocumentCategory::RelationshipRequestToMany => schema_name(&["toMany", name, "RequestDocument"]),
            DocumentCategory::ErrorResponse => ERROR_DOCUMENT.to_string(),
        }
    }

    /// Memoization identity; the nullable flag only counts where honoured.
    fn key(&self) -> SchemaKey {
        SchemaKey::Document(Self {
            nullable_data: self.nullable_data && self.category.allows_null_data(),
            ..*self
        })
    }
}

const ERROR_DOCUMENT: &str = "errorResponseDocument";

pub struct DocumentSchemaSynthesizer;

impl DocumentSchemaSynthesizer {
    /// Builds (once) the schema of `document_type` and returns its handle.
    pub fn synthesize(ctx: &mut SynthesisContext<'_>, document_type: DocumentType) -> Result<SchemaHandle> {
        let Some(element_id) = document_type.element_type()? else {
            return Self::error_document(ctx);
        };
        let element = ctx.resource_type(element_id)?;
        if let Some(handle) = ctx.repository().lookup(&document_type.key()) {
            return Ok(handle);
        }

        let category = document_type.category;
        debug!(resource = %element.public_name, ?category, "synthesizing document schema");

        if let Some(role) = ResourceRole::for_category(category) {
            if element.is_polymorphic() {
                DiscriminatorRegistry::register_hierarchy(ctx, element, role)?;
            }
            if role == ResourceRole::Response {
                DiscriminatorRegistry::ensure_reachable_subtypes_registered(ctx, element)?;
            }
        }

        let name = document_type.schema_name(element);
        let handle = ctx.get_or_create(document_type.key(), &name, |ctx, _| {
            Self::resource_document(ctx, document_type, element)
        })?;
        NullabilityNormalizer::normalize(&mut ctx.repository, &handle)?;
        Ok(handle)
    }

    fn resource_document(
        ctx: &mut SynthesisContext<'_>,
        document_type: DocumentType,
        element: &ResourceTypeDescriptor,
    ) -> Result<Schema> {
        let category = document_type.category;
        let with_included = matches!(
            category,
            DocumentCategory::ResponseSingle | DocumentCategory::ResponseCollection
        );
        let mut body = ctx.generate_object(&document_shape(category.top_level_links(), with_included))?;

        let mut data = Self::element_schema(ctx, category, element)?;
        if category.is_collection() {
            data = Schema::array(data);
        } else if document_type.nullable_data && category.allows_null_data() {
            data.make_nullable();
        }
        body.properties.insert("data".into(), data);

        if with_included {
            match Self::included(ctx, element)? {
                Some(included) => {
                    body.properties.insert("included".into(), included);
                }
                None => {
                    body.remove_property("included");
                }
            }
        }

        if !ctx.options().include_jsonapi_object {
            body.remove_property("jsonapi");
        }
        Ok(body)
    }

    /// Schema of one `data` element.
    fn element_schema(
        ctx: &mut SynthesisContext<'_>,
        category: DocumentCategory,
        element: &ResourceTypeDescriptor,
    ) -> Result<Schema> {
        if category.carries_identifiers() {
            return Ok(ResourceIdentifierSchemaFactory::get(ctx, element)?.to_reference());
        }
        let role = ResourceRole::for_category(category)
            .ok_or_else(|| SynthesisError::unreachable(format!("{category:?} has no resource role")))?;
        let handle = if element.has_sub_types() {
            DiscriminatorRegistry::ensure_abstract_schema(ctx, element, role)?
        } else {
            ResourceObjectSchemaBuilder::build_for_role(ctx, element, role)?
        };
        Ok(handle.to_reference())
    }

    /// `included` array over every concrete type reachable from `element`.
    fn included(ctx: &mut SynthesisContext<'_>, element: &ResourceTypeDescriptor) -> Result<Option<Schema>> {
        let reachable = ctx.graph().reachable_related_types(element.id);
        let mut variants = Vec::new();
        let mut discriminator = Discriminator::new("type");
        for resource_type in reachable.into_iter().filter(|t| !t.is_abstract) {
            let handle = ResourceObjectSchemaBuilder::build_for_role(ctx, resource_type, ResourceRole::Response)?;
            discriminator
                .mapping
                .insert(resource_type.public_name.clone(), handle.reference_path());
            variants.push(handle.to_reference());
        }
        if variants.is_empty() {
            return Ok(None);
        }

        let items = Schema {
            one_of: variants,
            discriminator: Some(discriminator),
            ..Default::default()
        };
        Ok(Some(Schema::array(items)))
    }

    fn error_document(ctx: &mut SynthesisContext<'_>) -> Result<SchemaHandle> {
        let key = DocumentType::error().key();
        if let Some(handle) = ctx.repository().lookup(&key) {
            return Ok(handle);
        }
        let handle = ctx.get_or_create(key, ERROR_DOCUMENT, |ctx, _| {
            let mut body = ctx.generate_object(&error_document_shape())?;
            if let Some(errors) = body.properties.get_mut("errors") {
                errors.clear_nullable();
            }
            if !ctx.options().include_jsonapi_object {
                body.remove_property("jsonapi");
            }
            Ok(body)
        })?;
        NullabilityNormalizer::normalize(&mut ctx.repository, &handle)?;
        Ok(handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DefaultStructuralGenerator, SynthesisOptions};
    use japi_core::{ResourceDefinition, ResourceGraph, ResourceGraphBuilder};

    fn graph() -> ResourceGraph {
        ResourceGraphBuilder::new()
            .resource(ResourceDefinition::new("Person"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_element_extraction() {
        assert!(DocumentType::error().element_type().unwrap().is_none());
        let bad = DocumentType {
            category: DocumentCategory::ResponseSingle,
            element: None,
            nullable_data: false,
        };
        assert!(matches!(
            bad.element_type(),
            Err(SynthesisError::UnreachableConfiguration(_))
        ));
    }

    #[test]
    fn test_document_names() {
        let graph = graph();
        let person = graph.find_by_type_name("Person").unwrap();
        let generator = DefaultStructuralGenerator;
        let mut ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());

        let names: Vec<String> = DocumentCategory::ALL
            .into_iter()
            .filter(|c| *c != DocumentCategory::ErrorResponse)
            .map(|c| {
                DocumentSchemaSynthesizer::synthesize(&mut ctx, DocumentType::new(c, person.id))
                    .unwrap()
                    .name()
                    .to_string()
            })
            .collect();
        assert_eq!(
            names,
            vec![
                "personsPrimaryResponseDocument",
                "personsCollectionResponseDocument",
                "personsPostRequestDocument",
                "personsPatchRequestDocument",
                "personsIdentifierResponseDocument",
                "personsIdentifierCollectionResponseDocument",
                "toOnePersonsRequestDocument",
                "toManyPersonsRequestDocument",
            ]
        );

        let nullable = DocumentType::new(DocumentCategory::ResponseSingle, person.id).with_nullable_data(true);
        let handle = DocumentSchemaSynthesizer::synthesize(&mut ctx, nullable).unwrap();
        assert_eq!(handle.name(), "nullablePersonsSecondaryResponseDocument");
        assert!(ctx.repository().body(&handle).unwrap().properties["data"].is_nullable());
    }

    #[test]
    fn test_nullable_flag_ignored_for_collections() {
        let graph = graph();
        let person = graph.find_by_type_name("Person").unwrap();
        let generator = DefaultStructuralGenerator;
        let mut ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());

        let plain = DocumentType::new(DocumentCategory::ResponseCollection, person.id);
        let a = DocumentSchemaSynthesizer::synthesize(&mut ctx, plain).unwrap();
        let b = DocumentSchemaSynthesizer::synthesize(&mut ctx, plain.with_nullable_data(true)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_error_document() {
        let graph = ResourceGraph::empty();
        let generator = DefaultStructuralGenerator;
        let options = SynthesisOptions {
            include_jsonapi_object: false,
            ..Default::default()
        };
        let mut ctx = SynthesisContext::new(&graph, &generator, options);

        let handle = DocumentSchemaSynthesizer::synthesize(&mut ctx, DocumentType::error()).unwrap();
        assert_eq!(handle.name(), "errorResponseDocument");
        let body = ctx.repository().body(&handle).unwrap();
        let members: Vec<&str> = body.properties.keys().map(String::as_str).collect();
        assert_eq!(members, vec!["errors", "links", "meta"]);
        assert_eq!(body.required, vec!["errors"]);
        assert!(!body.properties["errors"].is_nullable());
        assert!(!body.properties["links"].is_nullable());
    }

    #[test]
    fn test_lone_type_has_no_included() {
        let graph = graph();
        let person = graph.find_by_type_name("Person").unwrap();
        let generator = DefaultStructuralGenerator;
        let mut ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());

        let handle =
            DocumentSchemaSynthesizer::synthesize(&mut ctx, DocumentType::new(DocumentCategory::ResponseSingle, person.id))
                .unwrap();
        let body = ctx.repository().body(&handle).unwrap();
        let members: Vec<&str> = body.properties.keys().map(String::as_str).collect();
        assert_eq!(members, vec!["data", "links", "meta", "jsonapi"]);
        assert_eq!(body.required, vec!["data"]);
    }
}
