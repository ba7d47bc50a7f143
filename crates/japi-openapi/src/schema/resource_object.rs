//! Resource object schemas (`data` of resource documents).
//!
//! A resource object is built per resource type and per [`ResourceRole`].
//! Members are emitted in canonical order (`type`, `id`, `attributes`,
//! `relationships`, `links`, `meta`) and fields in declaration order, so
//! generated documents diff cleanly between runs.

use japi_core::{AttributeField, Capability, ClientIdGeneration, RelationshipField, ResourceTypeDescriptor};
use tracing::{trace, warn};

use super::structural::resource_object_shape;
use super::{
    DiscriminatorRegistry, DocumentCategory, RelationshipSchemaFactory, ResourceTypeLiteralCache, SchemaHandle,
    SchemaKey, SynthesisContext, schema_name,
};
use crate::error::{Result, SynthesisError};
use crate::model::Schema;

/// The context a resource object appears in.
///
/// Single and collection responses share one role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceRole {
    Response,
    PostRequest,
    PatchRequest,
}

impl ResourceRole {
    pub fn for_category(category: DocumentCategory) -> Option<Self> {
        match category {
            DocumentCategory::ResponseSingle | DocumentCategory::ResponseCollection => Some(Self::Response),
            DocumentCategory::CreateRequest => Some(Self::PostRequest),
            DocumentCategory::UpdateRequest => Some(Self::PatchRequest),
            _ => None,
        }
    }

    /// Category used when delegating to category-keyed factories.
    pub fn category(self) -> DocumentCategory {
        match self {
            Self::Response => DocumentCategory::ResponseSingle,
            Self::PostRequest => DocumentCategory::CreateRequest,
            Self::PatchRequest => DocumentCategory::UpdateRequest,
        }
    }

    /// Capability a field needs to appear in this role.
    pub fn capability(self) -> Capability {
        match self {
            Self::Response => Capability::Viewable,
            Self::PostRequest => Capability::Creatable,
            Self::PatchRequest => Capability::Changeable,
        }
    }

    pub fn is_request(self) -> bool {
        self != Self::Response
    }

    pub(crate) fn suffix(self) -> &'static str {
        match self {
            Self::Response => "DataInResponse",
            Self::PostRequest => "DataInPostRequest",
            Self::PatchRequest => "DataInPatchRequest",
        }
    }

    fn includes_attribute(self, attribute: &AttributeField) -> bool {
        let accessible = if self.is_request() {
            attribute.has_setter
        } else {
            attribute.has_getter
        };
        accessible && attribute.capabilities.contains(self.capability())
    }

    fn includes_relationship(self, relationship: &RelationshipField) -> bool {
        relationship.capabilities.contains(self.capability())
    }
}

pub struct ResourceObjectSchemaBuilder;

impl ResourceObjectSchemaBuilder {
    /// Builds (once) the resource object schema of `resource_type` for a
    /// resource document category.
    ///
    /// # Errors
    ///
    /// Fails with [`SynthesisError::UnreachableConfiguration`] for categories
    /// that carry no resource objects and for abstract types.
    pub fn build(
        ctx: &mut SynthesisContext<'_>,
        resource_type: &ResourceTypeDescriptor,
        category: DocumentCategory,
    ) -> Result<SchemaHandle> {
        let role = ResourceRole::for_category(category).ok_or_else(|| {
            SynthesisError::unreachable(format!("{category:?} documents carry no resource objects"))
        })?;
        Self::build_for_role(ctx, resource_type, role)
    }

    pub(crate) fn build_for_role(
        ctx: &mut SynthesisContext<'_>,
        resource_type: &ResourceTypeDescriptor,
        role: ResourceRole,
    ) -> Result<SchemaHandle> {
        if resource_type.is_abstract {
            return Err(SynthesisError::unreachable(format!(
                "abstract resource type '{}' has no concrete schema",
                resource_type.public_name
            )));
        }

        let name = schema_name(&[&resource_type.public_name, role.suffix()]);
        let handle = ctx.get_or_create(SchemaKey::ResourceObject(resource_type.id, role), &name, |ctx, _| {
            trace!(resource = %resource_type.public_name, ?role, "building resource object");
            let body = Self::canonical_body(ctx, resource_type, role)?;
            if !resource_type.is_polymorphic() {
                return Ok(body);
            }
            let abstract_schema = DiscriminatorRegistry::ensure_abstract_schema(ctx, resource_type, role)?;
            Ok(Schema {
                all_of: vec![abstract_schema.to_reference(), body],
                ..Default::default()
            })
        })?;

        if resource_type.is_polymorphic() {
            DiscriminatorRegistry::register_subtype(ctx, resource_type, &handle, role)?;
        }
        Ok(handle)
    }

    fn canonical_body(
        ctx: &mut SynthesisContext<'_>,
        resource_type: &ResourceTypeDescriptor,
        role: ResourceRole,
    ) -> Result<Schema> {
        let mut body = ctx.generate_object(&resource_object_shape(!role.is_request()))?;

        let literal = ResourceTypeLiteralCache::get(ctx, resource_type)?;
        body.properties.insert("type".into(), literal.to_reference());

        match (role, ctx.client_id_generation(resource_type)) {
            (ResourceRole::PostRequest, ClientIdGeneration::Forbidden) => {
                body.remove_property("id");
            }
            (ResourceRole::PostRequest, ClientIdGeneration::Allowed) => {
                body.properties.insert("id".into(), Schema::string());
            }
            _ => {
                body.properties.insert("id".into(), Schema::string());
                body.require("id");
            }
        }

        let attributes = Self::attributes(ctx, resource_type, role)?;
        Self::fill_container(&mut body, "attributes", attributes);

        let relationships = Self::relationships(ctx, resource_type, role)?;
        Self::fill_container(&mut body, "relationships", relationships);

        Ok(body)
    }

    /// Replaces a placeholder container, or drops it when it has no members.
    ///
    /// The placeholder's nullability is kept for the normalizer to repair.
    fn fill_container(body: &mut Schema, member: &str, container: Schema) {
        if container.properties.is_empty() {
            body.remove_property(member);
            return;
        }
        let required = !container.required.is_empty();
        if let Some(slot) = body.properties.get_mut(member) {
            let nullable = slot.is_nullable();
            *slot = container;
            slot.nullable = nullable;
        }
        if required {
            body.require(member);
        }
    }

    fn attributes(
        ctx: &mut SynthesisContext<'_>,
        resource_type: &ResourceTypeDescriptor,
        role: ResourceRole,
    ) -> Result<Schema> {
        let mut container = Schema::object();
        for attribute in &resource_type.attributes {
            if attribute.capabilities.is_empty() {
                warn!(
                    resource = %resource_type.public_name,
                    attribute = %attribute.name,
                    "attribute has no capabilities, skipping"
                );
                continue;
            }
            if !role.includes_attribute(attribute) {
                continue;
            }

            let mut schema = ctx.generate_value(&attribute.value_type)?;
            schema.set_nullable(attribute.nullable);
            if role == ResourceRole::PostRequest && attribute.required_on_create {
                container.require(&attribute.name);
            }
            container.properties.insert(attribute.name.clone(), schema);
        }
        Ok(container)
    }

    fn relationships(
        ctx: &mut SynthesisContext<'_>,
        resource_type: &ResourceTypeDescriptor,
        role: ResourceRole,
    ) -> Result<Schema> {
        let mut container = Schema::object();
        for relationship in &resource_type.relationships {
            if relationship.capabilities.is_empty() {
                warn!(
                    resource = %resource_type.public_name,
                    relationship = %relationship.name,
                    "relationship has no capabilities, skipping"
                );
                continue;
            }
            if !role.includes_relationship(relationship) {
                continue;
            }

            let handle = RelationshipSchemaFactory::build(ctx, relationship, role.category())?;
            container.properties.insert(relationship.name.clone(), handle.to_reference());
        }
        Ok(container)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DefaultStructuralGenerator, SynthesisOptions};
    use japi_core::{
        AttributeDefinition, Capabilities, RelationshipDefinition, ResourceDefinition, ResourceGraph,
        ResourceGraphBuilder,
    };

    fn shop() -> ResourceGraph {
        ResourceGraphBuilder::new()
            .resource(
                ResourceDefinition::new("Order")
                    .attribute(
                        AttributeDefinition::new("total", "decimal")
                            .capabilities(Capabilities::of([Capability::Viewable, Capability::Changeable])),
                    )
                    .attribute(
                        AttributeDefinition::new("notes", "string")
                            .capabilities(Capabilities::of([Capability::Creatable]))
                            .required(),
                    )
                    .attribute(AttributeDefinition::new("secret", "string").without_getter())
                    .attribute(AttributeDefinition::new("ghost", "string").capabilities(Capabilities::NONE))
                    .relationship(RelationshipDefinition::to_one("customer", "Customer")),
            )
            .resource(ResourceDefinition::new("Customer"))
            .build()
            .unwrap()
    }

    fn property_names(schema: &Schema) -> Vec<&str> {
        schema.properties.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_canonical_member_order() {
        let graph = shop();
        let order = graph.find_by_type_name("Order").unwrap();
        let generator = DefaultStructuralGenerator;
        let mut ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());

        let handle = ResourceObjectSchemaBuilder::build(&mut ctx, order, DocumentCategory::ResponseSingle).unwrap();
        assert_eq!(handle.name(), "ordersDataInResponse");
        let body = ctx.repository().body(&handle).unwrap();
        assert_eq!(
            property_names(body),
            vec!["type", "id", "attributes", "relationships", "links", "meta"]
        );
        assert_eq!(body.required, vec!["type", "id"]);
    }

    #[test]
    fn test_attribute_gating_per_role() {
        let graph = shop();
        let order = graph.find_by_type_name("Order").unwrap();
        let generator = DefaultStructuralGenerator;
        let mut ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());

        let response = ResourceObjectSchemaBuilder::build(&mut ctx, order, DocumentCategory::ResponseSingle).unwrap();
        let post = ResourceObjectSchemaBuilder::build(&mut ctx, order, DocumentCategory::CreateRequest).unwrap();
        let patch = ResourceObjectSchemaBuilder::build(&mut ctx, order, DocumentCategory::UpdateRequest).unwrap();

        let attrs = |handle: &SchemaHandle| property_names(&ctx.repository().body(handle).unwrap().properties["attributes"]);
        assert_eq!(attrs(&response), vec!["total"]);
        assert_eq!(attrs(&post), vec!["notes", "secret"]);
        assert_eq!(attrs(&patch), vec!["total", "secret"]);

        let post_body = ctx.repository().body(&post).unwrap();
        assert_eq!(post_body.properties["attributes"].required, vec!["notes"]);
        assert!(post_body.required.contains(&"attributes".to_string()));
        assert!(!post_body.properties.contains_key("id"));
        assert!(!post_body.properties.contains_key("links"));
    }

    #[test]
    fn test_same_handle_for_single_and_collection() {
        let graph = shop();
        let order = graph.find_by_type_name("Order").unwrap();
        let generator = DefaultStructuralGenerator;
        let mut ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());

        let a = ResourceObjectSchemaBuilder::build(&mut ctx, order, DocumentCategory::ResponseSingle).unwrap();
        let b = ResourceObjectSchemaBuilder::build(&mut ctx, order, DocumentCategory::ResponseCollection).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_client_id_modes() {
        let graph = ResourceGraphBuilder::new()
            .resource(ResourceDefinition::new("Tag").client_id_generation(ClientIdGeneration::Allowed))
            .resource(ResourceDefinition::new("Label").client_id_generation(ClientIdGeneration::Required))
            .build()
            .unwrap();
        let generator = DefaultStructuralGenerator;
        let mut ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());

        let tag = graph.find_by_type_name("Tag").unwrap();
        let label = graph.find_by_type_name("Label").unwrap();
        let tag_post = ResourceObjectSchemaBuilder::build(&mut ctx, tag, DocumentCategory::CreateRequest).unwrap();
        let label_post = ResourceObjectSchemaBuilder::build(&mut ctx, label, DocumentCategory::CreateRequest).unwrap();

        let tag_body = ctx.repository().body(&tag_post).unwrap();
        assert!(tag_body.properties.contains_key("id"));
        assert!(!tag_body.required.contains(&"id".to_string()));

        let label_body = ctx.repository().body(&label_post).unwrap();
        assert!(label_body.required.contains(&"id".to_string()));
        // no attributes or relationships at all
        assert_eq!(property_names(label_body), vec!["type", "id", "meta"]);
    }

    #[test]
    fn test_rejects_non_resource_categories() {
        let graph = shop();
        let order = graph.find_by_type_name("Order").unwrap();
        let generator = DefaultStructuralGenerator;
        let mut ctx = SynthesisContext::new(&graph, &generator, SynthesisOptions::default());

        let err = ResourceObjectSchemaBuilder::build(&mut ctx, order, DocumentCategory::ErrorResponse).unwrap_err();
        assert!(matches!(err, SynthesisError::UnreachableConfiguration(_)));
    }
}
