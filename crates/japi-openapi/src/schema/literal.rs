//! `type` literal schemas.

use std::collections::HashMap;

use japi_core::{ResourceTypeDescriptor, ResourceTypeId};
use tracing::trace;

use super::{SchemaHandle, SchemaKey, SynthesisContext, schema_name};
use crate::error::{Result, SynthesisError};
use crate::model::Schema;

/// Caches the string-enum schemas used for the `type` member.
#[derive(Debug, Default)]
pub struct ResourceTypeLiteralCache {
    literals: HashMap<ResourceTypeId, SchemaHandle>,
    hierarchy_literals: HashMap<ResourceTypeId, SchemaHandle>,
}

impl ResourceTypeLiteralCache {
    /// Literal allowing exactly the public name of `resource_type`.
    pub fn get(ctx: &mut SynthesisContext<'_>, resource_type: &ResourceTypeDescriptor) -> Result<SchemaHandle> {
        if let Some(handle) = ctx.literals.literals.get(&resource_type.id) {
            return Ok(handle.clone());
        }

        let name = schema_name(&[&resource_type.public_name, "ResourceType"]);
        let public_name = resource_type.public_name.clone();
        let handle = ctx.get_or_create(SchemaKey::TypeLiteral(resource_type.id), &name, |_, _| {
            Ok(Schema::string_enum([public_name]))
        })?;
        ctx.literals.literals.insert(resource_type.id, handle.clone());
        Ok(handle)
    }

    /// Literal accepted wherever `resource_type` may be referenced.
    ///
    /// For a type with subtypes this allows the public name of every
    /// concrete type in its subtree; otherwise it is [`Self::get`].
    pub fn get_for_hierarchy(
        ctx: &mut SynthesisContext<'_>,
        resource_type: &ResourceTypeDescriptor,
    ) -> Result<SchemaHandle> {
        if !resource_type.has_sub_types() {
            return Self::get(ctx, resource_type);
        }
        if let Some(handle) = ctx.literals.hierarchy_literals.get(&resource_type.id) {
            return Ok(handle.clone());
        }

        let graph = ctx.graph();
        let values: Vec<String> = graph
            .concrete_descendants(resource_type.id)
            .into_iter()
            .filter_map(|id| graph.get_resource_type(id))
            .map(|t| t.public_name.clone())
            .collect();
        if values.is_empty() {
            return Err(SynthesisError::unreachable(format!(
                "resource type '{}' has no concrete types to reference",
                resource_type.public_name
            )));
        }
        trace!(resource = %resource_type.public_name, ?values, "hierarchy type literal");

        let name = schema_name(&[&resource_type.public_name, "HierarchyResourceType"]);
        let handle = ctx.get_or_create(SchemaKey::HierarchyLiteral(resource_type.id), &name, |_, _| {
            Ok(Schema::string_enum(values))
        })?;
        ctx.literals.hierarchy_literals.insert(resource_type.id, handle.clone());
        Ok(handle)
    }
}
