//! Resource identifier objects (`{type, id}`).

use std::collections::HashMap;

use japi_core::{ResourceTypeDescriptor, ResourceTypeId};

use super::structural::meta_shape;
use super::{ResourceTypeLiteralCache, SchemaHandle, SchemaKey, SynthesisContext, schema_name};
use crate::error::Result;
use crate::model::Schema;

/// Builds one identifier schema per resource type.
///
/// Identifiers never vary by document category.
#[derive(Debug, Default)]
pub struct ResourceIdentifierSchemaFactory {
    handles: HashMap<ResourceTypeId, SchemaHandle>,
}

impl ResourceIdentifierSchemaFactory {
    pub fn get(ctx: &mut SynthesisContext<'_>, resource_type: &ResourceTypeDescriptor) -> Result<SchemaHandle> {
        if let Some(handle) = ctx.identifiers.handles.get(&resource_type.id) {
            return Ok(handle.clone());
        }

        let name = schema_name(&[&resource_type.public_name, "Identifier"]);
        let handle = ctx.get_or_create(SchemaKey::Identifier(resource_type.id), &name, |ctx, _| {
            let literal = ResourceTypeLiteralCache::get_for_hierarchy(ctx, resource_type)?;
            let meta = ctx.define_shape(&meta_shape())?;

            let mut body = Schema::object();
            body.properties.insert("type".into(), literal.to_reference());
            body.properties.insert("id".into(), Schema::string());
            body.properties.insert("meta".into(), meta);
            body.require("type");
            body.require("id");
            Ok(body)
        })?;
        ctx.identifiers.handles.insert(resource_type.id, handle.clone());
        Ok(handle)
    }
}
