//! Discriminated hierarchies.
//!
//! Every polymorphic hierarchy gets one abstract schema per role. It carries
//! a discriminator on `type` whose mapping grows as concrete members of the
//! hierarchy are built. Concrete schemas extend the abstract one through
//! `allOf`, and every reference to a type with subtypes points at the
//! abstract schema.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use japi_core::{ResourceTypeDescriptor, ResourceTypeId};
use tracing::debug;

use super::{
    ResourceObjectSchemaBuilder, ResourceRole, ResourceTypeLiteralCache, SchemaHandle, SchemaKey, SynthesisContext,
    schema_name,
};
use crate::error::{Result, SynthesisError};
use crate::model::{Discriminator, Schema};

#[derive(Debug)]
struct Hierarchy {
    handle: SchemaHandle,
    mapping: IndexMap<String, SchemaHandle>,
}

/// Discriminator maps of one build, keyed by hierarchy root and role.
#[derive(Debug, Default)]
pub struct DiscriminatorRegistry {
    hierarchies: HashMap<(ResourceTypeId, ResourceRole), Hierarchy>,
}

impl DiscriminatorRegistry {
    /// Registered `type` values and their schemas for the hierarchy rooted at `root`.
    pub fn mapping(&self, root: ResourceTypeId, role: ResourceRole) -> Option<&IndexMap<String, SchemaHandle>> {
        self.hierarchies.get(&(root, role)).map(|h| &h.mapping)
    }

    /// Creates the abstract schema of the hierarchy `member` belongs to.
    pub fn ensure_abstract_schema(
        ctx: &mut SynthesisContext<'_>,
        member: &ResourceTypeDescriptor,
        role: ResourceRole,
    ) -> Result<SchemaHandle> {
        let root_id = ctx.graph().hierarchy_root(member.id);
        if let Some(hierarchy) = ctx.discriminators.hierarchies.get(&(root_id, role)) {
            return Ok(hierarchy.handle.clone());
        }

        let root = ctx.resource_type(root_id)?;
        let name = schema_name(&[&root.public_name, "Hierarchy", role.suffix()]);
        let handle = ctx.get_or_create(SchemaKey::AbstractResourceObject(root_id, role), &name, |ctx, _| {
            let literal = ResourceTypeLiteralCache::get_for_hierarchy(ctx, root)?;
            let mut body = Schema::object();
            body.properties.insert("type".into(), literal.to_reference());
            body.require("type");
            body.discriminator = Some(Discriminator::new("type"));
            Ok(body)
        })?;

        ctx.discriminators.hierarchies.insert(
            (root_id, role),
            Hierarchy {
                handle: handle.clone(),
                mapping: IndexMap::new(),
            },
        );
        Ok(handle)
    }

    /// Adds `concrete` to its hierarchy's discriminator mapping.
    ///
    /// Registering the same schema again is a no-op.
    pub fn register_subtype(
        ctx: &mut SynthesisContext<'_>,
        concrete: &ResourceTypeDescriptor,
        schema: &SchemaHandle,
        role: ResourceRole,
    ) -> Result<()> {
        let abstract_schema = Self::ensure_abstract_schema(ctx, concrete, role)?;
        let root_id = ctx.graph().hierarchy_root(concrete.id);
        let hierarchy = ctx
            .discriminators
            .hierarchies
            .get_mut(&(root_id, role))
            .ok_or_else(|| SynthesisError::UnresolvedHandle(abstract_schema.name().to_string()))?;

        match hierarchy.mapping.get(&concrete.public_name) {
            Some(existing) if existing == schema => return Ok(()),
            Some(existing) => {
                return Err(SynthesisError::conflict(
                    abstract_schema.name(),
                    format!(
                        "'{}' is already mapped to {existing}, not {schema}",
                        concrete.public_name
                    ),
                ));
            }
            None => {}
        }

        hierarchy.mapping.insert(concrete.public_name.clone(), schema.clone());
        debug!(
            hierarchy = %abstract_schema,
            value = %concrete.public_name,
            schema = %schema,
            "registered discriminator value"
        );

        let value = concrete.public_name.clone();
        let target = schema.reference_path();
        ctx.repository.update(&abstract_schema, |body| {
            if let Some(discriminator) = body.discriminator.as_mut() {
                discriminator.mapping.insert(value, target);
            }
        })
    }

    /// Builds and registers every concrete member of the hierarchy `member`
    /// belongs to.
    pub fn register_hierarchy(
        ctx: &mut SynthesisContext<'_>,
        member: &ResourceTypeDescriptor,
        role: ResourceRole,
    ) -> Result<SchemaHandle> {
        let abstract_schema = Self::ensure_abstract_schema(ctx, member, role)?;
        let graph = ctx.graph();
        for id in graph.concrete_descendants(graph.hierarchy_root(member.id)) {
            let concrete = ctx.resource_type(id)?;
            ResourceObjectSchemaBuilder::build_for_role(ctx, concrete, role)?;
        }
        Ok(abstract_schema)
    }

    /// Registers the response schemas of every polymorphic hierarchy
    /// reachable from `starting`, so that types only ever reached through
    /// `included` still appear in the discriminator mappings.
    pub fn ensure_reachable_subtypes_registered(
        ctx: &mut SynthesisContext<'_>,
        starting: &ResourceTypeDescriptor,
    ) -> Result<()> {
        let graph = ctx.graph();
        let mut seen_roots = HashSet::new();
        let candidates = std::iter::once(starting).chain(graph.reachable_related_types(starting.id));
        for candidate in candidates {
            if !candidate.is_polymorphic() {
                continue;
            }
            if seen_roots.insert(graph.hierarchy_root(candidate.id)) {
                Self::register_hierarchy(ctx, candidate, ResourceRole::Response)?;
            }
        }
        Ok(())
    }
}
