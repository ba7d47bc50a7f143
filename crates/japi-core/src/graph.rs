//! Resource graph: the registry of resolved resource types.
//!
//! The graph is built once at startup from [`ResourceDefinition`]s and is
//! immutable afterwards. Besides plain lookups it answers reachability
//! queries, which the schema synthesis uses to discover every resource type
//! that can show up in a document.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::debug;

use crate::definition::ResourceDefinition;
use crate::error::{CoreError, Result};
use crate::naming::NamingConvention;
use crate::resource::{
    AttributeField, RelationshipField, ResourceTypeDescriptor, ResourceTypeId,
};

/// Member names that JSON:API reserves on resource objects.
const RESERVED_MEMBER_NAMES: [&str; 2] = ["type", "id"];

/// Immutable registry of resource type descriptors.
#[derive(Debug, Clone, Default)]
pub struct ResourceGraph {
    types: Vec<ResourceTypeDescriptor>,
    by_public_name: HashMap<String, ResourceTypeId>,
    by_type_name: HashMap<String, ResourceTypeId>,
}

impl ResourceGraph {
    /// Creates an empty graph.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// All resource types in declaration order.
    pub fn list_resource_types(&self) -> &[ResourceTypeDescriptor] {
        &self.types
    }

    pub fn get_resource_type(&self, id: ResourceTypeId) -> Option<&ResourceTypeDescriptor> {
        self.types.get(id.index())
    }

    pub fn find_by_public_name(&self, public_name: &str) -> Option<&ResourceTypeDescriptor> {
        self.by_public_name
            .get(public_name)
            .and_then(|id| self.get_resource_type(*id))
    }

    pub fn find_by_type_name(&self, type_name: &str) -> Option<&ResourceTypeDescriptor> {
        self.by_type_name
            .get(type_name)
            .and_then(|id| self.get_resource_type(*id))
    }

    /// Resource types reachable from `id` through relationships and subtypes.
    ///
    /// Breadth-first, in discovery order. The start type itself is only part
    /// of the result when a relationship cycle leads back to it.
    pub fn reachable_related_types(&self, id: ResourceTypeId) -> Vec<&ResourceTypeDescriptor> {
        let mut visited: HashSet<ResourceTypeId> = HashSet::new();
        let mut queue: VecDeque<ResourceTypeId> = VecDeque::new();
        let mut reached = Vec::new();

        let Some(start) = self.get_resource_type(id) else {
            return reached;
        };
        for next in neighbours(start) {
            if visited.insert(next) {
                queue.push_back(next);
            }
        }

        while let Some(current) = queue.pop_front() {
            let Some(descriptor) = self.get_resource_type(current) else {
                continue;
            };
            reached.push(descriptor);
            for next in neighbours(descriptor) {
                if visited.insert(next) {
                    queue.push_back(next);
                }
            }
        }

        reached
    }

    /// Topmost base type of the hierarchy `id` belongs to (`id` itself if it has no base).
    pub fn hierarchy_root(&self, id: ResourceTypeId) -> ResourceTypeId {
        let mut current = id;
        // Bounded by the number of types; the builder rejects base cycles.
        for _ in 0..self.types.len() {
            match self.get_resource_type(current).and_then(|d| d.base_type) {
                Some(base) => current = base,
                None => break,
            }
        }
        current
    }

    /// Non-abstract types in the subtree rooted at `id`, `id` included, in pre-order.
    pub fn concrete_descendants(&self, id: ResourceTypeId) -> Vec<ResourceTypeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(descriptor) = self.get_resource_type(current) else {
                continue;
            };
            if !descriptor.is_abstract {
                out.push(current);
            }
            for sub in descriptor.sub_types.iter().rev() {
                stack.push(*sub);
            }
        }
        out
    }
}

fn neighbours(descriptor: &ResourceTypeDescriptor) -> impl Iterator<Item = ResourceTypeId> + '_ {
    descriptor
        .relationships
        .iter()
        .map(|r| r.target)
        .chain(descriptor.sub_types.iter().copied())
}

/// Builder that resolves definitions into a [`ResourceGraph`].
#[derive(Debug, Default)]
pub struct ResourceGraphBuilder {
    naming: NamingConvention,
    definitions: Vec<ResourceDefinition>,
}

impl ResourceGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    pub fn resource(mut self, definition: ResourceDefinition) -> Self {
        self.definitions.push(definition);
        self
    }

    /// Validates the definitions and produces the graph.
    ///
    /// # Errors
    ///
    /// Fails on duplicate type or public names, unknown relationship targets,
    /// unknown or cyclic base types, abstract types without a concrete
    /// subtype and duplicate member names (including members inherited from
    /// base types).
    pub fn build(self) -> Result<ResourceGraph> {
        let naming = self.naming;
        let definitions = self.definitions;

        let mut by_type_name: HashMap<String, ResourceTypeId> = HashMap::new();
        for (index, def) in definitions.iter().enumerate() {
            let id = ResourceTypeId(index as u32);
            if by_type_name.insert(def.name.clone(), id).is_some() {
                return Err(CoreError::DuplicateResourceType(def.name.clone()));
            }
        }

        let mut by_public_name: HashMap<String, ResourceTypeId> = HashMap::new();
        let mut public_names = Vec::with_capacity(definitions.len());
        for (index, def) in definitions.iter().enumerate() {
            let public_name = def
                .public_name
                .clone()
                .unwrap_or_else(|| naming.public_name(&def.name));
            let id = ResourceTypeId(index as u32);
            if let Some(existing) = by_public_name.insert(public_name.clone(), id) {
                return Err(CoreError::DuplicatePublicName {
                    public_name,
                    first: definitions[existing.index()].name.clone(),
                    second: def.name.clone(),
                });
            }
            public_names.push(public_name);
        }

        let mut base_types: Vec<Option<ResourceTypeId>> = Vec::with_capacity(definitions.len());
        for def in &definitions {
            let base = match &def.base {
                Some(base_name) => Some(*by_type_name.get(base_name).ok_or_else(|| {
                    CoreError::invalid_hierarchy(
                        &def.name,
                        format!("base type '{base_name}' is not declared"),
                    )
                })?),
                None => None,
            };
            base_types.push(base);
        }
        for (index, def) in definitions.iter().enumerate() {
            let mut steps = 0;
            let mut current = base_types[index];
            while let Some(base) = current {
                steps += 1;
                if base.index() == index || steps > definitions.len() {
                    return Err(CoreError::invalid_hierarchy(
                        &def.name,
                        "base type chain is cyclic",
                    ));
                }
                current = base_types[base.index()];
            }
        }

        let mut own_attributes = Vec::with_capacity(definitions.len());
        let mut own_relationships = Vec::with_capacity(definitions.len());
        for def in &definitions {
            let attributes = def
                .attributes
                .iter()
                .map(|a| {
                    Ok(AttributeField {
                        name: naming.apply(&a.name),
                        value_type: a.value_type.resolve(naming)?,
                        capabilities: a.capabilities,
                        nullable: a.nullable,
                        required_on_create: a.required_on_create,
                        has_getter: a.getter,
                        has_setter: a.setter,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            let relationships = def
                .relationships
                .iter()
                .map(|r| {
                    let target = by_type_name.get(&r.target).copied().ok_or_else(|| {
                        CoreError::UnknownRelationshipTarget {
                            resource_type: def.name.clone(),
                            relationship: r.name.clone(),
                            target: r.target.clone(),
                        }
                    })?;
                    Ok(RelationshipField {
                        name: naming.apply(&r.name),
                        cardinality: r.cardinality,
                        target,
                        capabilities: r.capabilities,
                        nullable: r.nullable,
                    })
                })
                .collect::<Result<Vec<_>>>()?;

            own_attributes.push(attributes);
            own_relationships.push(relationships);
        }

        let mut sub_types: Vec<Vec<ResourceTypeId>> = vec![Vec::new(); definitions.len()];
        for (index, base) in base_types.iter().enumerate() {
            if let Some(base) = base {
                sub_types[base.index()].push(ResourceTypeId(index as u32));
            }
        }

        let mut types = Vec::with_capacity(definitions.len());
        for (index, def) in definitions.iter().enumerate() {
            // Root first, so inherited fields precede the type's own fields.
            let mut chain = vec![index];
            let mut current = base_types[index];
            while let Some(base) = current {
                chain.push(base.index());
                current = base_types[base.index()];
            }
            chain.reverse();

            let mut attributes = Vec::new();
            let mut relationships = Vec::new();
            for link in &chain {
                attributes.extend(own_attributes[*link].iter().cloned());
                relationships.extend(own_relationships[*link].iter().cloned());
            }

            let mut seen: HashSet<&str> = HashSet::new();
            let names = attributes
                .iter()
                .map(|a| a.name.as_str())
                .chain(relationships.iter().map(|r| r.name.as_str()));
            for name in names {
                if RESERVED_MEMBER_NAMES.contains(&name) {
                    return Err(CoreError::invalid_model(format!(
                        "{}.{name} uses a member name reserved by JSON:API",
                        def.name
                    )));
                }
                if !seen.insert(name) {
                    return Err(CoreError::duplicate_field(&def.name, name));
                }
            }

            types.push(ResourceTypeDescriptor {
                id: ResourceTypeId(index as u32),
                type_name: def.name.clone(),
                public_name: public_names[index].clone(),
                attributes,
                relationships,
                base_type: base_types[index],
                sub_types: sub_types[index].clone(),
                is_abstract: def.is_abstract,
                client_id_generation: def.client_id_generation,
                endpoints: def.endpoints.resolve(),
            });
        }

        let graph = ResourceGraph {
            types,
            by_public_name,
            by_type_name,
        };
        for descriptor in &graph.types {
            if descriptor.is_abstract && graph.concrete_descendants(descriptor.id).is_empty() {
                return Err(CoreError::invalid_hierarchy(
                    &descriptor.type_name,
                    "abstract type has no concrete subtype",
                ));
            }
        }

        debug!(count = graph.types.len(), "Resource graph built");
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{AttributeDefinition, RelationshipDefinition};
    use crate::error::ErrorCategory;

    fn blog_graph() -> ResourceGraph {
        ResourceGraphBuilder::new()
            .resource(
                ResourceDefinition::new("BlogPost")
                    .attribute(AttributeDefinition::new("Title", "string"))
                    .relationship(RelationshipDefinition::to_one("author", "Person"))
                    .relationship(RelationshipDefinition::to_many("comments", "Comment")),
            )
            .resource(
                ResourceDefinition::new("Person")
                    .relationship(RelationshipDefinition::to_many("posts", "BlogPost")),
            )
            .resource(
                ResourceDefinition::new("Comment")
                    .relationship(RelationshipDefinition::to_one("parent", "Comment")),
            )
            .resource(ResourceDefinition::new("Tag"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_public_names_and_lookup() {
        let graph = blog_graph();
        assert_eq!(graph.len(), 4);
        let post = graph.find_by_public_name("blogPosts").unwrap();
        assert_eq!(post.type_name, "BlogPost");
        assert_eq!(post.attributes[0].name, "title");
        assert_eq!(graph.find_by_type_name("Person").unwrap().public_name, "persons");
    }

    #[test]
    fn test_reachability_excludes_unrelated_types() {
        let graph = blog_graph();
        let post = graph.find_by_type_name("BlogPost").unwrap();
        let reached: Vec<&str> = graph
            .reachable_related_types(post.id)
            .iter()
            .map(|d| d.type_name.as_str())
            .collect();
        // Person leads back to BlogPost, so the start type is part of the closure.
        assert_eq!(reached, vec!["Person", "Comment", "BlogPost"]);
    }

    #[test]
    fn test_reachability_terminates_on_self_reference() {
        let graph = blog_graph();
        let comment = graph.find_by_type_name("Comment").unwrap();
        let reached: Vec<&str> = graph
            .reachable_related_types(comment.id)
            .iter()
            .map(|d| d.type_name.as_str())
            .collect();
        assert_eq!(reached, vec!["Comment"]);

        let tag = graph.find_by_type_name("Tag").unwrap();
        assert!(graph.reachable_related_types(tag.id).is_empty());
    }

    #[test]
    fn test_hierarchy_resolution() {
        let graph = ResourceGraphBuilder::new()
            .resource(
                ResourceDefinition::new("Vehicle")
                    .abstract_type()
                    .attribute(AttributeDefinition::new("weight", "integer")),
            )
            .resource(
                ResourceDefinition::new("Car")
                    .base("Vehicle")
                    .attribute(AttributeDefinition::new("seats", "integer")),
            )
            .resource(ResourceDefinition::new("Truck").base("Vehicle"))
            .resource(ResourceDefinition::new("Pickup").base("Truck"))
            .build()
            .unwrap();

        let vehicle = graph.find_by_type_name("Vehicle").unwrap();
        let car = graph.find_by_type_name("Car").unwrap();
        let pickup = graph.find_by_type_name("Pickup").unwrap();

        let names: Vec<&str> = car.attributes.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["weight", "seats"]);
        assert_eq!(graph.hierarchy_root(pickup.id), vehicle.id);

        let concrete: Vec<&str> = graph
            .concrete_descendants(vehicle.id)
            .into_iter()
            .map(|id| graph.get_resource_type(id).unwrap().type_name.as_str())
            .collect();
        assert_eq!(concrete, vec!["Car", "Truck", "Pickup"]);
        assert!(vehicle.is_polymorphic());
        assert!(car.is_polymorphic());
    }

    #[test]
    fn test_unknown_target_rejected() {
        let err = ResourceGraphBuilder::new()
            .resource(
                ResourceDefinition::new("Order")
                    .relationship(RelationshipDefinition::to_one("customer", "Client")),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::UnknownRelationshipTarget { .. }));
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_duplicate_public_name_rejected() {
        let err = ResourceGraphBuilder::new()
            .resource(ResourceDefinition::new("Order"))
            .resource(ResourceDefinition::new("Purchase").public_name("orders"))
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::DuplicatePublicName { .. }));
    }

    #[test]
    fn test_inherited_duplicate_field_rejected() {
        let err = ResourceGraphBuilder::new()
            .resource(
                ResourceDefinition::new("Base").attribute(AttributeDefinition::new("name", "string")),
            )
            .resource(
                ResourceDefinition::new("Derived")
                    .base("Base")
                    .attribute(AttributeDefinition::new("name", "string")),
            )
            .build()
            .unwrap_err();
        assert_eq!(err.to_string(), "Duplicate field 'name' on resource type Derived");
    }

    #[test]
    fn test_reserved_member_name_rejected() {
        let err = ResourceGraphBuilder::new()
            .resource(
                ResourceDefinition::new("Order").attribute(AttributeDefinition::new("id", "string")),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidModel { .. }));
    }

    #[test]
    fn test_cyclic_base_rejected() {
        let err = ResourceGraphBuilder::new()
            .resource(ResourceDefinition::new("A").base("B"))
            .resource(ResourceDefinition::new("B").base("A"))
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidHierarchy { .. }));
    }

    #[test]
    fn test_abstract_type_needs_concrete_subtype() {
        let err = ResourceGraphBuilder::new()
            .resource(ResourceDefinition::new("Shape").abstract_type())
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidHierarchy { .. }));
        assert!(err.to_string().contains("Shape"));

        // only abstract descendants
        let err = ResourceGraphBuilder::new()
            .resource(ResourceDefinition::new("Shape").abstract_type())
            .resource(ResourceDefinition::new("Polygon").base("Shape").abstract_type())
            .build()
            .unwrap_err();
        assert!(matches!(err, CoreError::InvalidHierarchy { .. }));

        let graph = ResourceGraphBuilder::new()
            .resource(ResourceDefinition::new("Shape").abstract_type())
            .resource(ResourceDefinition::new("Polygon").base("Shape").abstract_type())
            .resource(ResourceDefinition::new("Square").base("Polygon"))
            .build()
            .unwrap();
        assert_eq!(graph.len(), 3);
    }

    #[test]
    fn test_empty_graph() {
        let graph = ResourceGraphBuilder::new().build().unwrap();
        assert!(graph.is_empty());
        assert!(graph.list_resource_types().is_empty());
    }
}
