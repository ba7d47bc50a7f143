//! Nullability repair.
//!
//! The structural generator marks every reference-typed member nullable.
//! JSON:API never sends `null` for `meta`, `links` (or any link inside it),
//! `jsonapi` (or its members), or the `attributes` and `relationships`
//! containers: an absent member is omitted. This pass walks a finished
//! document schema, following component references, and clears those
//! markers. `data` members keep their nullability, as do attribute values.

use std::collections::HashSet;

use tracing::trace;

use super::{SchemaHandle, SchemaRepository};
use crate::error::{Result, SynthesisError};
use crate::model::{COMPONENTS_PREFIX, Schema};

/// How a schema was reached, which decides the rules applied to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Position {
    /// A document, resource object, relationship object or identifier.
    Object,
    /// A links object; every entry is non-nullable.
    Links,
    /// The `jsonapi` object; every member is non-nullable.
    JsonApi,
    /// The `relationships` container; each member is a relationship object.
    Relationships,
    /// Attribute values and free-form members are left alone.
    Opaque,
}

pub struct NullabilityNormalizer;

impl NullabilityNormalizer {
    /// Normalizes `root` and every component reachable from it.
    ///
    /// # Errors
    ///
    /// Fails if a reference names a component the repository does not know.
    pub fn normalize(repository: &mut SchemaRepository, root: &SchemaHandle) -> Result<()> {
        let mut visited = HashSet::new();
        let mut pending = vec![(root.name().to_string(), Position::Object)];

        while let Some((name, position)) = pending.pop() {
            if !visited.insert((name.clone(), position)) {
                continue;
            }
            if repository.lookup_name(&name).is_none() {
                return Err(SynthesisError::UnresolvedHandle(name));
            }
            let Some(body) = repository.body_by_name_mut(&name) else {
                // still being built further up the stack
                trace!(schema = %name, "skipping unfilled schema");
                continue;
            };

            let mut next = Vec::new();
            normalize_schema(body, position, &mut next);
            pending.extend(next.into_iter().filter(|entry| !visited.contains(entry)));
        }
        Ok(())
    }
}

fn normalize_schema(schema: &mut Schema, position: Position, refs: &mut Vec<(String, Position)>) {
    if position == Position::Opaque {
        return;
    }

    if let Some(name) = schema
        .reference
        .as_deref()
        .and_then(|r| r.strip_prefix(COMPONENTS_PREFIX))
    {
        refs.push((name.to_string(), position));
    }
    for nested in schema.all_of.iter_mut().chain(schema.one_of.iter_mut()) {
        normalize_schema(nested, position, refs);
    }
    if let Some(items) = schema.items.as_deref_mut() {
        normalize_schema(items, position, refs);
    }
    if let Some(discriminator) = &schema.discriminator {
        for target in discriminator.mapping.values() {
            if let Some(name) = target.strip_prefix(COMPONENTS_PREFIX) {
                refs.push((name.to_string(), Position::Object));
            }
        }
    }

    match position {
        Position::Object => {
            for (member, value) in schema.properties.iter_mut() {
                let nested = match member.as_str() {
                    "meta" => Position::Opaque,
                    "links" => Position::Links,
                    "jsonapi" => Position::JsonApi,
                    "attributes" => Position::Opaque,
                    "relationships" => Position::Relationships,
                    _ => {
                        normalize_schema(value, Position::Object, refs);
                        continue;
                    }
                };
                value.clear_nullable();
                normalize_schema(value, nested, refs);
            }
        }
        Position::Links => {
            for value in schema.properties.values_mut() {
                value.clear_nullable();
            }
        }
        Position::JsonApi => {
            for value in schema.properties.values_mut() {
                value.clear_nullable();
            }
        }
        Position::Relationships => {
            for value in schema.properties.values_mut() {
                normalize_schema(value, Position::Object, refs);
            }
        }
        Position::Opaque => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::structural::{TopLevelLinks, document_shape, resource_object_shape};
    use crate::schema::{DefaultStructuralGenerator, StructuralGenerator};

    fn repository_with_document() -> (SchemaRepository, SchemaHandle) {
        let generator = DefaultStructuralGenerator;
        let mut repo = SchemaRepository::new();

        let mut resource = generator.generate_object(&resource_object_shape(true), &mut repo).unwrap();
        let mut attributes = Schema::object();
        attributes
            .properties
            .insert("nickname".into(), Schema::string().into_nullable());
        let slot = resource.properties.get_mut("attributes").unwrap();
        *slot = attributes.into_nullable();
        resource.remove_property("relationships");
        repo.define("peopleDataInResponse", resource).unwrap();

        let mut document = generator
            .generate_object(&document_shape(Some(TopLevelLinks::Resource), false), &mut repo)
            .unwrap();
        document.properties.insert(
            "data".into(),
            Schema::reference("peopleDataInResponse").into_nullable(),
        );
        let handle = repo.define("peopleDocument", document).unwrap();
        (repo, handle)
    }

    #[test]
    fn test_structural_members_are_repaired() {
        let (mut repo, handle) = repository_with_document();
        NullabilityNormalizer::normalize(&mut repo, &handle).unwrap();

        let document = repo.body(&handle).unwrap();
        assert!(!document.properties["meta"].is_nullable());
        assert!(!document.properties["links"].is_nullable());
        assert!(!document.properties["jsonapi"].is_nullable());
        assert!(document.properties["meta"].is_pure_reference());
        // top-level data keeps its nullability
        assert!(document.properties["data"].is_nullable());

        let links = repo.body(&repo.lookup_name("resourceTopLevelLinks").unwrap()).unwrap();
        assert!(links.properties.values().all(|link| !link.is_nullable()));

        let jsonapi = repo.body(&repo.lookup_name("jsonapi").unwrap()).unwrap();
        assert!(jsonapi.properties.values().all(|member| !member.is_nullable()));

        let resource = repo.body(&repo.lookup_name("peopleDataInResponse").unwrap()).unwrap();
        assert!(!resource.properties["attributes"].is_nullable());
        assert!(!resource.properties["links"].is_nullable());
        // attribute values keep their own nullability
        assert!(resource.properties["attributes"].properties["nickname"].is_nullable());
        // id is not a structural member
        assert!(resource.properties["id"].is_nullable());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let (mut repo, handle) = repository_with_document();
        NullabilityNormalizer::normalize(&mut repo, &handle).unwrap();
        let once = repo.body(&handle).cloned();
        NullabilityNormalizer::normalize(&mut repo, &handle).unwrap();
        assert_eq!(repo.body(&handle).cloned(), once);
    }

    #[test]
    fn test_dangling_reference_fails() {
        let mut repo = SchemaRepository::new();
        let mut document = Schema::object();
        document.properties.insert("data".into(), Schema::reference("missing"));
        let handle = repo.define("doc", document).unwrap();

        let err = NullabilityNormalizer::normalize(&mut repo, &handle).unwrap_err();
        assert!(matches!(err, SynthesisError::UnresolvedHandle(name) if name == "missing"));
    }
}
