//! Registry of named component schemas for one document build.
//!
//! Schemas are stored in an arena of slots. A slot is allocated the moment a
//! schema identity is first requested, before its body exists, so recursive
//! references (a person whose `friends` point back at people) resolve to the
//! slot's handle instead of recursing forever. The slot is filled once the
//! body is complete.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use japi_core::{ResourceTypeId, ValueType};
use tracing::trace;

use crate::error::{Result, SynthesisError};
use crate::model::{COMPONENTS_PREFIX, Schema};
use crate::schema::document::DocumentType;
use crate::schema::relationship::RelationshipShape;
use crate::schema::resource_object::ResourceRole;

/// Stable reference to a component schema.
///
/// Two handles are equal when they denote the same slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SchemaHandle {
    index: usize,
    name: Arc<str>,
}

impl SchemaHandle {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// A `$ref` schema pointing at this component.
    pub fn to_reference(&self) -> Schema {
        Schema::reference(&self.name)
    }

    /// The `#/components/schemas/..` path of this component.
    pub fn reference_path(&self) -> String {
        format!("{COMPONENTS_PREFIX}{}", self.name)
    }
}

impl fmt::Display for SchemaHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Identity under which a schema is memoized.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SchemaKey {
    /// Single-value `type` literal of a resource type.
    TypeLiteral(ResourceTypeId),
    /// `type` literal accepting every concrete type of a hierarchy.
    HierarchyLiteral(ResourceTypeId),
    Identifier(ResourceTypeId),
    ResourceObject(ResourceTypeId, ResourceRole),
    /// Abstract schema of a hierarchy, keyed by the hierarchy root.
    AbstractResourceObject(ResourceTypeId, ResourceRole),
    Relationship(RelationshipShape),
    Document(DocumentType),
    /// Shared structural definitions, keyed by their name.
    Named(String),
    /// Named enum or complex attribute type, keyed by its full definition so
    /// that two different types declared under one name collide on the name.
    ValueType(ValueType),
}

/// Result of [`SchemaRepository::reserve`].
#[derive(Debug)]
pub enum Reservation {
    /// The identity was already known; the handle may still be unfilled.
    Existing(SchemaHandle),
    /// A fresh slot the caller must fill.
    New(SchemaHandle),
}

#[derive(Debug)]
struct Slot {
    name: Arc<str>,
    key: SchemaKey,
    body: Option<Schema>,
}

/// Arena of component schemas keyed by identity and by name.
#[derive(Debug, Default)]
pub struct SchemaRepository {
    slots: Vec<Slot>,
    by_key: HashMap<SchemaKey, usize>,
    by_name: HashMap<Arc<str>, usize>,
}

impl SchemaRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn lookup(&self, key: &SchemaKey) -> Option<SchemaHandle> {
        self.by_key.get(key).map(|&index| self.handle(index))
    }

    pub fn lookup_name(&self, name: &str) -> Option<SchemaHandle> {
        self.by_name.get(name).map(|&index| self.handle(index))
    }

    fn handle(&self, index: usize) -> SchemaHandle {
        SchemaHandle {
            index,
            name: Arc::clone(&self.slots[index].name),
        }
    }

    /// Allocates a slot for `key`, or returns the existing one.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::ConflictingDefinition`] if `name` is already
    /// bound to a different identity.
    pub fn reserve(&mut self, key: SchemaKey, name: &str) -> Result<Reservation> {
        if let Some(handle) = self.lookup(&key) {
            return Ok(Reservation::Existing(handle));
        }
        if let Some(&index) = self.by_name.get(name) {
            return Err(SynthesisError::conflict(
                name,
                format!(
                    "name already used by {:?}, requested for {:?}",
                    self.slots[index].key, key
                ),
            ));
        }

        let index = self.slots.len();
        let name: Arc<str> = Arc::from(name);
        trace!(schema = %name, "reserving schema slot");
        self.slots.push(Slot {
            name: Arc::clone(&name),
            key: key.clone(),
            body: None,
        });
        self.by_key.insert(key, index);
        self.by_name.insert(Arc::clone(&name), index);
        Ok(Reservation::New(SchemaHandle { index, name }))
    }

    /// Gives a reserved slot its body.
    ///
    /// Filling a slot again with an identical body is a no-op.
    pub fn fill(&mut self, handle: &SchemaHandle, body: Schema) -> Result<()> {
        let slot = self.slot_mut(handle)?;
        match &slot.body {
            Some(existing) if *existing != body => Err(SynthesisError::conflict(
                handle.name(),
                "slot already holds a different body",
            )),
            Some(_) => Ok(()),
            None => {
                slot.body = Some(body);
                Ok(())
            }
        }
    }

    /// Binds a structural definition directly by name.
    ///
    /// Defining the same name twice with identical bodies returns the
    /// original handle.
    pub fn define(&mut self, name: &str, body: Schema) -> Result<SchemaHandle> {
        match self.reserve(SchemaKey::Named(name.to_string()), name)? {
            Reservation::New(handle) => {
                self.fill(&handle, body)?;
                Ok(handle)
            }
            Reservation::Existing(handle) => match self.body(&handle) {
                Some(existing) if *existing != body => Err(SynthesisError::conflict(
                    name,
                    "defined twice with different bodies",
                )),
                _ => {
                    self.fill(&handle, body)?;
                    Ok(handle)
                }
            },
        }
    }

    /// Memoized construction: returns the handle for `key`, building and
    /// filling the body only on the first request.
    ///
    /// The builder receives the already-allocated handle so the body may
    /// reference itself.
    pub fn get_or_create<F>(&mut self, key: SchemaKey, name: &str, build: F) -> Result<SchemaHandle>
    where
        F: FnOnce(&mut Self, &SchemaHandle) -> Result<Schema>,
    {
        match self.reserve(key, name)? {
            Reservation::Existing(handle) => Ok(handle),
            Reservation::New(handle) => {
                let body = build(self, &handle)?;
                self.fill(&handle, body)?;
                Ok(handle)
            }
        }
    }

    pub fn body(&self, handle: &SchemaHandle) -> Option<&Schema> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.name == handle.name)
            .and_then(|slot| slot.body.as_ref())
    }

    pub fn body_by_name_mut(&mut self, name: &str) -> Option<&mut Schema> {
        let index = *self.by_name.get(name)?;
        self.slots[index].body.as_mut()
    }

    /// Mutates the body of an already filled slot in place.
    pub fn update<F>(&mut self, handle: &SchemaHandle, update: F) -> Result<()>
    where
        F: FnOnce(&mut Schema),
    {
        let slot = self.slot_mut(handle)?;
        match slot.body.as_mut() {
            Some(body) => {
                update(body);
                Ok(())
            }
            None => Err(SynthesisError::UnresolvedHandle(handle.name().to_string())),
        }
    }

    fn slot_mut(&mut self, handle: &SchemaHandle) -> Result<&mut Slot> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.name == handle.name)
            .ok_or_else(|| SynthesisError::UnresolvedHandle(handle.name().to_string()))
    }

    /// Names of slots that were reserved but never filled.
    pub fn unresolved(&self) -> Vec<&str> {
        self.slots
            .iter()
            .filter(|slot| slot.body.is_none())
            .map(|slot| &*slot.name)
            .collect()
    }

    /// Consumes the repository into `components.schemas`, sorted by name.
    ///
    /// # Errors
    ///
    /// Returns [`SynthesisError::UnresolvedHandle`] if any slot is unfilled.
    pub fn into_components(self) -> Result<IndexMap<String, Schema>> {
        let mut components = IndexMap::with_capacity(self.slots.len());
        for slot in self.slots {
            let body = slot
                .body
                .ok_or_else(|| SynthesisError::UnresolvedHandle(slot.name.to_string()))?;
            components.insert(slot.name.to_string(), body);
        }
        components.sort_keys();
        Ok(components)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reserve_returns_forward_reference() {
        let mut repo = SchemaRepository::new();
        let key = SchemaKey::Named("person".into());

        let first = match repo.reserve(key.clone(), "person").unwrap() {
            Reservation::New(handle) => handle,
            Reservation::Existing(_) => panic!("expected new slot"),
        };
        let again = match repo.reserve(key, "person").unwrap() {
            Reservation::Existing(handle) => handle,
            Reservation::New(_) => panic!("expected existing slot"),
        };
        assert_eq!(first, again);
        assert!(repo.body(&first).is_none());
        assert_eq!(repo.unresolved(), vec!["person"]);
    }

    #[test]
    fn test_get_or_create_builds_once() {
        let mut repo = SchemaRepository::new();
        let mut calls = 0;
        let a = repo
            .get_or_create(SchemaKey::Named("meta".into()), "meta", |_, _| {
                calls += 1;
                Ok(Schema::free_form_object())
            })
            .unwrap();
        let b = repo
            .get_or_create(SchemaKey::Named("meta".into()), "meta", |_, _| {
                panic!("must not rebuild")
            })
            .unwrap();
        assert_eq!(calls, 1);
        assert_eq!(a, b);
    }

    #[test]
    fn test_self_reference_while_building() {
        let mut repo = SchemaRepository::new();
        let handle = repo
            .get_or_create(SchemaKey::Named("node".into()), "node", |repo, this| {
                let nested = repo.lookup(&SchemaKey::Named("node".into())).unwrap();
                assert_eq!(&nested, this);
                let mut body = Schema::object();
                body.properties.insert("next".into(), this.to_reference());
                Ok(body)
            })
            .unwrap();
        let body = repo.body(&handle).unwrap();
        assert_eq!(body.properties["next"].referenced_name(), Some("node"));
    }

    #[test]
    fn test_define_conflict() {
        let mut repo = SchemaRepository::new();
        repo.define("meta", Schema::free_form_object()).unwrap();
        repo.define("meta", Schema::free_form_object()).unwrap();
        let err = repo.define("meta", Schema::string()).unwrap_err();
        assert!(matches!(err, SynthesisError::ConflictingDefinition { .. }));
    }

    #[test]
    fn test_name_bound_to_other_identity() {
        let mut repo = SchemaRepository::new();
        repo.define("peopleIdentifier", Schema::object()).unwrap();
        let err = repo
            .reserve(SchemaKey::Named("other".into()), "peopleIdentifier")
            .unwrap_err();
        assert!(matches!(err, SynthesisError::ConflictingDefinition { .. }));
    }

    #[test]
    fn test_into_components_rejects_unfilled() {
        let mut repo = SchemaRepository::new();
        repo.reserve(SchemaKey::Named("dangling".into()), "dangling").unwrap();
        let err = repo.into_components().unwrap_err();
        assert!(matches!(err, SynthesisError::UnresolvedHandle(name) if name == "dangling"));
    }

    #[test]
    fn test_components_are_sorted() {
        let mut repo = SchemaRepository::new();
        repo.define("zeta", Schema::string()).unwrap();
        repo.define("alpha", Schema::string()).unwrap();
        let components = repo.into_components().unwrap();
        let names: Vec<_> = components.keys().cloned().collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
    }

    #[test]
    fn test_update_filled_slot() {
        let mut repo = SchemaRepository::new();
        let handle = repo.define("meta", Schema::object()).unwrap();
        repo.update(&handle, |body| body.description = Some("free-form".into()))
            .unwrap();
        assert_eq!(
            repo.body(&handle).unwrap().description.as_deref(),
            Some("free-form")
        );
    }
}
