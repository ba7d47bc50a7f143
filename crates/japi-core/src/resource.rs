//! Resource type descriptors.
//!
//! A [`ResourceTypeDescriptor`] is the resolved, immutable view of one
//! resource type in the [`ResourceGraph`](crate::ResourceGraph): its public
//! name, fields, hierarchy links and exposed endpoints.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque identity of a resource type within one graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceTypeId(pub(crate) u32);

impl ResourceTypeId {
    /// Position of the type in declaration order.
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for ResourceTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A single capability a field can grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Capability {
    #[serde(rename = "view", alias = "viewable")]
    Viewable,
    #[serde(rename = "create", alias = "creatable")]
    Creatable,
    #[serde(rename = "change", alias = "changeable")]
    Changeable,
}

/// Set of capabilities declared on an attribute or relationship.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "Vec<Capability>", into = "Vec<Capability>")]
pub struct Capabilities {
    pub viewable: bool,
    pub creatable: bool,
    pub changeable: bool,
}

impl Capabilities {
    /// Every capability.
    pub const ALL: Self = Self {
        viewable: true,
        creatable: true,
        changeable: true,
    };

    /// No capability at all.
    pub const NONE: Self = Self {
        viewable: false,
        creatable: false,
        changeable: false,
    };

    pub fn of(capabilities: impl IntoIterator<Item = Capability>) -> Self {
        let mut set = Self::NONE;
        for capability in capabilities {
            match capability {
                Capability::Viewable => set.viewable = true,
                Capability::Creatable => set.creatable = true,
                Capability::Changeable => set.changeable = true,
            }
        }
        set
    }

    pub fn contains(&self, capability: Capability) -> bool {
        match capability {
            Capability::Viewable => self.viewable,
            Capability::Creatable => self.creatable,
            Capability::Changeable => self.changeable,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.viewable && !self.creatable && !self.changeable
    }
}

impl From<Vec<Capability>> for Capabilities {
    fn from(value: Vec<Capability>) -> Self {
        Self::of(value)
    }
}

impl From<Capabilities> for Vec<Capability> {
    fn from(value: Capabilities) -> Self {
        let mut out = Vec::with_capacity(3);
        if value.viewable {
            out.push(Capability::Viewable);
        }
        if value.creatable {
            out.push(Capability::Creatable);
        }
        if value.changeable {
            out.push(Capability::Changeable);
        }
        out
    }
}

/// Whether clients may (or must) send their own `id` when creating a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClientIdGeneration {
    #[default]
    Forbidden,
    Allowed,
    Required,
}

/// Value type of an attribute.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ValueType {
    String,
    Integer,
    Long,
    Number,
    Decimal,
    Boolean,
    Date,
    DateTime,
    Uuid,
    Enum(EnumType),
    Object(ObjectType),
    Array(Box<ValueType>),
}

impl ValueType {
    /// Value types can never hold `null` unless a field declares them nullable.
    ///
    /// Strings, complex objects and arrays are reference-like and may be
    /// absent by default.
    pub fn is_value_type(&self) -> bool {
        !matches!(self, Self::String | Self::Object(_) | Self::Array(_))
    }

    /// Parses a primitive type keyword as used in model files.
    pub fn primitive(keyword: &str) -> Option<Self> {
        let value = match keyword {
            "string" => Self::String,
            "integer" | "int" => Self::Integer,
            "long" => Self::Long,
            "number" | "double" => Self::Number,
            "decimal" => Self::Decimal,
            "boolean" | "bool" => Self::Boolean,
            "date" => Self::Date,
            "date-time" | "datetime" => Self::DateTime,
            "uuid" => Self::Uuid,
            _ => return None,
        };
        Some(value)
    }
}

/// A named enumeration of string values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EnumType {
    pub name: String,
    pub values: Vec<String>,
}

/// A named complex attribute type.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectType {
    pub name: String,
    pub members: Vec<ObjectMember>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ObjectMember {
    pub name: String,
    pub value_type: ValueType,
    pub nullable: bool,
}

/// An attribute of a resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeField {
    pub name: String,
    pub value_type: ValueType,
    pub capabilities: Capabilities,
    pub nullable: bool,
    pub required_on_create: bool,
    /// Fields without a getter never appear in responses.
    pub has_getter: bool,
    /// Fields without a setter never appear in requests.
    pub has_setter: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Cardinality {
    ToOne,
    ToMany,
}

/// A relationship from one resource type to another.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationshipField {
    pub name: String,
    pub cardinality: Cardinality,
    pub target: ResourceTypeId,
    pub capabilities: Capabilities,
    /// Only meaningful for to-one relationships.
    pub nullable: bool,
}

impl RelationshipField {
    pub fn is_to_one(&self) -> bool {
        self.cardinality == Cardinality::ToOne
    }

    /// Whether the relationship linkage may be `null`.
    pub fn is_nullable(&self) -> bool {
        self.is_to_one() && self.nullable
    }
}

/// A JSON:API endpoint a resource controller can expose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum JsonApiEndpoint {
    GetCollection,
    GetSingle,
    GetSecondary,
    GetRelationship,
    Post,
    PostRelationship,
    Patch,
    PatchRelationship,
    Delete,
    DeleteRelationship,
}

impl JsonApiEndpoint {
    pub const ALL: [Self; 10] = [
        Self::GetCollection,
        Self::GetSingle,
        Self::GetSecondary,
        Self::GetRelationship,
        Self::Post,
        Self::PostRelationship,
        Self::Patch,
        Self::PatchRelationship,
        Self::Delete,
        Self::DeleteRelationship,
    ];
}

/// Endpoints exposed by the controller of a resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointSet(BTreeSet<JsonApiEndpoint>);

impl EndpointSet {
    pub fn all() -> Self {
        Self(JsonApiEndpoint::ALL.into_iter().collect())
    }

    pub fn read_only() -> Self {
        Self(
            [
                JsonApiEndpoint::GetCollection,
                JsonApiEndpoint::GetSingle,
                JsonApiEndpoint::GetSecondary,
                JsonApiEndpoint::GetRelationship,
            ]
            .into_iter()
            .collect(),
        )
    }

    pub fn contains(&self, endpoint: JsonApiEndpoint) -> bool {
        self.0.contains(&endpoint)
    }

    pub fn iter(&self) -> impl Iterator<Item = JsonApiEndpoint> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<JsonApiEndpoint> for EndpointSet {
    fn from_iter<T: IntoIterator<Item = JsonApiEndpoint>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// Resolved description of one resource type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceTypeDescriptor {
    pub id: ResourceTypeId,
    /// Declared type name, e.g. `BlogPost`.
    pub type_name: String,
    /// Public plural name, e.g. `blogPosts`. Used as the JSON:API `type`.
    pub public_name: String,
    /// Inherited attributes first, then the type's own, in declaration order.
    pub attributes: Vec<AttributeField>,
    /// Inherited relationships first, then the type's own, in declaration order.
    pub relationships: Vec<RelationshipField>,
    pub base_type: Option<ResourceTypeId>,
    /// Direct subtypes, in declaration order.
    pub sub_types: Vec<ResourceTypeId>,
    pub is_abstract: bool,
    /// Per-type override of the configured default.
    pub client_id_generation: Option<ClientIdGeneration>,
    /// `None` when no controller exists for the type.
    pub endpoints: Option<EndpointSet>,
}

impl ResourceTypeDescriptor {
    /// Whether the type participates in an inheritance hierarchy.
    pub fn is_polymorphic(&self) -> bool {
        self.base_type.is_some() || !self.sub_types.is_empty()
    }

    /// A type with subtypes is referenced through its hierarchy's abstract schema.
    pub fn has_sub_types(&self) -> bool {
        !self.sub_types.is_empty()
    }

    pub fn find_attribute(&self, name: &str) -> Option<&AttributeField> {
        self.attributes.iter().find(|a| a.name == name)
    }

    pub fn find_relationship(&self, name: &str) -> Option<&RelationshipField> {
        self.relationships.iter().find(|r| r.name == name)
    }
}
