//! On-disk resource model format.
//!
//! A model file lists resource types with their attributes, relationships,
//! hierarchy and exposed endpoints. It can be written in TOML or JSON:
//!
//! ```toml
//! naming = "camelCase"
//!
//! [[resources]]
//! name = "Order"
//! client_id_generation = "allowed"
//!
//! [[resources.attributes]]
//! name = "total"
//! type = "decimal"
//! capabilities = ["view", "change"]
//!
//! [[resources.relationships]]
//! name = "customer"
//! kind = "to-one"
//! target = "Customer"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::{CoreError, Result};
use crate::graph::{ResourceGraph, ResourceGraphBuilder};
use crate::naming::NamingConvention;
use crate::resource::{
    Capabilities, Cardinality, ClientIdGeneration, EndpointSet, EnumType, JsonApiEndpoint,
    ObjectMember, ObjectType, ValueType,
};

/// Root of a model file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResourceGraphDefinition {
    #[serde(default)]
    pub naming: NamingConvention,
    #[serde(default)]
    pub resources: Vec<ResourceDefinition>,
}

impl ResourceGraphDefinition {
    pub fn from_toml_str(input: &str) -> Result<Self> {
        Ok(toml::from_str(input)?)
    }

    pub fn from_json_str(input: &str) -> Result<Self> {
        Ok(serde_json::from_str(input)?)
    }

    /// Reads a model file, choosing the format from its extension.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&content),
            Some("toml") => Self::from_toml_str(&content),
            other => Err(CoreError::invalid_model(format!(
                "unsupported model file extension {other:?} for {}",
                path.display()
            ))),
        }
    }

    /// Resolves the definition into an immutable graph.
    pub fn build(self) -> Result<ResourceGraph> {
        let mut builder = ResourceGraphBuilder::new().with_naming(self.naming);
        for resource in self.resources {
            builder = builder.resource(resource);
        }
        builder.build()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ResourceDefinition {
    pub name: String,
    #[serde(default)]
    pub public_name: Option<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default)]
    pub base: Option<String>,
    #[serde(default)]
    pub client_id_generation: Option<ClientIdGeneration>,
    #[serde(default)]
    pub endpoints: EndpointsDefinition,
    #[serde(default)]
    pub attributes: Vec<AttributeDefinition>,
    #[serde(default)]
    pub relationships: Vec<RelationshipDefinition>,
}

impl ResourceDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            public_name: None,
            is_abstract: false,
            base: None,
            client_id_generation: None,
            endpoints: EndpointsDefinition::default(),
            attributes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn public_name(mut self, public_name: impl Into<String>) -> Self {
        self.public_name = Some(public_name.into());
        self
    }

    pub fn abstract_type(mut self) -> Self {
        self.is_abstract = true;
        self
    }

    pub fn base(mut self, base: impl Into<String>) -> Self {
        self.base = Some(base.into());
        self
    }

    pub fn client_id_generation(mut self, mode: ClientIdGeneration) -> Self {
        self.client_id_generation = Some(mode);
        self
    }

    pub fn endpoints(mut self, endpoints: EndpointsDefinition) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Marks the type as having no controller of its own.
    pub fn without_endpoints(self) -> Self {
        self.endpoints(EndpointsDefinition::Preset(EndpointPreset::None))
    }

    pub fn attribute(mut self, attribute: AttributeDefinition) -> Self {
        self.attributes.push(attribute);
        self
    }

    pub fn relationship(mut self, relationship: RelationshipDefinition) -> Self {
        self.relationships.push(relationship);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EndpointPreset {
    All,
    ReadOnly,
    None,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EndpointsDefinition {
    Preset(EndpointPreset),
    List(Vec<JsonApiEndpoint>),
}

impl Default for EndpointsDefinition {
    fn default() -> Self {
        Self::Preset(EndpointPreset::All)
    }
}

impl EndpointsDefinition {
    pub(crate) fn resolve(&self) -> Option<EndpointSet> {
        match self {
            Self::Preset(EndpointPreset::All) => Some(EndpointSet::all()),
            Self::Preset(EndpointPreset::ReadOnly) => Some(EndpointSet::read_only()),
            Self::Preset(EndpointPreset::None) => None,
            Self::List(list) => Some(list.iter().copied().collect()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AttributeDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueTypeDefinition,
    #[serde(default = "default_capabilities")]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, rename = "required")]
    pub required_on_create: bool,
    #[serde(default = "default_true")]
    pub getter: bool,
    #[serde(default = "default_true")]
    pub setter: bool,
}

impl AttributeDefinition {
    pub fn new(name: impl Into<String>, value_type: impl Into<ValueTypeDefinition>) -> Self {
        Self {
            name: name.into(),
            value_type: value_type.into(),
            capabilities: default_capabilities(),
            nullable: false,
            required_on_create: false,
            getter: true,
            setter: true,
        }
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn required(mut self) -> Self {
        self.required_on_create = true;
        self
    }

    pub fn without_getter(mut self) -> Self {
        self.getter = false;
        self
    }

    pub fn without_setter(mut self) -> Self {
        self.setter = false;
        self
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RelationshipDefinition {
    pub name: String,
    #[serde(rename = "kind")]
    pub cardinality: Cardinality,
    pub target: String,
    #[serde(default = "default_capabilities")]
    pub capabilities: Capabilities,
    #[serde(default = "default_true")]
    pub nullable: bool,
}

impl RelationshipDefinition {
    pub fn to_one(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cardinality: Cardinality::ToOne,
            target: target.into(),
            capabilities: default_capabilities(),
            nullable: true,
        }
    }

    pub fn to_many(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            cardinality: Cardinality::ToMany,
            ..Self::to_one(name, target)
        }
    }

    pub fn capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn required(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Attribute type as written in a model file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum ValueTypeDefinition {
    Keyword(String),
    Enum {
        #[serde(rename = "enum")]
        name: String,
        values: Vec<String>,
    },
    Object {
        object: String,
        members: Vec<MemberDefinition>,
    },
    Array {
        array: Box<ValueTypeDefinition>,
    },
}

impl From<&str> for ValueTypeDefinition {
    fn from(value: &str) -> Self {
        Self::Keyword(value.to_string())
    }
}

impl ValueTypeDefinition {
    pub(crate) fn resolve(&self, naming: NamingConvention) -> Result<ValueType> {
        match self {
            Self::Keyword(keyword) => ValueType::primitive(keyword).ok_or_else(|| {
                CoreError::invalid_model(format!("unknown attribute type '{keyword}'"))
            }),
            Self::Enum { name, values } => {
                if values.is_empty() {
                    return Err(CoreError::invalid_model(format!(
                        "enum '{name}' declares no values"
                    )));
                }
                Ok(ValueType::Enum(EnumType {
                    name: name.clone(),
                    values: values.clone(),
                }))
            }
            Self::Object { object, members } => {
                let members = members
                    .iter()
                    .map(|m| {
                        Ok(ObjectMember {
                            name: naming.apply(&m.name),
                            value_type: m.value_type.resolve(naming)?,
                            nullable: m.nullable,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(ValueType::Object(ObjectType {
                    name: object.clone(),
                    members,
                }))
            }
            Self::Array { array } => Ok(ValueType::Array(Box::new(array.resolve(naming)?))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MemberDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub value_type: ValueTypeDefinition,
    #[serde(default)]
    pub nullable: bool,
}

fn default_capabilities() -> Capabilities {
    Capabilities::ALL
}

fn default_true() -> bool {
    true
}
