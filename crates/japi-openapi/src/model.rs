//! OpenAPI 3.0 schema objects.
//!
//! Only the subset of the schema vocabulary that generated documents use is
//! modelled. Property maps are [`IndexMap`]s so serialized output follows
//! insertion order.

use indexmap::IndexMap;
use serde::Serialize;

/// Prefix of every component reference.
pub const COMPONENTS_PREFIX: &str = "#/components/schemas/";

/// JSON type keyword of a schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    String,
    Integer,
    Number,
    Boolean,
    Object,
    Array,
}

/// Discriminator of a polymorphic schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Discriminator {
    pub property_name: String,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub mapping: IndexMap<String, String>,
}

impl Discriminator {
    pub fn new(property_name: impl Into<String>) -> Self {
        Self {
            property_name: property_name.into(),
            mapping: IndexMap::new(),
        }
    }
}

/// An OpenAPI schema object.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Schema {
    #[serde(rename = "$ref", skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,

    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub schema_type: Option<SchemaType>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,

    #[serde(rename = "enum", skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub required: Vec<String>,

    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub properties: IndexMap<String, Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<Schema>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<Schema>>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub all_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub one_of: Vec<Schema>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub discriminator: Option<Discriminator>,

    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub nullable: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Schema {
    pub fn of_type(schema_type: SchemaType) -> Self {
        Self {
            schema_type: Some(schema_type),
            ..Default::default()
        }
    }

    pub fn string() -> Self {
        Self::of_type(SchemaType::String)
    }

    pub fn boolean() -> Self {
        Self::of_type(SchemaType::Boolean)
    }

    pub fn object() -> Self {
        Self::of_type(SchemaType::Object)
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn array(items: Schema) -> Self {
        Self {
            schema_type: Some(SchemaType::Array),
            items: Some(Box::new(items)),
            ..Default::default()
        }
    }

    /// A string schema restricted to the given values.
    pub fn string_enum<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            schema_type: Some(SchemaType::String),
            enum_values: values.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    /// An object that accepts any members.
    pub fn free_form_object() -> Self {
        Self {
            schema_type: Some(SchemaType::Object),
            additional_properties: Some(Box::default()),
            ..Default::default()
        }
    }

    /// A reference to the named component schema.
    pub fn reference(name: &str) -> Self {
        Self {
            reference: Some(format!("{COMPONENTS_PREFIX}{name}")),
            ..Default::default()
        }
    }

    /// A bare `$ref` with no sibling keywords.
    pub fn is_pure_reference(&self) -> bool {
        self.reference.is_some() && *self == Self::reference_only(self.reference.clone())
    }

    fn reference_only(reference: Option<String>) -> Self {
        Self {
            reference,
            ..Default::default()
        }
    }

    /// Component name this schema points at, looking through a nullable
    /// `allOf` wrapper.
    pub fn referenced_name(&self) -> Option<&str> {
        if let Some(reference) = &self.reference {
            return reference.strip_prefix(COMPONENTS_PREFIX);
        }
        if self.is_nullable_reference_wrapper() {
            return self.all_of[0].referenced_name();
        }
        None
    }

    fn is_nullable_reference_wrapper(&self) -> bool {
        self.all_of.len() == 1
            && self.all_of[0].is_pure_reference()
            && *self
                == Self {
                    all_of: self.all_of.clone(),
                    nullable: self.nullable,
                    ..Default::default()
                }
    }

    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Marks the schema as nullable.
    ///
    /// `$ref` siblings are ignored by OpenAPI 3.0 tooling, so a pure
    /// reference is wrapped as `{"allOf": [{"$ref": ..}], "nullable": true}`.
    pub fn make_nullable(&mut self) {
        if self.is_pure_reference() {
            let reference = std::mem::take(self);
            *self = Self {
                all_of: vec![reference],
                nullable: true,
                ..Default::default()
            };
        } else {
            self.nullable = true;
        }
    }

    pub fn into_nullable(mut self) -> Self {
        self.make_nullable();
        self
    }

    /// Clears nullability, unwrapping a nullable reference wrapper.
    pub fn clear_nullable(&mut self) {
        if self.is_nullable_reference_wrapper() {
            let inner = self.all_of.remove(0);
            *self = inner;
        } else {
            self.nullable = false;
        }
    }

    /// Sets nullability to exactly `nullable`.
    pub fn set_nullable(&mut self, nullable: bool) {
        if nullable {
            if !self.nullable {
                self.make_nullable();
            }
        } else {
            self.clear_nullable();
        }
    }

    pub fn require(&mut self, member: &str) {
        if !self.required.iter().any(|r| r == member) {
            self.required.push(member.to_string());
        }
    }

    /// Removes a property along with its `required` entry.
    pub fn remove_property(&mut self, member: &str) -> Option<Schema> {
        self.required.retain(|r| r != member);
        self.properties.shift_remove(member)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nullable_reference_is_wrapped() {
        let schema = Schema::reference("people").into_nullable();
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({"allOf": [{"$ref": "#/components/schemas/people"}], "nullable": true})
        );
        assert_eq!(schema.referenced_name(), Some("people"));
    }

    #[test]
    fn test_clear_nullable_unwraps_reference() {
        let mut schema = Schema::reference("meta").into_nullable();
        schema.clear_nullable();
        assert_eq!(schema, Schema::reference("meta"));
        assert!(schema.is_pure_reference());
    }

    #[test]
    fn test_nullable_plain_schema() {
        let mut schema = Schema::string();
        schema.set_nullable(true);
        assert_eq!(
            serde_json::to_value(&schema).unwrap(),
            json!({"type": "string", "nullable": true})
        );
        schema.set_nullable(false);
        assert!(!schema.is_nullable());
    }

    #[test]
    fn test_property_order_is_preserved() {
        let mut schema = Schema::object();
        schema.properties.insert("type".into(), Schema::string());
        schema.properties.insert("id".into(), Schema::string());
        schema.properties.insert("attributes".into(), Schema::object());
        schema.require("type");
        schema.require("type");

        let text = serde_json::to_string(&schema).unwrap();
        assert_eq!(
            text,
            r#"{"type":"object","required":["type"],"properties":{"type":{"type":"string"},"id":{"type":"string"},"attributes":{"type":"object"}}}"#
        );
    }

    #[test]
    fn test_free_form_object() {
        assert_eq!(
            serde_json::to_value(Schema::free_form_object()).unwrap(),
            json!({"type": "object", "additionalProperties": {}})
        );
    }
}
