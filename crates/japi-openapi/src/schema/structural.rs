//! Generic, JSON:API-agnostic schema generation.
//!
//! The [`StructuralGenerator`] turns plain object shapes and attribute value
//! types into schemas. It knows nothing about JSON:API: it marks every member
//! that is not a value type as nullable, the way a reflection-based
//! generator would for reference-typed properties. The JSON:API layer then
//! replaces placeholder members and the
//! [`NullabilityNormalizer`](super::NullabilityNormalizer) repairs the
//! nullability of members the protocol never allows to be `null`.
//!
//! The shapes of the protocol envelopes (links, meta, error objects and the
//! document skeletons) are declared at the bottom of this module.

use japi_core::{ObjectType, ValueType};

use crate::error::Result;
use crate::model::Schema;
use crate::schema::repository::{SchemaKey, SchemaRepository};

/// Type of a member of an [`ObjectShape`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemberType {
    String,
    Integer,
    Boolean,
    /// Reference to another named shape.
    Object(ObjectShape),
    Array(Box<MemberType>),
    /// Value filled in later by the JSON:API layer.
    Placeholder,
}

impl MemberType {
    pub fn is_value_type(&self) -> bool {
        matches!(self, Self::Integer | Self::Boolean)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShapeMember {
    pub name: &'static str,
    pub member_type: MemberType,
    pub required: bool,
}

/// A plain object shape, e.g. the members of a links object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectShape {
    pub name: &'static str,
    pub members: Vec<ShapeMember>,
    /// Accepts arbitrary additional members.
    pub open: bool,
}

impl ObjectShape {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            members: Vec::new(),
            open: false,
        }
    }

    pub fn open(mut self) -> Self {
        self.open = true;
        self
    }

    pub fn member(mut self, name: &'static str, member_type: MemberType) -> Self {
        self.members.push(ShapeMember {
            name,
            member_type,
            required: false,
        });
        self
    }

    pub fn required_member(mut self, name: &'static str, member_type: MemberType) -> Self {
        self.members.push(ShapeMember {
            name,
            member_type,
            required: true,
        });
        self
    }
}

/// Produces base schemas for object shapes and attribute values.
pub trait StructuralGenerator: Send + Sync {
    /// Schema body of `shape`. Nested named shapes are defined in the
    /// repository and referenced.
    fn generate_object(&self, shape: &ObjectShape, repository: &mut SchemaRepository) -> Result<Schema>;

    /// Schema of an attribute value. Named enums and complex objects are
    /// defined in the repository and referenced.
    fn generate_value(&self, value_type: &ValueType, repository: &mut SchemaRepository) -> Result<Schema>;

    /// Defines a named shape in the repository and returns a reference to it.
    fn define_shape(&self, shape: &ObjectShape, repository: &mut SchemaRepository) -> Result<Schema> {
        let handle = repository.get_or_create(SchemaKey::Named(shape.name.to_string()), shape.name, |repo, _| {
            self.generate_object(shape, repo)
        })?;
        Ok(handle.to_reference())
    }
}

/// Default generator following reference-type nullability.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultStructuralGenerator;

impl DefaultStructuralGenerator {
    fn member_schema(&self, member_type: &MemberType, repository: &mut SchemaRepository) -> Result<Schema> {
        let mut schema = match member_type {
            MemberType::String => Schema::string(),
            MemberType::Integer => Schema::of_type(crate::model::SchemaType::Integer),
            MemberType::Boolean => Schema::boolean(),
            MemberType::Object(shape) => self.define_shape(shape, repository)?,
            MemberType::Array(items) => {
                let mut items = self.member_schema(items, repository)?;
                // array items are never null
                items.clear_nullable();
                Schema::array(items)
            }
            MemberType::Placeholder => Schema::default(),
        };
        if !member_type.is_value_type() {
            schema.make_nullable();
        }
        Ok(schema)
    }

    fn complex_object(&self, object: &ObjectType, repository: &mut SchemaRepository) -> Result<Schema> {
        let key = SchemaKey::ValueType(ValueType::Object(object.clone()));
        let handle = repository.get_or_create(key, &object.name, |repo, _| {
            let mut body = Schema::object();
            for member in &object.members {
                let mut schema = self.generate_value(&member.value_type, repo)?;
                schema.set_nullable(member.nullable);
                if !member.nullable {
                    body.require(&member.name);
                }
                body.properties.insert(member.name.clone(), schema);
            }
            Ok(body)
        })?;
        Ok(handle.to_reference())
    }
}

impl StructuralGenerator for DefaultStructuralGenerator {
    fn generate_object(&self, shape: &ObjectShape, repository: &mut SchemaRepository) -> Result<Schema> {
        let mut body = Schema::object();
        for member in &shape.members {
            let schema = self.member_schema(&member.member_type, repository)?;
            body.properties.insert(member.name.to_string(), schema);
            if member.required {
                body.require(member.name);
            }
        }
        if shape.open {
            body.additional_properties = Some(Box::default());
        }
        Ok(body)
    }

    fn generate_value(&self, value_type: &ValueType, repository: &mut SchemaRepository) -> Result<Schema> {
        use crate::model::SchemaType;

        let mut schema = match value_type {
            ValueType::String => Schema::string(),
            ValueType::Integer => Schema::of_type(SchemaType::Integer).with_format("int32"),
            ValueType::Long => Schema::of_type(SchemaType::Integer).with_format("int64"),
            ValueType::Number => Schema::of_type(SchemaType::Number).with_format("double"),
            ValueType::Decimal => Schema::of_type(SchemaType::Number),
            ValueType::Boolean => Schema::boolean(),
            ValueType::Date => Schema::string().with_format("date"),
            ValueType::DateTime => Schema::string().with_format("date-time"),
            ValueType::Uuid => Schema::string().with_format("uuid"),
            ValueType::Enum(enumeration) => {
                let handle = repository.get_or_create(
                    SchemaKey::ValueType(value_type.clone()),
                    &enumeration.name,
                    |_, _| Ok(Schema::string_enum(enumeration.values.iter().cloned())),
                )?;
                handle.to_reference()
            }
            ValueType::Object(object) => self.complex_object(object, repository)?,
            ValueType::Array(items) => {
                let mut items = self.generate_value(items, repository)?;
                items.clear_nullable();
                Schema::array(items)
            }
        };
        if !value_type.is_value_type() {
            schema.make_nullable();
        }
        Ok(schema)
    }
}

/// Free-form `meta` object.
pub fn meta_shape() -> ObjectShape {
    ObjectShape::new("meta").open()
}

/// The `jsonapi` top-level member.
pub fn jsonapi_shape() -> ObjectShape {
    ObjectShape::new("jsonapi")
        .member("version", MemberType::String)
        .member("ext", MemberType::Array(Box::new(MemberType::String)))
        .member("profile", MemberType::Array(Box::new(MemberType::String)))
        .member("meta", MemberType::Object(meta_shape()))
}

fn links_shape(name: &'static str, links: &[&'static str], required: &[&'static str]) -> ObjectShape {
    links.iter().fold(ObjectShape::new(name), |shape, &link| {
        if required.contains(&link) {
            shape.required_member(link, MemberType::String)
        } else {
            shape.member(link, MemberType::String)
        }
    })
}

const PAGINATION_LINKS: [&str; 4] = ["first", "last", "prev", "next"];

/// Top-level links of a document, chosen by what the document carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopLevelLinks {
    Resource,
    ResourceCollection,
    ResourceIdentifier,
    ResourceIdentifierCollection,
    Error,
}

impl TopLevelLinks {
    pub fn shape(self) -> ObjectShape {
        let mut names: Vec<&'static str> = match self {
            Self::Resource => vec!["self", "describedby"],
            Self::ResourceCollection => vec!["self", "describedby"],
            Self::ResourceIdentifier | Self::ResourceIdentifierCollection => {
                vec!["self", "related", "describedby"]
            }
            Self::Error => vec!["self", "describedby"],
        };
        if matches!(self, Self::ResourceCollection | Self::ResourceIdentifierCollection) {
            names.extend(PAGINATION_LINKS);
        }
        let name = match self {
            Self::Resource => "resourceTopLevelLinks",
            Self::ResourceCollection => "resourceCollectionTopLevelLinks",
            Self::ResourceIdentifier => "resourceIdentifierTopLevelLinks",
            Self::ResourceIdentifierCollection => "resourceIdentifierCollectionTopLevelLinks",
            Self::Error => "errorTopLevelLinks",
        };
        let required: &[&str] = if self == Self::Error { &[] } else { &["self"] };
        links_shape(name, &names, required)
    }
}

pub fn resource_links_shape() -> ObjectShape {
    links_shape("resourceLinks", &["self"], &[])
}

pub fn relationship_links_shape() -> ObjectShape {
    links_shape("relationshipLinks", &["self", "related"], &[])
}

pub fn error_links_shape() -> ObjectShape {
    links_shape("errorLinks", &["about", "type"], &[])
}

pub fn error_source_shape() -> ObjectShape {
    ObjectShape::new("errorSource")
        .member("pointer", MemberType::String)
        .member("parameter", MemberType::String)
        .member("header", MemberType::String)
}

pub fn error_object_shape() -> ObjectShape {
    ObjectShape::new("errorObject")
        .member("id", MemberType::String)
        .member("links", MemberType::Object(error_links_shape()))
        .member("status", MemberType::String)
        .member("code", MemberType::String)
        .member("title", MemberType::String)
        .member("detail", MemberType::String)
        .member("source", MemberType::Object(error_source_shape()))
        .member("meta", MemberType::Object(meta_shape()))
}

/// Skeleton of a top-level document. `data` and `included` are placeholders.
pub fn document_shape(links: Option<TopLevelLinks>, with_included: bool) -> ObjectShape {
    let mut shape = ObjectShape::new("document").required_member("data", MemberType::Placeholder);
    if with_included {
        shape = shape.member("included", MemberType::Placeholder);
    }
    if let Some(links) = links {
        shape = shape.member("links", MemberType::Object(links.shape()));
    }
    shape
        .member("meta", MemberType::Object(meta_shape()))
        .member("jsonapi", MemberType::Object(jsonapi_shape()))
}

pub fn error_document_shape() -> ObjectShape {
    ObjectShape::new("errorResponseDocument")
        .required_member("errors", MemberType::Array(Box::new(MemberType::Object(error_object_shape()))))
        .member("links", MemberType::Object(TopLevelLinks::Error.shape()))
        .member("meta", MemberType::Object(meta_shape()))
        .member("jsonapi", MemberType::Object(jsonapi_shape()))
}

/// Skeleton of a resource object in canonical member order.
pub fn resource_object_shape(with_links: bool) -> ObjectShape {
    let mut shape = ObjectShape::new("resourceObject")
        .required_member("type", MemberType::Placeholder)
        .member("id", MemberType::String)
        .member("attributes", MemberType::Placeholder)
        .member("relationships", MemberType::Placeholder);
    if with_links {
        shape = shape.member("links", MemberType::Object(resource_links_shape()));
    }
    shape.member("meta", MemberType::Object(meta_shape()))
}

/// Skeleton of a relationship object.
pub fn relationship_object_shape(with_links: bool) -> ObjectShape {
    let mut shape = ObjectShape::new("relationshipObject");
    if with_links {
        shape = shape.member("links", MemberType::Object(relationship_links_shape()));
    }
    shape
        .member("data", MemberType::Placeholder)
        .member("meta", MemberType::Object(meta_shape()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SynthesisError;
    use japi_core::{EnumType, ObjectMember};
    use serde_json::json;

    #[test]
    fn test_reference_members_are_nullable() {
        let mut repo = SchemaRepository::new();
        let body = DefaultStructuralGenerator
            .generate_object(&resource_object_shape(true), &mut repo)
            .unwrap();

        assert!(body.properties["id"].is_nullable());
        assert!(body.properties["links"].is_nullable());
        assert!(body.properties["meta"].is_nullable());
        assert_eq!(body.properties["links"].referenced_name(), Some("resourceLinks"));
        assert_eq!(body.required, vec!["type"]);
        assert!(repo.lookup_name("resourceLinks").is_some());
        assert!(repo.lookup_name("meta").is_some());
    }

    #[test]
    fn test_shared_shapes_defined_once() {
        let mut repo = SchemaRepository::new();
        let generator = DefaultStructuralGenerator;
        generator.define_shape(&jsonapi_shape(), &mut repo).unwrap();
        generator.define_shape(&error_object_shape(), &mut repo).unwrap();
        // meta is reached through both shapes
        let names = ["meta", "jsonapi", "errorObject", "errorLinks", "errorSource"];
        assert_eq!(repo.len(), names.len());
        for name in names {
            assert!(repo.lookup_name(name).is_some(), "{name} missing");
        }
    }

    #[test]
    fn test_collection_links_include_pagination() {
        let shape = TopLevelLinks::ResourceCollection.shape();
        let names: Vec<_> = shape.members.iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["self", "describedby", "first", "last", "prev", "next"]);
        assert!(shape.members[0].required);
    }

    #[test]
    fn test_value_type_schemas() {
        let mut repo = SchemaRepository::new();
        let generator = DefaultStructuralGenerator;

        let int = generator.generate_value(&ValueType::Integer, &mut repo).unwrap();
        assert_eq!(serde_json::to_value(&int).unwrap(), json!({"type": "integer", "format": "int32"}));

        let text = generator.generate_value(&ValueType::String, &mut repo).unwrap();
        assert_eq!(serde_json::to_value(&text).unwrap(), json!({"type": "string", "nullable": true}));

        let status = ValueType::Enum(EnumType {
            name: "orderStatus".into(),
            values: vec!["open".into(), "shipped".into()],
        });
        let reference = generator.generate_value(&status, &mut repo).unwrap();
        assert_eq!(reference, Schema::reference("orderStatus"));
        assert!(repo.lookup_name("orderStatus").is_some());
    }

    #[test]
    fn test_complex_attribute_object() {
        let mut repo = SchemaRepository::new();
        let address = ValueType::Object(ObjectType {
            name: "address".into(),
            members: vec![
                ObjectMember {
                    name: "street".into(),
                    value_type: ValueType::String,
                    nullable: false,
                },
                ObjectMember {
                    name: "number".into(),
                    value_type: ValueType::Integer,
                    nullable: false,
                },
            ],
        });
        let schema = DefaultStructuralGenerator.generate_value(&address, &mut repo).unwrap();
        assert!(schema.is_nullable());
        assert_eq!(schema.referenced_name(), Some("address"));

        let handle = repo.lookup_name("address").unwrap();
        let body = serde_json::to_value(repo.body(&handle).unwrap()).unwrap();
        assert_eq!(
            body,
            json!({
                "type": "object",
                "required": ["street", "number"],
                "properties": {
                    "street": {"type": "string"},
                    "number": {"type": "integer", "format": "int32"}
                }
            })
        );
    }

    fn status(values: &[&str]) -> ValueType {
        ValueType::Enum(EnumType {
            name: "status".into(),
            values: values.iter().map(|v| v.to_string()).collect(),
        })
    }

    #[test]
    fn test_same_enum_is_defined_once() {
        let mut repo = SchemaRepository::new();
        let generator = DefaultStructuralGenerator;
        let first = generator.generate_value(&status(&["open", "shipped"]), &mut repo).unwrap();
        let second = generator.generate_value(&status(&["open", "shipped"]), &mut repo).unwrap();
        assert_eq!(first, second);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_different_enums_under_one_name_conflict() {
        let mut repo = SchemaRepository::new();
        let generator = DefaultStructuralGenerator;
        generator.generate_value(&status(&["open", "shipped"]), &mut repo).unwrap();

        let err = generator
            .generate_value(&status(&["new", "closed"]), &mut repo)
            .unwrap_err();
        assert!(matches!(err, SynthesisError::ConflictingDefinition { ref name, .. } if name == "status"));
    }

    #[test]
    fn test_value_type_cannot_shadow_structural_schema() {
        let generator = DefaultStructuralGenerator;
        let meta_enum = ValueType::Enum(EnumType {
            name: "meta".into(),
            values: vec!["a".into()],
        });

        // structural schema first
        let mut repo = SchemaRepository::new();
        generator.define_shape(&meta_shape(), &mut repo).unwrap();
        let err = generator.generate_value(&meta_enum, &mut repo).unwrap_err();
        assert!(matches!(err, SynthesisError::ConflictingDefinition { .. }));

        // attribute type first
        let mut repo = SchemaRepository::new();
        generator.generate_value(&meta_enum, &mut repo).unwrap();
        let err = generator.define_shape(&meta_shape(), &mut repo).unwrap_err();
        assert!(matches!(err, SynthesisError::ConflictingDefinition { .. }));
    }

    #[test]
    fn test_different_objects_under_one_name_conflict() {
        let mut repo = SchemaRepository::new();
        let generator = DefaultStructuralGenerator;
        let address = |member: &str| {
            ValueType::Object(ObjectType {
                name: "address".into(),
                members: vec![ObjectMember {
                    name: member.into(),
                    value_type: ValueType::String,
                    nullable: false,
                }],
            })
        };
        generator.generate_value(&address("street"), &mut repo).unwrap();
        assert!(generator.generate_value(&address("street"), &mut repo).is_ok());
        assert!(generator.generate_value(&address("city"), &mut repo).is_err());
    }
}
