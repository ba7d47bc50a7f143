//! Paths and operations of a JSON:API document.
//!
//! Every endpoint a resource type exposes becomes an operation whose request
//! and response bodies reference synthesized document schemas.

use indexmap::IndexMap;
use japi_core::{Capability, JsonApiEndpoint, RelationshipField, ResourceTypeDescriptor};
use tracing::trace;

use crate::error::Result;
use crate::model::Schema;
use crate::openapi::{Operation, Parameter, PathItem, RequestBody, Response};
use crate::schema::{DocumentCategory, DocumentSchemaSynthesizer, DocumentType, SynthesisContext, schema_name};

/// One path pattern with its operations.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry {
    pub path: String,
    pub item: PathItem,
}

const BAD_REQUEST: &str = "400";
const NOT_FOUND: &str = "404";
const CONFLICT: &str = "409";
const UNPROCESSABLE: &str = "422";

fn error_description(status: &str) -> &'static str {
    match status {
        BAD_REQUEST => "The query string or request body is invalid.",
        NOT_FOUND => "The resource does not exist.",
        CONFLICT => "The request conflicts with the resource type or id in the URL.",
        UNPROCESSABLE => "Validation of the request body failed.",
        _ => "The request failed.",
    }
}

/// Generates path entries for a set of resource types.
pub struct PathGenerator<'c, 'g> {
    ctx: &'c mut SynthesisContext<'g>,
}

impl<'c, 'g> PathGenerator<'c, 'g> {
    pub fn new(ctx: &'c mut SynthesisContext<'g>) -> Self {
        Self { ctx }
    }

    /// Path entries for every endpoint of `resource_types`, in generation
    /// order. Types without endpoints contribute nothing.
    pub fn generate(&mut self, resource_types: &[&ResourceTypeDescriptor]) -> Result<Vec<PathEntry>> {
        let mut entries = Vec::new();
        for resource_type in resource_types {
            let Some(endpoints) = resource_type.endpoints.as_ref() else {
                trace!(resource = %resource_type.public_name, "no endpoints exposed");
                continue;
            };
            let base = format!("/{}", resource_type.public_name);
            let single = format!("{base}/{{id}}");

            let mut collection = PathItem::default();
            if endpoints.contains(JsonApiEndpoint::GetCollection) {
                collection.get = Some(self.get_collection(resource_type)?);
            }
            if endpoints.contains(JsonApiEndpoint::Post) {
                collection.post = Some(self.post(resource_type)?);
            }
            push(&mut entries, base, collection);

            let mut item = PathItem::default();
            if endpoints.contains(JsonApiEndpoint::GetSingle) {
                item.get = Some(self.get_single(resource_type)?);
            }
            if endpoints.contains(JsonApiEndpoint::Patch) {
                item.patch = Some(self.patch(resource_type)?);
            }
            if endpoints.contains(JsonApiEndpoint::Delete) {
                item.delete = Some(self.delete(resource_type)?);
            }
            push(&mut entries, single.clone(), item);

            for relationship in &resource_type.relationships {
                let viewable = relationship.capabilities.contains(Capability::Viewable);
                let changeable = relationship.capabilities.contains(Capability::Changeable);

                let mut secondary = PathItem::default();
                if viewable && endpoints.contains(JsonApiEndpoint::GetSecondary) {
                    secondary.get = Some(self.get_secondary(resource_type, relationship)?);
                }
                push(&mut entries, format!("{single}/{}", relationship.name), secondary);

                let mut linkage = PathItem::default();
                if viewable && endpoints.contains(JsonApiEndpoint::GetRelationship) {
                    linkage.get = Some(self.get_relationship(resource_type, relationship)?);
                }
                if changeable && endpoints.contains(JsonApiEndpoint::PatchRelationship) {
                    linkage.patch = Some(self.mutate_relationship(resource_type, relationship, Mutation::Replace)?);
                }
                if !relationship.is_to_one() && changeable {
                    if endpoints.contains(JsonApiEndpoint::PostRelationship) {
                        linkage.post = Some(self.mutate_relationship(resource_type, relationship, Mutation::Add)?);
                    }
                    if endpoints.contains(JsonApiEndpoint::DeleteRelationship) {
                        linkage.delete =
                            Some(self.mutate_relationship(resource_type, relationship, Mutation::Remove)?);
                    }
                }
                push(
                    &mut entries,
                    format!("{single}/relationships/{}", relationship.name),
                    linkage,
                );
            }
        }
        Ok(entries)
    }

    fn document(&mut self, document_type: DocumentType) -> Result<Schema> {
        Ok(DocumentSchemaSynthesizer::synthesize(self.ctx, document_type)?.to_reference())
    }

    fn errors(&mut self, responses: &mut IndexMap<String, Response>, statuses: &[&str]) -> Result<()> {
        let error = self.document(DocumentType::error())?;
        for status in statuses {
            responses.insert(
                status.to_string(),
                Response::json_api(error_description(status), error.clone()),
            );
        }
        Ok(())
    }

    fn get_collection(&mut self, resource_type: &ResourceTypeDescriptor) -> Result<Operation> {
        let name = &resource_type.public_name;
        let document = self.document(DocumentType::new(DocumentCategory::ResponseCollection, resource_type.id))?;
        let mut responses = IndexMap::new();
        responses.insert(
            "200".to_string(),
            Response::json_api(format!("Successfully returns the found {name}."), document),
        );
        self.errors(&mut responses, &[BAD_REQUEST])?;
        Ok(operation(
            schema_name(&["get", name, "Collection"]),
            resource_type,
            format!("Retrieves a collection of {name}."),
            false,
            None,
            responses,
        ))
    }

    fn get_single(&mut self, resource_type: &ResourceTypeDescriptor) -> Result<Operation> {
        let name = &resource_type.public_name;
        let document = self.document(DocumentType::new(DocumentCategory::ResponseSingle, resource_type.id))?;
        let mut responses = IndexMap::new();
        responses.insert(
            "200".to_string(),
            Response::json_api(format!("Successfully returns the found {name} resource."), document),
        );
        self.errors(&mut responses, &[BAD_REQUEST, NOT_FOUND])?;
        Ok(operation(
            schema_name(&["get", name]),
            resource_type,
            format!("Retrieves an individual {name} resource by its identifier."),
            true,
            None,
            responses,
        ))
    }

    fn post(&mut self, resource_type: &ResourceTypeDescriptor) -> Result<Operation> {
        let name = &resource_type.public_name;
        let request = self.document(DocumentType::new(DocumentCategory::CreateRequest, resource_type.id))?;
        let created = self.document(DocumentType::new(DocumentCategory::ResponseSingle, resource_type.id))?;
        let mut responses = IndexMap::new();
        responses.insert(
            "201".to_string(),
            Response::json_api(format!("The {name} resource was successfully created."), created),
        );
        responses.insert(
            "204".to_string(),
            Response::empty(format!(
                "The {name} resource was created with the client-generated id and no side effects."
            )),
        );
        self.errors(&mut responses, &[BAD_REQUEST, NOT_FOUND, CONFLICT, UNPROCESSABLE])?;
        Ok(operation(
            schema_name(&["post", name]),
            resource_type,
            format!("Creates a new {name} resource."),
            false,
            Some(RequestBody::json_api(request)),
            responses,
        ))
    }

    fn patch(&mut self, resource_type: &ResourceTypeDescriptor) -> Result<Operation> {
        let name = &resource_type.public_name;
        let request = self.document(DocumentType::new(DocumentCategory::UpdateRequest, resource_type.id))?;
        let updated = self.document(DocumentType::new(DocumentCategory::ResponseSingle, resource_type.id))?;
        let mut responses = IndexMap::new();
        responses.insert(
            "200".to_string(),
            Response::json_api(format!("The {name} resource was successfully updated."), updated),
        );
        responses.insert(
            "204".to_string(),
            Response::empty(format!("The {name} resource was updated without side effects.")),
        );
        self.errors(&mut responses, &[BAD_REQUEST, NOT_FOUND, CONFLICT, UNPROCESSABLE])?;
        Ok(operation(
            schema_name(&["patch", name]),
            resource_type,
            format!("Updates an existing {name} resource."),
            true,
            Some(RequestBody::json_api(request)),
            responses,
        ))
    }

    fn delete(&mut self, resource_type: &ResourceTypeDescriptor) -> Result<Operation> {
        let name = &resource_type.public_name;
        let mut responses = IndexMap::new();
        responses.insert(
            "204".to_string(),
            Response::empty(format!("The {name} resource was successfully deleted.")),
        );
        self.errors(&mut responses, &[NOT_FOUND])?;
        Ok(operation(
            schema_name(&["delete", name]),
            resource_type,
            format!("Deletes an existing {name} resource by its identifier."),
            true,
            None,
            responses,
        ))
    }

    fn get_secondary(
        &mut self,
        resource_type: &ResourceTypeDescriptor,
        relationship: &RelationshipField,
    ) -> Result<Operation> {
        let category = if relationship.is_to_one() {
            DocumentCategory::ResponseSingle
        } else {
            DocumentCategory::ResponseCollection
        };
        let document = self.document(
            DocumentType::new(category, relationship.target).with_nullable_data(relationship.is_nullable()),
        )?;
        let mut responses = IndexMap::new();
        responses.insert(
            "200".to_string(),
            Response::json_api(
                format!("Successfully returns the found {}.", relationship.name),
                document,
            ),
        );
        self.errors(&mut responses, &[BAD_REQUEST, NOT_FOUND])?;
        Ok(operation(
            schema_name(&["get", &resource_type.public_name, &relationship.name]),
            resource_type,
            format!(
                "Retrieves the related {} of an individual {} resource.",
                relationship.name, resource_type.public_name
            ),
            true,
            None,
            responses,
        ))
    }

    fn get_relationship(
        &mut self,
        resource_type: &ResourceTypeDescriptor,
        relationship: &RelationshipField,
    ) -> Result<Operation> {
        let category = if relationship.is_to_one() {
            DocumentCategory::IdentifierResponseSingle
        } else {
            DocumentCategory::IdentifierResponseCollection
        };
        let document = self.document(
            DocumentType::new(category, relationship.target).with_nullable_data(relationship.is_nullable()),
        )?;
        let mut responses = IndexMap::new();
        responses.insert(
            "200".to_string(),
            Response::json_api(
                format!("Successfully returns the found {} identities.", relationship.name),
                document,
            ),
        );
        self.errors(&mut responses, &[BAD_REQUEST, NOT_FOUND])?;
        Ok(operation(
            schema_name(&["get", &resource_type.public_name, &relationship.name, "Relationship"]),
            resource_type,
            format!(
                "Retrieves the related {} identities of an individual {} resource.",
                relationship.name, resource_type.public_name
            ),
            true,
            None,
            responses,
        ))
    }

    fn mutate_relationship(
        &mut self,
        resource_type: &ResourceTypeDescriptor,
        relationship: &RelationshipField,
        mutation: Mutation,
    ) -> Result<Operation> {
        let document_type = if relationship.is_to_one() {
            DocumentType::new(DocumentCategory::RelationshipRequestToOne, relationship.target)
                .with_nullable_data(relationship.is_nullable())
        } else {
            DocumentType::new(DocumentCategory::RelationshipRequestToMany, relationship.target)
        };
        let request = self.document(document_type)?;
        let mut responses = IndexMap::new();
        responses.insert(
            "204".to_string(),
            Response::empty(format!("The {} relationship was successfully updated.", relationship.name)),
        );
        self.errors(&mut responses, &[BAD_REQUEST, NOT_FOUND, CONFLICT, UNPROCESSABLE])?;

        let target = &self.ctx.resource_type(relationship.target)?.public_name;
        let (verb, summary) = match mutation {
            Mutation::Replace => ("patch", "Assigns"),
            Mutation::Add => ("post", "Adds"),
            Mutation::Remove => ("delete", "Removes"),
        };
        Ok(operation(
            schema_name(&[verb, &resource_type.public_name, &relationship.name, "Relationship"]),
            resource_type,
            format!(
                "{summary} existing {} to the {} relationship of an individual {} resource.",
                target,
                relationship.name,
                resource_type.public_name
            ),
            true,
            Some(RequestBody::json_api(request)),
            responses,
        ))
    }
}

#[derive(Debug, Clone, Copy)]
enum Mutation {
    Replace,
    Add,
    Remove,
}

fn push(entries: &mut Vec<PathEntry>, path: String, item: PathItem) {
    if !item.is_empty() {
        entries.push(PathEntry { path, item });
    }
}

fn operation(
    operation_id: String,
    resource_type: &ResourceTypeDescriptor,
    summary: String,
    with_id: bool,
    request_body: Option<RequestBody>,
    responses: IndexMap<String, Response>,
) -> Operation {
    let parameters = if with_id {
        vec![Parameter::path(
            "id",
            format!("The identifier of the {} resource.", resource_type.public_name),
        )]
    } else {
        Vec::new()
    };
    Operation {
        operation_id,
        tags: vec![resource_type.public_name.clone()],
        summary,
        parameters,
        request_body,
        responses,
    }
}
