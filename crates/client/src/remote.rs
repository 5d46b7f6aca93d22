//! Remote adapters for note sub-collections.
//!
//! [`RemoteCollection`] is the seam the reconciler drives: one create,
//! update and delete per entry. [`TaskRemote`] and [`ServiceRequestRemote`]
//! implement it against the GraphQL API for the tasks and service requests
//! of one note.

use std::sync::Arc;

use async_trait::async_trait;
use betterangels_core::mutation::{EntityRef, MutationOutcome, DELETED_OBJECT_TYPENAME};
use betterangels_core::service_request::{ServiceRef, ServiceRequestFields};
use betterangels_core::task::TaskFields;
use betterangels_core::types::ServerId;
use serde_json::{json, Value};

use crate::error::ClientResult;
use crate::graphql::GraphQlClient;
use crate::upload::FileUpload;

/// Remote side of a draft collection.
#[async_trait]
pub trait RemoteCollection<F: Sync>: Send + Sync {
    /// Entity name for logs and notifications, e.g. `"task"`.
    fn entity(&self) -> &'static str;

    async fn create(&self, fields: &F) -> ClientResult<MutationOutcome<EntityRef>>;

    async fn update(&self, id: &str, fields: &F) -> ClientResult<MutationOutcome<EntityRef>>;

    async fn delete(&self, id: &str) -> ClientResult<MutationOutcome<EntityRef>>;
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

const CREATE_NOTE_TASK: &str = r#"
mutation CreateNoteTask($data: CreateNoteTaskInput!) {
  createNoteTask(data: $data) {
    __typename
    ... on TaskType { id }
    ... on OperationInfo { messages { kind field message } }
  }
}"#;

const UPDATE_TASK: &str = r#"
mutation UpdateTask($data: UpdateTaskInput!) {
  updateTask(data: $data) {
    __typename
    ... on TaskType { id }
    ... on OperationInfo { messages { kind field message } }
  }
}"#;

const DELETE_TASK: &str = r#"
mutation DeleteTask($id: ID!) {
  deleteTask(data: { id: $id }) {
    __typename
    ... on DeletedObjectType { id }
    ... on OperationInfo { messages { kind field message } }
  }
}"#;

const TASK_TYPENAME: &str = "TaskType";

/// Tasks attached to one note.
pub struct TaskRemote {
    client: Arc<GraphQlClient>,
    note_id: ServerId,
}

impl TaskRemote {
    pub fn new(client: Arc<GraphQlClient>, note_id: impl Into<ServerId>) -> Self {
        Self {
            client,
            note_id: note_id.into(),
        }
    }
}

/// Input body shared by task create and update.
fn task_input(fields: &TaskFields) -> Value {
    json!({
        "summary": fields.summary,
        "description": fields.description,
        "status": fields.status.as_str(),
        "team": fields.team,
    })
}

#[async_trait]
impl RemoteCollection<TaskFields> for TaskRemote {
    fn entity(&self) -> &'static str {
        "task"
    }

    async fn create(&self, fields: &TaskFields) -> ClientResult<MutationOutcome<EntityRef>> {
        let mut data = task_input(fields);
        data["noteId"] = json!(self.note_id);
        self.client
            .mutate(CREATE_NOTE_TASK, "createNoteTask", TASK_TYPENAME, json!({ "data": data }))
            .await
    }

    async fn update(&self, id: &str, fields: &TaskFields) -> ClientResult<MutationOutcome<EntityRef>> {
        let mut data = task_input(fields);
        data["id"] = json!(id);
        self.client
            .mutate(UPDATE_TASK, "updateTask", TASK_TYPENAME, json!({ "data": data }))
            .await
    }

    async fn delete(&self, id: &str) -> ClientResult<MutationOutcome<EntityRef>> {
        self.client
            .mutate(DELETE_TASK, "deleteTask", DELETED_OBJECT_TYPENAME, json!({ "id": id }))
            .await
    }
}

// ---------------------------------------------------------------------------
// Service requests
// ---------------------------------------------------------------------------

const CREATE_NOTE_SERVICE_REQUEST: &str = r#"
mutation CreateNoteServiceRequest($data: CreateNoteServiceRequestInput!) {
  createNoteServiceRequest(data: $data) {
    __typename
    ... on ServiceRequestType { id }
    ... on OperationInfo { messages { kind field message } }
  }
}"#;

const UPDATE_SERVICE_REQUEST: &str = r#"
mutation UpdateServiceRequest($data: UpdateServiceRequestInput!) {
  updateServiceRequest(data: $data) {
    __typename
    ... on ServiceRequestType { id }
    ... on OperationInfo { messages { kind field message } }
  }
}"#;

const DELETE_SERVICE_REQUEST: &str = r#"
mutation DeleteServiceRequest($id: ID!) {
  deleteServiceRequest(data: { id: $id }) {
    __typename
    ... on DeletedObjectType { id }
    ... on OperationInfo { messages { kind field message } }
  }
}"#;

const SERVICE_REQUEST_TYPENAME: &str = "ServiceRequestType";

/// Service requests attached to one note.
pub struct ServiceRequestRemote {
    client: Arc<GraphQlClient>,
    note_id: ServerId,
}

impl ServiceRequestRemote {
    pub fn new(client: Arc<GraphQlClient>, note_id: impl Into<ServerId>) -> Self {
        Self {
            client,
            note_id: note_id.into(),
        }
    }
}

/// Catalog services go by id, free-form ones by label.
fn service_request_input(fields: &ServiceRequestFields) -> Value {
    let (service_id, service_other) = match &fields.service {
        ServiceRef::Catalog(id) => (Some(id.as_str()), None),
        ServiceRef::Other(label) => (None, Some(label.trim())),
    };
    json!({
        "serviceId": service_id,
        "serviceOther": service_other,
        "serviceRequestType": fields.status.as_str(),
    })
}

#[async_trait]
impl RemoteCollection<ServiceRequestFields> for ServiceRequestRemote {
    fn entity(&self) -> &'static str {
        "service request"
    }

    async fn create(&self, fields: &ServiceRequestFields) -> ClientResult<MutationOutcome<EntityRef>> {
        let mut data = service_request_input(fields);
        data["noteId"] = json!(self.note_id);
        self.client
            .mutate(
                CREATE_NOTE_SERVICE_REQUEST,
                "createNoteServiceRequest",
                SERVICE_REQUEST_TYPENAME,
                json!({ "data": data }),
            )
            .await
    }

    async fn update(
        &self,
        id: &str,
        fields: &ServiceRequestFields,
    ) -> ClientResult<MutationOutcome<EntityRef>> {
        let mut data = service_request_input(fields);
        data["id"] = json!(id);
        self.client
            .mutate(
                UPDATE_SERVICE_REQUEST,
                "updateServiceRequest",
                SERVICE_REQUEST_TYPENAME,
                json!({ "data": data }),
            )
            .await
    }

    async fn delete(&self, id: &str) -> ClientResult<MutationOutcome<EntityRef>> {
        self.client
            .mutate(
                DELETE_SERVICE_REQUEST,
                "deleteServiceRequest",
                DELETED_OBJECT_TYPENAME,
                json!({ "id": id }),
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Profile photo
// ---------------------------------------------------------------------------

const UPDATE_CLIENT_PROFILE_PHOTO: &str = r#"
mutation UpdateClientProfilePhoto($data: ClientProfilePhotoInput!) {
  updateClientProfilePhoto(data: $data) {
    __typename
    ... on ClientProfileType { id }
    ... on OperationInfo { messages { kind field message } }
  }
}"#;

/// Replace a client profile's photo with a picked file.
pub async fn upload_profile_photo(
    client: &GraphQlClient,
    client_profile_id: &str,
    photo: FileUpload,
) -> ClientResult<MutationOutcome<EntityRef>> {
    let variables = json!({ "data": { "clientProfile": client_profile_id, "photo": null } });
    let data: Value = client
        .execute_upload(
            UPDATE_CLIENT_PROFILE_PHOTO,
            variables,
            &[("data.photo".to_string(), photo)],
        )
        .await?;
    crate::graphql::decode_mutation(&data, "updateClientProfilePhoto", "ClientProfileType")
}
