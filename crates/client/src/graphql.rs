//! GraphQL-over-HTTP client for the BetterAngels API.
//!
//! Wraps a [`reqwest::Client`] bound to the `/graphql` endpoint. Every
//! request carries the session's bearer token (when present) and an
//! `x-request-id`. A 401 answer expires the [`Session`].

use std::sync::Arc;
use std::time::Duration;

use betterangels_core::error::CoreError;
use betterangels_core::mutation::{EntityRef, MutationOutcome};
use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use crate::upload::{self, FileUpload};

/// Header used to correlate client requests with server logs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Standard GraphQL response envelope.
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

/// HTTP client for the GraphQL endpoint.
pub struct GraphQlClient {
    client: reqwest::Client,
    endpoint: String,
    session: Arc<Session>,
}

impl GraphQlClient {
    /// Build a client from configuration.
    ///
    /// A token from the configuration seeds the session unless the session
    /// already holds one.
    pub fn new(config: &ClientConfig, session: Arc<Session>) -> ClientResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        if let Some(token) = &config.api_token {
            if !session.is_authenticated() {
                session.restore_token(token);
            }
        }

        Ok(Self::with_client(client, config.graphql_url(), session))
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(client: reqwest::Client, endpoint: String, session: Arc<Session>) -> Self {
        Self {
            client,
            endpoint,
            session,
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// Run a query or mutation and decode its `data`.
    pub async fn execute<T: DeserializeOwned>(&self, query: &str, variables: Value) -> ClientResult<T> {
        let body = json!({ "query": query, "variables": variables });
        let request = self.request(query).json(&body);
        let response = request.send().await?;
        self.handle_response(response).await
    }

    /// Run an operation with file variables as a multipart request.
    ///
    /// `files` pairs each file with its dotted variable path.
    pub async fn execute_upload<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
        files: &[(String, FileUpload)],
    ) -> ClientResult<T> {
        let form = upload::multipart_form(query, variables, files).await?;
        let response = self.request(query).multipart(form).send().await?;
        self.handle_response(response).await
    }

    /// Run a mutation whose result field is an `<Entity> | OperationInfo`
    /// union.
    pub async fn mutate(
        &self,
        query: &str,
        field: &str,
        typename: &str,
        variables: Value,
    ) -> ClientResult<MutationOutcome<EntityRef>> {
        let data: Value = self.execute(query, variables).await?;
        decode_mutation(&data, field, typename)
    }

    // ---- private helpers ----

    fn request(&self, query: &str) -> RequestBuilder {
        let request_id = uuid::Uuid::new_v4().to_string();
        tracing::debug!(
            request_id = %request_id,
            operation = operation_name(query),
            "GraphQL request"
        );

        let request = self
            .client
            .post(&self.endpoint)
            .header(REQUEST_ID_HEADER, request_id);

        match self.session.token() {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn handle_response<T: DeserializeOwned>(&self, response: reqwest::Response) -> ClientResult<T> {
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            self.session.expire();
            return Err(ClientError::SessionExpired);
        }

        let body = response.text().await?;
        if !status.is_success() {
            tracing::error!(status = status.as_u16(), "GraphQL request failed");
            return Err(ClientError::Api {
                status: status.as_u16(),
                body,
            });
        }

        decode_body(&body)
    }
}

/// Decode a GraphQL response body into its `data`.
///
/// Top-level `errors` take precedence over partial data.
pub fn decode_body<T: DeserializeOwned>(body: &str) -> ClientResult<T> {
    let envelope: GraphQlResponse<T> = serde_json::from_str(body)?;
    if !envelope.errors.is_empty() {
        return Err(ClientError::GraphQl(
            envelope.errors.into_iter().map(|e| e.message).collect(),
        ));
    }
    envelope
        .data
        .ok_or_else(|| ClientError::GraphQl(vec!["response contained no data".to_string()]))
}

/// Pull `field` out of mutation `data` and decode the union by typename.
pub fn decode_mutation(
    data: &Value,
    field: &str,
    typename: &str,
) -> ClientResult<MutationOutcome<EntityRef>> {
    let payload = data
        .get(field)
        .ok_or_else(|| CoreError::UnexpectedPayload(format!("missing field '{field}'")))?;
    Ok(MutationOutcome::from_payload(typename, payload)?)
}

/// Name of the operation in a GraphQL document, for logs.
fn operation_name(query: &str) -> &str {
    let trimmed = query.trim_start();
    let rest = ["mutation", "query"]
        .iter()
        .find_map(|kw| trimmed.strip_prefix(kw))
        .unwrap_or(trimmed)
        .trim_start();
    let end = rest
        .find(|c: char| c == '(' || c == '{' || c.is_whitespace())
        .unwrap_or(rest.len());
    if end == 0 {
        "anonymous"
    } else {
        &rest[..end]
    }
}
