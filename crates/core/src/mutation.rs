//! Mutation response union.
//!
//! Every create/update/delete mutation answers with either the affected
//! object (`{"__typename": "TaskType", "id": ...}`) or an `OperationInfo`
//! payload carrying field-level messages. [`MutationOutcome`] is the typed
//! form of that union; callers match on it instead of comparing typenames.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::ServerId;

/// GraphQL typename of the validation-failure payload.
pub const OPERATION_INFO_TYPENAME: &str = "OperationInfo";

/// GraphQL typename returned by delete mutations.
pub const DELETED_OBJECT_TYPENAME: &str = "DeletedObjectType";

/// Category of an [`OperationMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageKind {
    Info,
    Warning,
    Error,
    Permission,
    Validation,
}

impl MessageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Error => "ERROR",
            Self::Permission => "PERMISSION",
            Self::Validation => "VALIDATION",
        }
    }
}

/// A single message inside an `OperationInfo` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationMessage {
    pub kind: MessageKind,
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
}

impl OperationMessage {
    /// A `VALIDATION` message targeting `field`.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind: MessageKind::Validation,
            field: Some(field.into()),
            message: message.into(),
        }
    }
}

/// Reference to the object a mutation touched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRef {
    pub id: ServerId,
}

/// Result of a mutation that reached the server.
#[derive(Debug, Clone, PartialEq)]
pub enum MutationOutcome<T> {
    Success(T),
    ValidationFailure(Vec<OperationMessage>),
}

impl<T> MutationOutcome<T> {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> MutationOutcome<U> {
        match self {
            Self::Success(value) => MutationOutcome::Success(f(value)),
            Self::ValidationFailure(messages) => MutationOutcome::ValidationFailure(messages),
        }
    }

    pub fn into_result(self) -> Result<T, Vec<OperationMessage>> {
        match self {
            Self::Success(value) => Ok(value),
            Self::ValidationFailure(messages) => Err(messages),
        }
    }
}

impl<T: DeserializeOwned> MutationOutcome<T> {
    /// Decode a mutation payload by its `__typename`.
    ///
    /// `expected_typename` is the success type for this mutation. Any other
    /// typename, or a payload without one, is an error.
    pub fn from_payload(
        expected_typename: &str,
        payload: &serde_json::Value,
    ) -> Result<Self, CoreError> {
        let typename = payload
            .get("__typename")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| CoreError::UnexpectedPayload("missing __typename".to_string()))?;

        if typename == OPERATION_INFO_TYPENAME {
            let messages = payload
                .get("messages")
                .cloned()
                .unwrap_or(serde_json::Value::Array(Vec::new()));
            let messages: Vec<OperationMessage> = serde_json::from_value(messages)
                .map_err(|e| CoreError::UnexpectedPayload(format!("bad OperationInfo: {e}")))?;
            return Ok(Self::ValidationFailure(messages));
        }

        if typename != expected_typename {
            return Err(CoreError::UnexpectedPayload(format!(
                "expected {expected_typename} or {OPERATION_INFO_TYPENAME}, got {typename}"
            )));
        }

        serde_json::from_value(payload.clone())
            .map(Self::Success)
            .map_err(|e| CoreError::UnexpectedPayload(format!("bad {typename}: {e}")))
    }
}
