//! Form error bookkeeping shared by the editor and server-side validation.

use std::collections::BTreeMap;
use std::fmt;

use crate::mutation::{MessageKind, OperationMessage};

/// Errors shown on a form: per-field messages plus messages that do not
/// belong to any known field (shown as a toast).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, Vec<String>>,
    general: Vec<String>,
}

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_field(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_general(&mut self, message: impl Into<String>) {
        self.general.push(message.into());
    }

    /// First message for `field`, the one a form would render.
    pub fn field(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn field_messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn general(&self) -> &[String] {
        &self.general
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_empty()
    }

    /// Map server messages onto a form.
    ///
    /// `VALIDATION` messages naming one of `known_fields` land on that
    /// field; everything else is general.
    pub fn from_operation_messages(messages: &[OperationMessage], known_fields: &[&str]) -> Self {
        Self::from_operation_messages_with(messages, |field| {
            known_fields.iter().copied().find(|known| *known == field)
        })
    }

    /// Like [`from_operation_messages`](Self::from_operation_messages), with
    /// `resolve` turning a server field name into a form key. Messages whose
    /// field does not resolve are general.
    pub fn from_operation_messages_with<'k>(
        messages: &[OperationMessage],
        resolve: impl Fn(&str) -> Option<&'k str>,
    ) -> Self {
        let mut errors = Self::new();
        for msg in messages {
            let key = match (&msg.kind, msg.field.as_deref()) {
                (MessageKind::Validation, Some(field)) => resolve(field),
                _ => None,
            };
            match key {
                Some(key) => errors.add_field(key, msg.message.clone()),
                None => errors.add_general(msg.message.clone()),
            }
        }
        errors
    }

    /// Collect `validator` failures, falling back to the error code when a
    /// rule carries no message.
    pub fn from_validation_errors(errors: &validator::ValidationErrors) -> Self {
        let mut form = Self::new();
        for (field, field_errors) in errors.field_errors() {
            for err in field_errors {
                let message = err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| err.code.to_string());
                form.add_field(field.to_string(), message);
            }
        }
        form
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .fields
            .iter()
            .flat_map(|(field, messages)| messages.iter().map(move |m| format!("{field}: {m}")))
            .collect();
        parts.extend(self.general.iter().cloned());
        f.write_str(&parts.join("; "))
    }
}
