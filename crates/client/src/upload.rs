//! File uploads over the GraphQL multipart request convention.
//!
//! A multipart upload sends three kinds of parts:
//!
//! - `operations`: the usual `{query, variables}` body with every file
//!   variable set to `null`
//! - `map`: which part fills which variable, e.g. `{"0": ["variables.photo"]}`
//! - one part per file, named `0`, `1`, ...

use std::path::PathBuf;

use reqwest::multipart::{Form, Part};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::error::{ClientError, ClientResult};

/// A device file picked by the user, as handed over by the media picker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileUpload {
    /// `file://` URI or plain path.
    pub uri: String,
    /// MIME type, e.g. `image/jpeg`.
    #[serde(rename = "type")]
    pub mime_type: String,
    /// File name reported to the server.
    pub name: String,
}

impl FileUpload {
    pub fn new(uri: impl Into<String>, mime_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            mime_type: mime_type.into(),
            name: name.into(),
        }
    }

    /// Filesystem path behind the URI.
    pub fn local_path(&self) -> PathBuf {
        PathBuf::from(self.uri.strip_prefix("file://").unwrap_or(&self.uri))
    }

    async fn read(&self) -> ClientResult<Vec<u8>> {
        tokio::fs::read(self.local_path())
            .await
            .map_err(|source| ClientError::Upload {
                name: self.name.clone(),
                source,
            })
    }
}

/// The `operations` part: `variables` with every file slot nulled.
///
/// `slots` are dotted paths relative to `variables`, e.g. `data.photo`.
pub fn operations(query: &str, mut variables: Value, slots: &[String]) -> Value {
    for slot in slots {
        set_null(&mut variables, slot);
    }
    json!({ "query": query, "variables": variables })
}

/// The `map` part for `slots`, in part order.
pub fn file_map(slots: &[String]) -> Value {
    let map: Map<String, Value> = slots
        .iter()
        .enumerate()
        .map(|(i, slot)| (i.to_string(), json!([format!("variables.{slot}")])))
        .collect();
    Value::Object(map)
}

/// Build the full multipart form, reading every file from disk.
pub async fn multipart_form(
    query: &str,
    variables: Value,
    files: &[(String, FileUpload)],
) -> ClientResult<Form> {
    let slots: Vec<String> = files.iter().map(|(slot, _)| slot.clone()).collect();

    let mut form = Form::new()
        .text("operations", operations(query, variables, &slots).to_string())
        .text("map", file_map(&slots).to_string());

    for (i, (_, file)) in files.iter().enumerate() {
        let bytes = file.read().await?;
        tracing::debug!(name = %file.name, size = bytes.len(), "Attaching upload");
        let part = Part::bytes(bytes)
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?;
        form = form.part(i.to_string(), part);
    }

    Ok(form)
}

/// Set the value at a dotted path to `null`, creating objects on the way.
fn set_null(root: &mut Value, path: &str) {
    let mut current = root;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(object) = current else {
            return;
        };
        if segments.peek().is_none() {
            object.insert(segment.to_string(), Value::Null);
            return;
        }
        current = object
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}
