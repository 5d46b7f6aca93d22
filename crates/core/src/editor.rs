//! Editor contract for a single draft entry.
//!
//! An [`EditorSession`] is opened for an existing entry (edit) or for none
//! (create). It knows nothing about persistence: a successful submit hands
//! back an [`EditorResult`], and [`apply_result`] folds that result into a
//! [`DraftCollection`].

use validator::Validate;

use crate::draft::{DraftCollection, DraftEntry, EntryId};
use crate::form::FormErrors;
use crate::mutation::OperationMessage;

/// Payloads that can be edited in an [`EditorSession`].
pub trait FormFields: Clone + Default + Validate {
    /// Form keys that server validation messages may target.
    const KNOWN_FIELDS: &'static [&'static str];

    /// Server input names that differ from the form key they belong to,
    /// as `(server_field, form_key)`.
    const SERVER_FIELD_ALIASES: &'static [(&'static str, &'static str)] = &[];

    /// Form key a server validation message on `server_field` lands on.
    fn form_key(server_field: &str) -> Option<&'static str> {
        Self::KNOWN_FIELDS
            .iter()
            .copied()
            .find(|key| *key == server_field)
            .or_else(|| {
                Self::SERVER_FIELD_ALIASES
                    .iter()
                    .find(|(alias, _)| *alias == server_field)
                    .map(|(_, key)| *key)
            })
    }
}

/// What a submitted editor hands back to its caller.
#[derive(Debug, Clone, PartialEq)]
pub struct EditorResult<F> {
    pub fields: F,
    /// Set when editing; `None` means the caller must assign a temporary id.
    pub existing_id: Option<EntryId>,
}

/// State of one open editor.
#[derive(Debug, Clone)]
pub struct EditorSession<F> {
    existing_id: Option<EntryId>,
    seed: F,
    errors: FormErrors,
}

impl<F: FormFields> EditorSession<F> {
    /// Open the editor, seeded from `existing` or with default fields.
    pub fn open(existing: Option<&DraftEntry<F>>) -> Self {
        match existing {
            Some(entry) => Self {
                existing_id: Some(entry.id().clone()),
                seed: entry.fields.clone(),
                errors: FormErrors::new(),
            },
            None => Self {
                existing_id: None,
                seed: F::default(),
                errors: FormErrors::new(),
            },
        }
    }

    /// Initial form values.
    pub fn seed(&self) -> &F {
        &self.seed
    }

    pub fn existing_id(&self) -> Option<&EntryId> {
        self.existing_id.as_ref()
    }

    pub fn is_editing(&self) -> bool {
        self.existing_id.is_some()
    }

    /// Errors currently shown on the form.
    pub fn errors(&self) -> &FormErrors {
        &self.errors
    }

    /// Validate and hand back the finished fields.
    ///
    /// On failure the errors are kept on the session (so the form can render
    /// them) and returned.
    pub fn submit(&mut self, fields: F) -> Result<EditorResult<F>, FormErrors> {
        if let Err(validation) = fields.validate() {
            self.errors = FormErrors::from_validation_errors(&validation);
            return Err(self.errors.clone());
        }
        self.errors = FormErrors::new();
        Ok(EditorResult {
            fields,
            existing_id: self.existing_id.clone(),
        })
    }

    /// Show server-side validation messages on the form.
    pub fn apply_server_messages(&mut self, messages: &[OperationMessage]) {
        self.errors = FormErrors::from_operation_messages_with(messages, F::form_key);
    }

    /// Close without a result.
    pub fn cancel(self) -> Option<EditorResult<F>> {
        None
    }
}

/// Fold a submitted result into the collection.
///
/// An edit of a known entry replaces its fields in place; anything else is
/// appended under a fresh temporary id. Returns the id of the affected entry.
pub fn apply_result<F>(collection: &mut DraftCollection<F>, result: EditorResult<F>) -> EntryId {
    let EditorResult {
        fields,
        existing_id,
    } = result;

    match existing_id {
        Some(id) if collection.get(&id).is_some() => {
            collection.update_fields(&id, fields);
            id
        }
        _ => collection.insert_new(fields),
    }
}
