//! Locally edited sub-collections (tasks, service requests) held between a
//! parent-record load and the parent-record save.
//!
//! A [`DraftCollection`] keeps entries in display order. Entries created
//! locally carry an [`EntryId::Temporary`] id until the server assigns one;
//! entries loaded from the server carry an [`EntryId::Persisted`] id.
//! Removing a persisted entry only marks it, so the reconciler still sees
//! it and can issue the delete.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::ServerId;

/// Prefix used when a temporary id is rendered as a string.
pub const TEMPORARY_ID_PREFIX: &str = "tmp-";

// ---------------------------------------------------------------------------
// EntryId
// ---------------------------------------------------------------------------

/// Identity of a draft entry.
///
/// In JSON a server id is a plain string and a temporary id is an object,
/// `{"tmp": 3}`, so a server id that happens to read `tmp-3` stays a
/// server id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "EntryIdRepr", try_from = "EntryIdRepr")]
pub enum EntryId {
    /// Not yet persisted; the number is unique within its collection.
    Temporary(u64),
    /// Server-assigned id.
    Persisted(ServerId),
}

impl EntryId {
    pub fn is_temporary(&self) -> bool {
        matches!(self, Self::Temporary(_))
    }

    pub fn is_persisted(&self) -> bool {
        matches!(self, Self::Persisted(_))
    }

    /// The server id, if this entry has been persisted.
    pub fn server_id(&self) -> Option<&str> {
        match self {
            Self::Persisted(id) => Some(id),
            Self::Temporary(_) => None,
        }
    }
}

/// Log form only; not parsed back.
impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Temporary(n) => write!(f, "{TEMPORARY_ID_PREFIX}{n}"),
            Self::Persisted(id) => f.write_str(id),
        }
    }
}

/// Wire shape of [`EntryId`].
#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum EntryIdRepr {
    Temporary { tmp: u64 },
    Persisted(String),
}

impl From<EntryId> for EntryIdRepr {
    fn from(id: EntryId) -> Self {
        match id {
            EntryId::Temporary(tmp) => Self::Temporary { tmp },
            EntryId::Persisted(id) => Self::Persisted(id),
        }
    }
}

impl TryFrom<EntryIdRepr> for EntryId {
    type Error = CoreError;

    fn try_from(repr: EntryIdRepr) -> Result<Self, Self::Error> {
        match repr {
            EntryIdRepr::Temporary { tmp } => Ok(Self::Temporary(tmp)),
            EntryIdRepr::Persisted(id) if id.trim().is_empty() => {
                Err(CoreError::InvalidId("server id cannot be empty".to_string()))
            }
            EntryIdRepr::Persisted(id) => Ok(Self::Persisted(id)),
        }
    }
}

// ---------------------------------------------------------------------------
// DraftEntry
// ---------------------------------------------------------------------------

/// One row of a draft collection.
///
/// Edits replace `fields` only. The id changes once at most, when a
/// temporary entry is promoted to the id the server assigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftEntry<F> {
    id: EntryId,
    pub fields: F,
    #[serde(default)]
    marked_for_deletion: bool,
}

impl<F> DraftEntry<F> {
    /// An unmarked entry with the given id.
    pub fn new(id: EntryId, fields: F) -> Self {
        Self {
            id,
            fields,
            marked_for_deletion: false,
        }
    }

    /// An entry loaded from the server.
    pub fn persisted(id: impl Into<ServerId>, fields: F) -> Self {
        Self::new(EntryId::Persisted(id.into()), fields)
    }

    /// A server entry the user has already removed.
    pub fn deleted(id: impl Into<ServerId>, fields: F) -> Self {
        Self {
            id: EntryId::Persisted(id.into()),
            fields,
            marked_for_deletion: true,
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn is_marked_for_deletion(&self) -> bool {
        self.marked_for_deletion
    }

    /// Visible entries are the ones not marked for deletion.
    pub fn is_visible(&self) -> bool {
        !self.marked_for_deletion
    }
}

// ---------------------------------------------------------------------------
// DraftCollection
// ---------------------------------------------------------------------------

/// Ordered local view of a sub-collection.
#[derive(Debug, Clone, PartialEq)]
pub struct DraftCollection<F> {
    entries: Vec<DraftEntry<F>>,
    next_temporary: u64,
}

impl<F> Default for DraftCollection<F> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_temporary: 1,
        }
    }
}

impl<F> DraftCollection<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a collection from freshly fetched server rows.
    pub fn from_server(server_entries: impl IntoIterator<Item = (ServerId, F)>) -> Self {
        let mut collection = Self::new();
        collection.reset(server_entries);
        collection
    }

    /// Rebuild a collection from previously saved entries (e.g. a draft
    /// file). Entries are upserted in order, so duplicate ids collapse and
    /// temporary entries flagged for deletion are dropped.
    pub fn from_entries(entries: impl IntoIterator<Item = DraftEntry<F>>) -> Self {
        let mut collection = Self::new();
        for entry in entries {
            collection.upsert(entry);
        }
        collection
    }

    /// All entries in display order, including those marked for deletion.
    pub fn entries(&self) -> &[DraftEntry<F>] {
        &self.entries
    }

    /// Entries the user should see.
    pub fn visible(&self) -> impl Iterator<Item = &DraftEntry<F>> {
        self.entries.iter().filter(|e| e.is_visible())
    }

    pub fn get(&self, id: &EntryId) -> Option<&DraftEntry<F>> {
        self.entries.iter().find(|e| &e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn position(&self, id: &EntryId) -> Option<usize> {
        self.entries.iter().position(|e| &e.id == id)
    }

    /// Replace the entry with the same id in place, or append it.
    ///
    /// A temporary entry arriving with the deletion flag set is treated as
    /// a removal.
    pub fn upsert(&mut self, entry: DraftEntry<F>) {
        if let EntryId::Temporary(n) = entry.id {
            if entry.marked_for_deletion {
                self.remove(&entry.id);
                return;
            }
            self.next_temporary = self.next_temporary.max(n.saturating_add(1));
        }

        match self.position(&entry.id) {
            Some(idx) => self.entries[idx] = entry,
            None => self.entries.push(entry),
        }
    }

    /// Append new fields under a fresh temporary id.
    pub fn insert_new(&mut self, fields: F) -> EntryId {
        let id = EntryId::Temporary(self.next_temporary);
        self.next_temporary += 1;
        self.entries.push(DraftEntry::new(id.clone(), fields));
        id
    }

    /// Replace the fields of an existing entry. Returns `false` if the id is
    /// unknown.
    pub fn update_fields(&mut self, id: &EntryId, fields: F) -> bool {
        match self.entries.iter_mut().find(|e| &e.id == id) {
            Some(entry) => {
                entry.fields = fields;
                true
            }
            None => false,
        }
    }

    /// Remove an entry: temporary entries leave the list, persisted entries
    /// are marked for deletion. Returns `false` if the id is unknown.
    pub fn remove(&mut self, id: &EntryId) -> bool {
        let Some(idx) = self.position(id) else {
            return false;
        };
        if id.is_temporary() {
            self.entries.remove(idx);
        } else {
            self.entries[idx].marked_for_deletion = true;
        }
        true
    }

    /// Clear the deletion mark on a persisted entry. Returns `false` if the
    /// id is unknown.
    pub fn restore(&mut self, id: &EntryId) -> bool {
        match self.entries.iter_mut().find(|e| &e.id == id) {
            Some(entry) => {
                entry.marked_for_deletion = false;
                true
            }
            None => false,
        }
    }

    /// Swap a temporary entry the server has created for a persisted entry
    /// with the same fields and position. Returns `false` if there is no
    /// such temporary entry.
    pub fn promote(&mut self, local_id: u64, server_id: impl Into<ServerId>) -> bool {
        let Some(idx) = self.position(&EntryId::Temporary(local_id)) else {
            return false;
        };
        let entry = &mut self.entries[idx];
        entry.id = EntryId::Persisted(server_id.into());
        true
    }

    /// Drop a persisted entry the server has deleted. Returns `false` unless
    /// the entry exists and was marked for deletion.
    pub fn discard(&mut self, server_id: &str) -> bool {
        let id = EntryId::Persisted(server_id.to_string());
        match self.position(&id) {
            Some(idx) if self.entries[idx].marked_for_deletion => {
                self.entries.remove(idx);
                true
            }
            _ => false,
        }
    }

    /// Replace the whole list with server rows, discarding local edits.
    ///
    /// The temporary-id counter keeps counting so ids handed out before the
    /// reset are never reused.
    pub fn reset(&mut self, server_entries: impl IntoIterator<Item = (ServerId, F)>) {
        self.entries = server_entries
            .into_iter()
            .map(|(id, fields)| DraftEntry::persisted(id, fields))
            .collect();
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn sample() -> DraftCollection<&'static str> {
        let mut c = DraftCollection::from_server(vec![
            ("srv-1".to_string(), "first"),
            ("srv-2".to_string(), "second"),
        ]);
        c.insert_new("local");
        c
    }

    #[test]
    fn entry_id_json_distinguishes_temporary_from_server_ids() {
        let temporary: EntryId = serde_json::from_value(serde_json::json!({"tmp": 4})).unwrap();
        assert_eq!(temporary, EntryId::Temporary(4));
        let persisted: EntryId = serde_json::from_value(serde_json::json!("42")).unwrap();
        assert_eq!(persisted, EntryId::Persisted("42".to_string()));
        assert!(serde_json::from_value::<EntryId>(serde_json::json!("")).is_err());
        assert!(serde_json::from_value::<EntryId>(serde_json::json!({"tmp": "x"})).is_err());
    }

    #[test]
    fn server_id_shaped_like_temporary_survives_round_trip() {
        let entry = DraftEntry::persisted("tmp-5", "row");
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], "tmp-5");

        let back: DraftEntry<String> = serde_json::from_value(json).unwrap();
        assert_eq!(back.id(), &EntryId::Persisted("tmp-5".to_string()));

        let temporary = serde_json::to_value(EntryId::Temporary(5)).unwrap();
        assert_eq!(temporary, serde_json::json!({"tmp": 5}));
    }

    #[test]
    fn empty_server_id_is_invalid_id() {
        let err = EntryId::try_from(EntryIdRepr::Persisted(" ".to_string())).unwrap_err();
        assert_matches!(err, CoreError::InvalidId(_));
    }

    #[test]
    fn entry_id_display_is_readable() {
        assert_eq!(EntryId::Temporary(7).to_string(), "tmp-7");
        assert_eq!(EntryId::Persisted("abc".into()).to_string(), "abc");
    }

    #[test]
    fn remove_temporary_drops_entry() {
        let mut c = sample();
        let removed = c.remove(&EntryId::Temporary(1));
        assert!(removed);
        assert_eq!(c.len(), 2);
        assert!(c.get(&EntryId::Temporary(1)).is_none());
    }

    #[test]
    fn remove_persisted_marks_entry() {
        let mut c = sample();
        let id = EntryId::Persisted("srv-1".into());
        assert!(c.remove(&id));
        assert_eq!(c.len(), 3);
        assert!(c.get(&id).unwrap().is_marked_for_deletion());
        assert_eq!(c.visible().count(), 2);
    }

    #[test]
    fn remove_unknown_id_is_noop() {
        let mut c = sample();
        assert!(!c.remove(&EntryId::Persisted("missing".into())));
        assert_eq!(c.len(), 3);
    }

    #[test]
    fn restore_clears_mark() {
        let mut c = sample();
        let id = EntryId::Persisted("srv-2".into());
        c.remove(&id);
        assert!(c.restore(&id));
        assert!(c.get(&id).unwrap().is_visible());
    }

    #[test]
    fn upsert_existing_preserves_position() {
        let mut c = sample();
        c.upsert(DraftEntry::persisted("srv-1", "edited"));
        assert_eq!(c.len(), 3);
        assert_eq!(c.entries()[0].fields, "edited");
        assert_eq!(c.entries()[0].id(), &EntryId::Persisted("srv-1".into()));
    }

    #[test]
    fn upsert_new_id_appends_one() {
        let mut c = sample();
        c.upsert(DraftEntry::persisted("srv-3", "third"));
        assert_eq!(c.len(), 4);
        assert_eq!(c.entries()[3].fields, "third");
    }

    #[test]
    fn upsert_marked_temporary_is_removal() {
        let mut c = sample();
        let entry = DraftEntry {
            id: EntryId::Temporary(1),
            fields: "local",
            marked_for_deletion: true,
        };
        c.upsert(entry);
        assert!(c.get(&EntryId::Temporary(1)).is_none());
        assert!(c.entries().iter().all(|e| !(e.id().is_temporary() && e.is_marked_for_deletion())));
    }

    #[test]
    fn insert_new_assigns_increasing_temporary_ids() {
        let mut c: DraftCollection<&str> = DraftCollection::new();
        assert_eq!(c.insert_new("a"), EntryId::Temporary(1));
        assert_eq!(c.insert_new("b"), EntryId::Temporary(2));
        c.remove(&EntryId::Temporary(2));
        assert_eq!(c.insert_new("c"), EntryId::Temporary(3));
    }

    #[test]
    fn upsert_of_temporary_entry_advances_counter() {
        let mut c: DraftCollection<&str> = DraftCollection::new();
        c.upsert(DraftEntry::new(EntryId::Temporary(9), "nine"));
        assert_eq!(c.insert_new("ten"), EntryId::Temporary(10));
    }

    #[test]
    fn reset_replaces_everything_and_clears_marks() {
        let mut c = sample();
        c.remove(&EntryId::Persisted("srv-1".into()));
        c.reset(vec![("srv-9".to_string(), "fresh")]);
        assert_eq!(c.len(), 1);
        assert_eq!(c.entries()[0], DraftEntry::persisted("srv-9", "fresh"));
        assert!(c.entries().iter().all(DraftEntry::is_visible));
    }

    #[test]
    fn reset_does_not_reuse_temporary_ids() {
        let mut c = sample();
        c.reset(Vec::new());
        assert_eq!(c.insert_new("again"), EntryId::Temporary(2));
    }

    #[test]
    fn promote_keeps_fields_and_position() {
        let mut c = sample();
        assert!(c.promote(1, "srv-3"));
        assert_eq!(c.entries()[2], DraftEntry::persisted("srv-3", "local"));
        assert!(!c.promote(1, "srv-4"));
    }

    #[test]
    fn discard_only_drops_marked_entries() {
        let mut c = sample();
        assert!(!c.discard("srv-1"));
        c.remove(&EntryId::Persisted("srv-1".into()));
        assert!(c.discard("srv-1"));
        assert_eq!(c.len(), 2);
        assert!(!c.discard("srv-1"));
    }

    #[test]
    fn draft_entry_json_reads_both_id_shapes() {
        let json = serde_json::json!([
            {"id": {"tmp": 1}, "fields": "a"},
            {"id": "srv-9", "fields": "b", "markedForDeletion": true},
        ]);
        let entries: Vec<DraftEntry<String>> = serde_json::from_value(json).unwrap();
        assert_eq!(entries[0].id(), &EntryId::Temporary(1));
        assert!(!entries[0].is_marked_for_deletion());
        assert!(entries[1].is_marked_for_deletion());

        let back = serde_json::to_value(&entries[1]).unwrap();
        assert_eq!(back["id"], "srv-9");
        assert_eq!(back["markedForDeletion"], true);
    }
}
