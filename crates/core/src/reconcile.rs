//! Partition a draft collection into remote create/update/delete sets.
//!
//! Planning is pure; the client crate executes a [`ReconcilePlan`] against
//! the API.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::draft::{DraftCollection, EntryId};
use crate::types::ServerId;

/// Kind of remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncOp {
    Create,
    Update,
    Delete,
}

impl SyncOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
        }
    }
}

impl std::fmt::Display for SyncOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A locally created entry to send to the server.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedCreate<F> {
    /// Temporary id of the draft entry.
    pub local_id: u64,
    pub fields: F,
}

/// A persisted entry whose fields should be written back.
#[derive(Debug, Clone, PartialEq)]
pub struct PlannedUpdate<F> {
    pub id: ServerId,
    pub fields: F,
}

/// The three disjoint operation sets derived from a draft.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePlan<F> {
    pub to_create: Vec<PlannedCreate<F>>,
    pub to_update: Vec<PlannedUpdate<F>>,
    pub to_delete: Vec<ServerId>,
}

impl<F> Default for ReconcilePlan<F> {
    fn default() -> Self {
        Self {
            to_create: Vec::new(),
            to_update: Vec::new(),
            to_delete: Vec::new(),
        }
    }
}

impl<F: Clone> ReconcilePlan<F> {
    /// Partition every entry of `collection`:
    ///
    /// - temporary, unmarked → create
    /// - persisted, unmarked → update
    /// - persisted, marked   → delete
    ///
    /// Every persisted entry is updated whether or not it changed; use
    /// [`partition_against`](Self::partition_against) to skip unchanged rows.
    pub fn partition(collection: &DraftCollection<F>) -> Self {
        let mut plan = Self::default();
        for entry in collection.entries() {
            match (entry.id(), entry.is_marked_for_deletion()) {
                (EntryId::Temporary(n), false) => plan.to_create.push(PlannedCreate {
                    local_id: *n,
                    fields: entry.fields.clone(),
                }),
                // The collection never holds a marked temporary entry.
                (EntryId::Temporary(_), true) => {}
                (EntryId::Persisted(id), false) => plan.to_update.push(PlannedUpdate {
                    id: id.clone(),
                    fields: entry.fields.clone(),
                }),
                (EntryId::Persisted(id), true) => plan.to_delete.push(id.clone()),
            }
        }
        plan
    }
}

impl<F: Clone + PartialEq> ReconcilePlan<F> {
    /// Like [`partition`](Self::partition), but drops updates whose fields
    /// equal the server `snapshot`. Persisted ids missing from the snapshot
    /// are still updated.
    pub fn partition_against(
        collection: &DraftCollection<F>,
        snapshot: &HashMap<ServerId, F>,
    ) -> Self {
        let mut plan = Self::partition(collection);
        plan.to_update
            .retain(|update| snapshot.get(&update.id) != Some(&update.fields));
        plan
    }
}

impl<F> ReconcilePlan<F> {
    /// Total number of remote operations.
    pub fn len(&self) -> usize {
        self.to_create.len() + self.to_update.len() + self.to_delete.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
