//! Service requests attached to a note, and the selection diff behind the
//! services picker.
//!
//! The picker works on one status bucket at a time ("requested" or
//! "provided"): the user ticks catalog services or types free-form ones,
//! and [`apply_selection`] turns the final selection into draft changes.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

use crate::draft::{DraftCollection, EntryId};
use crate::editor::FormFields;
use crate::types::ServerId;

/// What service a request refers to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "value")]
pub enum ServiceRef {
    /// A service from the server-side catalog.
    Catalog(ServerId),
    /// A free-form label typed by the user.
    Other(String),
}

impl ServiceRef {
    /// Whether two references denote the same service. Free-form labels are
    /// compared trimmed and case-insensitively.
    pub fn same_service(&self, other: &ServiceRef) -> bool {
        match (self, other) {
            (Self::Catalog(a), Self::Catalog(b)) => a == b,
            (Self::Other(a), Self::Other(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
            _ => false,
        }
    }
}

impl Default for ServiceRef {
    fn default() -> Self {
        Self::Other(String::new())
    }
}

/// Whether the service was asked for or already delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceRequestStatus {
    #[default]
    Requested,
    Provided,
}

impl ServiceRequestStatus {
    /// GraphQL enum value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "REQUESTED",
            Self::Provided => "PROVIDED",
        }
    }
}

/// Editable fields of a service request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequestFields {
    pub service: ServiceRef,
    #[serde(default)]
    pub status: ServiceRequestStatus,
}

impl Validate for ServiceRequestFields {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        match &self.service {
            ServiceRef::Other(label) if label.trim().is_empty() => {
                errors.add(
                    "service",
                    ValidationError::new("required")
                        .with_message(Cow::Borrowed("Service name is required")),
                );
            }
            ServiceRef::Catalog(id) if id.is_empty() => {
                errors.add(
                    "service",
                    ValidationError::new("required")
                        .with_message(Cow::Borrowed("Select a service")),
                );
            }
            _ => {}
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl FormFields for ServiceRequestFields {
    const KNOWN_FIELDS: &'static [&'static str] = &["service", "status"];
    const SERVER_FIELD_ALIASES: &'static [(&'static str, &'static str)] = &[
        ("serviceId", "service"),
        ("serviceOther", "service"),
        ("serviceRequestType", "status"),
    ];
}

/// Counts of what [`apply_selection`] changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SelectionDiff {
    pub added: usize,
    pub restored: usize,
    pub removed: usize,
}

impl SelectionDiff {
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.restored == 0 && self.removed == 0
    }
}

/// Bring the `status` bucket of `collection` in line with `selected`.
///
/// - Selected services with no entry are appended as new entries.
/// - Selected services whose persisted entry was marked are restored.
/// - Entries whose service is no longer selected are removed (temporary
///   entries leave the list, persisted ones are marked).
///
/// Entries in the other status bucket are untouched. Duplicate selections
/// collapse to one entry.
pub fn apply_selection(
    collection: &mut DraftCollection<ServiceRequestFields>,
    status: ServiceRequestStatus,
    selected: &[ServiceRef],
) -> SelectionDiff {
    let mut diff = SelectionDiff::default();

    let mut wanted: Vec<&ServiceRef> = Vec::new();
    for service in selected {
        if !wanted.iter().any(|w| w.same_service(service)) {
            wanted.push(service);
        }
    }

    let bucket: Vec<(EntryId, ServiceRef, bool)> = collection
        .entries()
        .iter()
        .filter(|e| e.fields.status == status)
        .map(|e| (e.id().clone(), e.fields.service.clone(), e.is_marked_for_deletion()))
        .collect();

    for (id, service, marked) in &bucket {
        let still_selected = wanted.iter().any(|w| w.same_service(service));
        match (still_selected, *marked) {
            (true, true) => {
                collection.restore(id);
                diff.restored += 1;
            }
            (false, false) => {
                collection.remove(id);
                diff.removed += 1;
            }
            _ => {}
        }
    }

    for service in wanted {
        let present = bucket.iter().any(|(_, s, _)| s.same_service(service));
        if !present {
            collection.insert_new(ServiceRequestFields {
                service: service.clone(),
                status,
            });
            diff.added += 1;
        }
    }

    diff
}
