//! Integration tests for the draft reconciler.
//!
//! Drives [`Reconciler`] against an in-memory [`RemoteCollection`] that
//! records every call and fails on demand.

use std::collections::HashSet;
use std::sync::Arc;

use assert_matches::assert_matches;
use async_trait::async_trait;
use betterangels_client::context::AppContext;
use betterangels_client::error::{ClientError, ClientResult};
use betterangels_client::notifier::{NotificationLevel, Notifier};
use betterangels_client::remote::RemoteCollection;
use betterangels_client::session::Session;
use betterangels_client::sync::{BatchPolicy, OpStatus, Reconciler};
use betterangels_core::draft::{DraftCollection, EntryId};
use betterangels_core::flags::FeatureFlags;
use betterangels_core::mutation::{EntityRef, MutationOutcome, OperationMessage};
use betterangels_core::reconcile::SyncOp;
use betterangels_core::task::TaskFields;
use tokio::sync::Mutex;

// ---------------------------------------------------------------------------
// Fake remote
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Call {
    Create(String),
    Update(String, String),
    Delete(String),
}

/// Records calls; hands out ids `srv-100`, `srv-101`, ... for creates.
#[derive(Default)]
struct FakeRemote {
    calls: Mutex<Vec<Call>>,
    next_id: Mutex<u32>,
    /// Summaries or ids whose request fails at the transport level.
    broken: HashSet<String>,
    /// Summaries the server rejects with a validation message.
    rejected: HashSet<String>,
}

impl FakeRemote {
    fn breaking(keys: &[&str]) -> Self {
        Self {
            broken: keys.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    fn rejecting(summaries: &[&str]) -> Self {
        Self {
            rejected: summaries.iter().map(|k| k.to_string()).collect(),
            ..Self::default()
        }
    }

    async fn calls(&self) -> Vec<Call> {
        self.calls.lock().await.clone()
    }

    fn check(&self, key: &str) -> ClientResult<()> {
        if self.broken.contains(key) {
            return Err(ClientError::Api {
                status: 502,
                body: format!("{key} unavailable"),
            });
        }
        Ok(())
    }

    fn outcome(&self, summary: &str, id: String) -> MutationOutcome<EntityRef> {
        if self.rejected.contains(summary) {
            MutationOutcome::ValidationFailure(vec![OperationMessage::validation(
                "summary",
                "Summary is not allowed",
            )])
        } else {
            MutationOutcome::Success(EntityRef { id })
        }
    }
}

#[async_trait]
impl RemoteCollection<TaskFields> for FakeRemote {
    fn entity(&self) -> &'static str {
        "task"
    }

    async fn create(&self, fields: &TaskFields) -> ClientResult<MutationOutcome<EntityRef>> {
        self.calls.lock().await.push(Call::Create(fields.summary.clone()));
        self.check(&fields.summary)?;
        let mut next = self.next_id.lock().await;
        let id = format!("srv-{}", 100 + *next);
        *next += 1;
        Ok(self.outcome(&fields.summary, id))
    }

    async fn update(&self, id: &str, fields: &TaskFields) -> ClientResult<MutationOutcome<EntityRef>> {
        self.calls
            .lock()
            .await
            .push(Call::Update(id.to_string(), fields.summary.clone()));
        self.check(id)?;
        Ok(self.outcome(&fields.summary, id.to_string()))
    }

    async fn delete(&self, id: &str) -> ClientResult<MutationOutcome<EntityRef>> {
        self.calls.lock().await.push(Call::Delete(id.to_string()));
        self.check(id)?;
        Ok(MutationOutcome::Success(EntityRef { id: id.to_string() }))
    }
}

fn task(summary: &str) -> TaskFields {
    TaskFields {
        summary: summary.to_string(),
        ..TaskFields::default()
    }
}

/// Server tasks `srv-7` ("Call shelter") and `srv-9` ("Old"), `srv-9`
/// removed, plus a new "Bring water".
fn mixed_draft() -> DraftCollection<TaskFields> {
    let mut collection = DraftCollection::from_server(vec![
        ("srv-7".to_string(), task("Call shelter")),
        ("srv-9".to_string(), task("Old")),
    ]);
    collection.insert_new(task("Bring water"));
    collection.remove(&EntryId::Persisted("srv-9".into()));
    collection
}

// ---------------------------------------------------------------------------
// Test: mixed draft issues one call per entry, deletes first
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mixed_draft_issues_delete_create_update() {
    let remote = FakeRemote::default();
    let report = Reconciler::new(BatchPolicy::Independent)
        .reconcile(&remote, &mixed_draft())
        .await;

    assert_eq!(
        remote.calls().await,
        vec![
            Call::Delete("srv-9".into()),
            Call::Create("Bring water".into()),
            Call::Update("srv-7".into(), "Call shelter".into()),
        ]
    );
    assert!(report.is_clean());
    assert_eq!(report.created_ids(), vec![(1, "srv-100".to_string())]);
}

#[tokio::test]
async fn empty_draft_makes_no_calls() {
    let remote = FakeRemote::default();
    let report = Reconciler::new(BatchPolicy::StopOnFirstError)
        .reconcile(&remote, &DraftCollection::<TaskFields>::new())
        .await;

    assert!(remote.calls().await.is_empty());
    assert!(report.outcomes.is_empty());
    assert!(report.is_clean());
}

// ---------------------------------------------------------------------------
// Test: batch policies on a transport failure
// ---------------------------------------------------------------------------

#[tokio::test]
async fn stop_on_first_error_skips_the_rest() {
    let remote = FakeRemote::breaking(&["srv-9"]);
    let report = Reconciler::new(BatchPolicy::StopOnFirstError)
        .reconcile(&remote, &mixed_draft())
        .await;

    assert_eq!(remote.calls().await, vec![Call::Delete("srv-9".into())]);
    assert_eq!(report.outcomes.len(), 3);
    assert_matches!(&report.outcomes[0].status, OpStatus::Failed(reason) if reason.contains("502"));
    assert_eq!(report.outcomes[1].op, SyncOp::Create);
    assert_eq!(report.outcomes[1].status, OpStatus::Skipped);
    assert_eq!(report.outcomes[2].status, OpStatus::Skipped);
    assert_eq!(report.skipped().count(), 2);
}

#[tokio::test]
async fn independent_attempts_everything_and_collects_failures() {
    let remote = FakeRemote::breaking(&["srv-9", "srv-7"]);
    let report = Reconciler::new(BatchPolicy::Independent)
        .reconcile(&remote, &mixed_draft())
        .await;

    assert_eq!(remote.calls().await.len(), 3);
    let failed: Vec<&EntryId> = report.failures().map(|o| &o.entry_id).collect();
    assert_eq!(
        failed,
        vec![&EntryId::Persisted("srv-9".into()), &EntryId::Persisted("srv-7".into())]
    );
    assert_eq!(report.applied_count(), 1);
    assert_eq!(report.skipped().count(), 0);
}

// ---------------------------------------------------------------------------
// Test: validation rejections
// ---------------------------------------------------------------------------

#[tokio::test]
async fn rejection_does_not_stop_the_batch() {
    let remote = FakeRemote::rejecting(&["Bring water"]);
    let report = Reconciler::new(BatchPolicy::StopOnFirstError)
        .reconcile(&remote, &mixed_draft())
        .await;

    assert_eq!(remote.calls().await.len(), 3);
    let create = &report.outcomes[1];
    assert_eq!(create.entry_id, EntryId::Temporary(1));
    assert_matches!(&create.status, OpStatus::Rejected(messages) if messages[0].field.as_deref() == Some("summary"));
    assert_matches!(report.outcomes[2].status, OpStatus::Applied(_));
    assert!(report.created_ids().is_empty());
}

// ---------------------------------------------------------------------------
// Test: notifications
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_batch_sends_one_error_notification() {
    let notifier = Arc::new(Notifier::default());
    let mut rx = notifier.subscribe();
    let ctx = AppContext::builder()
        .flags(FeatureFlags::new())
        .notifier(notifier)
        .session(Arc::new(Session::in_memory()))
        .build()
        .unwrap();

    let remote = FakeRemote::breaking(&["srv-9", "srv-7"]);
    Reconciler::from_context(&ctx, BatchPolicy::Independent)
        .reconcile(&remote, &mixed_draft())
        .await;

    let notification = rx.recv().await.unwrap();
    assert_eq!(notification.level, NotificationLevel::Error);
    assert!(notification.message.starts_with("2 task change(s) failed"));
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn clean_batch_is_silent() {
    let notifier = Arc::new(Notifier::default());
    let mut rx = notifier.subscribe();

    Reconciler::new(BatchPolicy::Independent)
        .with_notifier(notifier)
        .reconcile(&FakeRemote::default(), &mixed_draft())
        .await;

    assert!(rx.try_recv().is_err());
}

// ---------------------------------------------------------------------------
// Test: settling and retrying
// ---------------------------------------------------------------------------

#[tokio::test]
async fn retry_after_settle_only_resends_failures() {
    let mut collection = mixed_draft();
    collection.insert_new(task("Find bed"));

    let first = FakeRemote::breaking(&["Find bed"]);
    let report = Reconciler::new(BatchPolicy::Independent)
        .reconcile(&first, &collection)
        .await;
    report.settle(&mut collection);

    let ids: Vec<String> = collection.entries().iter().map(|e| e.id().to_string()).collect();
    assert_eq!(ids, vec!["srv-7", "srv-100", "tmp-2"]);

    let second = FakeRemote::default();
    let retry = Reconciler::new(BatchPolicy::Independent)
        .reconcile(&second, &collection)
        .await;

    assert!(retry.is_clean());
    let creates: Vec<Call> = second
        .calls()
        .await
        .into_iter()
        .filter(|c| matches!(c, Call::Create(_)))
        .collect();
    assert_eq!(creates, vec![Call::Create("Find bed".into())]);
}
