//! Reconciler: turn a draft collection into remote mutations.
//!
//! Operations run in three groups: deletes, then creates, then updates.
//! There is no transaction; a batch can partially succeed. The
//! [`BatchPolicy`] decides whether a failed operation stops the rest:
//!
//! - [`BatchPolicy::Independent`] (default) attempts everything. Operations
//!   inside a group run concurrently, groups run in order, and every
//!   failure ends up in the [`ReconcileReport`].
//! - [`BatchPolicy::StopOnFirstError`] runs one operation at a time and
//!   marks everything after the first transport failure as skipped.
//!
//! A validation rejection (`OperationInfo`) is not a transport failure and
//! never stops a batch.

use std::str::FromStr;
use std::sync::Arc;

use betterangels_core::draft::{DraftCollection, EntryId};
use betterangels_core::mutation::{EntityRef, MutationOutcome, OperationMessage};
use betterangels_core::reconcile::{ReconcilePlan, SyncOp};
use betterangels_core::types::ServerId;
use futures::future::join_all;

use crate::context::AppContext;
use crate::error::ClientResult;
use crate::notifier::Notifier;
use crate::remote::RemoteCollection;

// ---------------------------------------------------------------------------
// Policy
// ---------------------------------------------------------------------------

/// What a failed operation does to the rest of a batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BatchPolicy {
    #[default]
    Independent,
    StopOnFirstError,
}

impl BatchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Independent => "independent",
            Self::StopOnFirstError => "stop_on_first_error",
        }
    }
}

impl FromStr for BatchPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "independent" => Ok(Self::Independent),
            "stop_on_first_error" => Ok(Self::StopOnFirstError),
            other => Err(format!("unknown batch policy '{other}'")),
        }
    }
}

// ---------------------------------------------------------------------------
// Report
// ---------------------------------------------------------------------------

/// How one operation ended.
#[derive(Debug, Clone, PartialEq)]
pub enum OpStatus {
    /// The server applied it; carries the affected id.
    Applied(ServerId),
    /// The server answered with `OperationInfo`.
    Rejected(Vec<OperationMessage>),
    /// The request failed (network, HTTP, decode).
    Failed(String),
    /// Not attempted because an earlier operation failed.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OpOutcome {
    pub op: SyncOp,
    pub entry_id: EntryId,
    pub status: OpStatus,
}

impl OpOutcome {
    pub fn is_failure(&self) -> bool {
        matches!(self.status, OpStatus::Rejected(_) | OpStatus::Failed(_))
    }
}

/// Per-operation results of one reconcile, in execution order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReconcileReport {
    pub outcomes: Vec<OpOutcome>,
}

impl ReconcileReport {
    /// True when every operation was applied.
    pub fn is_clean(&self) -> bool {
        self.outcomes
            .iter()
            .all(|o| matches!(o.status, OpStatus::Applied(_)))
    }

    pub fn failures(&self) -> impl Iterator<Item = &OpOutcome> {
        self.outcomes.iter().filter(|o| o.is_failure())
    }

    pub fn skipped(&self) -> impl Iterator<Item = &OpOutcome> {
        self.outcomes
            .iter()
            .filter(|o| o.status == OpStatus::Skipped)
    }

    pub fn applied_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OpStatus::Applied(_)))
            .count()
    }

    /// `(temporary id, server id)` for every applied create.
    pub fn created_ids(&self) -> Vec<(u64, ServerId)> {
        self.outcomes
            .iter()
            .filter_map(|o| match (&o.op, &o.entry_id, &o.status) {
                (SyncOp::Create, EntryId::Temporary(n), OpStatus::Applied(id)) => {
                    Some((*n, id.clone()))
                }
                _ => None,
            })
            .collect()
    }

    /// Fold applied operations back into the draft: created entries take
    /// their server ids and deleted entries leave the list. Failed and
    /// skipped entries stay as they were so the user can retry.
    pub fn settle<F>(&self, collection: &mut DraftCollection<F>) {
        for outcome in &self.outcomes {
            match (&outcome.op, &outcome.entry_id, &outcome.status) {
                (SyncOp::Create, EntryId::Temporary(n), OpStatus::Applied(id)) => {
                    collection.promote(*n, id.clone());
                }
                (SyncOp::Delete, EntryId::Persisted(id), OpStatus::Applied(_)) => {
                    collection.discard(id);
                }
                _ => {}
            }
        }
    }

    /// One-line description of the failures, for the snackbar.
    pub fn summary(&self, entity: &str) -> String {
        let failed = self.failures().count();
        let skipped = self.skipped().count();
        let mut parts = vec![format!("{failed} {entity} change(s) failed")];
        if skipped > 0 {
            parts.push(format!("{skipped} not attempted"));
        }
        let first_reason = self.failures().find_map(|o| match &o.status {
            OpStatus::Rejected(messages) => messages.first().map(|m| m.message.clone()),
            OpStatus::Failed(reason) => Some(reason.clone()),
            _ => None,
        });
        if let Some(reason) = first_reason {
            parts.push(reason);
        }
        parts.join(": ")
    }
}

// ---------------------------------------------------------------------------
// Reconciler
// ---------------------------------------------------------------------------

/// One remote operation to run.
enum Job<F> {
    Delete(ServerId),
    Create(u64, F),
    Update(ServerId, F),
}

impl<F> Job<F> {
    fn op(&self) -> SyncOp {
        match self {
            Self::Delete(_) => SyncOp::Delete,
            Self::Create(..) => SyncOp::Create,
            Self::Update(..) => SyncOp::Update,
        }
    }

    fn entry_id(&self) -> EntryId {
        match self {
            Self::Delete(id) | Self::Update(id, _) => EntryId::Persisted(id.clone()),
            Self::Create(n, _) => EntryId::Temporary(*n),
        }
    }
}

/// Executes reconcile plans.
pub struct Reconciler {
    policy: BatchPolicy,
    notifier: Option<Arc<Notifier>>,
}

impl Reconciler {
    pub fn new(policy: BatchPolicy) -> Self {
        Self {
            policy,
            notifier: None,
        }
    }

    /// Reconciler that reports failures through the context's notifier.
    pub fn from_context(ctx: &AppContext, policy: BatchPolicy) -> Self {
        Self::new(policy).with_notifier(Arc::clone(ctx.notifier()))
    }

    pub fn with_notifier(mut self, notifier: Arc<Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn policy(&self) -> BatchPolicy {
        self.policy
    }

    /// Partition `collection` and execute the plan.
    pub async fn reconcile<F, R>(&self, remote: &R, collection: &DraftCollection<F>) -> ReconcileReport
    where
        F: Clone + Send + Sync,
        R: RemoteCollection<F> + ?Sized,
    {
        self.execute(remote, ReconcilePlan::partition(collection)).await
    }

    /// Execute an already computed plan.
    pub async fn execute<F, R>(&self, remote: &R, plan: ReconcilePlan<F>) -> ReconcileReport
    where
        F: Send + Sync,
        R: RemoteCollection<F> + ?Sized,
    {
        let entity = remote.entity();
        tracing::info!(
            entity,
            creates = plan.to_create.len(),
            updates = plan.to_update.len(),
            deletes = plan.to_delete.len(),
            policy = self.policy.as_str(),
            "Reconciling draft collection"
        );

        let groups: [Vec<Job<F>>; 3] = [
            plan.to_delete.into_iter().map(Job::Delete).collect(),
            plan.to_create
                .into_iter()
                .map(|c| Job::Create(c.local_id, c.fields))
                .collect(),
            plan.to_update
                .into_iter()
                .map(|u| Job::Update(u.id, u.fields))
                .collect(),
        ];

        let outcomes = match self.policy {
            BatchPolicy::Independent => {
                let mut outcomes = Vec::new();
                for group in &groups {
                    outcomes.extend(join_all(group.iter().map(|job| run_job(remote, job))).await);
                }
                outcomes
            }
            BatchPolicy::StopOnFirstError => {
                let mut outcomes = Vec::new();
                let mut aborted = false;
                for job in groups.iter().flatten() {
                    if aborted {
                        outcomes.push(OpOutcome {
                            op: job.op(),
                            entry_id: job.entry_id(),
                            status: OpStatus::Skipped,
                        });
                        continue;
                    }
                    let outcome = run_job(remote, job).await;
                    aborted = matches!(outcome.status, OpStatus::Failed(_));
                    outcomes.push(outcome);
                }
                outcomes
            }
        };

        let report = ReconcileReport { outcomes };

        if report.is_clean() {
            tracing::info!(entity, applied = report.applied_count(), "Draft collection saved");
        } else {
            tracing::warn!(
                entity,
                applied = report.applied_count(),
                failed = report.failures().count(),
                skipped = report.skipped().count(),
                "Draft collection partially saved"
            );
            if let Some(notifier) = &self.notifier {
                notifier.error(report.summary(entity));
            }
        }

        report
    }
}

/// Run one job and classify its result.
async fn run_job<F, R>(remote: &R, job: &Job<F>) -> OpOutcome
where
    F: Send + Sync,
    R: RemoteCollection<F> + ?Sized,
{
    let result: ClientResult<MutationOutcome<EntityRef>> = match job {
        Job::Delete(id) => remote.delete(id).await,
        Job::Create(_, fields) => remote.create(fields).await,
        Job::Update(id, fields) => remote.update(id, fields).await,
    };

    let op = job.op();
    let entry_id = job.entry_id();
    let status = match result {
        Ok(MutationOutcome::Success(entity)) => OpStatus::Applied(entity.id),
        Ok(MutationOutcome::ValidationFailure(messages)) => {
            tracing::warn!(%op, entry_id = %entry_id, messages = messages.len(), "Operation rejected");
            OpStatus::Rejected(messages)
        }
        Err(e) => {
            tracing::error!(%op, entry_id = %entry_id, error = %e, "Operation failed");
            OpStatus::Failed(e.to_string())
        }
    };

    OpOutcome {
        op,
        entry_id,
        status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(op: SyncOp, entry_id: EntryId, status: OpStatus) -> OpOutcome {
        OpOutcome {
            op,
            entry_id,
            status,
        }
    }

    #[test]
    fn policy_parses_both_names() {
        assert_eq!("independent".parse(), Ok(BatchPolicy::Independent));
        assert_eq!(" stop_on_first_error ".parse(), Ok(BatchPolicy::StopOnFirstError));
        assert!("sometimes".parse::<BatchPolicy>().is_err());
    }

    #[test]
    fn empty_report_is_clean() {
        assert!(ReconcileReport::default().is_clean());
    }

    #[test]
    fn created_ids_only_lists_applied_creates() {
        let report = ReconcileReport {
            outcomes: vec![
                outcome(SyncOp::Create, EntryId::Temporary(1), OpStatus::Applied("50".into())),
                outcome(SyncOp::Create, EntryId::Temporary(2), OpStatus::Failed("x".into())),
                outcome(SyncOp::Update, EntryId::Persisted("7".into()), OpStatus::Applied("7".into())),
            ],
        };
        assert_eq!(report.created_ids(), vec![(1, "50".to_string())]);
        assert_eq!(report.applied_count(), 2);
        assert!(!report.is_clean());
    }

    #[test]
    fn settle_promotes_creates_and_drops_deletes() {
        let mut collection = DraftCollection::from_server(vec![
            ("7".to_string(), "keep"),
            ("9".to_string(), "gone"),
        ]);
        collection.insert_new("new");
        collection.insert_new("retry me");
        collection.remove(&EntryId::Persisted("9".into()));

        let report = ReconcileReport {
            outcomes: vec![
                outcome(SyncOp::Delete, EntryId::Persisted("9".into()), OpStatus::Applied("9".into())),
                outcome(SyncOp::Create, EntryId::Temporary(1), OpStatus::Applied("50".into())),
                outcome(SyncOp::Create, EntryId::Temporary(2), OpStatus::Failed("timeout".into())),
            ],
        };
        report.settle(&mut collection);

        let ids: Vec<String> = collection.entries().iter().map(|e| e.id().to_string()).collect();
        assert_eq!(ids, vec!["7", "50", "tmp-2"]);
    }

    #[test]
    fn summary_names_counts_and_first_reason() {
        let report = ReconcileReport {
            outcomes: vec![
                outcome(
                    SyncOp::Create,
                    EntryId::Temporary(1),
                    OpStatus::Rejected(vec![OperationMessage::validation("summary", "Required")]),
                ),
                outcome(SyncOp::Update, EntryId::Persisted("7".into()), OpStatus::Skipped),
            ],
        };
        assert_eq!(
            report.summary("task"),
            "1 task change(s) failed: 1 not attempted: Required"
        );
    }
}
