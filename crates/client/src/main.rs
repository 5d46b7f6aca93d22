//! `ba-sync` -- save a draft task list for one note.
//!
//! Reads a JSON array of draft entries, reconciles it against the API and
//! prints the per-operation report. Exits non-zero when any operation was
//! rejected, failed or skipped.
//!
//! ```text
//! ba-sync <note-id> <draft.json>
//! ```
//!
//! # Environment variables
//!
//! | Variable                  | Required | Default                 |
//! |---------------------------|----------|-------------------------|
//! | `BA_API_URL`              | no       | `http://localhost:8000` |
//! | `BA_API_TOKEN`            | no       | --                      |
//! | `BA_REQUEST_TIMEOUT_SECS` | no       | `30`                    |
//! | `BA_BATCH_POLICY`         | no       | `independent`           |

use std::sync::Arc;

use anyhow::{bail, Context};
use betterangels_client::config::ClientConfig;
use betterangels_client::graphql::GraphQlClient;
use betterangels_client::notifier::Notifier;
use betterangels_client::remote::TaskRemote;
use betterangels_client::session::Session;
use betterangels_client::sync::{OpStatus, Reconciler};
use betterangels_core::draft::{DraftCollection, DraftEntry};
use betterangels_core::task::TaskFields;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "betterangels_client=debug,ba_sync=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    let (Some(note_id), Some(draft_path)) = (args.next(), args.next()) else {
        bail!("usage: ba-sync <note-id> <draft.json>");
    };

    let config = ClientConfig::from_env()?;
    tracing::info!(
        api_url = %config.api_url,
        policy = config.batch_policy.as_str(),
        note_id = %note_id,
        "Starting ba-sync"
    );

    let raw = tokio::fs::read_to_string(&draft_path)
        .await
        .with_context(|| format!("failed to read {draft_path}"))?;
    let entries: Vec<DraftEntry<TaskFields>> =
        serde_json::from_str(&raw).with_context(|| format!("{draft_path} is not a draft task list"))?;
    let mut collection = DraftCollection::from_entries(entries);

    let session = Arc::new(Session::in_memory());
    let client = Arc::new(GraphQlClient::new(&config, session)?);
    let remote = TaskRemote::new(client, note_id);

    let notifier = Arc::new(Notifier::default());
    let reconciler = Reconciler::new(config.batch_policy).with_notifier(notifier);

    let report = reconciler.reconcile(&remote, &collection).await;
    for outcome in &report.outcomes {
        match &outcome.status {
            OpStatus::Applied(id) => {
                tracing::info!(op = %outcome.op, entry = %outcome.entry_id, server_id = %id, "Applied")
            }
            OpStatus::Rejected(messages) => {
                for m in messages {
                    tracing::warn!(
                        op = %outcome.op,
                        entry = %outcome.entry_id,
                        field = m.field.as_deref().unwrap_or("-"),
                        message = %m.message,
                        "Rejected"
                    );
                }
            }
            OpStatus::Failed(reason) => {
                tracing::error!(op = %outcome.op, entry = %outcome.entry_id, reason = %reason, "Failed")
            }
            OpStatus::Skipped => {
                tracing::warn!(op = %outcome.op, entry = %outcome.entry_id, "Skipped")
            }
        }
    }

    report.settle(&mut collection);
    println!("{}", serde_json::to_string_pretty(collection.entries())?);

    if !report.is_clean() {
        bail!(report.summary("task"));
    }
    Ok(())
}
