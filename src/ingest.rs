//! Event ingestion. A single worker task owns the database connection and
//! applies events strictly in arrival order, so the read-modify-write on a
//! user's session marker can never interleave with another event for the
//! same user.

use crate::db::Database;
use crate::tracker::{Tracker, VoiceEvent};
use anyhow::{Result, anyhow};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

pub const EVENT_QUEUE_DEPTH: usize = 256;

/// Handle given to the gateway collaborator for submitting transitions.
#[derive(Clone)]
pub struct EventIngestor {
    sender: mpsc::Sender<VoiceEvent>,
}

impl EventIngestor {
    pub async fn submit(&self, event: VoiceEvent) -> Result<()> {
        self.sender
            .send(event)
            .await
            .map_err(|_| anyhow!("event worker has shut down"))
    }
}

pub fn event_channel() -> (EventIngestor, mpsc::Receiver<VoiceEvent>) {
    let (sender, receiver) = mpsc::channel(EVENT_QUEUE_DEPTH);
    (EventIngestor { sender }, receiver)
}

/// Drains the channel until every sender is dropped, then hands the database
/// back. A failed event rolls back, is logged with its guild/user context
/// and is not retried; replaying it would need the original transition,
/// which later events for the same user may have invalidated.
pub async fn run_event_worker(
    mut db: Database,
    mut receiver: mpsc::Receiver<VoiceEvent>,
) -> Result<Database> {
    info!("voice event worker started");

    while let Some(event) = receiver.recv().await {
        match Tracker::new(&mut db).process(&event) {
            Ok(outcome) => {
                if !outcome.is_noop() {
                    debug!(
                        guild_id = event.guild_id,
                        user_id = event.user_id,
                        started = outcome.started.len(),
                        committed = outcome.committed.len(),
                        untracked = outcome.untracked.len(),
                        switched = outcome.switched,
                        "voice event applied"
                    );
                }
            }
            Err(error) => {
                error!(
                    error = %error,
                    guild_id = event.guild_id,
                    user_id = event.user_id,
                    "failed to apply voice event; its duration is dropped"
                );
            }
        }
    }

    info!("voice event worker stopped");
    Ok(db)
}
