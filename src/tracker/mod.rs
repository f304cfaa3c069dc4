//! Voice session state machine. Each activity runs a two-state machine,
//! Inactive(0) or Active(start timestamp), persisted in the session-marker
//! row. One voice-state event is applied in a single transaction: markers
//! open or close, closed sessions commit into the aggregate stores, and the
//! outcome reports what happened so the ingestion worker can log it.

use crate::activity::Activity;
use crate::db::{self, Database};
use anyhow::{Context, Result};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Normalized voice state for one user at one instant, as delivered by the
/// platform gateway collaborator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoiceSnapshot {
    pub channel_id: Option<u64>,
    pub self_mute: bool,
    pub self_deaf: bool,
    pub streaming: bool,
    pub camera: bool,
}

/// One voice-state transition. `old` is absent when the platform has no
/// prior state for the user (first sighting behaves like a join).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoiceEvent {
    pub guild_id: u64,
    pub user_id: u64,
    pub old: Option<VoiceSnapshot>,
    pub new: VoiceSnapshot,
    pub at_ms: i64,
}

/// What one event did. `untracked` lists stop requests that found no open
/// session; the caller reports those periods as not tracked instead of
/// failing.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EventOutcome {
    pub started: Vec<Activity>,
    pub committed: Vec<(Activity, i64)>,
    pub untracked: Vec<Activity>,
    pub switched: bool,
}

impl EventOutcome {
    pub fn is_noop(&self) -> bool {
        self.started.is_empty()
            && self.committed.is_empty()
            && self.untracked.is_empty()
            && !self.switched
    }
}

pub struct Tracker<'a> {
    db: &'a mut Database,
}

impl<'a> Tracker<'a> {
    pub fn new(db: &'a mut Database) -> Self {
        Self { db }
    }

    /// Applies one transition atomically. On storage failure the transaction
    /// rolls back and the event's duration is lost; partial commits never
    /// become visible.
    pub fn process(&mut self, event: &VoiceEvent) -> Result<EventOutcome> {
        let transaction = self.db.transaction()?;

        let mut session = EventSession {
            conn: &transaction,
            guild_id: event.guild_id,
            user_id: event.user_id,
            now: event.at_ms,
            outcome: EventOutcome::default(),
        };
        session.apply(event)?;
        let outcome = session.outcome;

        transaction
            .commit()
            .context("Failed to commit voice event")?;

        Ok(outcome)
    }
}

struct EventSession<'t> {
    conn: &'t Connection,
    guild_id: u64,
    user_id: u64,
    now: i64,
    outcome: EventOutcome,
}

impl EventSession<'_> {
    fn apply(&mut self, event: &VoiceEvent) -> Result<()> {
        let old = event.old.unwrap_or_default();
        let new = event.new;

        match (old.channel_id, new.channel_id) {
            (None, Some(_)) => self.handle_join(&new),
            (Some(_), None) => self.handle_leave(),
            (Some(from), Some(to)) if from != to => self.handle_switch(),
            (Some(_), Some(_)) => self.handle_flags(&old, &new),
            (None, None) => Ok(()),
        }
    }

    fn handle_join(&mut self, new: &VoiceSnapshot) -> Result<()> {
        self.start(Activity::Connected)?;

        // A join can open sub-sessions when the user arrives already
        // muted/deafened; deafened wins when both flags are set.
        if new.self_deaf {
            self.start(Activity::Deafened)?;
        } else if new.self_mute {
            self.start(Activity::Muted)?;
        }
        if new.streaming {
            self.start(Activity::ScreenSharing)?;
        }
        if new.camera {
            self.start(Activity::Camera)?;
        }

        Ok(())
    }

    fn handle_leave(&mut self) -> Result<()> {
        self.stop(Activity::Connected)?;

        for activity in [
            Activity::Deafened,
            Activity::Muted,
            Activity::ScreenSharing,
            Activity::Camera,
        ] {
            self.stop_if_open(activity)?;
        }

        Ok(())
    }

    fn handle_switch(&mut self) -> Result<()> {
        db::add_switch(self.conn, self.guild_id, self.user_id)?;
        self.outcome.switched = true;
        Ok(())
    }

    fn handle_flags(&mut self, old: &VoiceSnapshot, new: &VoiceSnapshot) -> Result<()> {
        // Deafen first: it absorbs a running mute session and hands it back
        // on undeafen, so the same wall clock never counts twice.
        match (old.self_deaf, new.self_deaf) {
            (false, true) => {
                self.stop_if_open(Activity::Muted)?;
                self.start(Activity::Deafened)?;
            }
            (true, false) => {
                self.stop(Activity::Deafened)?;
                if new.self_mute {
                    self.start(Activity::Muted)?;
                }
            }
            _ => {}
        }

        match (old.self_mute, new.self_mute) {
            (false, true) => {
                if self.is_open(Activity::Deafened)? {
                    debug!(
                        guild_id = self.guild_id,
                        user_id = self.user_id,
                        "mute absorbed by open deafened session"
                    );
                } else {
                    self.start(Activity::Muted)?;
                }
            }
            (true, false) => {
                if !self.is_open(Activity::Deafened)? {
                    self.stop_if_started(Activity::Muted)?;
                }
            }
            _ => {}
        }

        match (old.streaming, new.streaming) {
            (false, true) => self.start(Activity::ScreenSharing)?,
            (true, false) => self.stop(Activity::ScreenSharing)?,
            _ => {}
        }

        match (old.camera, new.camera) {
            (false, true) => self.start(Activity::Camera)?,
            (true, false) => self.stop(Activity::Camera)?,
            _ => {}
        }

        Ok(())
    }

    fn marker_start(&self, activity: Activity) -> Result<i64> {
        let marker = db::session_marker_on(self.conn, self.guild_id, self.user_id)?;
        Ok(marker.map(|row| row.start(activity)).unwrap_or(0))
    }

    fn is_open(&self, activity: Activity) -> Result<bool> {
        Ok(self.marker_start(activity)? != 0)
    }

    /// Opens a session unless one is already open (first start wins). Starts
    /// of anything but `connected` are skipped while no connected session is
    /// open, keeping the marker invariant intact.
    fn start(&mut self, activity: Activity) -> Result<()> {
        if activity != Activity::Connected && !self.is_open(Activity::Connected)? {
            debug!(
                guild_id = self.guild_id,
                user_id = self.user_id,
                activity = %activity,
                "ignoring start without an open connected session"
            );
            return Ok(());
        }

        if self.is_open(activity)? {
            debug!(
                guild_id = self.guild_id,
                user_id = self.user_id,
                activity = %activity,
                "session already open"
            );
            return Ok(());
        }

        db::open_session(self.conn, self.guild_id, self.user_id, activity, self.now)?;
        self.outcome.started.push(activity);

        Ok(())
    }

    /// Closes a session and commits its elapsed duration. A stop with no
    /// open marker signals "duration was never tracked" and commits nothing.
    fn stop(&mut self, activity: Activity) -> Result<()> {
        let start = self.marker_start(activity)?;
        if start == 0 {
            self.outcome.untracked.push(activity);
            return Ok(());
        }

        let elapsed = (self.now - start).max(0);
        db::commit_session(
            self.conn,
            self.guild_id,
            self.user_id,
            activity,
            elapsed,
            self.now,
        )?;
        db::close_session(self.conn, self.guild_id, self.user_id, activity)?;
        self.outcome.committed.push((activity, elapsed));

        Ok(())
    }

    fn stop_if_open(&mut self, activity: Activity) -> Result<()> {
        if self.is_open(activity)? {
            self.stop(activity)?;
        }
        Ok(())
    }

    /// Like `stop`, but a missing marker is a quiet no-op rather than an
    /// untracked signal. Used where an absent session is the expected case,
    /// e.g. an unmute while the mute was absorbed by deafen.
    fn stop_if_started(&mut self, activity: Activity) -> Result<()> {
        if self.is_open(activity)? {
            self.stop(activity)?;
        } else {
            debug!(
                guild_id = self.guild_id,
                user_id = self.user_id,
                activity = %activity,
                "stop without open session"
            );
        }
        Ok(())
    }
}
