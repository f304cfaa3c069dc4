//! Live/historical merge. Stored totals only advance when a session closes,
//! so every read here overlays the elapsed-so-far portion of any still-open
//! session marker before reporting.

use crate::activity::Activity;
use crate::dayspan::split_pair_into_days;
use crate::db::{Database, SessionMarker};
use crate::timeutil::percentage;
use anyhow::Result;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Seam for the external membership collaborator. Users the roster cannot
/// resolve are treated as having left the guild and are filtered from
/// rankings.
pub trait GuildRoster {
    fn is_member(&self, guild_id: u64, user_id: u64) -> bool;
}

/// Roster that resolves everyone; used where no membership source exists,
/// e.g. offline inspection of a statistics database.
pub struct FullRoster;

impl GuildRoster for FullRoster {
    fn is_member(&self, _guild_id: u64, _user_id: u64) -> bool {
        true
    }
}

impl GuildRoster for HashSet<(u64, u64)> {
    fn is_member(&self, guild_id: u64, user_id: u64) -> bool {
        self.contains(&(guild_id, user_id))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityStats {
    pub activity: Activity,
    pub live_ms: i64,
    pub max_ms: i64,
    pub count: i64,
    pub pct_of_connected: f64,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserStatsReport {
    pub guild_id: u64,
    pub user_id: u64,
    pub activities: Vec<ActivityStats>,
    pub count_switch: i64,
    pub daily_streak: i64,
    pub max_daily_streak: i64,
    pub last_activity: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankEntry {
    pub user_id: u64,
    pub total_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HeatmapPoint {
    pub day: i64,
    pub value_ms: i64,
    pub connected_ms: i64,
}

fn live_delta(marker: Option<&SessionMarker>, activity: Activity, now_ms: i64) -> i64 {
    match marker.map(|row| row.start(activity)).unwrap_or(0) {
        0 => 0,
        start => (now_ms - start).max(0),
    }
}

/// Stored total plus the elapsed-so-far portion of an open session.
pub fn live_total(
    db: &Database,
    guild_id: u64,
    user_id: u64,
    activity: Activity,
    now_ms: i64,
) -> Result<i64> {
    let stored = db
        .user_aggregate(guild_id, user_id)?
        .map(|row| row.time(activity))
        .unwrap_or(0);
    let marker = db.session_marker(guild_id, user_id)?;

    Ok(stored + live_delta(marker.as_ref(), activity, now_ms))
}

/// Full per-user report. A user with no rows yet yields an all-zero report,
/// not an error.
pub fn user_stats(db: &Database, guild_id: u64, user_id: u64, now_ms: i64) -> Result<UserStatsReport> {
    let row = db.user_aggregate(guild_id, user_id)?.unwrap_or_default();
    let marker = db.session_marker(guild_id, user_id)?;

    let connected_live =
        row.time(Activity::Connected) + live_delta(marker.as_ref(), Activity::Connected, now_ms);

    let activities = Activity::ALL
        .iter()
        .map(|&activity| {
            let live_ms = row.time(activity) + live_delta(marker.as_ref(), activity, now_ms);
            ActivityStats {
                activity,
                live_ms,
                max_ms: row.max(activity),
                count: row.count(activity),
                pct_of_connected: percentage(live_ms, connected_live),
            }
        })
        .collect::<Vec<_>>();

    Ok(UserStatsReport {
        guild_id,
        user_id,
        activities,
        count_switch: row.count_switch,
        daily_streak: row.daily_streak,
        max_daily_streak: row.max_daily_streak,
        last_activity: row.last_activity,
    })
}

/// Guild-wide ranking by live total, descending. Users the roster cannot
/// resolve are dropped silently; ties break on ascending user id.
pub fn rank(
    db: &Database,
    roster: &dyn GuildRoster,
    guild_id: u64,
    activity: Activity,
    now_ms: i64,
    limit: usize,
) -> Result<Vec<RankEntry>> {
    let markers = db
        .session_markers_for_guild(guild_id)?
        .into_iter()
        .map(|marker| (marker.user_id, marker))
        .collect::<HashMap<_, _>>();

    let mut entries = db
        .user_aggregates_for_guild(guild_id)?
        .into_iter()
        .filter(|row| roster.is_member(guild_id, row.user_id))
        .map(|row| {
            let delta = live_delta(markers.get(&row.user_id), activity, now_ms);
            RankEntry {
                user_id: row.user_id,
                total_ms: row.time(activity) + delta,
            }
        })
        .collect::<Vec<_>>();

    entries.sort_by(|left, right| {
        right
            .total_ms
            .cmp(&left.total_ms)
            .then_with(|| left.user_id.cmp(&right.user_id))
    });
    entries.truncate(limit);

    Ok(entries)
}

/// Day-bucketed series for one user, or the whole guild when `user_id` is
/// `None`. Historical buckets and live day-split deltas merge additively on
/// the day key; the connected companion rides along for percentage
/// normalization by the presentation layer.
pub fn heatmap_series(
    db: &Database,
    guild_id: u64,
    user_id: Option<u64>,
    activity: Activity,
    now_ms: i64,
) -> Result<Vec<HeatmapPoint>> {
    let daily = match user_id {
        Some(user) => db.daily_rows_for_user(guild_id, user)?,
        None => db.daily_rows_for_guild(guild_id)?,
    };

    let mut days: BTreeMap<i64, (i64, i64)> = BTreeMap::new();
    for row in daily {
        let bucket = days.entry(row.day).or_default();
        bucket.0 += row.time(activity);
        bucket.1 += row.time(Activity::Connected);
    }

    let markers = match user_id {
        Some(user) => db.session_marker(guild_id, user)?.into_iter().collect(),
        None => db.session_markers_for_guild(guild_id)?,
    };

    for marker in markers {
        let elapsed_activity = live_delta(Some(&marker), activity, now_ms);
        let elapsed_connected = live_delta(Some(&marker), Activity::Connected, now_ms);
        if elapsed_activity == 0 && elapsed_connected == 0 {
            continue;
        }

        for slice in split_pair_into_days(elapsed_activity, elapsed_connected, now_ms) {
            let bucket = days.entry(slice.day).or_default();
            bucket.0 += slice.primary;
            bucket.1 += slice.baseline;
        }
    }

    Ok(days
        .into_iter()
        .map(|(day, (value_ms, connected_ms))| HeatmapPoint {
            day,
            value_ms,
            connected_ms,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::{FullRoster, heatmap_series, live_total, rank, user_stats};
    use crate::activity::Activity;
    use crate::db::Database;
    use crate::timeutil::{HOUR_MS, MINUTE_MS};
    use crate::tracker::{Tracker, VoiceEvent, VoiceSnapshot};
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    const GUILD: u64 = 3;
    const CHANNEL: u64 = 500;

    fn at(day: u32, hour: u32) -> i64 {
        Utc.with_ymd_and_hms(2024, 8, day, hour, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn join(db: &mut Database, user: u64, at_ms: i64) {
        let new = VoiceSnapshot {
            channel_id: Some(CHANNEL),
            ..VoiceSnapshot::default()
        };
        Tracker::new(db)
            .process(&VoiceEvent {
                guild_id: GUILD,
                user_id: user,
                old: Some(VoiceSnapshot::default()),
                new,
                at_ms,
            })
            .unwrap();
    }

    fn leave(db: &mut Database, user: u64, at_ms: i64) {
        let old = VoiceSnapshot {
            channel_id: Some(CHANNEL),
            ..VoiceSnapshot::default()
        };
        Tracker::new(db)
            .process(&VoiceEvent {
                guild_id: GUILD,
                user_id: user,
                old: Some(old),
                new: VoiceSnapshot::default(),
                at_ms,
            })
            .unwrap();
    }

    #[test]
    fn live_total_tracks_open_sessions_and_settles_on_commit() {
        let mut db = Database::open_in_memory().unwrap();
        let t0 = at(1, 10);
        let t1 = t0 + 45 * MINUTE_MS;

        join(&mut db, 1, t0);
        assert_eq!(
            live_total(&db, GUILD, 1, Activity::Connected, t1).unwrap(),
            45 * MINUTE_MS
        );

        leave(&mut db, 1, t1);
        let stored = db.user_aggregate(GUILD, 1).unwrap().unwrap().time_connected;
        assert_eq!(stored, 45 * MINUTE_MS);
        // No further growth once the session is closed.
        assert_eq!(
            live_total(&db, GUILD, 1, Activity::Connected, t1).unwrap(),
            45 * MINUTE_MS
        );
        assert_eq!(
            live_total(&db, GUILD, 1, Activity::Connected, t1 + HOUR_MS).unwrap(),
            45 * MINUTE_MS
        );
    }

    #[test]
    fn stats_for_an_unknown_user_are_all_zero() {
        let db = Database::open_in_memory().unwrap();
        let report = user_stats(&db, GUILD, 12345, at(1, 10)).unwrap();

        assert!(report.activities.iter().all(|entry| entry.live_ms == 0));
        assert_eq!(report.daily_streak, 0);
        assert_eq!(report.count_switch, 0);
    }

    #[test]
    fn ranking_overlays_live_deltas_and_sorts_descending() {
        let mut db = Database::open_in_memory().unwrap();
        let t0 = at(1, 10);

        join(&mut db, 1, t0);
        leave(&mut db, 1, t0 + HOUR_MS);

        // User 2 has less committed time but a long open session.
        join(&mut db, 2, t0);
        leave(&mut db, 2, t0 + 10 * MINUTE_MS);
        join(&mut db, 2, t0 + 10 * MINUTE_MS);

        let now = t0 + 3 * HOUR_MS;
        let entries = rank(&db, &FullRoster, GUILD, Activity::Connected, now, 10).unwrap();

        assert_eq!(entries[0].user_id, 2);
        assert_eq!(entries[0].total_ms, 3 * HOUR_MS);
        assert_eq!(entries[1].user_id, 1);
        assert_eq!(entries[1].total_ms, HOUR_MS);
    }

    #[test]
    fn ranking_excludes_users_missing_from_the_roster() {
        let mut db = Database::open_in_memory().unwrap();
        let t0 = at(1, 10);

        for user in [1, 2] {
            join(&mut db, user, t0);
            leave(&mut db, user, t0 + HOUR_MS);
        }

        let roster: HashSet<(u64, u64)> = HashSet::from([(GUILD, 2)]);
        let entries = rank(&db, &roster, GUILD, Activity::Connected, t0 + HOUR_MS, 10).unwrap();

        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].user_id, 2);
    }

    #[test]
    fn equal_totals_break_ties_on_ascending_user_id() {
        let mut db = Database::open_in_memory().unwrap();
        let t0 = at(1, 10);

        for user in [9, 4, 7] {
            join(&mut db, user, t0);
            leave(&mut db, user, t0 + HOUR_MS);
        }

        let entries = rank(&db, &FullRoster, GUILD, Activity::Connected, t0 + HOUR_MS, 10).unwrap();
        let order = entries.iter().map(|entry| entry.user_id).collect::<Vec<_>>();
        assert_eq!(order, vec![4, 7, 9]);
    }

    #[test]
    fn ranking_respects_the_limit() {
        let mut db = Database::open_in_memory().unwrap();
        let t0 = at(1, 10);

        for user in 1..=5 {
            join(&mut db, user, t0);
            leave(&mut db, user, t0 + user as i64 * MINUTE_MS);
        }

        let entries = rank(&db, &FullRoster, GUILD, Activity::Connected, t0 + HOUR_MS, 2).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].user_id, 5);
    }

    #[test]
    fn heatmap_merges_history_with_a_live_session_spanning_midnight() {
        let mut db = Database::open_in_memory().unwrap();

        // Committed history on day 1.
        join(&mut db, 1, at(1, 10));
        leave(&mut db, 1, at(1, 12));

        // Open session from day 2, 23:00 queried at day 3, 01:00.
        join(&mut db, 1, at(2, 23));
        let now = at(3, 1);

        let series = heatmap_series(&db, GUILD, Some(1), Activity::Connected, now).unwrap();

        assert_eq!(series.len(), 3);
        assert_eq!(series[0].day, at(1, 0));
        assert_eq!(series[0].value_ms, 2 * HOUR_MS);
        assert_eq!(series[1].day, at(2, 0));
        assert_eq!(series[1].value_ms, HOUR_MS);
        assert_eq!(series[2].day, at(3, 0));
        assert_eq!(series[2].value_ms, HOUR_MS);
        // Connected baseline mirrors the value for the connected activity.
        assert!(series.iter().all(|point| point.connected_ms == point.value_ms));
    }

    #[test]
    fn guild_heatmap_sums_across_users() {
        let mut db = Database::open_in_memory().unwrap();

        for user in [1, 2] {
            join(&mut db, user, at(1, 10));
            leave(&mut db, user, at(1, 11));
        }

        let series = heatmap_series(&db, GUILD, None, Activity::Connected, at(1, 12)).unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].value_ms, 2 * HOUR_MS);
    }
}
