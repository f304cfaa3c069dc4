pub mod queries;

use crate::activity::Activity;
use crate::dayspan::split_into_days;
use crate::timeutil::{DAY_MS, utc_day_start};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, params};
use std::fs;
use std::path::Path;

/// Open-session start timestamps for one guild member. A column value of 0
/// means no session is open for that activity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionMarker {
    pub guild_id: u64,
    pub user_id: u64,
    pub start_connected: i64,
    pub start_muted: i64,
    pub start_deafened: i64,
    pub start_screen_sharing: i64,
    pub start_camera: i64,
}

impl SessionMarker {
    pub fn start(&self, activity: Activity) -> i64 {
        match activity {
            Activity::Connected => self.start_connected,
            Activity::Muted => self.start_muted,
            Activity::Deafened => self.start_deafened,
            Activity::ScreenSharing => self.start_screen_sharing,
            Activity::Camera => self.start_camera,
        }
    }

    pub fn is_open(&self, activity: Activity) -> bool {
        self.start(activity) != 0
    }

    pub fn any_open(&self) -> bool {
        Activity::ALL.iter().any(|activity| self.is_open(*activity))
    }
}

/// All-time totals, maxima and counters for one guild member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserAggregateRow {
    pub guild_id: u64,
    pub user_id: u64,
    pub time_connected: i64,
    pub time_muted: i64,
    pub time_deafened: i64,
    pub time_screen_sharing: i64,
    pub time_camera: i64,
    pub max_connected: i64,
    pub max_muted: i64,
    pub max_deafened: i64,
    pub max_screen_sharing: i64,
    pub max_camera: i64,
    pub max_daily_streak: i64,
    pub count_connected: i64,
    pub count_muted: i64,
    pub count_deafened: i64,
    pub count_screen_sharing: i64,
    pub count_camera: i64,
    pub count_switch: i64,
    pub daily_streak: i64,
    pub last_activity: i64,
}

impl UserAggregateRow {
    pub fn time(&self, activity: Activity) -> i64 {
        match activity {
            Activity::Connected => self.time_connected,
            Activity::Muted => self.time_muted,
            Activity::Deafened => self.time_deafened,
            Activity::ScreenSharing => self.time_screen_sharing,
            Activity::Camera => self.time_camera,
        }
    }

    pub fn max(&self, activity: Activity) -> i64 {
        match activity {
            Activity::Connected => self.max_connected,
            Activity::Muted => self.max_muted,
            Activity::Deafened => self.max_deafened,
            Activity::ScreenSharing => self.max_screen_sharing,
            Activity::Camera => self.max_camera,
        }
    }

    pub fn count(&self, activity: Activity) -> i64 {
        match activity {
            Activity::Connected => self.count_connected,
            Activity::Muted => self.count_muted,
            Activity::Deafened => self.count_deafened,
            Activity::ScreenSharing => self.count_screen_sharing,
            Activity::Camera => self.count_camera,
        }
    }
}

/// One calendar day of totals for one guild member. `day` is the UTC-midnight
/// timestamp of the bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DailyAggregateRow {
    pub guild_id: u64,
    pub user_id: u64,
    pub day: i64,
    pub time_connected: i64,
    pub time_muted: i64,
    pub time_deafened: i64,
    pub time_screen_sharing: i64,
    pub time_camera: i64,
}

impl DailyAggregateRow {
    pub fn time(&self, activity: Activity) -> i64 {
        match activity {
            Activity::Connected => self.time_connected,
            Activity::Muted => self.time_muted,
            Activity::Deafened => self.time_deafened,
            Activity::ScreenSharing => self.time_screen_sharing,
            Activity::Camera => self.time_camera,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StoreSummary {
    pub tracked_users: i64,
    pub open_markers: i64,
    pub daily_rows: i64,
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open SQLite DB: {}", path.display()))?;

        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Failed to open in-memory SQLite DB")?;
        let database = Self { conn };
        database.init_schema()?;

        Ok(database)
    }

    pub fn init_schema(&self) -> Result<()> {
        queries::schema_statements()
            .iter()
            .try_for_each(|statement| {
                self.conn
                    .execute(statement, [])
                    .context("Failed to initialize schema")
                    .map(|_| ())
            })
    }

    pub(crate) fn transaction(&mut self) -> Result<Transaction<'_>> {
        self.conn
            .transaction()
            .context("Failed to start transaction")
    }

    pub fn session_marker(&self, guild_id: u64, user_id: u64) -> Result<Option<SessionMarker>> {
        session_marker_on(&self.conn, guild_id, user_id)
    }

    pub fn session_markers_for_guild(&self, guild_id: u64) -> Result<Vec<SessionMarker>> {
        let mut statement = self.conn.prepare(
            "SELECT guild_id, user_id, start_connected, start_muted, start_deafened,
                    start_screen_sharing, start_camera
             FROM session_markers
             WHERE guild_id = ?1
             ORDER BY user_id ASC",
        )?;

        let rows = statement
            .query_map(params![guild_id as i64], map_marker)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query session markers")?;

        Ok(rows)
    }

    /// Startup recovery: forget every open session. Duration accrued while
    /// the process was down is intentionally not credited.
    pub fn clear_session_markers(&self) -> Result<usize> {
        self.conn
            .execute("DELETE FROM session_markers", [])
            .context("Failed to clear session markers")
    }

    pub fn user_aggregate(&self, guild_id: u64, user_id: u64) -> Result<Option<UserAggregateRow>> {
        user_aggregate_on(&self.conn, guild_id, user_id)
    }

    pub fn user_aggregates_for_guild(&self, guild_id: u64) -> Result<Vec<UserAggregateRow>> {
        let mut statement = self.conn.prepare(&format!(
            "SELECT {AGGREGATE_COLUMNS} FROM user_aggregates WHERE guild_id = ?1 ORDER BY user_id ASC"
        ))?;

        let rows = statement
            .query_map(params![guild_id as i64], map_aggregate)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query user aggregates")?;

        Ok(rows)
    }

    pub fn daily_rows_for_user(&self, guild_id: u64, user_id: u64) -> Result<Vec<DailyAggregateRow>> {
        let mut statement = self.conn.prepare(&format!(
            "SELECT {DAILY_COLUMNS} FROM daily_aggregates
             WHERE guild_id = ?1 AND user_id = ?2
             ORDER BY day ASC"
        ))?;

        let rows = statement
            .query_map(params![guild_id as i64, user_id as i64], map_daily)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query daily aggregates")?;

        Ok(rows)
    }

    pub fn daily_rows_for_guild(&self, guild_id: u64) -> Result<Vec<DailyAggregateRow>> {
        let mut statement = self.conn.prepare(&format!(
            "SELECT {DAILY_COLUMNS} FROM daily_aggregates
             WHERE guild_id = ?1
             ORDER BY day ASC, user_id ASC"
        ))?;

        let rows = statement
            .query_map(params![guild_id as i64], map_daily)?
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to query daily aggregates")?;

        Ok(rows)
    }

    /// Deletes every trace of a member who left the guild.
    pub fn remove_user(&mut self, guild_id: u64, user_id: u64) -> Result<()> {
        let transaction = self.transaction()?;

        for table in ["session_markers", "user_aggregates", "daily_aggregates"] {
            transaction
                .execute(
                    &format!("DELETE FROM {table} WHERE guild_id = ?1 AND user_id = ?2"),
                    params![guild_id as i64, user_id as i64],
                )
                .with_context(|| format!("Failed to delete user rows from {table}"))?;
        }

        transaction.commit().context("Failed to commit user removal")
    }

    pub fn summary(&self) -> Result<StoreSummary> {
        let tracked_users = self
            .conn
            .query_row("SELECT COUNT(*) FROM user_aggregates", [], |row| row.get(0))
            .context("Failed to count user aggregates")?;
        let open_markers = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM session_markers WHERE start_connected != 0",
                [],
                |row| row.get(0),
            )
            .context("Failed to count open markers")?;
        let daily_rows = self
            .conn
            .query_row("SELECT COUNT(*) FROM daily_aggregates", [], |row| row.get(0))
            .context("Failed to count daily aggregates")?;

        Ok(StoreSummary {
            tracked_users,
            open_markers,
            daily_rows,
        })
    }
}

const AGGREGATE_COLUMNS: &str = "guild_id, user_id, time_connected, time_muted, time_deafened, \
     time_screen_sharing, time_camera, max_connected, max_muted, max_deafened, \
     max_screen_sharing, max_camera, max_daily_streak, count_connected, count_muted, \
     count_deafened, count_screen_sharing, count_camera, count_switch, daily_streak, \
     last_activity";

const DAILY_COLUMNS: &str = "guild_id, user_id, day, time_connected, time_muted, time_deafened, \
     time_screen_sharing, time_camera";

fn map_marker(row: &Row<'_>) -> rusqlite::Result<SessionMarker> {
    Ok(SessionMarker {
        guild_id: row.get::<_, i64>(0)? as u64,
        user_id: row.get::<_, i64>(1)? as u64,
        start_connected: row.get(2)?,
        start_muted: row.get(3)?,
        start_deafened: row.get(4)?,
        start_screen_sharing: row.get(5)?,
        start_camera: row.get(6)?,
    })
}

fn map_aggregate(row: &Row<'_>) -> rusqlite::Result<UserAggregateRow> {
    Ok(UserAggregateRow {
        guild_id: row.get::<_, i64>(0)? as u64,
        user_id: row.get::<_, i64>(1)? as u64,
        time_connected: row.get(2)?,
        time_muted: row.get(3)?,
        time_deafened: row.get(4)?,
        time_screen_sharing: row.get(5)?,
        time_camera: row.get(6)?,
        max_connected: row.get(7)?,
        max_muted: row.get(8)?,
        max_deafened: row.get(9)?,
        max_screen_sharing: row.get(10)?,
        max_camera: row.get(11)?,
        max_daily_streak: row.get(12)?,
        count_connected: row.get(13)?,
        count_muted: row.get(14)?,
        count_deafened: row.get(15)?,
        count_screen_sharing: row.get(16)?,
        count_camera: row.get(17)?,
        count_switch: row.get(18)?,
        daily_streak: row.get(19)?,
        last_activity: row.get(20)?,
    })
}

fn map_daily(row: &Row<'_>) -> rusqlite::Result<DailyAggregateRow> {
    Ok(DailyAggregateRow {
        guild_id: row.get::<_, i64>(0)? as u64,
        user_id: row.get::<_, i64>(1)? as u64,
        day: row.get(2)?,
        time_connected: row.get(3)?,
        time_muted: row.get(4)?,
        time_deafened: row.get(5)?,
        time_screen_sharing: row.get(6)?,
        time_camera: row.get(7)?,
    })
}

pub(crate) fn session_marker_on(
    conn: &Connection,
    guild_id: u64,
    user_id: u64,
) -> Result<Option<SessionMarker>> {
    // A missing row means "no data yet"; any other failure must surface,
    // since this read decides whether a stop commits its duration.
    conn.query_row(
        "SELECT guild_id, user_id, start_connected, start_muted, start_deafened,
                start_screen_sharing, start_camera
         FROM session_markers
         WHERE guild_id = ?1 AND user_id = ?2",
        params![guild_id as i64, user_id as i64],
        map_marker,
    )
    .optional()
    .context("Failed to query session marker")
}

pub(crate) fn user_aggregate_on(
    conn: &Connection,
    guild_id: u64,
    user_id: u64,
) -> Result<Option<UserAggregateRow>> {
    conn.query_row(
        &format!("SELECT {AGGREGATE_COLUMNS} FROM user_aggregates WHERE guild_id = ?1 AND user_id = ?2"),
        params![guild_id as i64, user_id as i64],
        map_aggregate,
    )
    .optional()
    .context("Failed to query user aggregate")
}

/// Records the start of an in-progress session by upserting the marker row.
pub(crate) fn open_session(
    conn: &Connection,
    guild_id: u64,
    user_id: u64,
    activity: Activity,
    start_ms: i64,
) -> Result<()> {
    let column = activity.start_column();
    conn.execute(
        &format!(
            "INSERT INTO session_markers (guild_id, user_id, {column}) VALUES (?1, ?2, ?3)
             ON CONFLICT(guild_id, user_id) DO UPDATE SET {column} = excluded.{column}"
        ),
        params![guild_id as i64, user_id as i64, start_ms],
    )
    .with_context(|| format!("Failed to open {activity} session"))?;

    Ok(())
}

pub(crate) fn close_session(
    conn: &Connection,
    guild_id: u64,
    user_id: u64,
    activity: Activity,
) -> Result<()> {
    let column = activity.start_column();
    conn.execute(
        &format!("UPDATE session_markers SET {column} = 0 WHERE guild_id = ?1 AND user_id = ?2"),
        params![guild_id as i64, user_id as i64],
    )
    .with_context(|| format!("Failed to close {activity} session"))?;

    Ok(())
}

/// Folds one completed session into the all-time and per-day stores. The
/// caller provides the surrounding transaction; every effect here is
/// attributed to the same event.
pub(crate) fn commit_session(
    conn: &Connection,
    guild_id: u64,
    user_id: u64,
    activity: Activity,
    elapsed_ms: i64,
    now_ms: i64,
) -> Result<()> {
    let elapsed_ms = elapsed_ms.max(0);
    let previous = user_aggregate_on(conn, guild_id, user_id)?;
    let (streak, max_streak) = next_streak(previous.as_ref(), now_ms);

    let time_column = activity.time_column();
    let max_column = activity.max_column();
    let count_column = activity.count_column();

    conn.execute(
        &format!(
            "INSERT INTO user_aggregates
                 (guild_id, user_id, {time_column}, {max_column}, {count_column},
                  last_activity, daily_streak, max_daily_streak)
             VALUES (?1, ?2, ?3, ?3, 1, ?4, ?5, ?6)
             ON CONFLICT(guild_id, user_id) DO UPDATE SET
                 {time_column} = {time_column} + excluded.{time_column},
                 {max_column} = MAX({max_column}, excluded.{max_column}),
                 {count_column} = {count_column} + 1,
                 last_activity = MAX(last_activity, excluded.last_activity),
                 daily_streak = ?5,
                 max_daily_streak = MAX(max_daily_streak, ?6)"
        ),
        params![
            guild_id as i64,
            user_id as i64,
            elapsed_ms,
            now_ms,
            streak,
            max_streak
        ],
    )
    .with_context(|| format!("Failed to commit {activity} aggregate"))?;

    for slice in split_into_days(elapsed_ms, now_ms) {
        conn.execute(
            &format!(
                "INSERT INTO daily_aggregates (guild_id, user_id, day, {time_column})
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(guild_id, user_id, day) DO UPDATE SET
                     {time_column} = {time_column} + excluded.{time_column}"
            ),
            params![guild_id as i64, user_id as i64, slice.day, slice.duration],
        )
        .with_context(|| format!("Failed to commit {activity} daily bucket"))?;
    }

    Ok(())
}

/// Channel-to-channel moves touch neither timers nor the streak; they are
/// counted as informational events only.
pub(crate) fn add_switch(conn: &Connection, guild_id: u64, user_id: u64) -> Result<()> {
    conn.execute(
        "INSERT INTO user_aggregates (guild_id, user_id, count_switch) VALUES (?1, ?2, 1)
         ON CONFLICT(guild_id, user_id) DO UPDATE SET count_switch = count_switch + 1",
        params![guild_id as i64, user_id as i64],
    )
    .context("Failed to count channel switch")?;

    Ok(())
}

/// Consecutive-UTC-day streak update. Out-of-order events never decrement
/// the streak; same-day repeats leave it unchanged.
fn next_streak(previous: Option<&UserAggregateRow>, now_ms: i64) -> (i64, i64) {
    match previous {
        None => (1, 1),
        Some(row) if row.last_activity == 0 => (1, row.max_daily_streak.max(1)),
        Some(row) => {
            let previous_day = utc_day_start(row.last_activity);
            let today = utc_day_start(now_ms);

            let streak = if today == previous_day {
                row.daily_streak
            } else if today == previous_day + DAY_MS {
                row.daily_streak + 1
            } else if today > previous_day {
                1
            } else {
                row.daily_streak
            };

            (streak, row.max_daily_streak.max(streak))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Database, add_switch, close_session, commit_session, next_streak, open_session};
    use crate::activity::Activity;
    use crate::timeutil::HOUR_MS;
    use chrono::{TimeZone, Utc};

    const GUILD: u64 = 11;
    const USER: u64 = 42;

    fn at(day: u32, hour: u32) -> i64 {
        Utc.with_ymd_and_hms(2024, 5, day, hour, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    #[test]
    fn open_and_close_round_trip_the_marker() {
        let db = Database::open_in_memory().unwrap();

        open_session(&db.conn, GUILD, USER, Activity::Connected, at(1, 9)).unwrap();
        open_session(&db.conn, GUILD, USER, Activity::Muted, at(1, 10)).unwrap();

        let marker = db.session_marker(GUILD, USER).unwrap().unwrap();
        assert_eq!(marker.start(Activity::Connected), at(1, 9));
        assert_eq!(marker.start(Activity::Muted), at(1, 10));
        assert!(!marker.is_open(Activity::Camera));

        close_session(&db.conn, GUILD, USER, Activity::Muted).unwrap();
        let marker = db.session_marker(GUILD, USER).unwrap().unwrap();
        assert!(!marker.is_open(Activity::Muted));
        assert!(marker.is_open(Activity::Connected));
    }

    #[test]
    fn commit_updates_totals_maxima_counts_and_daily_buckets() {
        let db = Database::open_in_memory().unwrap();

        commit_session(&db.conn, GUILD, USER, Activity::Connected, 2 * HOUR_MS, at(1, 12)).unwrap();
        commit_session(&db.conn, GUILD, USER, Activity::Connected, HOUR_MS, at(1, 20)).unwrap();

        let row = db.user_aggregate(GUILD, USER).unwrap().unwrap();
        assert_eq!(row.time_connected, 3 * HOUR_MS);
        assert_eq!(row.max_connected, 2 * HOUR_MS);
        assert_eq!(row.count_connected, 2);
        assert_eq!(row.last_activity, at(1, 20));

        let daily = db.daily_rows_for_user(GUILD, USER).unwrap();
        assert_eq!(daily.len(), 1);
        assert_eq!(daily[0].day, at(1, 0));
        assert_eq!(daily[0].time_connected, 3 * HOUR_MS);
    }

    #[test]
    fn commit_spanning_midnight_lands_in_both_day_buckets() {
        let db = Database::open_in_memory().unwrap();

        // 23:00 day 1 through 01:00 day 2.
        commit_session(&db.conn, GUILD, USER, Activity::Connected, 2 * HOUR_MS, at(2, 1)).unwrap();

        let daily = db.daily_rows_for_user(GUILD, USER).unwrap();
        assert_eq!(daily.len(), 2);
        assert_eq!(daily[0].day, at(1, 0));
        assert_eq!(daily[0].time_connected, HOUR_MS);
        assert_eq!(daily[1].day, at(2, 0));
        assert_eq!(daily[1].time_connected, HOUR_MS);

        let row = db.user_aggregate(GUILD, USER).unwrap().unwrap();
        let daily_sum: i64 = daily.iter().map(|bucket| bucket.time_connected).sum();
        assert_eq!(daily_sum, row.time_connected);
    }

    #[test]
    fn switch_counter_works_without_a_prior_aggregate_row() {
        let db = Database::open_in_memory().unwrap();

        add_switch(&db.conn, GUILD, USER).unwrap();
        add_switch(&db.conn, GUILD, USER).unwrap();

        let row = db.user_aggregate(GUILD, USER).unwrap().unwrap();
        assert_eq!(row.count_switch, 2);
        assert_eq!(row.time_connected, 0);
        assert_eq!(row.daily_streak, 0);
    }

    #[test]
    fn streak_advances_on_consecutive_days_and_resets_on_gaps() {
        let db = Database::open_in_memory().unwrap();

        commit_session(&db.conn, GUILD, USER, Activity::Connected, HOUR_MS, at(1, 18)).unwrap();
        assert_eq!(db.user_aggregate(GUILD, USER).unwrap().unwrap().daily_streak, 1);

        commit_session(&db.conn, GUILD, USER, Activity::Connected, HOUR_MS, at(2, 18)).unwrap();
        let row = db.user_aggregate(GUILD, USER).unwrap().unwrap();
        assert_eq!(row.daily_streak, 2);
        assert_eq!(row.max_daily_streak, 2);

        // Day 3 skipped.
        commit_session(&db.conn, GUILD, USER, Activity::Connected, HOUR_MS, at(4, 18)).unwrap();
        let row = db.user_aggregate(GUILD, USER).unwrap().unwrap();
        assert_eq!(row.daily_streak, 1);
        assert_eq!(row.max_daily_streak, 2);
    }

    #[test]
    fn out_of_order_commit_never_decrements_the_streak() {
        let db = Database::open_in_memory().unwrap();

        commit_session(&db.conn, GUILD, USER, Activity::Connected, HOUR_MS, at(1, 18)).unwrap();
        commit_session(&db.conn, GUILD, USER, Activity::Connected, HOUR_MS, at(2, 18)).unwrap();
        // Backfill from day 1 arrives late.
        commit_session(&db.conn, GUILD, USER, Activity::Connected, HOUR_MS, at(1, 20)).unwrap();

        let row = db.user_aggregate(GUILD, USER).unwrap().unwrap();
        assert_eq!(row.daily_streak, 2);
        assert_eq!(row.last_activity, at(2, 18));
    }

    #[test]
    fn first_event_starts_the_streak_at_one() {
        assert_eq!(next_streak(None, at(1, 9)), (1, 1));
    }

    #[test]
    fn remove_user_clears_all_three_stores() {
        let mut db = Database::open_in_memory().unwrap();

        open_session(&db.conn, GUILD, USER, Activity::Connected, at(1, 9)).unwrap();
        commit_session(&db.conn, GUILD, USER, Activity::Connected, HOUR_MS, at(1, 12)).unwrap();

        db.remove_user(GUILD, USER).unwrap();

        assert!(db.session_marker(GUILD, USER).unwrap().is_none());
        assert!(db.user_aggregate(GUILD, USER).unwrap().is_none());
        assert!(db.daily_rows_for_user(GUILD, USER).unwrap().is_empty());
    }

    #[test]
    fn read_failures_propagate_instead_of_reading_as_no_data() {
        let db = Database::open_in_memory().unwrap();
        db.conn.execute_batch("DROP TABLE session_markers").unwrap();
        db.conn.execute_batch("DROP TABLE user_aggregates").unwrap();

        // A broken store must never look like an empty one.
        assert!(db.session_marker(GUILD, USER).is_err());
        assert!(db.user_aggregate(GUILD, USER).is_err());
    }

    #[test]
    fn open_creates_missing_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("stats.db");

        let db = Database::open(&path).unwrap();
        assert!(path.exists());
        assert_eq!(db.summary().unwrap().tracked_users, 0);
    }

    #[test]
    fn clearing_markers_leaves_aggregates_untouched() {
        let db = Database::open_in_memory().unwrap();

        open_session(&db.conn, GUILD, USER, Activity::Connected, at(1, 9)).unwrap();
        commit_session(&db.conn, GUILD, USER, Activity::Muted, HOUR_MS, at(1, 12)).unwrap();

        let cleared = db.clear_session_markers().unwrap();
        assert_eq!(cleared, 1);
        assert!(db.session_marker(GUILD, USER).unwrap().is_none());
        assert!(db.user_aggregate(GUILD, USER).unwrap().is_some());
    }
}
