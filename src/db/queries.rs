pub const CREATE_SESSION_MARKERS: &str = r#"
CREATE TABLE IF NOT EXISTS session_markers (
  guild_id             INTEGER NOT NULL,
  user_id              INTEGER NOT NULL,
  start_connected      INTEGER NOT NULL DEFAULT 0,
  start_muted          INTEGER NOT NULL DEFAULT 0,
  start_deafened       INTEGER NOT NULL DEFAULT 0,
  start_screen_sharing INTEGER NOT NULL DEFAULT 0,
  start_camera         INTEGER NOT NULL DEFAULT 0,
  PRIMARY KEY (guild_id, user_id)
);
"#;

pub const CREATE_USER_AGGREGATES: &str = r#"
CREATE TABLE IF NOT EXISTS user_aggregates (
  guild_id             INTEGER NOT NULL,
  user_id              INTEGER NOT NULL,
  time_connected       INTEGER NOT NULL DEFAULT 0,
  time_muted           INTEGER NOT NULL DEFAULT 0,
  time_deafened        INTEGER NOT NULL DEFAULT 0,
  time_screen_sharing  INTEGER NOT NULL DEFAULT 0,
  time_camera          INTEGER NOT NULL DEFAULT 0,
  max_connected        INTEGER NOT NULL DEFAULT 0,
  max_muted            INTEGER NOT NULL DEFAULT 0,
  max_deafened         INTEGER NOT NULL DEFAULT 0,
  max_screen_sharing   INTEGER NOT NULL DEFAULT 0,
  max_camera           INTEGER NOT NULL DEFAULT 0,
  max_daily_streak     INTEGER NOT NULL DEFAULT 0,
  count_connected      INTEGER NOT NULL DEFAULT 0,
  count_muted          INTEGER NOT NULL DEFAULT 0,
  count_deafened       INTEGER NOT NULL DEFAULT 0,
  count_screen_sharing INTEGER NOT NULL DEFAULT 0,
  count_camera         INTEGER NOT NULL DEFAULT 0,
  count_switch         INTEGER NOT NULL DEFAULT 0,
  daily_streak         INTEGER NOT NULL DEFAULT 0,
  last_activity        INTEGER NOT NULL DEFAULT 0,
  PRIMARY KEY (guild_id, user_id)
);
"#;

pub const CREATE_DAILY_AGGREGATES: &str = r#"
CREATE TABLE IF NOT EXISTS daily_aggregates (
  guild_id             INTEGER NOT NULL,
  user_id              INTEGER NOT NULL,
  day                  INTEGER NOT NULL,
  time_connected       INTEGER NOT NULL DEFAULT 0,
  time_muted           INTEGER NOT NULL DEFAULT 0,
  time_deafened        INTEGER NOT NULL DEFAULT 0,
  time_screen_sharing  INTEGER NOT NULL DEFAULT 0,
  time_camera          INTEGER NOT NULL DEFAULT 0,
  PRIMARY KEY (guild_id, user_id, day)
);
"#;

pub const INDEX_DAILY_AGGREGATES_GUILD_DAY: &str =
    "CREATE INDEX IF NOT EXISTS idx_daily_aggregates_guild_day ON daily_aggregates(guild_id, day);";

pub const INDEX_USER_AGGREGATES_GUILD: &str =
    "CREATE INDEX IF NOT EXISTS idx_user_aggregates_guild ON user_aggregates(guild_id);";

pub fn schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_SESSION_MARKERS,
        CREATE_USER_AGGREGATES,
        CREATE_DAILY_AGGREGATES,
        INDEX_DAILY_AGGREGATES_GUILD_DAY,
        INDEX_USER_AGGREGATES_GUILD,
    ]
}
