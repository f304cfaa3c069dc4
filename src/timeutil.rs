use chrono::DateTime;

pub const SECOND_MS: i64 = 1_000;
pub const MINUTE_MS: i64 = 60 * SECOND_MS;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// UTC midnight of the day containing `ms`. Euclidean remainder keeps the
/// floor correct for pre-epoch timestamps.
pub fn utc_day_start(ms: i64) -> i64 {
    ms - ms.rem_euclid(DAY_MS)
}

pub fn percentage(part_ms: i64, whole_ms: i64) -> f64 {
    if whole_ms <= 0 {
        0.0
    } else {
        (part_ms.max(0) as f64 / whole_ms as f64) * 100.0
    }
}

pub fn format_day(day_ms: i64) -> String {
    DateTime::from_timestamp_millis(day_ms)
        .map(|datetime| datetime.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| day_ms.to_string())
}

pub fn format_duration_ms(ms: i64) -> String {
    let total_seconds = ms.max(0) / SECOND_MS;
    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;

    if hours > 0 {
        if seconds == 0 {
            format!("{hours}h {minutes}m")
        } else {
            format!("{hours}h {minutes}m {seconds}s")
        }
    } else if minutes > 0 {
        if seconds == 0 {
            format!("{minutes}m")
        } else {
            format!("{minutes}m {seconds}s")
        }
    } else {
        format!("{seconds}s")
    }
}
