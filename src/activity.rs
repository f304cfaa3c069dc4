use anyhow::{Error, anyhow};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One tracked voice-state dimension. Closed set; adding a variant requires
/// matching columns in all three stores (see `db::queries`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Connected,
    Muted,
    Deafened,
    ScreenSharing,
    Camera,
}

impl Activity {
    pub const ALL: [Activity; 5] = [
        Activity::Connected,
        Activity::Muted,
        Activity::Deafened,
        Activity::ScreenSharing,
        Activity::Camera,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Activity::Connected => "connected",
            Activity::Muted => "muted",
            Activity::Deafened => "deafened",
            Activity::ScreenSharing => "screen_sharing",
            Activity::Camera => "camera",
        }
    }

    /// Column holding the open-session start timestamp in `session_markers`.
    pub fn start_column(self) -> &'static str {
        match self {
            Activity::Connected => "start_connected",
            Activity::Muted => "start_muted",
            Activity::Deafened => "start_deafened",
            Activity::ScreenSharing => "start_screen_sharing",
            Activity::Camera => "start_camera",
        }
    }

    /// Cumulative-duration column in `user_aggregates` and `daily_aggregates`.
    pub fn time_column(self) -> &'static str {
        match self {
            Activity::Connected => "time_connected",
            Activity::Muted => "time_muted",
            Activity::Deafened => "time_deafened",
            Activity::ScreenSharing => "time_screen_sharing",
            Activity::Camera => "time_camera",
        }
    }

    /// Longest-single-session column in `user_aggregates`.
    pub fn max_column(self) -> &'static str {
        match self {
            Activity::Connected => "max_connected",
            Activity::Muted => "max_muted",
            Activity::Deafened => "max_deafened",
            Activity::ScreenSharing => "max_screen_sharing",
            Activity::Camera => "max_camera",
        }
    }

    /// Completed-session counter column in `user_aggregates`.
    pub fn count_column(self) -> &'static str {
        match self {
            Activity::Connected => "count_connected",
            Activity::Muted => "count_muted",
            Activity::Deafened => "count_deafened",
            Activity::ScreenSharing => "count_screen_sharing",
            Activity::Camera => "count_camera",
        }
    }
}

impl fmt::Display for Activity {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Activity {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "connected" | "voice" => Ok(Activity::Connected),
            "muted" | "mute" => Ok(Activity::Muted),
            "deafened" | "deafen" => Ok(Activity::Deafened),
            "screen_sharing" | "screen" | "stream" => Ok(Activity::ScreenSharing),
            "camera" | "video" => Ok(Activity::Camera),
            _ => Err(anyhow!(
                "Unknown activity: {raw}. Expected one of connected|muted|deafened|screen_sharing|camera"
            )),
        }
    }
}
