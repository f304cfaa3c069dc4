use anyhow::{Context, Result, anyhow, bail};
use dirs::home_dir;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

const APP_DIR: &str = ".voicetally";
const CONFIG_FILE: &str = "config.json";

pub const DEFAULT_RANK_LIMIT: usize = 10;
pub const DEFAULT_HEATMAP_DAYS: u32 = 90;

/// Outside development, all session markers are cleared on startup: open
/// sessions from a previous run are forgotten rather than credited with
/// downtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn clears_markers_on_startup(self) -> bool {
        self != Environment::Development
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(self.as_str())
    }
}

impl FromStr for Environment {
    type Err = anyhow::Error;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "development" | "dev" => Ok(Environment::Development),
            "production" | "prod" => Ok(Environment::Production),
            _ => Err(anyhow!("environment must be development or production")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub db_path: PathBuf,
    pub environment: Environment,
    pub rank_limit: usize,
    pub heatmap_days: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_root_dir().join("db").join("voicetally.db"),
            environment: Environment::Production,
            rank_limit: DEFAULT_RANK_LIMIT,
            heatmap_days: DEFAULT_HEATMAP_DAYS,
        }
    }
}

impl Config {
    pub fn root_dir() -> PathBuf {
        default_root_dir()
    }

    pub fn config_path() -> PathBuf {
        default_root_dir().join(CONFIG_FILE)
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path())
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        let content = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", config_path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path())
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(config_path, content)
            .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;

        Ok(())
    }

    pub fn ensure_bootstrap_files(&self) -> Result<()> {
        let root = Self::root_dir();
        fs::create_dir_all(&root)
            .with_context(|| format!("Failed to create root directory: {}", root.display()))?;

        if let Some(parent) = self.db_path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create DB directory: {}", parent.display()))?;
        }

        Ok(())
    }

    pub fn set_value(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "db_path" => {
                self.db_path = PathBuf::from(value);
            }
            "environment" => {
                self.environment = value.parse()?;
            }
            "rank_limit" => {
                let parsed = value
                    .parse::<usize>()
                    .map_err(|_| anyhow!("rank_limit must be a number"))?;
                if parsed == 0 {
                    bail!("rank_limit must be at least 1");
                }
                self.rank_limit = parsed;
            }
            "heatmap_days" => {
                let parsed = value
                    .parse::<u32>()
                    .map_err(|_| anyhow!("heatmap_days must be a number"))?;
                if parsed == 0 {
                    bail!("heatmap_days must be at least 1");
                }
                self.heatmap_days = parsed;
            }
            _ => {
                bail!(
                    "Unsupported config key: {key}. Supported keys: db_path, environment, rank_limit, heatmap_days"
                );
            }
        }

        Ok(())
    }

    pub fn get_value(&self, key: &str) -> Option<String> {
        match key {
            "db_path" => Some(self.db_path.display().to_string()),
            "environment" => Some(self.environment.to_string()),
            "rank_limit" => Some(self.rank_limit.to_string()),
            "heatmap_days" => Some(self.heatmap_days.to_string()),
            _ => None,
        }
    }
}

fn default_root_dir() -> PathBuf {
    home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
}
