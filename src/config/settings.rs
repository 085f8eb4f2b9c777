//! Application settings loaded from config.toml
//!
//! Every section is optional. A missing file yields the defaults below; a file that
//! exists but fails to parse is a configuration error.

use crate::entities::{TaskType, task::TaskStatus};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Smallest withdrawal accepted, in cents ($10.00).
pub const DEFAULT_MIN_WITHDRAWAL_CENTS: i64 = 1_000;
/// Largest page a task listing may request.
pub const DEFAULT_MAX_PAGE_SIZE: u64 = 100;

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct AppConfig {
    /// HTTP listener settings
    pub server: ServerConfig,
    /// Business rules for tasks, submissions and withdrawals
    pub marketplace: MarketplaceConfig,
    /// Users and tasks inserted into an empty database on startup
    pub seed: SeedConfig,
}

/// HTTP listener settings
#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the API binds to
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Business rules shared by the core operations
#[derive(Debug, Deserialize, Clone, Copy)]
#[serde(default)]
pub struct MarketplaceConfig {
    /// Minimum withdrawal amount in cents
    pub min_withdrawal_cents: i64,
    /// Move a task to `completed` once its last slot is approved
    pub auto_complete_tasks: bool,
    /// Let a worker hold more than one open submission per task
    pub allow_duplicate_submissions: bool,
    /// Upper bound for the `limit` of task listings
    pub max_page_size: u64,
}

impl Default for MarketplaceConfig {
    fn default() -> Self {
        Self {
            min_withdrawal_cents: DEFAULT_MIN_WITHDRAWAL_CENTS,
            auto_complete_tasks: true,
            allow_duplicate_submissions: false,
            max_page_size: DEFAULT_MAX_PAGE_SIZE,
        }
    }
}

/// Seed data for a fresh database
#[derive(Debug, Deserialize, Default, Clone)]
#[serde(default)]
pub struct SeedConfig {
    /// Users to create, in order
    pub users: Vec<SeedUser>,
    /// Tasks to create, each owned by a seeded user
    pub tasks: Vec<SeedTask>,
}

/// A seeded user account
#[derive(Debug, Deserialize, Clone)]
pub struct SeedUser {
    pub username: String,
    pub email: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub balance_cents: i64,
    #[serde(default)]
    pub is_top_worker: bool,
    #[serde(default)]
    pub rank: Option<i32>,
}

/// A seeded task, owned by the seeded user named in `creator`
#[derive(Debug, Deserialize, Clone)]
pub struct SeedTask {
    pub creator: String,
    pub title: String,
    pub description: String,
    pub task_type: TaskType,
    pub platform: String,
    pub url: String,
    pub quantity: i32,
    pub price_per_task_cents: i64,
    #[serde(default)]
    pub completed_count: i32,
    #[serde(default)]
    pub status: Option<TaskStatus>,
}

/// Loads the application configuration from a TOML file
///
/// # Errors
/// Returns an error if the file exists but cannot be read or parsed.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path_ref = path.as_ref();
    if !path_ref.exists() {
        info!("No config file at {path_ref:?}, using defaults");
        return Ok(AppConfig::default());
    }

    debug!("Attempting to load configuration from: {path_ref:?}");
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path_ref:?}: {e}"),
    })?;

    let config: AppConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {path_ref:?}: {e}"),
    })?;

    validate(&config)?;
    Ok(config)
}

/// Loads the configuration from `CONFIG_PATH`, or ./config.toml when unset
pub fn load_default_config() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_config(path)
}

fn validate(config: &AppConfig) -> Result<()> {
    if config.marketplace.min_withdrawal_cents <= 0 {
        return Err(Error::Config {
            message: "marketplace.min_withdrawal_cents must be positive".to_string(),
        });
    }
    if config.marketplace.max_page_size == 0 {
        return Err(Error::Config {
            message: "marketplace.max_page_size must be at least 1".to_string(),
        });
    }
    Ok(())
}
