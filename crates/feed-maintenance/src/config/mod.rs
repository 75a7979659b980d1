use anyhow::Result;
use serde::{Deserialize, Serialize};
use tracing::info;

pub mod defaults;

use defaults::*;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub maintenance: MaintenanceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_database_url")]
    pub url: String,
    pub max_connections: Option<u32>,
}

/// Knobs for the scheduler and extension engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaintenanceConfig {
    /// Import level used when neither an override nor an active version supplies one
    #[serde(default = "default_import_level")]
    pub default_import_level: i32,
    /// Upper bound on dispatches per scheduling run; unbounded when absent
    pub max_imports: Option<usize>,
    /// Default extension start, in months before a version's latest calendar date
    #[serde(default = "default_extend_from_months")]
    pub extend_from_months: u32,
    /// Default extension end, in years after a version's latest calendar date
    #[serde(default = "default_extend_to_years")]
    pub extend_to_years: u32,
    /// Versions whose coverage ends within this many days are extended
    #[serde(default = "default_expiring_within_days")]
    pub expiring_within_days: u32,
}

fn default_database_url() -> String {
    DEFAULT_DATABASE_URL.to_string()
}

fn default_import_level() -> i32 {
    DEFAULT_IMPORT_LEVEL
}

fn default_extend_from_months() -> u32 {
    DEFAULT_EXTEND_FROM_MONTHS
}

fn default_extend_to_years() -> u32 {
    DEFAULT_EXTEND_TO_YEARS
}

fn default_expiring_within_days() -> u32 {
    DEFAULT_EXPIRING_WITHIN_DAYS
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: default_database_url(),
            max_connections: Some(DEFAULT_MAX_CONNECTIONS),
        }
    }
}

impl Default for MaintenanceConfig {
    fn default() -> Self {
        Self {
            default_import_level: default_import_level(),
            max_imports: None,
            extend_from_months: default_extend_from_months(),
            extend_to_years: default_extend_to_years(),
            expiring_within_days: default_expiring_within_days(),
        }
    }
}

impl Config {
    /// Load from `$CONFIG_FILE`, falling back to `config.toml`
    pub fn load() -> Result<Self> {
        let config_file =
            std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());
        let config = Self::load_from_file(&config_file)?;
        info!("Configuration loaded from: {}", config_file);
        Ok(config)
    }

    pub fn load_from_file(config_file: &str) -> Result<Self> {
        if std::path::Path::new(&config_file).exists() {
            let contents = std::fs::read_to_string(config_file)?;
            Ok(toml::from_str(&contents)?)
        } else {
            let default_config = Self::default();
            let contents = toml::to_string_pretty(&default_config)?;
            std::fs::write(config_file, contents)?;
            info!("Created default config file: {}", config_file);
            Ok(default_config)
        }
    }
}
