// Configuration: YAML file plus command-line overrides

use eyre::{Context, Result, eyre};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::models::Category;
use crate::slot::{DEFAULT_SLOT, FileSlot, Slot, SqliteSlot};

/// Where the task collection is persisted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// One JSON file per slot
    #[default]
    Json,
    /// A row in a SQLite key-value table
    Sqlite,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
    pub slot: String,
    pub default_category: Category,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            backend: Backend::default(),
            slot: DEFAULT_SLOT.to_string(),
            default_category: Category::default(),
        }
    }
}

impl Config {
    /// Load configuration
    ///
    /// An explicit path must exist. Without one, the default config file is
    /// used when present, otherwise built-in defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                if !path.exists() {
                    return Err(eyre!("Config file not found: {}", path.display()));
                }
                Self::from_file(path)
            }
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path),
                _ => {
                    debug!("No config file, using defaults");
                    Ok(Self::default())
                }
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let config = Self::parse(&content).with_context(|| format!("Invalid config file {}", path.display()))?;
        debug!(path = ?path, "Loaded config");
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self> {
        // An empty document deserializes to unit, not to a mapping
        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Config = serde_yaml::from_str(content).context("Failed to parse YAML")?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.slot.trim().is_empty() {
            return Err(eyre!("Slot name cannot be empty"));
        }
        if self.slot.len() > 64 {
            return Err(eyre!("Slot name too long: {} (max 64 chars)", self.slot));
        }
        if !self.slot.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
            return Err(eyre!("Invalid slot name: {} (must be alphanumeric with _/-)", self.slot));
        }
        Ok(())
    }

    /// Apply command-line flags on top of the file values
    pub fn with_overrides(mut self, data_dir: Option<PathBuf>, backend: Option<Backend>) -> Self {
        if let Some(data_dir) = data_dir {
            self.data_dir = data_dir;
        }
        if let Some(backend) = backend {
            self.backend = backend;
        }
        self
    }

    /// Open the configured slot
    pub fn open_slot(&self) -> Result<Box<dyn Slot>> {
        let slot: Box<dyn Slot> = match self.backend {
            Backend::Json => Box::new(FileSlot::open(&self.data_dir, &self.slot)?),
            Backend::Sqlite => Box::new(SqliteSlot::open(&self.data_dir, &self.slot)?),
        };
        Ok(slot)
    }
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("todoit").join("config.yml"))
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("todoit"))
        .unwrap_or_else(|| PathBuf::from(".todoit"))
}
