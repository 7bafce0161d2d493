//! User configuration for the dbkeeper tools.
//!
//! Every field has a default, so an empty file (or no file at all) is a
//! valid configuration.
//!
//! # Example YAML
//!
//! ```yaml
//! default_database: /home/me/inventory.db
//! log_filter: info
//! history_limit: 50
//! sample_text: Example
//! ```

use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default number of ad-hoc statements remembered per session.
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Top-level configuration.
///
/// # Examples
///
/// ```
/// use dbkeeper_transfer::ManagerConfig;
///
/// let config: ManagerConfig = serde_yaml::from_str("history_limit: 5").unwrap();
/// assert_eq!(config.history_limit, 5);
/// assert_eq!(config.log_filter, "warn");
/// assert!(config.default_database.is_none());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManagerConfig {
    /// Database opened when no `--db` argument is given.
    pub default_database: Option<PathBuf>,
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    pub log_filter: String,
    /// Maximum number of remembered ad-hoc statements.
    pub history_limit: usize,
    /// Text written into text columns by sample-data generation.
    pub sample_text: String,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            default_database: None,
            log_filter: "warn".to_string(),
            history_limit: DEFAULT_HISTORY_LIMIT,
            sample_text: "Sample".to_string(),
        }
    }
}

impl ManagerConfig {
    /// Loads configuration from a YAML file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError`](crate::TransferError::IoError) if the file cannot
    /// be read, or [`YamlError`](crate::TransferError::YamlError) if parsing
    /// fails.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let file = std::fs::File::open(path)?;
        let reader = BufReader::new(file);
        let config = serde_yaml::from_reader(reader)?;
        Ok(config)
    }

    /// Saves the configuration as YAML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = BufWriter::new(file);
        serde_yaml::to_writer(writer, self)?;
        Ok(())
    }
}
