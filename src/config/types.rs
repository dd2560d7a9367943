//! Configuration types.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default port for the HTTP API.
pub const DEFAULT_PORT: u16 = 31995;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub board: BoardConfig,
}

impl Config {
    /// Load a single YAML file, without tier merging.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        // Empty or comment-only files parse as null.
        let config: Option<Config> = serde_yaml::from_str(&content)?;
        Ok(config.unwrap_or_default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Port for the HTTP API.
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            port: default_port(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("task-board.db")
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// What happens to stored STATUS values when their option is removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusOptionRemoval {
    /// Leave them; they read as unset.
    #[default]
    Keep,
    /// Reset them to unset when the settings change.
    Clear,
}

/// Write policy for concurrent field edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcurrencyMode {
    /// No token check; the later write wins.
    #[default]
    LastWriteWins,
    /// Writes must name the version they replace.
    Versioned,
}

/// How the client cache treats its own field edits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldEditPolicy {
    /// Patch locally, keep the patch, no refetch.
    #[default]
    Optimistic,
    /// Patch locally, then refetch the whole board.
    Reconcile,
}

/// Board engine behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Name given to groups created without one.
    #[serde(default = "default_group_name")]
    pub default_group_name: String,

    /// Width of new columns when none is given.
    #[serde(default = "default_column_width")]
    pub default_column_width: i32,

    /// Reject blank board, column, group and task names.
    #[serde(default = "default_true")]
    pub reject_blank_names: bool,

    #[serde(default)]
    pub status_option_removal: StatusOptionRemoval,

    #[serde(default)]
    pub concurrency: ConcurrencyMode,

    #[serde(default)]
    pub field_edits: FieldEditPolicy,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_group_name: default_group_name(),
            default_column_width: default_column_width(),
            reject_blank_names: true,
            status_option_removal: StatusOptionRemoval::default(),
            concurrency: ConcurrencyMode::default(),
            field_edits: FieldEditPolicy::default(),
        }
    }
}

fn default_group_name() -> String {
    "New Group".to_string()
}

fn default_column_width() -> i32 {
    140
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "board:\n  concurrency: versioned\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.board.concurrency, ConcurrencyMode::Versioned);
        assert_eq!(config.board.default_group_name, "New Group");
        assert!(config.board.reject_blank_names);
        assert_eq!(config.server.port, DEFAULT_PORT);
    }

    #[test]
    fn empty_file_loads_defaults() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "# nothing here\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.board.status_option_removal, StatusOptionRemoval::Keep);
        assert_eq!(config.board.field_edits, FieldEditPolicy::Optimistic);
    }
}
