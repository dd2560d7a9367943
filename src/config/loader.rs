//! Configuration loader with tier-based merging.

use super::merge::deep_merge_all;
use super::types::Config;
use anyhow::Result;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::warn;

/// Configuration tier priority (lowest to highest).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ConfigTier {
    Defaults = 0,
    Project = 1,
    User = 2,
    Environment = 3,
}

impl std::fmt::Display for ConfigTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigTier::Defaults => write!(f, "defaults"),
            ConfigTier::Project => write!(f, "project"),
            ConfigTier::User => write!(f, "user"),
            ConfigTier::Environment => write!(f, "environment"),
        }
    }
}

/// Directories searched for `config.yaml`.
#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub project_dir: Option<PathBuf>,
    pub user_dir: Option<PathBuf>,
}

impl Default for ConfigPaths {
    fn default() -> Self {
        Self::discover()
    }
}

impl ConfigPaths {
    /// Discover configuration paths from environment and defaults.
    pub fn discover() -> Self {
        let user_dir = std::env::var("TASK_BOARD_USER_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| dirs::home_dir().map(|h| h.join(".task-board")));

        let project_dir = std::env::var("TASK_BOARD_PROJECT_DIR")
            .ok()
            .map(PathBuf::from)
            .or_else(|| Some(PathBuf::from("task-board")));

        Self {
            project_dir,
            user_dir,
        }
    }

    pub fn with_dirs(project_dir: Option<PathBuf>, user_dir: Option<PathBuf>) -> Self {
        Self {
            project_dir,
            user_dir,
        }
    }
}

/// Read a tier's `config.yaml`. Unreadable or malformed files are skipped with a warning.
fn read_tier(dir: &Path, tier: ConfigTier) -> Option<(Value, PathBuf)> {
    let file = dir.join("config.yaml");
    if !file.exists() {
        return None;
    }
    let parsed = std::fs::read_to_string(&file)
        .map_err(anyhow::Error::from)
        .and_then(|content| Ok(serde_yaml::from_str::<Value>(&content)?));
    match parsed {
        Ok(value) => Some((value, file)),
        Err(e) => {
            warn!(%tier, path = %file.display(), "ignoring config file: {}", e);
            None
        }
    }
}

/// Loaded configuration plus where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    pub paths: ConfigPaths,
    config: Config,
    /// Highest-priority file that contributed, if any.
    config_path: Option<PathBuf>,
}

impl ConfigLoader {
    /// Load configuration from all tiers with proper merging.
    pub fn load() -> Result<Self> {
        Self::load_with_paths(ConfigPaths::discover())
    }

    /// Load configuration with explicit paths.
    pub fn load_with_paths(paths: ConfigPaths) -> Result<Self> {
        if let Ok(explicit) = std::env::var("TASK_BOARD_CONFIG_PATH") {
            return Self::load_file(paths, PathBuf::from(explicit));
        }

        let mut tiers = vec![serde_json::to_value(Config::default())?];
        let mut config_path = None;

        for (dir, tier) in [
            (paths.project_dir.as_deref(), ConfigTier::Project),
            (paths.user_dir.as_deref(), ConfigTier::User),
        ] {
            if let Some((value, file)) = dir.and_then(|d| read_tier(d, tier)) {
                tiers.push(value);
                config_path = Some(file);
            }
        }

        let mut config: Config = serde_json::from_value(deep_merge_all(tiers))?;
        Self::apply_env_overrides(&mut config);

        Ok(Self {
            paths,
            config,
            config_path,
        })
    }

    /// Load one explicit file on top of the defaults, then the environment.
    pub fn load_file(paths: ConfigPaths, path: PathBuf) -> Result<Self> {
        let mut config = Config::load(&path)?;
        Self::apply_env_overrides(&mut config);
        Ok(Self {
            paths,
            config,
            config_path: Some(path),
        })
    }

    fn apply_env_overrides(config: &mut Config) {
        if let Ok(db_path) = std::env::var("TASK_BOARD_DB_PATH") {
            config.server.db_path = PathBuf::from(db_path);
        }
        if let Ok(port) = std::env::var("TASK_BOARD_PORT") {
            match port.parse() {
                Ok(port) => config.server.port = port,
                Err(_) => warn!(tier = %ConfigTier::Environment, "ignoring TASK_BOARD_PORT={}", port),
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut Config {
        &mut self.config
    }

    pub fn into_config(self) -> Config {
        self.config
    }

    pub fn config_path(&self) -> Option<&Path> {
        self.config_path.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConcurrencyMode, StatusOptionRemoval};
    use tempfile::TempDir;

    fn write_config(dir: &Path, yaml: &str) {
        std::fs::create_dir_all(dir).unwrap();
        std::fs::write(dir.join("config.yaml"), yaml).unwrap();
    }

    #[test]
    fn defaults_when_no_files() {
        let tmp = TempDir::new().unwrap();
        let paths = ConfigPaths::with_dirs(
            Some(tmp.path().join("project")),
            Some(tmp.path().join("user")),
        );
        let loader = ConfigLoader::load_with_paths(paths).unwrap();
        assert_eq!(loader.config().board.default_group_name, "New Group");
        assert!(loader.config_path().is_none());
    }

    #[test]
    fn user_tier_overrides_project_tier() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("project");
        let user = tmp.path().join("user");
        write_config(
            &project,
            "board:\n  concurrency: versioned\n  status_option_removal: clear\n",
        );
        write_config(&user, "board:\n  concurrency: last_write_wins\n");

        let loader =
            ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project), Some(user.clone())))
                .unwrap();
        let board = &loader.config().board;
        assert_eq!(board.concurrency, ConcurrencyMode::LastWriteWins);
        assert_eq!(board.status_option_removal, StatusOptionRemoval::Clear);
        assert_eq!(loader.config_path(), Some(user.join("config.yaml").as_path()));
    }

    #[test]
    fn malformed_tier_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("project");
        write_config(&project, "board: [not, a, map\n");
        let loader =
            ConfigLoader::load_with_paths(ConfigPaths::with_dirs(Some(project), None)).unwrap();
        assert_eq!(loader.config().board.default_column_width, 140);
    }
}
