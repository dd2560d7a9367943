//! Layered configuration.
//!
//! Tiers, lowest to highest priority, merged field by field:
//! 1. **Defaults** - `Config::default()`
//! 2. **Project** - `$CWD/task-board/config.yaml`
//! 3. **User** - `~/.task-board/config.yaml`
//! 4. **Environment** - see below
//!
//! ## Environment Variables
//! - `TASK_BOARD_CONFIG_PATH` - Explicit config file (skips the file tiers)
//! - `TASK_BOARD_DB_PATH` - Database path
//! - `TASK_BOARD_PORT` - HTTP port
//! - `TASK_BOARD_USER_DIR` - User config dir (default: `~/.task-board`)
//! - `TASK_BOARD_PROJECT_DIR` - Project config dir (default: `./task-board`)

mod loader;
mod merge;
mod types;

pub use loader::{ConfigLoader, ConfigPaths, ConfigTier};
pub use merge::{deep_merge, deep_merge_all};
pub use types::*;
