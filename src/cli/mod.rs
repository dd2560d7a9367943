//! CLI command definitions for task-board.
//!
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::format::OutputFormat;
use crate::types::{Actor, Role};

/// Dynamic task boards over SQLite, served as a JSON API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Path to database file (overrides config)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Logging output: 0/off, 1/stdout, 2/stderr (default), or filename
    #[arg(short, long, default_value = "2", global = true)]
    pub log: String,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the HTTP API (default if no subcommand given)
    Serve {
        /// Port to listen on (overrides config)
        #[arg(long)]
        port: Option<u16>,
    },

    /// Print a board with every group, task and cell
    Show {
        /// Board id
        board: String,

        #[command(flatten)]
        actor: ActorArgs,

        /// Only show tasks whose name contains this text
        #[arg(short, long)]
        query: Option<String>,

        #[arg(short, long, value_enum, default_value_t = FormatArg::Markdown)]
        format: FormatArg,
    },

    /// Print per-stage task counts for a STATUS column
    Stages {
        /// Board id
        board: String,

        /// STATUS column id
        column: String,

        #[command(flatten)]
        actor: ActorArgs,

        #[arg(short, long, value_enum, default_value_t = FormatArg::Markdown)]
        format: FormatArg,
    },
}

/// Who the command runs as.
#[derive(Args, Debug, Clone)]
pub struct ActorArgs {
    /// Tenant id
    #[arg(long)]
    pub tenant: String,

    /// Actor id
    #[arg(long)]
    pub actor: String,

    /// Role: owner, admin, manager, staff, member or customer
    #[arg(long, default_value = "member")]
    pub role: String,
}

impl ActorArgs {
    pub fn to_actor(&self) -> anyhow::Result<Actor> {
        let role = Role::from_str(&self.role)
            .ok_or_else(|| anyhow::anyhow!("unknown role: {}", self.role))?;
        Ok(Actor::new(self.actor.clone(), role, self.tenant.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    Json,
    Markdown,
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Json => OutputFormat::Json,
            FormatArg::Markdown => OutputFormat::Markdown,
        }
    }
}
