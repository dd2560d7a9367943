//! Task board server and CLI.

use anyhow::Result;
use clap::Parser;
use std::sync::Arc;
use task_board::api;
use task_board::cli::{Cli, Command};
use task_board::config::{Config, ConfigLoader};
use task_board::db::Database;
use task_board::format::{OutputFormat, format_board_markdown, format_stages_markdown};
use task_board::logging::{self, LogTarget};
use task_board::service::BoardService;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    logging::init(&LogTarget::parse(&cli.log), cli.verbose)?;

    // SAFETY: set before any other threads read the environment.
    if let Some(config_path) = &cli.config {
        unsafe {
            std::env::set_var("TASK_BOARD_CONFIG_PATH", config_path);
        }
    }
    let mut loader = ConfigLoader::load()?;
    if let Some(path) = loader.config_path() {
        info!("Using config {}", path.display());
    }
    if let Some(db_path) = &cli.database {
        loader.config_mut().server.db_path = db_path.into();
    }
    let config = loader.into_config();

    match cli.command {
        Some(Command::Show {
            board,
            actor,
            query,
            format,
        }) => {
            let service = open_service(&config)?;
            let view = service.get_board_view(&actor.to_actor()?, &board, query.as_deref())?;
            match OutputFormat::from(format) {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&view)?),
                OutputFormat::Markdown => print!("{}", format_board_markdown(&view)),
            }
        }
        Some(Command::Stages {
            board,
            column,
            actor,
            format,
        }) => {
            let service = open_service(&config)?;
            let breakdown = service.stage_breakdown(&actor.to_actor()?, &board, &column)?;
            match OutputFormat::from(format) {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&breakdown)?),
                OutputFormat::Markdown => print!("{}", format_stages_markdown(&breakdown)),
            }
        }
        Some(Command::Serve { port }) => run_server(config, port).await?,
        None => run_server(config, None).await?,
    }

    Ok(())
}

fn open_service(config: &Config) -> Result<BoardService> {
    if let Some(parent) = config.server.db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let db = Arc::new(Database::open(&config.server.db_path)?);
    Ok(BoardService::new(db, config.board.clone()))
}

async fn run_server(config: Config, port: Option<u16>) -> Result<()> {
    let service = open_service(&config)?;
    info!("Database: {}", config.server.db_path.display());

    let port = port.unwrap_or(config.server.port);
    let server = api::start_server(service, port).await?;
    info!("Serving boards on http://{}", server.addr());

    tokio::signal::ctrl_c().await?;
    server.shutdown().await
}
