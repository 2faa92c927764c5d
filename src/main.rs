//! tasktree
//!
//! Serves a nested task tree over HTTP, with CLI helpers for inspecting and
//! adding tasks from a terminal.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::OpenOptions;
use std::net::SocketAddr;
use std::sync::Arc;
use tasktree::cli::{Cli, Command};
use tasktree::config::Config;
use tasktree::db::Database;
use tasktree::format::{format_tags, format_tree};
use tasktree::web::start_server;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Initialize logging based on the --log option.
fn init_logging(cli: &Cli) -> Result<()> {
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    match cli.log.as_str() {
        "0" | "off" => {
            // No logging
        }
        "1" | "stdout" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stdout)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        "2" | "stderr" => {
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(std::io::stderr)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        filename => {
            // Log to file (append mode)
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(filename)?;
            let subscriber = FmtSubscriber::builder()
                .with_max_level(level)
                .with_writer(file)
                .with_ansi(false)
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_or_default(),
    };
    if let Some(db_path) = &cli.database {
        config.server.db_path = db_path.into();
    }
    Ok(config)
}

fn open_database(config: &Config) -> Result<Database> {
    config.ensure_db_dir()?;
    let db = Database::open(&config.server.db_path)
        .with_context(|| format!("opening database {}", config.server.db_path.display()))?;
    Ok(db.with_reporting_offset(config.reporting.offset()?))
}

async fn serve(db: Database, config: &Config, port: Option<u16>) -> Result<()> {
    let addr = SocketAddr::new(config.server.bind, port.unwrap_or(config.server.port));
    let handle = start_server(Arc::new(db), addr).await?;

    tokio::signal::ctrl_c().await?;
    info!("Received shutdown signal");
    handle.shutdown().await;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let config = load_config(&cli)?;
    let db = open_database(&config)?;
    info!(db_path = %config.server.db_path.display(), "Database opened");

    match cli.command {
        None => serve(db, &config, None).await,
        Some(Command::Serve { port }) => serve(db, &config, port).await,
        Some(Command::Show { format }) => {
            let views = db.render_views()?;
            print!("{}", format_tree(&views, format, &db.reporting_offset())?);
            Ok(())
        }
        Some(Command::Tags) => {
            print!("{}", format_tags(&db.list_all_tags()?));
            db.check_in()?;
            Ok(())
        }
        Some(Command::Add {
            parent,
            front,
            name,
        }) => {
            let task_id = match parent {
                Some(parent_id) => db.create_child(parent_id)?,
                None => db.create_root(front)?,
            };
            db.set_name(task_id, &name)?;
            db.check_in()?;
            println!("{}", task_id);
            Ok(())
        }
    }
}
