//! Command-line front end for the room availability calendar.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use log::{error, warn};

use room_calendar::{
    commands::{execute, Command},
    init_logging, memory_store, open_database, SettingsStore,
};

/// Room availability calendar
#[derive(Parser, Debug)]
#[command(name = "room-calendar")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the settings file
    #[arg(short, long, global = true, default_value = "room-calendar.json")]
    config: PathBuf,

    /// SQLite database file (overrides the settings file)
    #[arg(short, long, global = true)]
    database: Option<PathBuf>,

    /// Use the in-memory sample store even if a database is configured.
    /// Read-only: `book` is refused
    #[arg(long, global = true)]
    memory: bool,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() {
    init_logging();
    let args = Args::parse();

    if let Err(err) = run(args).await {
        error!("{err:#}");
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let settings_store = SettingsStore::new(args.config.clone())?;
    let mut settings = settings_store.calendar();
    if let Some(path) = args.database.clone() {
        settings.database_path = Some(path);
    }
    if args.memory {
        settings.database_path = None;
    }

    let report = match open_database(&settings).await? {
        Some(database) => execute(database, &settings, &args.command, true).await?,
        None => {
            warn!("No database configured, using the in-memory sample store");
            execute(memory_store(&settings), &settings, &args.command, false).await?
        }
    };
    println!("{}", report.render(args.json)?);
    Ok(())
}
