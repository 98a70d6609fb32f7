use std::io::Write;

use snapkv::{commands::Command, config::Config, Database, LoadOutcome, Result};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_args(std::env::args().skip(1))?;
    let mut db = Database::new();

    if let Some(path) = &config.db_file {
        match db.load(path) {
            Ok(LoadOutcome::Loaded) => info!("Loaded database from {:?}", path),
            Ok(LoadOutcome::NoPriorState) => info!("No database at {:?}, starting fresh", path),
            Err(e) => error!("Failed to load {:?}: {}", path, e),
        }
    }

    println!("Welcome to Key-Value DB CLI. Type 'help' for commands or 'exit' to quit.");

    let mut lines = BufReader::new(io::stdin()).lines();
    loop {
        prompt();
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match Command::parse(&line) {
            Ok(Some(Command::Exit)) => break,
            Ok(Some(command)) => println!("{}", command.execute(&mut db, &config)),
            Ok(None) => {}
            Err(e) => println!("{}", e),
        }
    }

    if let Some(path) = &config.db_file {
        if let Err(e) = db.save(path) {
            error!("Failed to save {:?}: {}", path, e);
        }
    }

    Ok(())
}
