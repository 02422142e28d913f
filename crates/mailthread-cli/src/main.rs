//! Mailthread CLI
//!
//! Inspect and maintain a thread store.
//!
//! # Commands
//!
//! - `stats` - Counters and backend details
//! - `history` - Stored records for one thread
//! - `transcript` - One thread rendered as a transcript
//! - `cleanup` - Remove threads idle for more than N days
//! - `copy` - Copy every thread into another backend

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use mailthread::{logging, open_backend, BackendKind, Config, StoreConfig, ThreadStorage, ThreadStore};

/// Mailthread store administration.
#[derive(Parser)]
#[command(name = "mailthread")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to a TOML config file
    #[arg(global = true, short, long, env = "MAILTHREAD_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display counters and backend details
    Stats {
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Print the stored records of a thread
    History {
        /// Thread key
        thread: String,
    },

    /// Print a thread as a transcript
    Transcript {
        /// Thread key
        thread: String,
    },

    /// Remove threads whose newest record is older than the given age
    Cleanup {
        /// Age in days
        #[arg(short, long, default_value = "30")]
        days: u32,
    },

    /// Copy every thread into another backend, replacing its contents
    Copy {
        /// Destination backend (file, sql, memory)
        #[arg(long)]
        to_backend: BackendKind,

        /// Destination file or database path
        #[arg(long)]
        to_path: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    logging::init(&config.logging)?;

    let store = ThreadStore::open(&config.storage).context("failed to open thread store")?;

    match cli.command {
        Commands::Stats { json } => {
            let stats = store.try_stats()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                let c = &stats.counts;
                println!("Backend:              {}", stats.backend.provider());
                if let Some(location) = config.storage.location() {
                    println!("Location:             {}", location.display());
                }
                println!("Threads:              {}", c.total_threads);
                println!("Records:              {}", c.total_records);
                println!("Threads with history: {}", c.threads_with_history);
                println!("Avg records/thread:   {:.1}", c.avg_records_per_thread);
                println!(
                    "Threads at cap ({}):   {}",
                    store.policy().max_history(),
                    c.threads_at_cap
                );
                println!("Replies / inbound:    {} / {}", c.reply_records, c.inbound_records);
            }
        }
        Commands::History { thread } => {
            for record in store.try_history(&thread)? {
                println!(
                    "[{}] {} | {} | {}",
                    record.timestamp,
                    record.role(),
                    record.subject,
                    record.body.replace('\n', " ")
                );
            }
        }
        Commands::Transcript { thread } => {
            println!("{}", store.try_transcript(&thread)?);
        }
        Commands::Cleanup { days } => {
            let removed = store.try_cleanup_older_than(days)?;
            println!("Removed {removed} thread(s) idle for more than {days} day(s)");
        }
        Commands::Copy { to_backend, to_path } => {
            let target = target_config(&config.storage, to_backend, to_path);
            let snapshot = store.try_load_all()?;
            let destination = open_backend(&target)?;
            destination
                .save_all(&snapshot)
                .with_context(|| format!("failed to write {to_backend} store"))?;
            tracing::info!(threads = snapshot.len(), to = %to_backend, "copied threads");
            println!("Copied {} thread(s) to {to_backend}", snapshot.len());
        }
    }

    Ok(())
}

/// The destination store for `copy`: same cap, different backend and path.
fn target_config(source: &StoreConfig, backend: BackendKind, path: Option<PathBuf>) -> StoreConfig {
    let mut target = StoreConfig {
        backend,
        ..source.clone()
    };
    if let Some(path) = path {
        match backend {
            BackendKind::File => target.file_path = path,
            BackendKind::Sql => target.sqlite_path = path,
            BackendKind::Memory => {}
        }
    }
    target
}
