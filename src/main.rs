use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use reserial::log::{migrate, LogStore};

/// Inspect and maintain serial traffic recordings.
#[derive(Debug, Parser)]
#[command(name = "reserial", version)]
struct Cli {
    /// Append diagnostic logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Convert a legacy whole-file JSON log to JSON Lines
    Migrate {
        /// Legacy log file
        input: PathBuf,
        /// Output file (defaults to the input with a .jsonl extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List the tests recorded in a log file
    List {
        log: PathBuf,
    },
    /// Show the traffic recorded for one test
    Show {
        log: PathBuf,
        test: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    reserial::logging::init_cli_logging(cli.log_file.as_deref())
        .context("Failed to open log file")?;

    match cli.command {
        Command::Migrate { input, output } => {
            let output = output.unwrap_or_else(|| migrate::default_output_path(&input));
            let count = migrate::convert_legacy(&input, &output)
                .with_context(|| format!("Failed to migrate {}", input.display()))?;
            println!("Wrote {count} test(s) to {}", output.display());
        }
        Command::List { log } => {
            for test in LogStore::new(log).list()? {
                println!("{test}");
            }
        }
        Command::Show { log, test } => {
            let traffic = LogStore::new(log).load(&test)?;
            println!("rx ({} bytes): b\"{}\"", traffic.rx_len(), traffic.rx().escape_ascii());
            println!("tx ({} bytes): b\"{}\"", traffic.tx_len(), traffic.tx().escape_ascii());
        }
    }

    Ok(())
}
