mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use recall::RecallConfig;

#[derive(Parser)]
#[command(name = "recall", version, about = "Per-conversation memory with semantic retrieval")]
struct Cli {
    /// Config file (default: ~/.recall/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List stored sessions
    Sessions,
    /// Show a session's index file and stored turns
    Inspect {
        session_id: String,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Find the turns in a session most similar to a query
    Search {
        session_id: String,
        query: String,
        /// Number of results (default: limits.retrieve_k)
        #[arg(short, long)]
        k: Option<usize>,
    },
    /// Store a JSON list of turns as a session's full history
    Store { session_id: String, file: PathBuf },
    /// Trim a JSON list of turns to the round and token limits
    Trim {
        file: PathBuf,
        #[arg(long)]
        max_rounds: Option<usize>,
        #[arg(long)]
        max_tokens: Option<usize>,
    },
    /// Delete one session
    Remove { session_id: String },
    /// Evict sessions over the age or count limits
    Sweep {
        #[arg(long)]
        json: bool,
    },
    /// Delete every stored session
    Reset,
    /// Check the storage root and every index file
    Doctor,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => RecallConfig::load_from(path)?,
        None => RecallConfig::load()?,
    };

    // Log to stderr so stdout stays clean for command output.
    let filter = EnvFilter::try_new(&config.server.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Sessions => cli::sessions::sessions(&config).await?,
        Command::Inspect { session_id, json } => cli::inspect::inspect(&config, &session_id, json)?,
        Command::Search { session_id, query, k } => {
            cli::search::search(&config, &session_id, &query, k).await?
        }
        Command::Store { session_id, file } => cli::store::store(&config, &session_id, &file).await?,
        Command::Trim {
            file,
            max_rounds,
            max_tokens,
        } => cli::trim::trim(&config, &file, max_rounds, max_tokens)?,
        Command::Remove { session_id } => cli::remove::remove(&config, &session_id).await?,
        Command::Sweep { json } => cli::sweep::sweep(&config, json).await?,
        Command::Reset => cli::reset::reset(&config).await?,
        Command::Doctor => cli::doctor::doctor(&config)?,
    }

    Ok(())
}
