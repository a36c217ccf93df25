//! Ripple CLI.
//!
//! Entry point for running the webhook server and for one-off local
//! impact analysis without any GitHub round trip.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "ripple")]
#[command(author = "Ripple Contributors")]
#[command(version)]
#[command(about = "Pre-merge change impact analysis for pull requests", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the webhook server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "8080")]
        port: u16,

        /// Directory for repository working copies
        #[arg(long, default_value = "/tmp/ripple")]
        workdir: PathBuf,

        /// GitHub API token
        #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
        token: Option<String>,

        /// Concurrent analysis workers
        #[arg(long, default_value = "4")]
        workers: usize,
    },

    /// Analyze a local source tree against a set of changed entities
    Analyze {
        /// Path of the source tree (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Changed entity ids or simple names, repeatable
        #[arg(short, long = "changed", required = true)]
        changed: Vec<String>,

        /// Output the report as JSON instead of formatted text
        #[arg(long)]
        json: bool,
    },

    /// Export the entity graph of a source tree to JSON
    Export {
        /// Path of the source tree (defaults to current directory)
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file
        #[arg(short, long, default_value = "ripple-graph.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter)),
        )
        .init();

    let result = match cli.command {
        Commands::Serve {
            port,
            workdir,
            token,
            workers,
        } => commands::serve(port, &workdir, token, workers).await,
        Commands::Analyze {
            path,
            changed,
            json,
        } => commands::analyze(&path, &changed, json),
        Commands::Export { path, output } => commands::export(&path, &output),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
