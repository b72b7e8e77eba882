use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod commands;

use commands::AppContext;

#[derive(Parser)]
#[command(name = "studylog")]
#[command(about = "studylog - log study sessions by talking about them", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to the platform config directory)
    #[arg(long, global = true, env = "STUDYLOG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start (or resume) a progress-logging conversation
    Chat {
        #[arg(long, env = "STUDYLOG_USER")]
        user: String,
        /// Check in on a scheduled study block instead of starting blank
        #[arg(long)]
        block: Option<String>,
    },
    /// Show hours done and remaining per assignment
    Progress {
        #[arg(long, env = "STUDYLOG_USER")]
        user: String,
    },
    /// List logged study sessions, newest first
    History {
        #[arg(long, env = "STUDYLOG_USER")]
        user: String,
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// List the assignments a user can log against
    Assignments {
        #[arg(long, env = "STUDYLOG_USER")]
        user: String,
    },
    /// Inspect or create the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file if none exists
    Init,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let ctx = AppContext::load(cli.config)?;

    match cli.command {
        Commands::Chat { user, block } => commands::chat::run(&ctx, &user, block.as_deref()).await?,
        Commands::Progress { user } => commands::report::progress(&ctx, &user).await?,
        Commands::History { user, limit } => commands::report::history(&ctx, &user, limit).await?,
        Commands::Assignments { user } => commands::report::assignments(&ctx, &user).await?,
        Commands::Config { action } => match action {
            ConfigAction::Show => commands::config::show(&ctx)?,
            ConfigAction::Path => commands::config::path(&ctx),
            ConfigAction::Init => commands::config::init(&ctx)?,
        },
    }

    Ok(())
}

/// Logs go to stderr so they never interleave with the chat transcript on stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}
