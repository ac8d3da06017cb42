//! Tidemark CLI - Applies numbered SQL migration files to a database

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tidemark_storage::Database;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod commands;
mod config;
mod connection;
mod highlight;
mod output;

use commands::{completions, history, migrate};
use config::{Settings, SettingsArgs};

#[derive(Parser)]
#[command(name = "tidemark")]
#[command(author, version, about = "Applies numbered SQL migration files exactly once, in order")]
pub struct Cli {
    /// Config file (default: ./tidemark.toml when present)
    #[arg(short, long, global = true, env = "TIDEMARK_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: SettingsArgs,

    /// Show migration history instead of migrating
    #[arg(long)]
    pub history: bool,

    /// History output format: table, json
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,

    /// Verbosity level (-v echoes executed SQL, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Resolve settings: defaults, then config file, then flags/env
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let file = Settings::load(self.config.as_deref())?;
        Ok(self.overrides.apply(file))
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Apply pending migrations (default)
    Migrate,
    /// Show applied migrations, newest first
    History,
    /// Inspect or create the config file
    Config(commands::config::ConfigArgs),
    /// Generate shell completions
    Completions(completions::CompletionsArgs),
}

/// Application context with resolved settings and the open database
pub struct AppContext {
    pub settings: Settings,
    pub database: Arc<dyn Database>,
}

impl AppContext {
    pub async fn new(cli: &Cli) -> anyhow::Result<Self> {
        let settings = cli.settings()?;
        let database = connection::connect(&settings).await?;
        Ok(Self { settings, database })
    }
}

fn init_logging(cli: &Cli) {
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()))
        .init();
}

async fn run(cli: &Cli) -> anyhow::Result<()> {
    match &cli.command {
        Some(Commands::Config(args)) => return commands::config::run(args, cli),
        Some(Commands::Completions(args)) => return completions::run(args),
        _ => {}
    }

    let ctx = AppContext::new(cli).await?;

    match &cli.command {
        Some(Commands::History) => history::run(cli, &ctx).await,
        _ if cli.history => history::run(cli, &ctx).await,
        _ => migrate::run(cli, &ctx).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli);

    tracing::debug!("Starting tidemark CLI");

    match run(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {:#}", err);
            eprintln!("Run 'tidemark --help' for usage.");
            ExitCode::FAILURE
        }
    }
}
