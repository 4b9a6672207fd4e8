mod commands;

use std::path::PathBuf;

use anyhow::Result;
use busy_blocker_core::settings::MAX_DAYS_AHEAD;
use busy_blocker_google::Role;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "busy-blocker", version)]
#[command(about = "Block out busy time from one Google Calendar in another")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Authorize access to the source or destination calendar
    Login {
        #[arg(value_enum)]
        role: RoleArg,
    },
    /// Create busy placeholders for upcoming source events and remove stale ones
    Sync {
        /// How many days ahead to look (defaults to days_ahead from config.toml)
        #[arg(
            long,
            value_parser = clap::value_parser!(u32).range(1..=i64::from(MAX_DAYS_AHEAD))
        )]
        days_ahead: Option<u32>,

        /// Only report what would change
        #[arg(
            long,
            action = ArgAction::Set,
            num_args = 0..=1,
            default_value_t = false,
            default_missing_value = "true"
        )]
        dry_run: bool,
    },
    /// Delete every placeholder from the destination calendar
    Clean {
        /// Only report what would be deleted
        #[arg(
            long,
            action = ArgAction::Set,
            num_args = 0..=1,
            default_value_t = false,
            default_missing_value = "true"
        )]
        dry_run: bool,
    },
    /// Install the OAuth client JSON downloaded from the Google Cloud console
    SetOauthCredentials {
        /// Path to the credentials JSON file
        #[arg(short, long)]
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RoleArg {
    Source,
    Destination,
}

impl From<RoleArg> for Role {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::Source => Role::Source,
            RoleArg::Destination => Role::Destination,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Login { role } => commands::login::run(role.into()).await,
        Commands::Sync {
            days_ahead,
            dry_run,
        } => commands::sync::run(days_ahead, dry_run).await,
        Commands::Clean { dry_run } => commands::clean::run(dry_run).await,
        Commands::SetOauthCredentials { path } => commands::credentials::run(&path),
    }
}
