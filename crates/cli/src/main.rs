//! Climatech CLI: session store migrations and backend checks.
//!
//! # Usage
//!
//! ```bash
//! # Create the storefront session table
//! ct-cli migrate storefront
//!
//! # Create the admin session table
//! ct-cli migrate admin
//!
//! # Both
//! ct-cli migrate all
//!
//! # Check that the business backend answers
//! ct-cli backend check
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "ct-cli")]
#[command(author, version, about = "Climatech CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create session tables
    Migrate {
        #[command(subcommand)]
        target: MigrateTarget,
    },
    /// Business backend utilities
    Backend {
        #[command(subcommand)]
        action: BackendAction,
    },
}

#[derive(Subcommand)]
enum MigrateTarget {
    /// Storefront session table (`tower_sessions.session`)
    Storefront,
    /// Admin session table (`admin.session`)
    Admin,
    /// Both session tables
    All,
}

#[derive(Subcommand)]
enum BackendAction {
    /// Ping the REST API at `API_BASE_URL`
    Check,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), commands::CommandError> {
    match cli.command {
        Commands::Migrate { target } => match target {
            MigrateTarget::Storefront => commands::migrate::storefront().await?,
            MigrateTarget::Admin => commands::migrate::admin().await?,
            MigrateTarget::All => {
                commands::migrate::storefront().await?;
                commands::migrate::admin().await?;
            }
        },
        Commands::Backend { action } => match action {
            BackendAction::Check => commands::backend::check().await?,
        },
    }
    Ok(())
}
