//! Concord - Discord OAuth2 identity broker
//!
//! Main entry point for the Concord CLI.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;

use commands::{connections, exchange, guilds, inspect, join, refresh, revoke, url, user};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Concord - Discord OAuth2 identity broker
#[derive(Parser)]
#[command(name = "concord")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Config file to use instead of discovery
    #[arg(long, global = true, env = "CONCORD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the authorization URL
    Url(url::UrlArgs),

    /// Exchange an authorization code for a token
    Exchange(exchange::ExchangeArgs),

    /// Refresh a token
    Refresh(refresh::RefreshArgs),

    /// Revoke a token
    Revoke(revoke::RevokeArgs),

    /// Show the user behind a token
    User(user::UserArgs),

    /// List the user's guilds
    Guilds(guilds::GuildsArgs),

    /// List the user's linked connections
    Connections(connections::ConnectionsArgs),

    /// Add the user to a guild
    Join(join::JoinArgs),

    /// Verify a token and show its grant
    Inspect(inspect::InspectArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Console (human-readable) + rotating JSON file
    let filter = if cli.verbose {
        "concord=debug,concord_client=debug,concord_oauth=debug,concord_cache=debug,concord_config=debug,info"
    } else {
        "concord=info,concord_client=info,concord_oauth=info,warn"
    };

    let log_dir = concord_config::config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let file_appender = tracing_appender::rolling::daily(&log_dir, "concord.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    use tracing_subscriber::prelude::*;
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_writer(std::io::stderr)
                .with_filter(tracing_subscriber::EnvFilter::new(filter)),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(non_blocking)
                .with_filter(tracing_subscriber::EnvFilter::new(
                    "concord=trace,concord_client=trace,concord_oauth=trace,concord_cache=trace,concord_config=trace,info",
                )),
        )
        .init();

    let ctx = commands::Context {
        json_output: cli.json,
        verbose: cli.verbose,
        config_path: cli.config,
    };

    match cli.command {
        Commands::Url(args) => url::run(args, &ctx).await,
        Commands::Exchange(args) => exchange::run(args, &ctx).await,
        Commands::Refresh(args) => refresh::run(args, &ctx).await,
        Commands::Revoke(args) => revoke::run(args, &ctx).await,
        Commands::User(args) => user::run(args, &ctx).await,
        Commands::Guilds(args) => guilds::run(args, &ctx).await,
        Commands::Connections(args) => connections::run(args, &ctx).await,
        Commands::Join(args) => join::run(args, &ctx).await,
        Commands::Inspect(args) => inspect::run(args, &ctx).await,
    }
}
