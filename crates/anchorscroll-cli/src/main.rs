use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use anchorscroll_core::AnchorConfig;

mod commands;
mod layout;

#[derive(Parser)]
#[command(name = "anchorscroll")]
#[command(author, version, about = "Drive the anchor engine against a simulated viewport")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration file (defaults to ~/.config/anchorscroll/config.toml)
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Scroll through the document and report every reached anchor
    Scroll {
        /// Layout file with the document sections
        #[arg(short = 'l', long)]
        layout: Option<PathBuf>,
        /// Pixels moved per scroll event
        #[arg(long, default_value_t = 24.0)]
        step: f64,
        /// Delay between scroll events
        #[arg(long, default_value_t = 32)]
        interval_ms: u64,
    },
    /// Navigate to an anchor
    Goto {
        /// Anchor name
        name: String,
        /// Layout file with the document sections
        #[arg(short = 'l', long)]
        layout: Option<PathBuf>,
        /// How long reached-anchor callbacks stay suppressed around the jump
        #[arg(long, default_value_t = 500)]
        suppress_ms: u64,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let cli = Cli::parse();

    // Load configuration
    let config_path = cli.config.unwrap_or_else(commands::config::default_path);
    let config = AnchorConfig::load(&config_path)?;

    match cli.command {
        Some(Commands::Scroll {
            layout,
            step,
            interval_ms,
        }) => commands::scroll::run(&config, layout.as_deref(), step, interval_ms).await,
        Some(Commands::Goto {
            name,
            layout,
            suppress_ms,
        }) => commands::goto::run(&config, layout.as_deref(), &name, suppress_ms).await,
        Some(Commands::Config) | None => commands::config::run(&config, &config_path),
    }
}
