//! turnbell
//!
//! Reads agent lifecycle events as JSON lines on stdin and shows one desktop
//! notification per finished turn.

mod config;
mod error;
mod notifier;
mod source;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::io::BufReader;
use tracing::{error, info};

use turnbell::{HookRegistry, register_turn_completion_hooks};

use crate::config::TurnbellConfig;
use crate::error::Result;
use crate::notifier::{CommandNotifier, Notification, Notifier, StdoutNotifier};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file (default: ~/.config/turnbell/config.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Notification title, overriding the configuration
    #[arg(long)]
    title: Option<String>,

    /// Notification body, overriding the configuration
    #[arg(long)]
    message: Option<String>,

    /// Print notifications to stdout instead of showing them
    #[arg(long)]
    dry_run: bool,
}

/// Initializes structured logging with tracing.
///
/// Supports two output formats via `TURNBELL_LOG_FORMAT` environment variable:
/// - `json`: Machine-readable JSON logs
/// - `pretty`: Human-readable formatted logs (default)
///
/// Log level is controlled via `RUST_LOG` environment variable. Logs go to
/// stderr; stdout is reserved for dry-run output.
fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt};

    let format = std::env::var("TURNBELL_LOG_FORMAT")
        .unwrap_or_else(|_| "pretty".to_string())
        .to_lowercase();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("turnbell=info,turnbell_cli=info"));

    match format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .init();
        }
        _ => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(false)
                .with_line_number(false)
                .init();
        }
    }
}

/// Loads the configuration and applies command line overrides.
fn load_config(args: &Args) -> Result<TurnbellConfig> {
    let mut config = TurnbellConfig::load(args.config.as_deref())?;

    if let Some(title) = &args.title {
        config.notification.title.clone_from(title);
    }
    if let Some(message) = &args.message {
        config.notification.message.clone_from(message);
    }

    config.validate()?;
    Ok(config)
}

fn build_notifier(args: &Args, config: &TurnbellConfig) -> Result<Arc<dyn Notifier>> {
    if args.dry_run {
        return Ok(Arc::new(StdoutNotifier));
    }

    let Some(template) = &config.notification.command else {
        return Ok(Arc::new(CommandNotifier::platform_default()));
    };

    let notifier = CommandNotifier::from_template(template)?;
    if config.notification.detach {
        Ok(Arc::new(notifier.detached()))
    } else {
        Ok(Arc::new(notifier))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing();

    let config = match load_config(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load configuration: {e}");
            return Err(e);
        }
    };

    let notification = Notification::from_settings(&config.notification);
    let notifier = build_notifier(&args, &config)?;

    let mut registry = HookRegistry::new();
    register_turn_completion_hooks(&mut registry, move || {
        let notifier = Arc::clone(&notifier);
        let notification = notification.clone();
        async move {
            notifier.notify(&notification).await?;
            info!("Turn complete notification sent");
            anyhow::Ok(())
        }
    });

    info!("Listening for lifecycle events on stdin");

    let stdin = BufReader::new(tokio::io::stdin());
    tokio::select! {
        result = source::run(stdin, &registry) => {
            let stats = result?;
            info!(
                dispatched = stats.dispatched,
                skipped = stats.skipped,
                failed = stats.failed,
                "Event stream closed"
            );
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received interrupt, shutting down");
        }
    }

    Ok(())
}
