//! Sessionkeep CLI - standalone session server

use clap::Parser;
use sessionkeep::config::expand_path;
use sessionkeep::{Config, Core};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "sessionkeep")]
#[command(author = "Sessionkeep Team")]
#[command(version)]
#[command(about = "Sessionkeep - in-memory HTTP session store", long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "~/.sessionkeep/config.toml")]
    config: PathBuf,

    /// Override server port
    #[arg(short, long)]
    port: Option<u16>,

    /// Override server host
    #[arg(long)]
    host: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Initialize a new config file with defaults
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("sessionkeep={},tower_http=debug", log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = expand_path(&args.config);

    // Handle --init flag
    if args.init {
        if config_path.exists() {
            tracing::warn!("Config file already exists: {}", config_path.display());
            return Ok(());
        }
        Config::create_default(&config_path)?;
        tracing::info!("Created default config at: {}", config_path.display());
        return Ok(());
    }

    // Load configuration
    let mut config = if config_path.exists() {
        Config::from_file(&config_path)?
    } else {
        tracing::warn!(
            "Config file not found at {}, using defaults",
            config_path.display()
        );
        Config::default()
    };

    config.apply_env_overrides();

    // Apply CLI overrides
    if let Some(port) = args.port {
        config.server.port = port;
    }
    if let Some(host) = args.host {
        config.server.host = host;
    }

    // Validates the configuration
    let core = Core::new(config)?;

    tracing::info!(
        "Session cookie '{}', lifetime {}s",
        core.config.session.cookie_name,
        core.config.session.max_lifetime_secs
    );

    core.start_sweeper().await;

    // Blocks until shutdown
    let result = core.start_api_server().await;

    core.stop_sweeper().await;
    result?;

    Ok(())
}
