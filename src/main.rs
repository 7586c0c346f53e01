//! pinlink-agent main entry point
//!
//! This binary serves as the entry point for the device agent. It handles
//! CLI parsing, logging setup, hardware bring-up, and the endpoint
//! lifecycle around connectivity.

use clap::{Parser, Subcommand};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pinlink_agent::channel::{CommandProcessor, MessageChannel};
use pinlink_agent::config::Config;
use pinlink_agent::endpoint::{ConnectivityMonitor, EndpointServer};
use pinlink_agent::gpio::PinController;
use pinlink_agent::{APP_NAME, VERSION};

/// Network-connected GPIO control endpoint
#[derive(Parser, Debug)]
#[command(name = APP_NAME, version = VERSION, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file path
    #[arg(
        short,
        long,
        global = true,
        default_value = "/etc/pinlink-agent/config.toml"
    )]
    config: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the agent
    Start,

    /// Show the effective configuration
    Status,

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    if let Err(e) = run(cli).await {
        error!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Initialize structured logging with tracing
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Run the CLI command
async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Start => {
            info!("Starting {} v{} with config: {}", APP_NAME, VERSION, cli.config);
            let config = Config::from_file(&cli.config)?;
            config.validate()?;

            // Hardware bring-up is fail-fast: a line that cannot be driven
            // makes the endpoint pointless.
            let pin = Arc::new(PinController::new(config.pin.clone()));
            pin.probe().await?;
            info!(
                "output line {} on '{}' ready, driven low",
                config.pin.line, config.pin.chip
            );

            let processor = CommandProcessor::new(pin);
            let channel = Arc::new(MessageChannel::new(
                processor,
                config.endpoint.max_frame_len,
            ));
            let server = EndpointServer::new(config.endpoint.clone(), channel);
            let monitor = ConnectivityMonitor::new(server);

            // The network stack is an external collaborator; link bring-up
            // at process start stands in for its up-signal here.
            monitor.network_up().await?;

            shutdown_signal().await;

            monitor.network_down().await?;
            info!("Agent stopped");
            Ok(())
        }
        Commands::Status => {
            let config = Config::from_file(&cli.config)?;
            config.validate()?;
            println!(
                "endpoint: ws://{}:{}{} (max frame {} bytes)",
                config.endpoint.bind_address,
                config.endpoint.bind_port,
                config.endpoint.route,
                config.endpoint.max_frame_len
            );
            println!(
                "pin: line {} on '{}' (idle bias: {})",
                config.pin.line,
                config.pin.chip,
                if config.pin.configure_idle_bias {
                    "configured with each write"
                } else {
                    "untouched"
                }
            );
            Ok(())
        }
        Commands::Version => {
            println!("{} v{}", APP_NAME, VERSION);
            Ok(())
        }
    }
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }
}
