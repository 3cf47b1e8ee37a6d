//! Serve command handler
//!
//! Starts the HTTP server in foreground mode.

use crate::cli::init_logging;
use crate::config::Config;
use crate::error::Result;
use crate::server;
use clap::Args;
use tracing::info;

/// Serve command arguments
#[derive(Args)]
pub struct ServeArgs {
    /// Host address to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to listen on
    #[arg(long, short = 'p')]
    pub port: Option<u16>,
}

/// Run the serve command
pub async fn run(args: ServeArgs) -> Result<()> {
    init_logging("info,tower_http=debug");

    // Load and optionally override config
    let mut config = Config::load_effective()?;

    if let Some(host) = args.host {
        config.server.host = host;
    }
    if let Some(port) = args.port {
        config.server.port = port;
    }

    info!(
        "Starting wayfinder server v{} on {}",
        env!("CARGO_PKG_VERSION"),
        config.server_addr()
    );
    if let Some(city) = config.resolver.forced_city() {
        info!("Forced city: {}", city);
    }
    if let Some(coords) = config.resolver.forced_coords() {
        info!("Forced coordinates: {}", coords);
    }

    // Run the server
    server::run(config).await
}
