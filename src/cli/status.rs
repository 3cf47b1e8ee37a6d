//! Status command handler
//!
//! Shows configured providers and whether the server is up.

use crate::config::Config;
use crate::error::Result;
use crate::geo::ip_location::available_ip_providers;
use crate::geo::ProviderSet;
use crate::resolve::LocationResolver;
use clap::Args;

/// Status command arguments
#[derive(Args)]
pub struct StatusArgs {
    /// Check if server is running (tries to connect)
    #[arg(long)]
    pub server: bool,
}

/// Run the status command
pub async fn run(args: StatusArgs) -> Result<()> {
    let config = Config::load_effective()?;

    // Check server status if requested
    if args.server {
        check_server_status(&config).await;
    }

    let providers = ProviderSet::from_config(&config.providers)?;
    let names = providers.describe();
    let resolver = LocationResolver::new(providers, &config.resolver);

    println!("wayfinder v{}", env!("CARGO_PKG_VERSION"));
    println!();

    println!("Strategies: {}", resolver.strategy_names().join(" -> "));
    println!();

    println!("Providers:");
    println!("  Forward:  {}", names.forward);
    println!("  Reverse:  {}", names.reverse.join(", "));
    println!("  IP:       {}", names.ip.join(", "));
    println!();

    println!("Known IP backends:");
    for backend in available_ip_providers() {
        let marker = if names.ip.iter().any(|n| n == backend.name) { "*" } else { " " };
        println!("  {} {:12} {}", marker, backend.name, backend.url);
    }
    println!();

    match (config.resolver.forced_city(), config.resolver.forced_coords()) {
        (None, None) => println!("Forced location: none"),
        (city, coords) => {
            if let Some(city) = city {
                println!("Forced city: {}", city);
            }
            if let Some(coords) = coords {
                println!("Forced coordinates: {}", coords);
            }
        }
    }

    Ok(())
}

/// Check if the server is running
async fn check_server_status(config: &Config) {
    let url = format!("http://{}/api/status", config.server_addr());

    match reqwest::get(&url).await {
        Ok(response) => {
            if response.status().is_success() {
                println!("Server: RUNNING on {}", config.server_addr());
                if let Ok(body) = response.text().await {
                    if let Ok(status) = serde_json::from_str::<serde_json::Value>(&body) {
                        if let Some(version) = status.get("version").and_then(|v| v.as_str()) {
                            println!("  Version: {}", version);
                        }
                        if let Some(sessions) = status.get("sessions").and_then(|v| v.as_u64()) {
                            println!("  Sessions: {}", sessions);
                        }
                    }
                }
            } else {
                println!("Server: ERROR (status {})", response.status());
            }
        }
        Err(_) => {
            println!("Server: NOT RUNNING on {}", config.server_addr());
        }
    }
    println!();
}
