//! Config command handler
//!
//! View and modify configuration settings.

use crate::config::Config;
use crate::constants::env;
use crate::error::Result;
use clap::Args;

/// Config command arguments
#[derive(Args)]
pub struct ConfigArgs {
    /// Configuration key (e.g., "resolver.forced_city")
    pub key: Option<String>,

    /// Value to set (if not provided, shows current value)
    pub value: Option<String>,

    /// Show config file path
    #[arg(long)]
    pub path: bool,

    /// Reset config to defaults
    #[arg(long)]
    pub reset: bool,
}

/// Run the config command
pub fn run(args: ConfigArgs) -> Result<()> {
    // Show path
    if args.path {
        let path = Config::config_path()?;
        println!("{}", path.display());
        return Ok(());
    }

    // Reset config
    if args.reset {
        let config = Config::default();
        config.save()?;
        println!("Configuration reset to defaults");
        return Ok(());
    }

    let mut config = Config::load()?;

    match (&args.key, &args.value) {
        // No arguments: show all config
        (None, None) => {
            show_all_config(&config);
        }

        // Key only: show that value
        (Some(key), None) => {
            if let Some(value) = config.get(key) {
                println!("{}", value);
            } else {
                eprintln!("Unknown config key: {}", key);
                eprintln!("\nAvailable keys:");
                for k in Config::available_keys() {
                    eprintln!("  {}", k);
                }
                std::process::exit(1);
            }
        }

        // Key and value: set the value
        (Some(key), Some(value)) => {
            config.set(key, value)?;
            config.save()?;
            println!("{} = {}", key, value);
        }

        // Value without key: not valid
        (None, Some(_)) => {
            eprintln!("Error: Must specify a key to set a value");
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Display all configuration values
fn show_all_config(config: &Config) {
    println!("[resolver]");
    println!("forced_city = \"{}\"", config.resolver.forced_city);
    println!("forced_coords = \"{}\"", config.resolver.forced_coords);
    println!("default_city = \"{}\"", config.resolver.default_city);
    println!("fill_defaults = {}", config.resolver.fill_defaults);
    println!("fill_country = \"{}\"", config.resolver.fill_country);
    println!("fill_time_zone = \"{}\"", config.resolver.fill_time_zone);
    println!("ip_prefer_reverse = {}", config.resolver.ip_prefer_reverse);
    println!();

    println!("[providers]");
    println!("user_agent = \"{}\"", config.providers.user_agent);
    println!("forward_timeout_secs = {}", config.providers.forward_timeout_secs);
    println!("reverse_timeout_secs = {}", config.providers.reverse_timeout_secs);
    println!("ip_timeout_secs = {}", config.providers.ip_timeout_secs);
    println!("ip_providers = {:?}", config.providers.ip_providers);
    println!();

    println!("[server]");
    println!("host = \"{}\"", config.server.host);
    println!("port = {}", config.server.port);
    println!("session_idle_secs = {}", config.server.session_idle_secs);
    println!();

    println!("[url]");
    println!("default = \"{}\"", config.url.default);
    println!();

    println!("[url.providers]");
    let mut providers: Vec<_> = config.url.providers.iter().collect();
    providers.sort();
    for (name, template) in providers {
        println!("{} = \"{}\"", name, template);
    }

    for var in [env::FORCE_CITY, env::FORCE_COORDS] {
        if let Ok(value) = std::env::var(var) {
            println!();
            println!("# {} is set and overrides the file: \"{}\"", var, value);
        }
    }
}
