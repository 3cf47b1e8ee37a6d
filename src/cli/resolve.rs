//! Resolve command handler
//!
//! Runs one resolution and prints it in the requested format.

use crate::cli::init_logging;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::format::url::UrlFormatter;
use crate::format::{available_formats, get_formatter};
use crate::geo::Coordinates;
use crate::resolve::{BrowserCoordinates, LocationResolver, Signals};
use crate::session::SessionLocationStore;
use clap::Args;
use std::fs;

/// Resolve command arguments
#[derive(Args)]
pub struct ResolveArgs {
    /// City to search for (treated as a submitted search)
    #[arg(long, short = 's')]
    pub search: Option<String>,

    /// Override the forced city name
    #[arg(long)]
    pub force_city: Option<String>,

    /// Override the forced coordinates ("lat,lon")
    #[arg(long)]
    pub force_coords: Option<String>,

    /// Coordinates from a client device ("lat,lon")
    #[arg(long)]
    pub browser: Option<String>,

    /// Accuracy of the --browser fix in meters
    #[arg(long, requires = "browser")]
    pub accuracy: Option<f64>,

    /// How the --browser fix was obtained
    #[arg(long, default_value = "cli")]
    pub method: String,

    /// Output format
    #[arg(long, short = 'f', default_value = "text")]
    pub format: String,

    /// Map provider for the url format
    #[arg(long)]
    pub map_provider: Option<String>,

    /// Write output to file
    #[arg(long, short = 'o')]
    pub output: Option<String>,

    /// Log provider activity to stderr
    #[arg(long, short = 'v')]
    pub verbose: bool,

    /// List available formats
    #[arg(short = 'F', long = "list-formats")]
    pub list_formats: bool,
}

/// Run the resolve command
pub async fn run(args: ResolveArgs) -> Result<()> {
    if args.list_formats {
        list_formats();
        return Ok(());
    }

    init_logging(if args.verbose { "debug" } else { "error" });

    let mut config = Config::load_effective()?;
    config.apply_overrides(args.force_city.clone(), args.force_coords.clone());

    let formatter = get_formatter(&args.format)
        .ok_or_else(|| Error::Config(format!("Unknown format: {}", args.format)))?;

    let signals = build_signals(&args, &config)?;
    let resolver = LocationResolver::from_config(&config)?;

    let mut store = SessionLocationStore::new();
    let resolution = resolver.resolve_into(&signals, &mut store).await;

    for warning in &resolution.warnings {
        eprintln!("Warning: {}", warning);
    }

    let output = match (formatter.name(), args.map_provider.as_deref()) {
        ("url", Some(provider)) => {
            UrlFormatter.format_with_provider(&resolution, &config, Some(provider))?
        }
        _ => formatter.format(&resolution, &config)?,
    };

    match &args.output {
        Some(path) => {
            fs::write(path, &output)?;
            eprintln!("Output written to: {}", path);
        }
        None => println!("{}", output.trim_end()),
    }

    Ok(())
}

/// Combine config overrides with the command-line signals
fn build_signals(args: &ResolveArgs, config: &Config) -> Result<Signals> {
    let mut signals = Signals::from_config(&config.resolver);

    if let Some(search) = &args.search {
        signals = signals.with_search(search.clone());
    }

    if let Some(raw) = &args.browser {
        let coords = Coordinates::parse_pair(raw)?;
        let mut browser = BrowserCoordinates::new(coords.lat, coords.lon, args.method.clone());
        if let Some(accuracy) = args.accuracy {
            browser = browser.with_accuracy(accuracy);
        }
        signals = signals.with_browser(browser);
    }

    Ok(signals)
}

fn list_formats() {
    println!("Available formats:");
    for f in available_formats() {
        println!("  {:8} {}", f.name, f.description);
    }
}
