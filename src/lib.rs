//! wayfinder: resolve "where am I?" from whatever signals are available
//!
//! A library and CLI tool that turns a submitted city search, configured
//! overrides, client GPS coordinates or the caller's IP address into exactly
//! one `ResolvedLocation`, falling back to a built-in default when every
//! provider is unreachable.
//!
//! ## Features
//!
//! - Fixed-precedence fallback chain that never fails
//! - Forward geocoding, two-stage reverse geocoding, ordered IP providers
//! - Per-session location store
//! - HTTP API + CLI interface
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use wayfinder::config::Config;
//! use wayfinder::resolve::{LocationResolver, Signals};
//!
//! # async fn demo() -> wayfinder::Result<()> {
//! let config = Config::default();
//! let resolver = LocationResolver::from_config(&config)?;
//!
//! let signals = Signals::from_config(&config.resolver).with_search("Dubai");
//! let location = resolver.resolve(&signals).await;
//! println!("{} via {}", location.coordinates, location.source);
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod error;
pub mod format;
pub mod geo;
pub mod resolve;
pub mod server;
pub mod session;

// Re-export commonly used types
pub use config::Config;
pub use error::{Error, Result};
pub use geo::{Coordinates, GeoProvider, Place};
pub use resolve::{LocationResolver, ResolvedLocation, Signals, SourceTag};
pub use session::SessionLocationStore;
