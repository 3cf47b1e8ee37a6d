//! Server shared state
//!
//! Holds configuration, the resolver and the live sessions.

use crate::config::Config;
use crate::error::Result;
use crate::geo::{ProviderNames, ProviderSet};
use crate::resolve::{LocationResolver, Signals};
use crate::session::SessionRegistry;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::RwLock;

/// Shared state for the HTTP server
pub struct AppState {
    /// Configuration
    pub config: Arc<RwLock<Config>>,

    /// Resolver over the configured providers
    pub resolver: Arc<LocationResolver>,

    /// Live sessions
    pub sessions: RwLock<SessionRegistry>,

    providers: ProviderNames,
    started: Instant,
}

impl AppState {
    /// Create state backed by the network providers the config names
    pub fn new(config: Config) -> Result<Self> {
        let providers = ProviderSet::from_config(&config.providers)?;
        Ok(Self::with_providers(config, providers))
    }

    /// Create state over an explicit provider set
    pub fn with_providers(config: Config, providers: ProviderSet) -> Self {
        let names = providers.describe();
        let resolver = LocationResolver::new(providers, &config.resolver);
        let sessions = SessionRegistry::with_idle_timeout(config.server.session_idle_secs);
        Self {
            config: Arc::new(RwLock::new(config)),
            resolver: Arc::new(resolver),
            sessions: RwLock::new(sessions),
            providers: names,
            started: Instant::now(),
        }
    }

    /// Names of the providers the resolver consults
    pub fn providers(&self) -> &ProviderNames {
        &self.providers
    }

    /// Signals every resolution starts from (the forced overrides)
    pub async fn base_signals(&self) -> Signals {
        let config = self.config.read().await;
        Signals::from_config(&config.resolver)
    }

    pub fn uptime_secs(&self) -> u64 {
        self.started.elapsed().as_secs()
    }
}
