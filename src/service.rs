//! VPN guard service wiring the cache, classifier and decision components.

use crate::admin::{AddressListing, AdminCommands, AdminError};
use crate::cache::{AddressCache, Identity};
use crate::classifier::proxycheck::ProxyCheckClient;
use crate::classifier::Classifier;
use crate::config::Config;
use crate::guard::{ConnectionGuard, Decision};
use crate::host::HostRuntime;
use crate::sweeper::DisconnectSweeper;
use std::sync::Arc;
use tracing::info;

/// Entry point for the host server.
///
/// Owns the address cache for the lifetime of the process and hands it to
/// the guard, the sweeper and the operator commands.
pub struct GuardService {
    config: Arc<Config>,
    cache: Arc<AddressCache>,
    guard: ConnectionGuard,
    sweeper: DisconnectSweeper,
    admin: AdminCommands,
}

impl GuardService {
    /// Create a service backed by the configured proxycheck client.
    pub fn new(config: Config, host: Arc<dyn HostRuntime>) -> anyhow::Result<Self> {
        let classifier = ProxyCheckClient::new(config.proxycheck.clone())?;
        Ok(Self::with_classifier(config, host, Arc::new(classifier)))
    }

    /// Create a service with a specific classifier.
    pub fn with_classifier(
        config: Config,
        host: Arc<dyn HostRuntime>,
        classifier: Arc<dyn Classifier>,
    ) -> Self {
        let config = Arc::new(config);
        let cache = Arc::new(AddressCache::new());
        let settings = &config.settings;

        let guard = ConnectionGuard::new(
            cache.clone(),
            classifier.clone(),
            host.clone(),
            settings.clone(),
        );
        let sweeper = DisconnectSweeper::new(cache.clone(), host.clone(), settings.ban_all_cached);
        let admin = AdminCommands::new(cache.clone(), host);

        info!(
            classifier = classifier.name(),
            ban_all_cached = settings.ban_all_cached,
            exempt_elevated = settings.exempt_elevated,
            "VPN guard initialized"
        );

        Self {
            config,
            cache,
            guard,
            sweeper,
            admin,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared address cache.
    pub fn cache(&self) -> &Arc<AddressCache> {
        &self.cache
    }

    /// A player is connecting. Denied players are disconnected by the host.
    pub async fn on_connect(
        &self,
        identity: Identity,
        raw_address: Option<&str>,
        elevated: bool,
    ) -> Decision {
        self.guard.on_connect(identity, raw_address, elevated).await
    }

    /// A player left. Returns the number of addresses banned.
    pub fn on_departure(&self, identity: &Identity, is_banned: bool) -> usize {
        self.sweeper.on_departure(identity, is_banned)
    }

    /// Operator query: cached addresses of a player.
    pub fn list_cached_addresses(
        &self,
        caller_elevated: bool,
        player_name: &str,
    ) -> Result<AddressListing, AdminError> {
        self.admin.list_cached_addresses(caller_elevated, player_name)
    }

    /// Operator command: forget a player's cached addresses.
    pub fn clear_cached_addresses(
        &self,
        caller_elevated: bool,
        player_name: &str,
    ) -> Result<usize, AdminError> {
        self.admin.clear_cached_addresses(caller_elevated, player_name)
    }

    /// Drop all cached state. Called when the host shuts the guard down.
    pub fn shutdown(&self) {
        let identities = self.cache.len();
        self.cache.clear();
        info!(identities, "VPN guard stopped, address cache cleared");
    }
}
