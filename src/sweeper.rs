//! Ban escalation when a banned identity leaves.

use crate::cache::{AddressCache, Identity};
use crate::host::HostRuntime;
use std::sync::Arc;
use tracing::{debug, info};

/// Propagates an existing ban onto every address an identity was seen on.
///
/// The sweeper never decides to ban anyone; it only acts on the host's
/// report that the departing identity is already banned.
pub struct DisconnectSweeper {
    cache: Arc<AddressCache>,
    host: Arc<dyn HostRuntime>,
    ban_all_cached: bool,
}

impl DisconnectSweeper {
    pub fn new(cache: Arc<AddressCache>, host: Arc<dyn HostRuntime>, ban_all_cached: bool) -> Self {
        Self {
            cache,
            host,
            ban_all_cached,
        }
    }

    /// Handle an identity leaving. Returns the number of addresses banned.
    pub fn on_departure(&self, identity: &Identity, is_banned: bool) -> usize {
        if !self.ban_all_cached || !is_banned {
            return 0;
        }

        // Evicted in one step; bans apply to exactly what was removed.
        let entries = self.cache.evict(identity);
        if entries.is_empty() {
            debug!(identity = %identity, "Banned identity left with no cached addresses");
            return 0;
        }

        for entry in &entries {
            self.host.ban_address(entry.address());
        }

        info!(
            identity = %identity,
            addresses = entries.len(),
            "Banned cached addresses of banned identity"
        );

        entries.len()
    }
}
