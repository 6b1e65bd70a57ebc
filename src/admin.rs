//! Operator commands for inspecting and clearing the address cache.

use crate::cache::{AddressCache, Identity};
use crate::host::HostRuntime;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// Rejected operator command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    /// Caller lacks elevated privilege.
    PermissionDenied,
    /// No player name was given.
    MissingPlayerName,
    /// No online player has that name.
    PlayerNotFound(String),
}

impl fmt::Display for AdminError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AdminError::PermissionDenied => {
                write!(f, "You do not have permission to use this command.")
            }
            AdminError::MissingPlayerName => write!(f, "Please provide a player's username."),
            AdminError::PlayerNotFound(name) => write!(f, "Could not find player {}", name),
        }
    }
}

impl std::error::Error for AdminError {}

/// Cached addresses of a player, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressListing {
    /// The player has no cached addresses.
    Empty,
    /// Addresses in the order they were first seen.
    Addresses(Vec<String>),
}

impl fmt::Display for AddressListing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressListing::Empty => {
                write!(f, "There are no cached IP addresses this player has joined on")
            }
            AddressListing::Addresses(addresses) => write!(
                f,
                "Joined IP addresses ({}): {}",
                addresses.len(),
                addresses.join(", ")
            ),
        }
    }
}

/// Operator-only commands.
pub struct AdminCommands {
    cache: Arc<AddressCache>,
    host: Arc<dyn HostRuntime>,
}

impl AdminCommands {
    pub fn new(cache: Arc<AddressCache>, host: Arc<dyn HostRuntime>) -> Self {
        Self { cache, host }
    }

    fn resolve(&self, caller_elevated: bool, player_name: &str) -> Result<Identity, AdminError> {
        if !caller_elevated {
            return Err(AdminError::PermissionDenied);
        }

        let name = player_name.trim();
        if name.is_empty() {
            return Err(AdminError::MissingPlayerName);
        }

        self.host
            .find_player(name)
            .ok_or_else(|| AdminError::PlayerNotFound(name.to_string()))
    }

    /// List every address cached for a player.
    pub fn list_cached_addresses(
        &self,
        caller_elevated: bool,
        player_name: &str,
    ) -> Result<AddressListing, AdminError> {
        let identity = self.resolve(caller_elevated, player_name)?;

        let addresses: Vec<String> = self
            .cache
            .all_for(&identity)
            .into_iter()
            .map(|entry| entry.address().to_string())
            .collect();

        if addresses.is_empty() {
            Ok(AddressListing::Empty)
        } else {
            Ok(AddressListing::Addresses(addresses))
        }
    }

    /// Forget every address cached for a player. Returns how many were removed.
    pub fn clear_cached_addresses(
        &self,
        caller_elevated: bool,
        player_name: &str,
    ) -> Result<usize, AdminError> {
        let identity = self.resolve(caller_elevated, player_name)?;

        let removed = self.cache.evict(&identity).len();
        info!(
            identity = %identity,
            player = player_name.trim(),
            removed,
            "Cleared cached addresses"
        );

        Ok(removed)
    }
}
