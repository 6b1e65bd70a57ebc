//! Per-identity cache of classified addresses.

use crate::classifier::Verdict;
use dashmap::DashMap;
use std::fmt;
use uuid::Uuid;

/// Unique key of a connecting player, supplied by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity(Uuid);

impl Identity {
    /// Wrap a host-provided UUID.
    pub fn new(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Generate a fresh random identity.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl From<Uuid> for Identity {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// An address an identity has connected from, with its classification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    address: String,
    verdict: Verdict,
}

impl CacheEntry {
    fn new(address: &str, verdict: Verdict) -> Self {
        Self {
            address: address.to_string(),
            verdict,
        }
    }

    /// The address exactly as first seen.
    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn is_proxy(&self) -> bool {
        self.verdict.is_proxy()
    }

    fn matches(&self, address: &str) -> bool {
        self.address.eq_ignore_ascii_case(address)
    }
}

/// Thread-safe cache of address classifications, keyed by identity.
///
/// Entries never expire and are never updated: the first verdict recorded for
/// an `(identity, address)` pair stays until the identity is evicted or the
/// cache is cleared. Addresses compare case-insensitively.
#[derive(Debug, Default)]
pub struct AddressCache {
    entries: DashMap<Identity, Vec<CacheEntry>>,
}

impl AddressCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the cached entry for this identity and address, if any.
    pub fn lookup(&self, identity: &Identity, address: &str) -> Option<CacheEntry> {
        if address.is_empty() {
            return None;
        }

        self.entries
            .get(identity)?
            .iter()
            .find(|entry| entry.matches(address))
            .cloned()
    }

    /// Record a verdict unless the address is already cached for the identity.
    ///
    /// Returns the entry that is in the cache afterwards, which is the earlier
    /// one when another writer got there first. Empty addresses are never
    /// stored and yield `None`.
    pub fn record(&self, identity: Identity, address: &str, verdict: Verdict) -> Option<CacheEntry> {
        if address.is_empty() {
            return None;
        }

        // The entry guard holds the shard write lock, making check-and-push atomic.
        let mut entries = self.entries.entry(identity).or_default();
        if let Some(existing) = entries.iter().find(|entry| entry.matches(address)) {
            return Some(existing.clone());
        }

        let entry = CacheEntry::new(address, verdict);
        entries.push(entry.clone());
        Some(entry)
    }

    /// All entries for an identity, in the order they were first recorded.
    pub fn all_for(&self, identity: &Identity) -> Vec<CacheEntry> {
        self.entries
            .get(identity)
            .map(|entries| entries.value().clone())
            .unwrap_or_default()
    }

    /// Remove every entry for an identity, returning what was removed.
    pub fn evict(&self, identity: &Identity) -> Vec<CacheEntry> {
        self.entries
            .remove(identity)
            .map(|(_, entries)| entries)
            .unwrap_or_default()
    }

    /// Number of identities with at least one cached address.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.value().is_empty()).count()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of cached addresses across all identities.
    pub fn entry_count(&self) -> usize {
        self.entries.iter().map(|e| e.value().len()).sum()
    }

    /// Clear all entries from the cache.
    pub fn clear(&self) {
        self.entries.clear();
    }
}
