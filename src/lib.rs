//! VPN guard for multiplayer servers.
//!
//! Classifies the address of every connecting player as VPN/proxy or clean,
//! remembers the verdict per player, and kicks players that connect through
//! a flagged address.
//!
//! # Features
//!
//! - **proxycheck.io Integration** - Look up addresses with a bounded timeout
//! - **Per-Player Cache** - Each address is classified once per player, with no TTL
//! - **Fail-Open Lookups** - Service outages admit players instead of locking them out
//! - **Fail-Closed Addresses** - Connections without an address are always denied
//! - **Ban Escalation** - Ban every cached address of a player who leaves banned
//! - **Operator Exemption** - Optionally skip the check for elevated players
//!
//! # Example Configuration
//!
//! ```yaml
//! settings:
//!   ban_all_cached: true
//!   exempt_elevated: false
//!
//! proxycheck:
//!   api_key: "${PROXYCHECK_API_KEY}"
//!   timeout_ms: 5000
//! ```

pub mod admin;
pub mod cache;
pub mod classifier;
pub mod config;
pub mod guard;
pub mod host;
pub mod service;
pub mod sweeper;

pub use cache::{AddressCache, Identity};
pub use classifier::Verdict;
pub use config::Config;
pub use guard::Decision;
pub use host::HostRuntime;
pub use service::GuardService;
