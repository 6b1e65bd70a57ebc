//! Per-connection admit/deny decision.

use crate::cache::{AddressCache, Identity};
use crate::classifier::{Classifier, Verdict};
use crate::config::Settings;
use crate::host::HostRuntime;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Message shown to players kicked for connecting through a flagged address.
pub const FLAGGED_ADDRESS_MESSAGE: &str = "Please disconnect from your VPN/Proxy before joining.";

/// Message shown to players whose address could not be determined.
pub const ADDRESS_UNAVAILABLE_MESSAGE: &str =
    "Your address could not be determined. Try rejoining.";

/// Where a decision came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionSource {
    /// Elevated identity skipped the check.
    Exempt,
    /// Verdict served from the address cache.
    Cache,
    /// Fresh verdict from the classifier.
    Classifier,
}

/// Why the connection had no usable address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MissingAddress {
    /// The host had no address at all.
    Absent,
    /// The host supplied an empty address.
    Empty,
}

/// Reason a connection was denied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No address to evaluate. This is the one fail-closed path.
    AddressUnavailable(MissingAddress),
    /// The address is classified as a VPN or proxy.
    FlaggedAddress(DecisionSource),
}

impl DenyReason {
    /// User-facing kick message.
    pub fn message(&self) -> &'static str {
        match self {
            DenyReason::AddressUnavailable(_) => ADDRESS_UNAVAILABLE_MESSAGE,
            DenyReason::FlaggedAddress(_) => FLAGGED_ADDRESS_MESSAGE,
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of a connection attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Admit(DecisionSource),
    Deny(DenyReason),
}

impl Decision {
    pub fn is_admitted(&self) -> bool {
        matches!(self, Decision::Admit(_))
    }

    /// Kick message if the connection is denied.
    pub fn reason(&self) -> Option<&'static str> {
        match self {
            Decision::Admit(_) => None,
            Decision::Deny(reason) => Some(reason.message()),
        }
    }

    fn from_verdict(verdict: Verdict, source: DecisionSource) -> Self {
        if verdict.is_proxy() {
            Decision::Deny(DenyReason::FlaggedAddress(source))
        } else {
            Decision::Admit(source)
        }
    }
}

/// Decides whether a connecting identity may join.
///
/// The cache is consulted before the classifier and every fresh verdict is
/// recorded, clean or not, so an address is classified at most once per
/// identity. No lock is held while the classifier runs; two simultaneous
/// first joins on the same address may both classify, and the cache keeps
/// whichever verdict lands first.
pub struct ConnectionGuard {
    cache: Arc<AddressCache>,
    classifier: Arc<dyn Classifier>,
    host: Arc<dyn HostRuntime>,
    settings: Settings,
}

impl ConnectionGuard {
    pub fn new(
        cache: Arc<AddressCache>,
        classifier: Arc<dyn Classifier>,
        host: Arc<dyn HostRuntime>,
        settings: Settings,
    ) -> Self {
        Self {
            cache,
            classifier,
            host,
            settings,
        }
    }

    /// Decide on a connection attempt without acting on it.
    pub async fn evaluate(
        &self,
        identity: Identity,
        raw_address: Option<&str>,
        elevated: bool,
    ) -> Decision {
        if elevated && self.settings.exempt_elevated {
            debug!(identity = %identity, "Elevated identity exempt from VPN check");
            return Decision::Admit(DecisionSource::Exempt);
        }

        let address = match raw_address {
            None => {
                return Decision::Deny(DenyReason::AddressUnavailable(MissingAddress::Absent))
            }
            Some(address) if address.is_empty() => {
                return Decision::Deny(DenyReason::AddressUnavailable(MissingAddress::Empty))
            }
            Some(address) => address,
        };

        if let Some(cached) = self.cache.lookup(&identity, address) {
            debug!(
                identity = %identity,
                address = %address,
                verdict = %cached.verdict(),
                "Address cache hit"
            );
            return Decision::from_verdict(cached.verdict(), DecisionSource::Cache);
        }

        let verdict = self.classifier.check(address).await;

        // A concurrent attempt may have recorded first; its verdict stands.
        let verdict = self
            .cache
            .record(identity, address, verdict)
            .map(|entry| entry.verdict())
            .unwrap_or(verdict);

        Decision::from_verdict(verdict, DecisionSource::Classifier)
    }

    /// Handle a connection attempt, disconnecting the identity when denied.
    pub async fn on_connect(
        &self,
        identity: Identity,
        raw_address: Option<&str>,
        elevated: bool,
    ) -> Decision {
        let decision = self.evaluate(identity, raw_address, elevated).await;

        match decision {
            Decision::Deny(reason @ DenyReason::AddressUnavailable(cause)) => {
                warn!(
                    identity = %identity,
                    cause = ?cause,
                    "Connection has no usable address, denying"
                );
                self.host.force_disconnect(&identity, reason.message());
            }
            Decision::Deny(reason @ DenyReason::FlaggedAddress(source)) => {
                if self.settings.log_denied {
                    info!(
                        identity = %identity,
                        address = raw_address.unwrap_or_default(),
                        source = ?source,
                        "Identity attempted to join on a flagged address"
                    );
                }
                self.host.force_disconnect(&identity, reason.message());
            }
            Decision::Admit(source) => {
                if self.settings.log_admitted {
                    debug!(
                        identity = %identity,
                        address = raw_address.unwrap_or_default(),
                        source = ?source,
                        "Admitting connection"
                    );
                }
            }
        }

        decision
    }
}
