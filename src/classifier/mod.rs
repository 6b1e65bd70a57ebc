//! Address classification against an external reputation service.

pub mod proxycheck;

use async_trait::async_trait;
use std::fmt;

/// Classification of a single address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Not known to be a VPN, proxy or anonymizer.
    Clean,
    /// Flagged as a VPN, proxy or anonymizer.
    Proxy,
}

impl Verdict {
    pub fn is_proxy(&self) -> bool {
        matches!(self, Verdict::Proxy)
    }
}

impl From<bool> for Verdict {
    fn from(is_proxy: bool) -> Self {
        if is_proxy {
            Verdict::Proxy
        } else {
            Verdict::Clean
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Clean => write!(f, "clean"),
            Verdict::Proxy => write!(f, "proxy"),
        }
    }
}

/// Why a classification could not be determined.
#[derive(Debug)]
pub enum ClassificationError {
    /// HTTP request failed.
    Http(reqwest::Error),
    /// Timeout.
    Timeout,
    /// Non-success HTTP status.
    Status(reqwest::StatusCode),
    /// The service answered with its own error status.
    ServiceError(String),
    /// Response body did not match the expected schema.
    InvalidResponse(String),
    /// The request URL could not be built.
    InvalidRequest(String),
}

impl fmt::Display for ClassificationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassificationError::Http(e) => write!(f, "HTTP error: {}", e),
            ClassificationError::Timeout => write!(f, "Request timed out"),
            ClassificationError::Status(status) => write!(f, "Unexpected HTTP status {}", status),
            ClassificationError::ServiceError(msg) => write!(f, "Service error: {}", msg),
            ClassificationError::InvalidResponse(msg) => write!(f, "Invalid response: {}", msg),
            ClassificationError::InvalidRequest(msg) => write!(f, "Invalid request: {}", msg),
        }
    }
}

impl std::error::Error for ClassificationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ClassificationError::Http(e) => Some(e),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for ClassificationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ClassificationError::Timeout
        } else {
            ClassificationError::Http(e)
        }
    }
}

/// Source of address verdicts.
///
/// Implementations never fail: anything that prevents a definite answer must
/// come back as [`Verdict::Clean`] so that an outage of the service does not
/// lock out legitimate players.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Classify an address.
    async fn check(&self, address: &str) -> Verdict;

    /// Classifier name for logging.
    fn name(&self) -> &str;
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Classifier double answering from a fixed table and counting calls.
    #[derive(Default)]
    pub struct StaticClassifier {
        verdicts: HashMap<String, Verdict>,
        delay: Option<Duration>,
        calls: AtomicUsize,
    }

    impl StaticClassifier {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with(mut self, address: &str, verdict: Verdict) -> Self {
            self.verdicts.insert(address.to_string(), verdict);
            self
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl Classifier for StaticClassifier {
        async fn check(&self, address: &str) -> Verdict {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            // Unknown addresses behave like an unreachable service.
            self.verdicts.get(address).copied().unwrap_or(Verdict::Clean)
        }

        fn name(&self) -> &str {
            "static"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verdict_from_bool() {
        assert_eq!(Verdict::from(true), Verdict::Proxy);
        assert_eq!(Verdict::from(false), Verdict::Clean);
        assert!(Verdict::Proxy.is_proxy());
        assert!(!Verdict::Clean.is_proxy());
    }

    #[test]
    fn test_verdict_display() {
        assert_eq!(Verdict::Proxy.to_string(), "proxy");
        assert_eq!(Verdict::Clean.to_string(), "clean");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(ClassificationError::Timeout.to_string(), "Request timed out");
        assert_eq!(
            ClassificationError::ServiceError("quota".to_string()).to_string(),
            "Service error: quota"
        );
        assert_eq!(
            ClassificationError::Status(reqwest::StatusCode::BAD_GATEWAY).to_string(),
            "Unexpected HTTP status 502 Bad Gateway"
        );
    }
}
