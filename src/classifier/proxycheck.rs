//! proxycheck.io classification client.

use super::{ClassificationError, Classifier, Verdict};
use crate::config::ProxyCheckConfig;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// proxycheck.io v2 response.
///
/// Per-address results are keyed by the queried address at the top level,
/// next to the status fields, so they are collected through `flatten`.
#[derive(Debug, Deserialize)]
struct ProxyCheckResponse {
    /// "ok", "warning", "denied" or "error".
    #[serde(default)]
    status: Option<String>,

    /// Explanation accompanying a non-ok status.
    #[serde(default)]
    message: Option<String>,

    #[serde(flatten)]
    blocks: HashMap<String, serde_json::Value>,
}

/// Result block for a single address.
///
/// Only the fields the decision needs are read; network metadata such as
/// `asn` or `provider` is skipped whatever its shape.
#[derive(Debug, Deserialize)]
struct AddressReport {
    /// Usually "yes" or "no", but any scalar is accepted.
    #[serde(default)]
    proxy: Option<serde_json::Value>,

    /// Kind of anonymizer, e.g. "VPN" or "SOCKS5".
    #[serde(rename = "type", default)]
    kind: Option<serde_json::Value>,
}

/// Render a JSON value as the text the service would have sent.
/// `null` counts as absent.
fn value_text(value: serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::Null => None,
        serde_json::Value::String(s) => Some(s),
        other => Some(other.to_string()),
    }
}

/// Interpretation of a response body for one address.
#[derive(Debug)]
enum Lookup {
    /// The service answered for this address.
    Answered { proxy: String, kind: Option<String> },
    /// The service reported its own error status.
    ServiceError(String),
    /// Expected fields were missing or had the wrong shape.
    Malformed(String),
}

impl Lookup {
    fn interpret(response: ProxyCheckResponse, address: &str) -> Self {
        let Some(status) = response.status else {
            return Lookup::Malformed("missing status".to_string());
        };

        if status.eq_ignore_ascii_case("error") {
            return Lookup::ServiceError(
                response.message.unwrap_or_else(|| "status error".to_string()),
            );
        }

        let block = response
            .blocks
            .into_iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(address))
            .map(|(_, value)| value);

        let Some(block) = block else {
            let detail = match response.message {
                Some(msg) => format!("no result for {} (status {}: {})", address, status, msg),
                None => format!("no result for {} (status {})", address, status),
            };
            return Lookup::Malformed(detail);
        };

        let report = match serde_json::from_value::<AddressReport>(block) {
            Ok(report) => report,
            Err(e) => {
                return Lookup::Malformed(format!("bad result block for {}: {}", address, e))
            }
        };

        match report.proxy.and_then(value_text) {
            Some(proxy) => Lookup::Answered {
                proxy,
                kind: report.kind.and_then(value_text),
            },
            None => Lookup::Malformed(format!("missing proxy field for {}", address)),
        }
    }
}

/// Anything other than an explicit "no" counts as flagged.
fn proxy_indicator_to_verdict(indicator: &str) -> Verdict {
    Verdict::from(!indicator.trim().eq_ignore_ascii_case("no"))
}

/// Client for the proxycheck.io lookup API.
pub struct ProxyCheckClient {
    config: ProxyCheckConfig,
    client: Client,
}

impl ProxyCheckClient {
    /// Create a new client. Every request is bounded by `timeout_ms`.
    pub fn new(config: ProxyCheckConfig) -> Result<Self, ClassificationError> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self { config, client })
    }

    /// Build the lookup URL for an address.
    fn lookup_url(&self, address: &str) -> Result<Url, ClassificationError> {
        let mut url = Url::parse(&self.config.endpoint).map_err(|e| {
            ClassificationError::InvalidRequest(format!(
                "bad endpoint {}: {}",
                self.config.endpoint, e
            ))
        })?;

        url.path_segments_mut()
            .map_err(|_| {
                ClassificationError::InvalidRequest(format!(
                    "endpoint cannot take a path: {}",
                    self.config.endpoint
                ))
            })?
            .pop_if_empty()
            .push(address);

        let mut params = Vec::new();
        if self.config.vpn {
            params.push(("vpn", "1"));
        }
        if self.config.asn {
            params.push(("asn", "1"));
        }
        if let Some(key) = self.config.api_key() {
            params.push(("key", key));
        }
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }

        Ok(url)
    }

    /// Query the service for an address, surfacing every failure.
    pub async fn lookup(&self, address: &str) -> Result<Verdict, ClassificationError> {
        let url = self.lookup_url(address)?;

        debug!(address = %address, "Querying proxycheck");

        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ClassificationError::Status(response.status()));
        }

        let body: ProxyCheckResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                ClassificationError::Timeout
            } else {
                ClassificationError::InvalidResponse(format!("Failed to parse response: {}", e))
            }
        })?;

        match Lookup::interpret(body, address) {
            Lookup::Answered { proxy, kind } => {
                let verdict = proxy_indicator_to_verdict(&proxy);
                debug!(
                    address = %address,
                    proxy = %proxy,
                    kind = ?kind,
                    verdict = %verdict,
                    "proxycheck lookup complete"
                );
                Ok(verdict)
            }
            Lookup::ServiceError(msg) => Err(ClassificationError::ServiceError(msg)),
            Lookup::Malformed(msg) => Err(ClassificationError::InvalidResponse(msg)),
        }
    }
}

#[async_trait]
impl Classifier for ProxyCheckClient {
    async fn check(&self, address: &str) -> Verdict {
        match self.lookup(address).await {
            Ok(verdict) => verdict,
            Err(e) => {
                warn!(
                    classifier = self.name(),
                    address = %address,
                    error = %e,
                    "Classification unavailable, treating address as clean"
                );
                Verdict::Clean
            }
        }
    }

    fn name(&self) -> &str {
        "proxycheck"
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use tokio::net::TcpListener;

    /// Endpoint that accepts connections and never answers them.
    pub async fn serve_silently() -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        format!("http://{}/v2", addr)
    }
}
