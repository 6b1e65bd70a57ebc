//! Configuration types for the VPN guard.

use reqwest::Url;
use serde::{Deserialize, Serialize};

/// Root configuration for the VPN guard.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    /// Global settings.
    #[serde(default)]
    pub settings: Settings,

    /// proxycheck.io classification service.
    #[serde(default)]
    pub proxycheck: ProxyCheckConfig,
}

/// Global settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    /// Ban every cached address of an identity that leaves while banned.
    #[serde(default)]
    pub ban_all_cached: bool,

    /// Skip all checks for identities with elevated privilege.
    #[serde(default)]
    pub exempt_elevated: bool,

    /// Log denied connections.
    #[serde(default = "default_true")]
    pub log_denied: bool,

    /// Log admitted connections.
    #[serde(default)]
    pub log_admitted: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ban_all_cached: false,
            exempt_elevated: false,
            log_denied: true,
            log_admitted: false,
        }
    }
}

/// proxycheck.io client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProxyCheckConfig {
    /// Base URL of the lookup endpoint. The address is appended as a path segment.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Optional API key (supports ${ENV_VAR} syntax). Empty means anonymous.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in milliseconds.
    #[serde(default = "default_timeout")]
    pub timeout_ms: u64,

    /// Ask the service for VPN detection in addition to open proxies.
    #[serde(default = "default_true")]
    pub vpn: bool,

    /// Ask the service for ASN/network metadata.
    #[serde(default = "default_true")]
    pub asn: bool,
}

impl Default for ProxyCheckConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            api_key: None,
            timeout_ms: default_timeout(),
            vpn: true,
            asn: true,
        }
    }
}

impl ProxyCheckConfig {
    /// API key if one is configured and non-empty after env expansion.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

fn default_endpoint() -> String {
    "https://proxycheck.io/v2".to_string()
}

fn default_timeout() -> u64 {
    5000
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load(path: &std::path::Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text, expanding `${VAR}` references first.
    pub fn from_yaml(content: &str) -> anyhow::Result<Self> {
        let expanded = expand_env_vars(content)?;
        // An empty document deserializes to null; treat it as all defaults.
        let config: Config = if expanded.trim().is_empty() {
            Config::default()
        } else {
            serde_yaml::from_str(&expanded)?
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.proxycheck.timeout_ms == 0 {
            anyhow::bail!("proxycheck.timeout_ms must be greater than 0");
        }

        let url = match Url::parse(&self.proxycheck.endpoint) {
            Ok(url) => url,
            Err(e) => anyhow::bail!(
                "Invalid proxycheck endpoint '{}': {}",
                self.proxycheck.endpoint,
                e
            ),
        };

        if !matches!(url.scheme(), "http" | "https") || url.cannot_be_a_base() {
            anyhow::bail!(
                "proxycheck endpoint must be an http(s) URL: {}",
                self.proxycheck.endpoint
            );
        }

        Ok(())
    }

    /// Generate example configuration YAML.
    pub fn example() -> String {
        r#"# VPN Guard Configuration

settings:
  ban_all_cached: false        # ban every cached address of a player who leaves banned
  exempt_elevated: false       # operators skip the VPN check entirely
  log_denied: true
  log_admitted: false

# Address classification service
proxycheck:
  endpoint: "https://proxycheck.io/v2"
  api_key: "${PROXYCHECK_API_KEY}"  # optional, leave unset for anonymous lookups
  timeout_ms: 5000             # lookups slower than this are treated as clean
  vpn: true
  asn: true
"#
        .to_string()
    }
}

/// Expand environment variables in the format ${VAR_NAME}.
fn expand_env_vars(content: &str) -> anyhow::Result<String> {
    let re = regex::Regex::new(r"\$\{([^}]+)\}")?;

    let expanded = re.replace_all(content, |caps: &regex::Captures| {
        std::env::var(&caps[1]).unwrap_or_default()
    });

    Ok(expanded.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert!(!settings.ban_all_cached);
        assert!(!settings.exempt_elevated);
        assert!(settings.log_denied);
        assert!(!settings.log_admitted);
    }

    #[test]
    fn test_default_proxycheck() {
        let config = ProxyCheckConfig::default();
        assert_eq!(config.endpoint, "https://proxycheck.io/v2");
        assert_eq!(config.timeout_ms, 5000);
        assert!(config.api_key().is_none());
        assert!(config.vpn);
        assert!(config.asn);
    }

    #[test]
    fn test_expand_env_vars() {
        std::env::set_var("VPN_GUARD_TEST_KEY", "secret123");
        let input = "api_key: \"${VPN_GUARD_TEST_KEY}\"";
        let result = expand_env_vars(input).unwrap();
        assert_eq!(result, "api_key: \"secret123\"");
        std::env::remove_var("VPN_GUARD_TEST_KEY");
    }

    #[test]
    fn test_expand_env_vars_missing() {
        let input = "api_key: \"${VPN_GUARD_NONEXISTENT_VAR}\"";
        let result = expand_env_vars(input).unwrap();
        assert_eq!(result, "api_key: \"\"");
    }

    #[test]
    fn test_blank_api_key_is_none() {
        let config = ProxyCheckConfig {
            api_key: Some("  ".to_string()),
            ..ProxyCheckConfig::default()
        };
        assert!(config.api_key().is_none());
    }

    #[test]
    fn test_parse_config_yaml() {
        let yaml = r#"
settings:
  ban_all_cached: true
  exempt_elevated: true

proxycheck:
  endpoint: "http://127.0.0.1:8080/v2"
  timeout_ms: 2500
"#;
        let config = Config::from_yaml(yaml).unwrap();
        assert!(config.settings.ban_all_cached);
        assert!(config.settings.exempt_elevated);
        assert!(config.settings.log_denied);
        assert_eq!(config.proxycheck.endpoint, "http://127.0.0.1:8080/v2");
        assert_eq!(config.proxycheck.timeout_ms, 2500);
        assert!(config.proxycheck.asn);
    }

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = Config::from_yaml("").unwrap();
        assert!(!config.settings.ban_all_cached);
        assert_eq!(config.proxycheck.timeout_ms, 5000);
    }

    #[test]
    fn test_example_config_is_valid() {
        let config = Config::from_yaml(&Config::example()).unwrap();
        assert!(!config.settings.ban_all_cached);
        assert!(!config.settings.exempt_elevated);
    }

    #[test]
    fn test_validate_zero_timeout() {
        let mut config = Config::default();
        config.proxycheck.timeout_ms = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_bad_endpoint() {
        let mut config = Config::default();
        config.proxycheck.endpoint = "not a url".to_string();
        assert!(config.validate().is_err());

        config.proxycheck.endpoint = "ftp://proxycheck.io/v2".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "settings:\n  ban_all_cached: true").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.settings.ban_all_cached);
        assert!(!config.settings.exempt_elevated);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(std::path::Path::new("/nonexistent/vpn-guard.yaml"));
        assert!(result.is_err());
    }
}
