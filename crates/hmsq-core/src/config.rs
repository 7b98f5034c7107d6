//! Connector configuration.
//!
//! Two layers: [`MetastoreConfig`] is the resolved attach-time record handed
//! over by the host engine (loaded from TOML here for the CLI), and
//! [`HmsConfig`] is the parsed, immutable endpoint configuration the
//! connector owns for its lifetime.

use crate::error::{MetastoreError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Default HMS Thrift port.
pub const DEFAULT_HMS_PORT: u16 = 9083;

/// Wire transport for the Thrift connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HmsTransport {
    /// Plain Thrift over TCP (no TLS)
    #[default]
    Thrift,
    /// Thrift over TLS
    ThriftTls,
}

impl HmsTransport {
    /// Scheme string form (`thrift` / `thrift+ssl`).
    pub fn as_str(&self) -> &'static str {
        match self {
            HmsTransport::Thrift => "thrift",
            HmsTransport::ThriftTls => "thrift+ssl",
        }
    }
}

impl std::fmt::Display for HmsTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parsed HMS endpoint configuration.
///
/// Built once per connector and immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HmsConfig {
    /// Hostname or IP of the HMS Thrift server
    pub host: String,
    /// HMS Thrift port
    pub port: u16,
    /// Wire transport
    pub transport: HmsTransport,
    /// Connection timeout in milliseconds.
    ///
    /// Present for configurability but the socket layer currently uses fixed
    /// timeout constants; see `thrift::rpc`.
    pub connection_timeout_ms: u32,
}

impl Default for HmsConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: DEFAULT_HMS_PORT,
            transport: HmsTransport::Thrift,
            connection_timeout_ms: 30_000,
        }
    }
}

/// Parse an HMS endpoint URI into an [`HmsConfig`].
///
/// Supported forms:
///
/// - `thrift://hostname:9083` — plain transport
/// - `thrift+ssl://hostname:9083` — TLS transport
/// - `hostname:9083` — bare host:port, defaults to plain transport
/// - `hostname` — bare host, defaults to plain transport and port 9083
pub fn parse_hms_endpoint(endpoint: &str) -> Result<HmsConfig> {
    if endpoint.is_empty() {
        return Err(MetastoreError::invalid_config("HMS endpoint URI is empty"));
    }

    let mut config = HmsConfig::default();

    let remainder = if let Some(rest) = endpoint.strip_prefix("thrift+ssl://") {
        config.transport = HmsTransport::ThriftTls;
        rest
    } else if let Some(rest) = endpoint.strip_prefix("thrift://") {
        config.transport = HmsTransport::Thrift;
        rest
    } else {
        endpoint
    };

    if remainder.is_empty() {
        return Err(MetastoreError::invalid_config(format!(
            "HMS endpoint URI has no host: '{}'",
            endpoint
        )));
    }

    match remainder.rsplit_once(':') {
        Some((host, port_str)) => {
            let port = parse_port(port_str).ok_or_else(|| {
                MetastoreError::invalid_config(format!(
                    "invalid port in HMS endpoint URI: '{}'",
                    endpoint
                ))
            })?;
            config.host = host.to_string();
            config.port = port;
        }
        None => {
            config.host = remainder.to_string();
        }
    }

    if config.host.is_empty() {
        return Err(MetastoreError::invalid_config(format!(
            "HMS endpoint URI has empty host: '{}'",
            endpoint
        )));
    }

    Ok(config)
}

fn parse_port(port_str: &str) -> Option<u16> {
    if port_str.is_empty() || !port_str.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match port_str.parse::<u16>() {
        Ok(0) | Err(_) => None,
        Ok(port) => Some(port),
    }
}

/// Metastore provider kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetastoreProvider {
    /// Hive-compatible metastore over Thrift
    #[default]
    Hms,
}

/// Resolved attach-time configuration.
///
/// Produced by the host engine's attach/option-resolution layer; this crate
/// only consumes the already-normalized endpoint, port, and transport.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetastoreConfig {
    /// Provider kind
    #[serde(default)]
    pub provider: MetastoreProvider,

    /// Endpoint URI (see [`parse_hms_endpoint`] for the accepted grammar)
    pub endpoint: String,

    /// Catalog label the attached metastore appears under
    #[serde(default = "default_catalog")]
    pub catalog: String,

    /// Optional provider region
    #[serde(default)]
    pub region: Option<String>,

    /// Auth strategy label (credential resolution happens upstream)
    #[serde(default = "default_auth_strategy")]
    pub auth_strategy: String,

    /// Extra provider-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_catalog() -> String {
    "hms".to_string()
}

fn default_auth_strategy() -> String {
    "none".to_string()
}

impl MetastoreConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| MetastoreError::invalid_config(format!("cannot read {:?}: {}", path, e)))?;
        let config: MetastoreConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.endpoint.is_empty() {
            return Err(MetastoreError::invalid_config("endpoint is required"));
        }
        if self.catalog.is_empty() {
            return Err(MetastoreError::invalid_config("catalog label is required"));
        }
        // Endpoint must parse up front so a bad attach fails fast.
        parse_hms_endpoint(&self.endpoint)?;
        Ok(())
    }

    /// Parse the endpoint into an [`HmsConfig`].
    pub fn hms_config(&self) -> Result<HmsConfig> {
        parse_hms_endpoint(&self.endpoint)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;

    #[test]
    fn test_parse_plain_endpoint() {
        let config = parse_hms_endpoint("thrift://localhost:9083").unwrap();
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, 9083);
        assert_eq!(config.transport, HmsTransport::Thrift);
    }

    #[test]
    fn test_parse_tls_endpoint() {
        let config = parse_hms_endpoint("thrift+ssl://hms.example.com:10000").unwrap();
        assert_eq!(config.host, "hms.example.com");
        assert_eq!(config.port, 10000);
        assert_eq!(config.transport, HmsTransport::ThriftTls);
    }

    #[test]
    fn test_parse_bare_host_defaults_port() {
        let config = parse_hms_endpoint("metastore.internal").unwrap();
        assert_eq!(config.host, "metastore.internal");
        assert_eq!(config.port, DEFAULT_HMS_PORT);
        assert_eq!(config.transport, HmsTransport::Thrift);
    }

    #[test]
    fn test_parse_bare_host_port() {
        let config = parse_hms_endpoint("10.0.0.5:9084").unwrap();
        assert_eq!(config.host, "10.0.0.5");
        assert_eq!(config.port, 9084);
    }

    #[test]
    fn test_parse_missing_host_is_invalid() {
        let err = parse_hms_endpoint("thrift://:9083").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfig);

        let err = parse_hms_endpoint("thrift://").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfig);

        let err = parse_hms_endpoint("").unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_parse_bad_port_is_invalid() {
        for endpoint in ["thrift://host:0", "thrift://host:abc", "thrift://host:70000"] {
            let err = parse_hms_endpoint(endpoint).unwrap_err();
            assert_eq!(err.code(), ErrorCode::InvalidConfig, "{}", endpoint);
        }
    }

    #[test]
    fn test_transport_display() {
        assert_eq!(HmsTransport::Thrift.to_string(), "thrift");
        assert_eq!(HmsTransport::ThriftTls.to_string(), "thrift+ssl");
    }

    #[test]
    fn test_metastore_config_validation() {
        let config = MetastoreConfig {
            provider: MetastoreProvider::Hms,
            endpoint: "thrift://localhost:9083".into(),
            catalog: "hms".into(),
            region: None,
            auth_strategy: "none".into(),
            params: HashMap::new(),
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_metastore_config_rejects_bad_endpoint() {
        let config = MetastoreConfig {
            provider: MetastoreProvider::Hms,
            endpoint: "thrift://:9083".into(),
            catalog: "hms".into(),
            region: None,
            auth_strategy: "none".into(),
            params: HashMap::new(),
        };
        let err = config.validate().unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidConfig);
    }

    #[test]
    fn test_metastore_config_from_toml() {
        let parsed: MetastoreConfig = toml::from_str(
            r#"
            endpoint = "thrift://hms.internal:9083"
            catalog = "warehouse"

            [params]
            "hive.metastore.client.socket.timeout" = "60"
            "#,
        )
        .unwrap();
        assert_eq!(parsed.provider, MetastoreProvider::Hms);
        assert_eq!(parsed.catalog, "warehouse");
        assert_eq!(parsed.auth_strategy, "none");
        assert_eq!(parsed.params.len(), 1);
        assert!(parsed.validate().is_ok());
    }
}
