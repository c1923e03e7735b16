//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Authentication settings. Required: the server never runs open.
    pub auth: AuthConfig,

    /// Listing pagination settings.
    #[serde(default)]
    pub pagination: PaginationConfig,

    /// Site content settings.
    #[serde(default)]
    pub site: SiteConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.socket_addr()?;

        if !self.server.public_url.starts_with("http://")
            && !self.server.public_url.starts_with("https://")
        {
            return Err(ConfigError::ValidationError {
                message: format!(
                    "Invalid public_url '{}'. Must start with http:// or https://",
                    self.server.public_url
                ),
            });
        }

        if self.auth.token.is_empty() {
            return Err(ConfigError::ValidationError {
                message: "auth.token must not be empty".to_string(),
            });
        }

        if self.pagination.page_size == 0 {
            return Err(ConfigError::ValidationError {
                message: "pagination.page_size must be at least 1".to_string(),
            });
        }

        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Address and port to listen on.
    /// Default: "127.0.0.1:8765"
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Externally visible base URL, used in the bearer challenge and the
    /// resource metadata document.
    /// Default: "http://127.0.0.1:8765"
    #[serde(default = "default_public_url")]
    pub public_url: String,
}

impl ServerConfig {
    /// Parses the listen address.
    ///
    /// # Errors
    ///
    /// Returns an error if the address is not `host:port`.
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.listen
            .parse()
            .map_err(|_| ConfigError::ValidationError {
                message: format!(
                    "Invalid listen address '{}'. Expected host:port",
                    self.listen
                ),
            })
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            public_url: default_public_url(),
        }
    }
}

fn default_listen() -> String {
    "127.0.0.1:8765".to_string()
}

fn default_public_url() -> String {
    "http://127.0.0.1:8765".to_string()
}

/// Authentication configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuthConfig {
    /// Bearer token clients must present. Must not be empty.
    pub token: String,
}

/// Listing pagination configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PaginationConfig {
    /// Items per page for `tools/list`, `resources/list`,
    /// `resources/templates/list` and `prompts/list`.
    /// Default: 50
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

impl Default for PaginationConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
        }
    }
}

const fn default_page_size() -> usize {
    50
}

/// Site content configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    /// Directory of static assets registered as file resources at boot.
    #[serde(default)]
    pub assets_dir: Option<PathBuf>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config() {
        let json = r#"{"auth": {"token": "secret"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.listen, "127.0.0.1:8765");
        assert_eq!(config.pagination.page_size, 50);
    }

    #[test]
    fn parse_full_config() {
        let json = r#"{
            "$schema": "https://json-schema.org/draft/2020-12/schema",
            "_comment": "Test config",
            "server": {
                "listen": "0.0.0.0:9000",
                "public_url": "https://site.example.com"
            },
            "auth": {
                "token": "secret"
            },
            "pagination": {
                "page_size": 10
            },
            "site": {
                "assets_dir": "/srv/site/assets"
            },
            "logging": {
                "level": "debug"
            }
        }"#;

        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.server.listen, "0.0.0.0:9000");
        assert_eq!(config.server.public_url, "https://site.example.com");
        assert_eq!(config.auth.token, "secret");
        assert_eq!(config.pagination.page_size, 10);
        assert_eq!(
            config.site.assets_dir,
            Some(PathBuf::from("/srv/site/assets"))
        );
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn server_config_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.listen, "127.0.0.1:8765");
        assert_eq!(config.public_url, "http://127.0.0.1:8765");
        assert!(config.socket_addr().is_ok());
    }

    #[test]
    fn logging_config_defaults() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "warn");
    }

    #[test]
    fn missing_auth_section_is_rejected() {
        let result: Result<Config, _> = serde_json::from_str("{}");
        assert!(result.is_err());
    }

    #[test]
    fn reject_empty_token() {
        let json = r#"{"auth": {"token": ""}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unparseable_listen_address() {
        let json = r#"{"auth": {"token": "secret"}, "server": {"listen": "not-an-address"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_bare_public_url() {
        let json =
            r#"{"auth": {"token": "secret"}, "server": {"public_url": "site.example.com"}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_zero_page_size() {
        let json = r#"{"auth": {"token": "secret"}, "pagination": {"page_size": 0}}"#;
        let config: Config = serde_json::from_str(json).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn reject_unknown_fields() {
        let json = r#"{
            "auth": {"token": "secret"},
            "unknown_field": "value"
        }"#;

        let result: Result<Config, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
