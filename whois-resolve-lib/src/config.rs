//! Configuration file parsing and management.
//!
//! This module handles loading configuration from TOML files and the
//! environment, and merging them with proper precedence rules.
//!
//! A configuration file looks like:
//!
//! ```toml
//! [client]
//! timeout = "30s"
//! bind_host = "192.0.2.10"
//!
//! [[server]]
//! adapter = "standard"
//! allocation = ".internal"
//! host = "whois.corp.example"
//! ```

use crate::error::WhoisError;
use crate::protocols::registry::{validate_definition, ServerRegistry};
use crate::types::{ClientSettings, ServerDefinition};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};

/// Configuration loaded from TOML files.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct FileConfig {
    /// Client connection settings
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client: Option<ClientConfig>,

    /// Extra server definitions, consulted before the built-in table
    #[serde(default, rename = "server", skip_serializing_if = "Vec::is_empty")]
    pub servers: Vec<ServerDefinition>,
}

impl FileConfig {
    /// The extra server definitions as a registry.
    pub fn server_overrides(&self) -> ServerRegistry {
        ServerRegistry::new(self.servers.clone())
    }
}

/// Client values as they appear in a file or the environment.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct ClientConfig {
    /// Overall query timeout (e.g. "10", "10s", "2m", "none")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,

    /// Local address to bind outgoing connections to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_host: Option<String>,

    /// Local port to bind outgoing connections to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bind_port: Option<u16>,
}

impl ClientConfig {
    /// Overlay the values that are set onto `settings`.
    ///
    /// # Errors
    ///
    /// Returns `WhoisError::Config` for an unparseable timeout or bind host.
    pub fn apply(&self, mut settings: ClientSettings) -> Result<ClientSettings, WhoisError> {
        if let Some(timeout) = &self.timeout {
            settings.timeout = parse_timeout_string(timeout)?;
        }
        if let Some(host) = &self.bind_host {
            settings.bind_host = Some(parse_bind_host(host)?);
        }
        if let Some(port) = self.bind_port {
            settings.bind_port = Some(port);
        }
        Ok(settings)
    }

    /// Merge with `higher` taking precedence field by field.
    fn merged_with(self, higher: ClientConfig) -> ClientConfig {
        ClientConfig {
            timeout: higher.timeout.or(self.timeout),
            bind_host: higher.bind_host.or(self.bind_host),
            bind_port: higher.bind_port.or(self.bind_port),
        }
    }
}

/// Configuration discovery and loading functionality.
pub struct ConfigManager {
    /// Whether to report which files were picked up
    pub verbose: bool,
}

impl ConfigManager {
    /// Create a new configuration manager.
    pub fn new(verbose: bool) -> Self {
        Self { verbose }
    }

    /// Load configuration from a specific file.
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// The parsed configuration or an error if parsing or validation fails.
    pub fn load_file<P: AsRef<Path>>(&self, path: P) -> Result<FileConfig, WhoisError> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(WhoisError::file_error(
                path.to_string_lossy(),
                "Configuration file not found",
            ));
        }

        let content = fs::read_to_string(path).map_err(|e| {
            WhoisError::file_error(
                path.to_string_lossy(),
                format!("Failed to read configuration file: {}", e),
            )
        })?;

        let config: FileConfig = toml::from_str(&content).map_err(|e| {
            WhoisError::config(format!(
                "Failed to parse TOML configuration {}: {}",
                path.display(),
                e
            ))
        })?;

        self.validate_config(&config)?;

        Ok(config)
    }

    /// Discover and load configuration files in precedence order.
    ///
    /// Looks in the XDG config directory, then the home directory, then the
    /// current directory. Later files win.
    pub fn discover_and_load(&self) -> Result<FileConfig, WhoisError> {
        let mut merged_config = FileConfig::default();
        let mut loaded_files = Vec::new();

        let candidates = [
            self.get_xdg_config_path(),
            self.get_global_config_path(),
            self.get_local_config_path(),
        ];

        for path in candidates.into_iter().flatten() {
            match self.load_file(&path) {
                Ok(config) => {
                    merged_config = self.merge_configs(merged_config, config);
                    loaded_files.push(path);
                }
                Err(e) => warn!(path = %path.display(), error = %e, "Skipping configuration file"),
            }
        }

        if self.verbose {
            for path in &loaded_files {
                debug!(path = %path.display(), "Loaded configuration file");
            }
        }

        Ok(merged_config)
    }

    /// Get the local configuration file path.
    fn get_local_config_path(&self) -> Option<PathBuf> {
        let candidates = ["./whois-resolve.toml", "./.whois-resolve.toml"];

        candidates
            .iter()
            .map(Path::new)
            .find(|path| path.exists())
            .map(Path::to_path_buf)
    }

    /// Get the global configuration file path in the user's home directory.
    fn get_global_config_path(&self) -> Option<PathBuf> {
        let home = env::var_os("HOME")?;
        let candidates = [".whois-resolve.toml", "whois-resolve.toml"];

        candidates
            .iter()
            .map(|candidate| Path::new(&home).join(candidate))
            .find(|path| path.exists())
    }

    /// Get the XDG configuration file path.
    fn get_xdg_config_path(&self) -> Option<PathBuf> {
        let config_dir = env::var_os("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|| env::var_os("HOME").map(|home| Path::new(&home).join(".config")))?;

        let path = config_dir.join("whois-resolve").join("config.toml");
        if path.exists() {
            Some(path)
        } else {
            None
        }
    }

    /// Merge two configurations with proper precedence.
    ///
    /// Client values from `higher` win. Server definitions from `higher` are
    /// placed first so they win resolution ties.
    fn merge_configs(&self, lower: FileConfig, higher: FileConfig) -> FileConfig {
        let client = match (lower.client, higher.client) {
            (Some(lower_client), Some(higher_client)) => {
                Some(lower_client.merged_with(higher_client))
            }
            (lower_client, higher_client) => higher_client.or(lower_client),
        };

        let mut servers = higher.servers;
        servers.extend(lower.servers);

        FileConfig { client, servers }
    }

    /// Validate a configuration for common issues.
    fn validate_config(&self, config: &FileConfig) -> Result<(), WhoisError> {
        if let Some(client) = &config.client {
            if let Some(timeout) = &client.timeout {
                parse_timeout_string(timeout)?;
            }
            if let Some(host) = &client.bind_host {
                parse_bind_host(host)?;
            }
        }

        for definition in &config.servers {
            validate_definition(definition)?;
        }

        Ok(())
    }
}

/// Load client configuration from `WHOIS_*` environment variables.
///
/// Invalid values are logged and ignored.
pub fn load_env_config() -> ClientConfig {
    client_config_from(|name| env::var(name).ok())
}

fn client_config_from<F>(lookup: F) -> ClientConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut config = ClientConfig::default();

    // WHOIS_TIMEOUT - overall query timeout
    if let Some(timeout) = lookup("WHOIS_TIMEOUT") {
        match parse_timeout_string(&timeout) {
            Ok(_) => {
                debug!(value = %timeout, "Using WHOIS_TIMEOUT");
                config.timeout = Some(timeout);
            }
            Err(_) => warn!(
                value = %timeout,
                "Invalid WHOIS_TIMEOUT, use a format like '10', '10s', '2m' or 'none'"
            ),
        }
    }

    // WHOIS_BIND_HOST - local address for outgoing connections
    if let Some(host) = lookup("WHOIS_BIND_HOST") {
        if parse_bind_host(&host).is_ok() {
            debug!(value = %host, "Using WHOIS_BIND_HOST");
            config.bind_host = Some(host);
        } else {
            warn!(value = %host, "Invalid WHOIS_BIND_HOST, expected an IP address");
        }
    }

    // WHOIS_BIND_PORT - local port for outgoing connections
    if let Some(port) = lookup("WHOIS_BIND_PORT") {
        match port.trim().parse::<u16>() {
            Ok(parsed) => {
                debug!(value = parsed, "Using WHOIS_BIND_PORT");
                config.bind_port = Some(parsed);
            }
            Err(_) => warn!(value = %port, "Invalid WHOIS_BIND_PORT, must be 0-65535"),
        }
    }

    config
}

/// Parse a timeout string like "10", "10s", "2m" or "none".
///
/// # Returns
///
/// `Ok(None)` when the timeout is disabled ("none", "off", "0").
///
/// # Errors
///
/// Returns `WhoisError::Config` for anything else.
pub fn parse_timeout_string(timeout_str: &str) -> Result<Option<Duration>, WhoisError> {
    let timeout_str = timeout_str.trim().to_lowercase();

    if matches!(timeout_str.as_str(), "none" | "off" | "0") {
        return Ok(None);
    }

    let seconds = if let Some(secs) = timeout_str.strip_suffix('s') {
        secs.trim().parse::<u64>().ok()
    } else if let Some(mins) = timeout_str.strip_suffix('m') {
        mins.trim().parse::<u64>().ok().and_then(|m| m.checked_mul(60))
    } else {
        // Assume seconds if no unit
        timeout_str.parse::<u64>().ok()
    };

    match seconds {
        Some(0) => Ok(None),
        Some(secs) => Ok(Some(Duration::from_secs(secs))),
        None => Err(WhoisError::config(format!(
            "Invalid timeout format '{}'. Use format like '10', '10s', '2m' or 'none'",
            timeout_str
        ))),
    }
}

fn parse_bind_host(host: &str) -> Result<IpAddr, WhoisError> {
    host.trim().parse::<IpAddr>().map_err(|_| {
        WhoisError::config(format!(
            "Invalid bind_host '{}', expected an IP address",
            host
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{AdapterKind, Allocation};
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(content: &str) -> NamedTempFile {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file.write_all(content.as_bytes()).unwrap();
        temp_file.flush().unwrap();
        temp_file
    }

    #[test]
    fn test_parse_timeout_string() {
        assert_eq!(parse_timeout_string("10").unwrap(), Some(Duration::from_secs(10)));
        assert_eq!(parse_timeout_string("30s").unwrap(), Some(Duration::from_secs(30)));
        assert_eq!(parse_timeout_string("2m").unwrap(), Some(Duration::from_secs(120)));
        assert_eq!(parse_timeout_string("none").unwrap(), None);
        assert_eq!(parse_timeout_string("OFF").unwrap(), None);
        assert!(parse_timeout_string("soon").is_err());
    }

    #[test]
    fn test_load_valid_config() {
        let temp_file = write_config(
            r#"
[client]
timeout = "30s"
bind_host = "127.0.0.1"
bind_port = 4343

[[server]]
adapter = "standard"
allocation = ".internal"
host = "whois.corp.test"
"#,
        );

        let manager = ConfigManager::new(false);
        let config = manager.load_file(temp_file.path()).unwrap();

        let client = config.client.clone().unwrap();
        assert_eq!(client.timeout, Some("30s".to_string()));
        assert_eq!(client.bind_port, Some(4343));

        assert_eq!(config.servers.len(), 1);
        assert_eq!(config.servers[0].kind, AdapterKind::Standard);
        assert_eq!(
            config.servers[0].allocation,
            Allocation::Suffix(".internal".to_string())
        );

        let overrides = config.server_overrides();
        assert_eq!(
            overrides.resolve("host.internal").unwrap().host.as_deref(),
            Some("whois.corp.test")
        );
    }

    #[test]
    fn test_invalid_timeout_rejected() {
        let temp_file = write_config("[client]\ntimeout = \"eventually\"\n");
        let result = ConfigManager::new(false).load_file(temp_file.path());
        assert!(matches!(result, Err(WhoisError::Config { .. })));
    }

    #[test]
    fn test_invalid_server_rejected() {
        let temp_file = write_config(
            r#"
[[server]]
adapter = "afilias"
allocation = ".test"
"#,
        );
        let result = ConfigManager::new(false).load_file(temp_file.path());
        assert!(matches!(result, Err(WhoisError::Config { .. })));
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigManager::new(false).load_file("/nonexistent/whois-resolve.toml");
        assert!(matches!(result, Err(WhoisError::File { .. })));
    }

    #[test]
    fn test_merge_configs() {
        let manager = ConfigManager::new(false);

        let lower = FileConfig {
            client: Some(ClientConfig {
                timeout: Some("10s".to_string()),
                bind_port: Some(4343),
                ..Default::default()
            }),
            servers: vec![ServerDefinition::new(
                AdapterKind::Standard,
                ".test",
                Some("lower.test"),
            )],
        };

        let higher = FileConfig {
            client: Some(ClientConfig {
                timeout: Some("2m".to_string()),
                ..Default::default()
            }),
            servers: vec![ServerDefinition::new(
                AdapterKind::Standard,
                ".test",
                Some("higher.test"),
            )],
        };

        let merged = manager.merge_configs(lower, higher);
        let client = merged.client.clone().unwrap();

        assert_eq!(client.timeout, Some("2m".to_string())); // Higher wins
        assert_eq!(client.bind_port, Some(4343)); // Lower preserved
        assert_eq!(
            merged.server_overrides().resolve("a.test").unwrap().host.as_deref(),
            Some("higher.test")
        );
    }

    #[test]
    fn test_apply_client_config() {
        let config = ClientConfig {
            timeout: Some("none".to_string()),
            bind_host: Some("::1".to_string()),
            bind_port: None,
        };
        let settings = config.apply(ClientSettings::default()).unwrap();
        assert_eq!(settings.timeout, None);
        assert_eq!(settings.bind_host, Some("::1".parse().unwrap()));
        assert_eq!(settings.bind_port, None);

        let bad = ClientConfig {
            bind_host: Some("localhost".to_string()),
            ..Default::default()
        };
        assert!(bad.apply(ClientSettings::default()).is_err());
    }

    #[test]
    fn test_env_values_are_validated() {
        let vars: HashMap<&str, &str> = [
            ("WHOIS_TIMEOUT", "5s"),
            ("WHOIS_BIND_HOST", "not-an-ip"),
            ("WHOIS_BIND_PORT", "4343"),
        ]
        .into_iter()
        .collect();

        let config = client_config_from(|name| vars.get(name).map(|v| v.to_string()));
        assert_eq!(config.timeout, Some("5s".to_string()));
        assert_eq!(config.bind_host, None);
        assert_eq!(config.bind_port, Some(4343));
    }
}
