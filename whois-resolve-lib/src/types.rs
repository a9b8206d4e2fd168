//! Core data types for WHOIS resolution.
//!
//! This module defines the server definitions loaded from the registry table,
//! the raw response parts collected while querying, and the client settings.

use crate::error::WhoisError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::IpAddr;
use std::time::Duration;

/// Default WHOIS port.
pub const DEFAULT_WHOIS_PORT: u16 = 43;

/// Default overall timeout for a query, in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Protocol strategy used to talk to a server.
///
/// The kind is chosen per server definition; the engine never special-cases
/// individual hosts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AdapterKind {
    /// Single request, single response
    Standard,

    /// Verisign-style thin registry: `=` prefixed query, follows referrals
    Verisign,

    /// Afilias-style registry: plain query, follows referrals
    Afilias,

    /// Registry only offers a web form
    Web,

    /// Registry offers no public interface at all
    Unsupported,
}

impl std::fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdapterKind::Standard => write!(f, "standard"),
            AdapterKind::Verisign => write!(f, "verisign"),
            AdapterKind::Afilias => write!(f, "afilias"),
            AdapterKind::Web => write!(f, "web"),
            AdapterKind::Unsupported => write!(f, "unsupported"),
        }
    }
}

/// The part of the query space a definition is responsible for.
///
/// In the server table an allocation starting with `.` is a suffix
/// (e.g. `.co.uk`), anything else must match the whole query.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(from = "String", into = "String")]
pub enum Allocation {
    Exact(String),
    Suffix(String),
}

impl Allocation {
    /// Whether this allocation equals the whole (normalized) query.
    pub fn matches_exactly(&self, query: &str) -> bool {
        matches!(self, Allocation::Exact(value) if value == query)
    }

    /// Length of the matching suffix, or `None` when the suffix does not match.
    pub fn suffix_len(&self, query: &str) -> Option<usize> {
        match self {
            Allocation::Suffix(suffix) if query.ends_with(suffix.as_str()) => Some(suffix.len()),
            _ => None,
        }
    }
}

impl From<String> for Allocation {
    fn from(value: String) -> Self {
        let value = value.trim().to_lowercase();
        if value.starts_with('.') {
            Allocation::Suffix(value)
        } else {
            Allocation::Exact(value)
        }
    }
}

impl From<Allocation> for String {
    fn from(value: Allocation) -> Self {
        match value {
            Allocation::Exact(s) | Allocation::Suffix(s) => s,
        }
    }
}

impl std::fmt::Display for Allocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Allocation::Exact(s) | Allocation::Suffix(s) => write!(f, "{}", s),
        }
    }
}

/// One entry of the server definition table.
///
/// Definitions are immutable once loaded.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServerDefinition {
    /// Which adapter strategy handles this server
    #[serde(rename = "adapter", alias = "kind")]
    pub kind: AdapterKind,

    /// Query space covered by this definition
    pub allocation: Allocation,

    /// WHOIS host; absent for web-only or unsupported registries
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,

    /// Adapter options (`port`, `prefix`, `referral_limit`, `url`)
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub options: BTreeMap<String, String>,
}

impl ServerDefinition {
    /// Create a definition without options.
    pub fn new<A: Into<String>>(kind: AdapterKind, allocation: A, host: Option<&str>) -> Self {
        Self {
            kind,
            allocation: Allocation::from(allocation.into()),
            host: host.map(str::to_string),
            options: BTreeMap::new(),
        }
    }

    /// Add an option, returning the updated definition.
    pub fn with_option<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    /// Look up an option value.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.options.get(key).map(String::as_str)
    }

    /// Port to use for the initial hop.
    pub fn port(&self) -> Result<u16, WhoisError> {
        match self.option("port") {
            Some(port) => port.trim().parse::<u16>().map_err(|_| {
                WhoisError::config(format!(
                    "Invalid port '{}' for allocation {}",
                    port, self.allocation
                ))
            }),
            None => Ok(DEFAULT_WHOIS_PORT),
        }
    }

    /// Host for the initial hop, or a configuration error when missing.
    pub fn require_host(&self) -> Result<&str, WhoisError> {
        self.host.as_deref().ok_or_else(|| {
            WhoisError::config(format!(
                "Definition for {} ({} adapter) has no host",
                self.allocation, self.kind
            ))
        })
    }
}

/// One server's raw reply, tagged with the host that produced it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Part {
    /// Raw response text
    pub body: String,

    /// Host that produced the response
    pub host: String,
}

impl Part {
    pub fn new<B: Into<String>, H: Into<String>>(body: B, host: H) -> Self {
        Self {
            body: body.into(),
            host: host.into(),
        }
    }
}

/// Settings shared by every query made through a client.
///
/// # Example
///
/// ```rust
/// use whois_resolve_lib::ClientSettings;
/// use std::time::Duration;
///
/// let settings = ClientSettings::default()
///     .with_timeout(Duration::from_secs(5))
///     .with_bind_port(4343);
/// assert_eq!(settings.timeout, Some(Duration::from_secs(5)));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    /// Deadline for the whole (possibly multi-hop) query.
    /// `None` disables the bound entirely.
    /// Default: 10 seconds
    pub timeout: Option<Duration>,

    /// Local address connections originate from
    pub bind_host: Option<IpAddr>,

    /// Local port connections originate from
    pub bind_port: Option<u16>,

    /// Pause before retrying a throttled or empty response
    /// Default: 500 milliseconds
    pub retry_delay: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(DEFAULT_TIMEOUT_SECS)),
            bind_host: None,
            bind_port: None,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl ClientSettings {
    /// Set the overall query timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Remove the overall query timeout.
    pub fn without_timeout(mut self) -> Self {
        self.timeout = None;
        self
    }

    /// Bind outgoing connections to a local address.
    pub fn with_bind_host(mut self, host: IpAddr) -> Self {
        self.bind_host = Some(host);
        self
    }

    /// Bind outgoing connections to a local port.
    pub fn with_bind_port(mut self, port: u16) -> Self {
        self.bind_port = Some(port);
        self
    }

    /// Set the pause between retries of incomplete responses.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }
}
