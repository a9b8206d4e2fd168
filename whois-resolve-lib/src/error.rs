//! Error handling for WHOIS queries and answer extraction.
//!
//! This module defines one error type that covers every way a query can fail,
//! from registry lookup and network issues to extractor defects. Each failure
//! is a distinct variant so callers can react to it precisely.

use std::fmt;
use std::time::Duration;

/// Main error type for WHOIS operations.
///
/// Variants fall in three groups: resolution and transport failures raised
/// while talking to servers, property contract failures raised while reading
/// an [`Answer`](crate::Answer), and configuration failures.
#[derive(Debug, Clone, PartialEq)]
pub enum WhoisError {
    /// No server definition matches the query
    NoServerFound { query: String },

    /// The query string cannot be sent as a WHOIS request
    InvalidQuery { query: String, reason: String },

    /// The matching server cannot be queried over the WHOIS protocol
    UnsupportedAdapter {
        query: String,
        adapter: String,
        url: Option<String>,
    },

    /// Referral chasing exceeded the hop limit or looped back
    ReferralLoop {
        query: String,
        host: String,
        limit: usize,
    },

    /// Transport-level failure (connect, write, read, decode)
    Connection { host: String, message: String },

    /// The overall deadline for the query expired
    Timeout {
        operation: String,
        duration: Duration,
    },

    /// The active extractor explicitly does not support this property
    PropertyNotSupported { property: String },

    /// The property name is outside the known capability set
    UnknownProperty { name: String },

    /// The extractor met content it cannot classify
    UnrecognizedFormat { property: String, fragment: String },

    /// Semantic comparison between answers produced by different extractors
    IncomparableAnswer { left: String, right: String },

    /// None of the answer parts has a registered extractor
    ExtractorNotFound { host: String },

    /// Configuration errors (invalid settings, malformed server table, etc.)
    Config { message: String },

    /// File I/O errors when reading configuration or server tables
    File { path: String, message: String },

    /// Generic internal errors that don't fit other categories
    Internal { message: String },
}

impl WhoisError {
    /// Create a new no-server-found error.
    pub fn no_server_found<Q: Into<String>>(query: Q) -> Self {
        Self::NoServerFound {
            query: query.into(),
        }
    }

    /// Create a new invalid query error.
    pub fn invalid_query<Q: Into<String>, R: Into<String>>(query: Q, reason: R) -> Self {
        Self::InvalidQuery {
            query: query.into(),
            reason: reason.into(),
        }
    }

    /// Create a new unsupported adapter error.
    pub fn unsupported_adapter<Q: Into<String>, A: Into<String>>(
        query: Q,
        adapter: A,
        url: Option<String>,
    ) -> Self {
        Self::UnsupportedAdapter {
            query: query.into(),
            adapter: adapter.into(),
            url,
        }
    }

    /// Create a new referral loop error.
    pub fn referral_loop<Q: Into<String>, H: Into<String>>(query: Q, host: H, limit: usize) -> Self {
        Self::ReferralLoop {
            query: query.into(),
            host: host.into(),
            limit,
        }
    }

    /// Create a new connection error.
    pub fn connection<H: Into<String>, M: Into<String>>(host: H, message: M) -> Self {
        Self::Connection {
            host: host.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new property-not-supported error.
    pub fn property_not_supported<P: Into<String>>(property: P) -> Self {
        Self::PropertyNotSupported {
            property: property.into(),
        }
    }

    /// Create a new unknown property error.
    pub fn unknown_property<N: Into<String>>(name: N) -> Self {
        Self::UnknownProperty { name: name.into() }
    }

    /// Create a new unrecognized format error.
    ///
    /// The fragment is the piece of server output that could not be classified.
    pub fn unrecognized_format<P: Into<String>, F: Into<String>>(property: P, fragment: F) -> Self {
        Self::UnrecognizedFormat {
            property: property.into(),
            fragment: fragment.into(),
        }
    }

    /// Create a new incomparable answer error.
    pub fn incomparable<L: Into<String>, R: Into<String>>(left: L, right: R) -> Self {
        Self::IncomparableAnswer {
            left: left.into(),
            right: right.into(),
        }
    }

    /// Create a new extractor-not-found error.
    pub fn extractor_not_found<H: Into<String>>(host: H) -> Self {
        Self::ExtractorNotFound { host: host.into() }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new file error.
    pub fn file_error<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::File {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new internal error.
    pub fn internal<M: Into<String>>(message: M) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Check if this error came from talking to a server rather than from
    /// reading an answer.
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Timeout { .. } | Self::ReferralLoop { .. }
        )
    }
}

impl fmt::Display for WhoisError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoServerFound { query } => {
                write!(f, "No WHOIS server known for '{}'", query)
            }
            Self::InvalidQuery { query, reason } => {
                write!(f, "Invalid query '{}': {}", query, reason)
            }
            Self::UnsupportedAdapter {
                query,
                adapter,
                url,
            } => {
                if let Some(url) = url {
                    write!(
                        f,
                        "'{}' cannot be queried over WHOIS ({} adapter), use {}",
                        query, adapter, url
                    )
                } else {
                    write!(
                        f,
                        "'{}' cannot be queried over WHOIS ({} adapter)",
                        query, adapter
                    )
                }
            }
            Self::ReferralLoop { query, host, limit } => {
                write!(
                    f,
                    "Referral limit of {} exceeded for '{}' at {}",
                    limit, query, host
                )
            }
            Self::Connection { host, message } => {
                write!(f, "Connection error with {}: {}", host, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::PropertyNotSupported { property } => {
                write!(f, "Property '{}' is not supported by this server", property)
            }
            Self::UnknownProperty { name } => {
                write!(f, "Unknown property '{}'", name)
            }
            Self::UnrecognizedFormat { property, fragment } => {
                write!(
                    f,
                    "Unrecognized content while reading '{}': `{}`",
                    property, fragment
                )
            }
            Self::IncomparableAnswer { left, right } => {
                write!(f, "Cannot compare answers from [{}] and [{}]", left, right)
            }
            Self::ExtractorNotFound { host } => {
                write!(f, "No extractor registered for host {}", host)
            }
            Self::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::File { path, message } => {
                write!(f, "File error at '{}': {}", path, message)
            }
            Self::Internal { message } => {
                write!(f, "Internal error: {}", message)
            }
        }
    }
}

impl std::error::Error for WhoisError {}

impl From<std::io::Error> for WhoisError {
    fn from(err: std::io::Error) -> Self {
        Self::Internal {
            message: format!("I/O error: {}", err),
        }
    }
}

impl From<toml::de::Error> for WhoisError {
    fn from(err: toml::de::Error) -> Self {
        Self::Config {
            message: format!("Failed to parse TOML: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            WhoisError::no_server_found("example.zz").to_string(),
            "No WHOIS server known for 'example.zz'"
        );
        assert_eq!(
            WhoisError::property_not_supported("created_on").to_string(),
            "Property 'created_on' is not supported by this server"
        );
        let web = WhoisError::unsupported_adapter(
            "example.es",
            "web",
            Some("https://www.nic.es/".to_string()),
        );
        assert!(web.to_string().contains("https://www.nic.es/"));
    }

    #[test]
    fn test_network_classification() {
        assert!(WhoisError::connection("whois.test", "refused").is_network());
        assert!(WhoisError::timeout("WHOIS query", Duration::from_secs(1)).is_network());
        assert!(!WhoisError::unknown_property("color").is_network());
    }
}
