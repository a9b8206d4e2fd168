//! # WHOIS Resolve Library
//!
//! Resolves domain registration data over the WHOIS protocol and turns the
//! free-text replies into structured, queryable answers.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whois_resolve_lib::WhoisClient;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WhoisClient::new();
//!     let answer = client.query("google.com").await?;
//!
//!     println!("{}", answer);
//!     println!("Expires: {:?}", answer.expires_on()?);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Server Registry**: Exact and longest-suffix matching over a TOML table
//! - **Referral Chasing**: Follows thin-registry referrals with loop protection
//! - **Tri-state Properties**: Distinguishes unsupported, absent and present values
//! - **Semantic Diffing**: Compare two answers property by property

// Re-export main public API types and functions
// This makes them available as whois_resolve_lib::TypeName
pub use answer::{
    Answer, Contact, ContactRole, DomainStatus, ExtractorFacade, Property, PropertyValue,
    Registrar,
};
pub use client::WhoisClient;
pub use config::{load_env_config, parse_timeout_string, ClientConfig, ConfigManager, FileConfig};
pub use error::WhoisError;
pub use extractors::{Declaration, Extractor, ExtractorCatalog, Rule};
pub use protocols::{Adapter, Request, ServerRegistry, Strategy, TcpTransport, Transport};
pub use types::{AdapterKind, Allocation, ClientSettings, Part, ServerDefinition};

// Public modules
pub mod extractors;
pub mod protocols;

// Internal modules - these are not part of the public API
mod answer;
mod client;
mod config;
mod error;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, WhoisError>;

// Library version and metadata
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const AUTHOR: &str = env!("CARGO_PKG_AUTHORS");

/// Get library information for debugging or display purposes.
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        author: AUTHOR,
        features: get_enabled_features(),
        servers: ServerRegistry::builtin().len(),
        extractors: ExtractorCatalog::builtin().hosts(),
    }
}

/// Information about the library build and its built-in tables
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub version: &'static str,
    pub author: &'static str,
    pub features: Vec<&'static str>,
    /// Number of built-in server definitions
    pub servers: usize,
    /// Hosts with a built-in extractor
    pub extractors: Vec<&'static str>,
}

/// Get list of enabled features at compile time
#[allow(clippy::vec_init_then_push)]
fn get_enabled_features() -> Vec<&'static str> {
    let mut features = Vec::new();

    #[cfg(feature = "builtin-servers")]
    features.push("builtin-servers");

    features
}
