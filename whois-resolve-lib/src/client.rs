//! Main WHOIS client implementation.
//!
//! This module provides the `WhoisClient` struct that resolves the server for
//! a query, runs the matching adapter under one overall deadline and returns
//! the collected [`Answer`].

use crate::answer::Answer;
use crate::error::WhoisError;
use crate::extractors::ExtractorCatalog;
use crate::protocols::{Adapter, ServerRegistry, TcpTransport, Transport};
use crate::types::{ClientSettings, ServerDefinition};
use crate::utils::validate_query;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Client that answers WHOIS queries.
///
/// A client holds only read-only state, so one instance can be shared
/// across tasks.
///
/// # Example
///
/// ```rust,no_run
/// use whois_resolve_lib::WhoisClient;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let client = WhoisClient::new();
///     let answer = client.query("google.com").await?;
///     println!("Registered: {}", answer.is_registered()?);
///     Ok(())
/// }
/// ```
pub struct WhoisClient {
    /// Settings applied to every query
    settings: ClientSettings,
    /// Server definitions consulted to pick a server
    registry: Arc<ServerRegistry>,
    /// How bytes reach the servers
    transport: Arc<dyn Transport>,
    /// Extractors attached to returned answers
    catalog: Arc<ExtractorCatalog>,
}

impl WhoisClient {
    /// Create a client with default settings and the built-in tables.
    ///
    /// Default settings:
    /// - Timeout: 10 seconds
    /// - No bind address
    pub fn new() -> Self {
        Self::with_settings(ClientSettings::default())
    }

    /// Create a client with custom settings.
    ///
    /// # Example
    ///
    /// ```rust
    /// use whois_resolve_lib::{ClientSettings, WhoisClient};
    /// use std::time::Duration;
    ///
    /// let settings = ClientSettings::default().with_timeout(Duration::from_secs(30));
    /// let client = WhoisClient::with_settings(settings);
    /// assert_eq!(client.settings().timeout, Some(Duration::from_secs(30)));
    /// ```
    pub fn with_settings(settings: ClientSettings) -> Self {
        let transport = TcpTransport::from_settings(&settings);
        Self {
            settings,
            registry: Arc::new(ServerRegistry::builtin().clone()),
            transport: Arc::new(transport),
            catalog: ExtractorCatalog::builtin(),
        }
    }

    /// Use `registry` instead of the built-in server table.
    pub fn with_registry(mut self, registry: ServerRegistry) -> Self {
        self.registry = Arc::new(registry);
        self
    }

    /// Use a custom transport (e.g. a proxy or an in-memory fake).
    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    /// Attach `catalog` to every answer instead of the built-in extractors.
    pub fn with_catalog(mut self, catalog: Arc<ExtractorCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    pub fn registry(&self) -> &ServerRegistry {
        &self.registry
    }

    /// The server definition that would handle `query`.
    pub fn resolve(&self, query: &str) -> Result<&ServerDefinition, WhoisError> {
        self.registry.resolve(query)
    }

    /// Query WHOIS for `query`, following referrals.
    ///
    /// The whole chain of round-trips shares one deadline. When it expires
    /// the partial progress is discarded.
    ///
    /// # Errors
    ///
    /// - `NoServerFound` if no definition covers the query
    /// - `UnsupportedAdapter` for web-only or unsupported registries
    /// - `Timeout` when the deadline expires
    /// - any `Connection` or `ReferralLoop` error from the adapter
    #[instrument(skip(self), fields(timeout = ?self.settings.timeout))]
    pub async fn query(&self, query: &str) -> Result<Answer, WhoisError> {
        let query = validate_query(query)?;
        let definition = self.registry.resolve(query)?;
        debug!(
            adapter = %definition.kind,
            host = definition.host.as_deref().unwrap_or("-"),
            "Resolved server"
        );

        let adapter = Adapter::new(definition);
        let request = adapter.request(query, self.transport.as_ref(), &self.settings);

        let answer = match self.settings.timeout {
            Some(limit) => match tokio::time::timeout(limit, request).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!(query = %query, "WHOIS query timed out");
                    return Err(WhoisError::timeout(
                        format!("WHOIS query for {}", query),
                        limit,
                    ));
                }
            },
            None => request.await?,
        };

        Ok(answer.with_catalog(Arc::clone(&self.catalog)))
    }
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}
