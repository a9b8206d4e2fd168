//! Server definition table and query-to-server resolution.
//!
//! This module maps a query string to the [`ServerDefinition`] responsible for
//! it. Exact allocations win over suffix allocations, and among suffixes the
//! longest match wins, so a `.co.uk` definition is preferred over `.uk`.

use crate::error::WhoisError;
use crate::types::{AdapterKind, ServerDefinition};
use crate::utils::normalize_query;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// The built-in server table, embedded at compile time.
#[cfg(feature = "builtin-servers")]
const BUILTIN_TABLE: &str = include_str!("../../data/servers.toml");

#[cfg(not(feature = "builtin-servers"))]
const BUILTIN_TABLE: &str = "";

// Global built-in registry, parsed on first use
lazy_static::lazy_static! {
    static ref BUILTIN_REGISTRY: ServerRegistry = match ServerRegistry::from_toml_str(BUILTIN_TABLE) {
        Ok(registry) => registry,
        Err(e) => {
            warn!(error = %e, "Built-in server table is invalid, starting empty");
            ServerRegistry::default()
        }
    };
}

/// On-disk shape of a server table: a list of `[[server]]` entries.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ServerTable {
    #[serde(default, rename = "server")]
    pub servers: Vec<ServerDefinition>,
}

/// Read-only collection of server definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ServerRegistry {
    definitions: Vec<ServerDefinition>,
}

impl ServerRegistry {
    /// Create a registry from already validated definitions.
    pub fn new(definitions: Vec<ServerDefinition>) -> Self {
        Self { definitions }
    }

    /// Get the built-in registry.
    ///
    /// The table is parsed once and shared for the lifetime of the process.
    pub fn builtin() -> &'static ServerRegistry {
        &BUILTIN_REGISTRY
    }

    /// Parse a registry from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `WhoisError::Config` if the text is not a valid table or a
    /// definition is inconsistent (missing host, bad port).
    pub fn from_toml_str(content: &str) -> Result<Self, WhoisError> {
        let table: ServerTable = toml::from_str(content)?;
        for definition in &table.servers {
            validate_definition(definition)?;
        }
        Ok(Self::new(table.servers))
    }

    /// Load a registry from a TOML file.
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self, WhoisError> {
        let path = path.as_ref();

        let content = fs::read_to_string(path).map_err(|e| {
            WhoisError::file_error(
                path.to_string_lossy(),
                format!("Failed to read server table: {}", e),
            )
        })?;

        Self::from_toml_str(&content)
    }

    /// Layer `overrides` on top of this registry.
    ///
    /// Definitions from `overrides` come first, so they win ties against
    /// definitions with the same allocation.
    pub fn with_overrides(self, overrides: ServerRegistry) -> Self {
        let mut definitions = overrides.definitions;
        definitions.extend(self.definitions);
        Self { definitions }
    }

    /// All definitions, in load order.
    pub fn definitions(&self) -> &[ServerDefinition] {
        &self.definitions
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Find the definition responsible for `query`.
    ///
    /// # Arguments
    ///
    /// * `query` - The query string (e.g., "example.co.uk")
    ///
    /// # Returns
    ///
    /// The exact-match definition if one exists, otherwise the definition with
    /// the longest matching suffix. Ties go to the definition loaded first.
    ///
    /// # Errors
    ///
    /// Returns `WhoisError::NoServerFound` if no allocation matches.
    pub fn resolve(&self, query: &str) -> Result<&ServerDefinition, WhoisError> {
        let normalized = normalize_query(query)?;

        if let Some(exact) = self
            .definitions
            .iter()
            .find(|d| d.allocation.matches_exactly(&normalized))
        {
            debug!(query = %normalized, allocation = %exact.allocation, "Exact allocation match");
            return Ok(exact);
        }

        let mut best: Option<(usize, &ServerDefinition)> = None;
        for definition in &self.definitions {
            if let Some(len) = definition.allocation.suffix_len(&normalized) {
                if best.map_or(true, |(best_len, _)| len > best_len) {
                    best = Some((len, definition));
                }
            }
        }

        match best {
            Some((_, definition)) => {
                debug!(query = %normalized, allocation = %definition.allocation, "Suffix allocation match");
                Ok(definition)
            }
            None => Err(WhoisError::no_server_found(normalized)),
        }
    }
}

/// Check a definition for inconsistencies that would only surface mid-query.
pub(crate) fn validate_definition(definition: &ServerDefinition) -> Result<(), WhoisError> {
    match definition.kind {
        AdapterKind::Web | AdapterKind::Unsupported => {}
        _ => {
            let host = definition.require_host()?;
            if host.trim().is_empty() {
                return Err(WhoisError::config(format!(
                    "Definition for {} has an empty host",
                    definition.allocation
                )));
            }
        }
    }

    definition.port()?;

    if let Some(limit) = definition.option("referral_limit") {
        if limit.trim().parse::<usize>().is_err() {
            return Err(WhoisError::config(format!(
                "Invalid referral_limit '{}' for allocation {}",
                limit, definition.allocation
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Allocation;

    fn uk_registry() -> ServerRegistry {
        ServerRegistry::new(vec![
            ServerDefinition::new(AdapterKind::Standard, ".uk", Some("whois.nic.uk")),
            ServerDefinition::new(AdapterKind::Standard, ".co.uk", Some("whois.co.uk.test")),
            ServerDefinition::new(AdapterKind::Standard, "whois", Some("whois.exact.test")),
        ])
    }

    #[test]
    fn test_longest_suffix_wins() {
        let registry = uk_registry();
        let def = registry.resolve("example.co.uk").unwrap();
        assert_eq!(def.host.as_deref(), Some("whois.co.uk.test"));

        let def = registry.resolve("example.org.uk").unwrap();
        assert_eq!(def.host.as_deref(), Some("whois.nic.uk"));
    }

    #[test]
    fn test_longest_suffix_independent_of_order() {
        let registry = ServerRegistry::new(vec![
            ServerDefinition::new(AdapterKind::Standard, ".co.uk", Some("whois.co.uk.test")),
            ServerDefinition::new(AdapterKind::Standard, ".uk", Some("whois.nic.uk")),
        ]);
        let def = registry.resolve("EXAMPLE.CO.UK").unwrap();
        assert_eq!(def.host.as_deref(), Some("whois.co.uk.test"));
    }

    #[test]
    fn test_exact_match_beats_suffix() {
        let registry = ServerRegistry::new(vec![
            ServerDefinition::new(AdapterKind::Standard, ".uk", Some("whois.nic.uk")),
            ServerDefinition::new(AdapterKind::Standard, "nic.uk", Some("whois.exact.test")),
        ]);
        let def = registry.resolve("nic.uk").unwrap();
        assert_eq!(def.allocation, Allocation::Exact("nic.uk".to_string()));
    }

    #[test]
    fn test_no_server_found() {
        let registry = uk_registry();
        assert_eq!(
            registry.resolve("example.zz"),
            Err(WhoisError::no_server_found("example.zz"))
        );
    }

    #[test]
    fn test_first_loaded_wins_ties() {
        let registry = ServerRegistry::new(vec![
            ServerDefinition::new(AdapterKind::Standard, ".test", Some("first.test")),
            ServerDefinition::new(AdapterKind::Standard, ".test", Some("second.test")),
        ]);
        assert_eq!(
            registry.resolve("a.test").unwrap().host.as_deref(),
            Some("first.test")
        );
    }

    #[test]
    fn test_overrides_take_precedence() {
        let base = ServerRegistry::new(vec![ServerDefinition::new(
            AdapterKind::Standard,
            ".test",
            Some("base.test"),
        )]);
        let overrides = ServerRegistry::new(vec![ServerDefinition::new(
            AdapterKind::Afilias,
            ".test",
            Some("override.test"),
        )]);
        let merged = base.with_overrides(overrides);
        assert_eq!(merged.len(), 2);
        assert_eq!(
            merged.resolve("a.test").unwrap().host.as_deref(),
            Some("override.test")
        );
    }

    #[test]
    fn test_from_toml_rejects_missing_host() {
        let result = ServerRegistry::from_toml_str(
            r#"
[[server]]
adapter = "standard"
allocation = ".test"
"#,
        );
        assert!(matches!(result, Err(WhoisError::Config { .. })));
    }

    #[test]
    fn test_from_toml_accepts_web_without_host() {
        let registry = ServerRegistry::from_toml_str(
            r#"
[[server]]
adapter = "web"
allocation = ".test"

[server.options]
url = "https://nic.test/"
"#,
        )
        .unwrap();
        assert_eq!(registry.resolve("a.test").unwrap().kind, AdapterKind::Web);
    }

    #[cfg(feature = "builtin-servers")]
    #[test]
    fn test_builtin_table_parses() {
        let registry = ServerRegistry::builtin();
        assert!(!registry.is_empty());

        let com = registry.resolve("google.com").unwrap();
        assert_eq!(com.kind, AdapterKind::Verisign);
        assert_eq!(com.host.as_deref(), Some("whois.verisign-grs.com"));

        // .co.za has a WHOIS server while the rest of .za is web only
        let coza = registry.resolve("example.co.za").unwrap();
        assert_eq!(coza.host.as_deref(), Some("whois.coza.net.za"));
        assert_eq!(registry.resolve("example.za").unwrap().kind, AdapterKind::Web);

        let ac_uk = registry.resolve("ox.ac.uk").unwrap();
        assert_eq!(ac_uk.host.as_deref(), Some("whois.ja.net"));
    }
}
