//! Per-host extractors that turn raw WHOIS text into property values.
//!
//! An extractor is bound to exactly one host name. For every [`Property`] it
//! either declares a rule computing the value, declares the property
//! explicitly not supported, or says nothing at all. The facade in
//! [`crate::answer`] turns those three outcomes into answers.

mod whois_coza_net_za;
mod whois_eu;
mod whois_nic_ac;
mod whois_registry_gy;
mod whois_verisign_grs_com;

pub use whois_coza_net_za::CozaNetZa;
pub use whois_eu::WhoisEu;
pub use whois_nic_ac::NicAc;
pub use whois_registry_gy::RegistryGy;
pub use whois_verisign_grs_com::VerisignGrs;

use crate::answer::{Property, PropertyValue};
use crate::error::WhoisError;
use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::fmt;
use std::sync::Arc;

/// Computes one property from the raw text of one part.
///
/// `Ok(None)` means the property is supported but absent from this response.
pub type Rule = fn(&str) -> Result<Option<PropertyValue>, WhoisError>;

/// What an extractor says about one property.
#[derive(Clone, Copy)]
pub enum Declaration {
    /// The property is computed by this rule
    Supported(Rule),

    /// The format is known never to carry this property
    NotSupported,
}

impl fmt::Debug for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Declaration::Supported(_) => write!(f, "Supported"),
            Declaration::NotSupported => write!(f, "NotSupported"),
        }
    }
}

/// Format-specific knowledge about one WHOIS host.
pub trait Extractor: Send + Sync {
    /// Host whose responses this extractor understands.
    fn host(&self) -> &'static str;

    /// Declaration for `property`, or `None` if the extractor is silent about it.
    fn declare(&self, property: Property) -> Option<Declaration>;

    /// Whether `content` is a throttling notice rather than an answer.
    fn is_throttled(&self, _content: &str) -> bool {
        false
    }
}

lazy_static::lazy_static! {
    static ref BUILTIN_CATALOG: Arc<ExtractorCatalog> = Arc::new(
        ExtractorCatalog::new()
            .with(RegistryGy)
            .with(WhoisEu)
            .with(CozaNetZa)
            .with(NicAc)
            .with(VerisignGrs)
    );
}

/// Host-name keyed collection of extractors.
#[derive(Clone, Default)]
pub struct ExtractorCatalog {
    extractors: Vec<Arc<dyn Extractor>>,
}

impl ExtractorCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// The catalog of extractors shipped with the library.
    pub fn builtin() -> Arc<ExtractorCatalog> {
        Arc::clone(&BUILTIN_CATALOG)
    }

    /// Register an extractor. A later registration for the same host
    /// replaces the earlier one.
    pub fn with<E: Extractor + 'static>(mut self, extractor: E) -> Self {
        self.extractors.push(Arc::new(extractor));
        self
    }

    /// Find the extractor bound to `host`, ignoring case.
    pub fn lookup(&self, host: &str) -> Option<Arc<dyn Extractor>> {
        self.extractors
            .iter()
            .rev()
            .find(|e| e.host().eq_ignore_ascii_case(host.trim()))
            .cloned()
    }

    /// Registered host names, in registration order.
    pub fn hosts(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.host()).collect()
    }

    pub fn len(&self) -> usize {
        self.extractors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.extractors.is_empty()
    }
}

impl fmt::Debug for ExtractorCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorCatalog")
            .field("hosts", &self.hosts())
            .finish()
    }
}

/// First capture group of `re` in `content`, trimmed.
pub(crate) fn capture(re: &Regex, content: &str) -> Option<String> {
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Non-empty trimmed lines of the block captured by `re`.
pub(crate) fn block_lines(re: &Regex, content: &str) -> Vec<String> {
    re.captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| {
            m.as_str()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Shortened copy of server output for error messages.
pub(crate) fn fragment(content: &str) -> String {
    const MAX_CHARS: usize = 120;
    let trimmed = content.trim();
    match trimmed.char_indices().nth(MAX_CHARS) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%SZ",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%d-%b-%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d-%b-%Y", "%Y/%m/%d", "%d/%m/%Y", "%d.%m.%Y"];

/// Parse a registry date or timestamp.
///
/// Date-only values are taken at midnight.
///
/// # Errors
///
/// Returns `WhoisError::UnrecognizedFormat` when no known layout matches.
pub(crate) fn parse_time(property: Property, value: &str) -> Result<NaiveDateTime, WhoisError> {
    let value = value.trim();

    for format in DATETIME_FORMATS {
        if let Ok(time) = NaiveDateTime::parse_from_str(value, format) {
            return Ok(time);
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            if let Some(time) = date.and_hms_opt(0, 0, 0) {
                return Ok(time);
            }
        }
    }

    Err(WhoisError::unrecognized_format(property.name(), value))
}

/// Optional timestamp captured by `re`.
pub(crate) fn captured_time(
    property: Property,
    re: &Regex,
    content: &str,
) -> Result<Option<PropertyValue>, WhoisError> {
    capture(re, content)
        .map(|raw| parse_time(property, &raw).map(PropertyValue::Time))
        .transpose()
}
