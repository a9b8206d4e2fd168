//! Property resolution across the parts of an answer.
//!
//! Each part is bound to the extractor registered for its host. A property
//! is resolved part by part, last part first. For a single part the
//! outcome is one of:
//!
//! - a value (possibly absent) computed by a declared rule
//! - an explicit "not supported" declaration
//! - silence, in which case `status` and `registered?` are derived from
//!   `available?` (and `registered?` from `status`) where possible
//!
//! Rule results are cached per part and property, so repeated reads never
//! re-run extraction.

use super::property::{DomainStatus, Property, PropertyValue};
use crate::error::WhoisError;
use crate::extractors::{Declaration, Extractor, ExtractorCatalog, Rule};
use crate::types::Part;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Outcome of resolving one property against one part.
enum Resolution {
    Value(Option<PropertyValue>),
    NotSupported,
    Undeclared,
}

/// Declaration-level view of one property for one part, without running rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Support {
    Supported,
    NotSupported,
    Undeclared,
}

type Cache = HashMap<(usize, Property), Option<PropertyValue>>;

/// Read-only property view over the parts of one answer.
pub struct ExtractorFacade {
    parts: Vec<Part>,
    bindings: Vec<Option<Arc<dyn Extractor>>>,
    cache: Mutex<Cache>,
}

impl ExtractorFacade {
    /// Bind every part to the extractor registered for its host.
    ///
    /// Parts from hosts without an extractor are kept but never consulted.
    pub fn new(parts: &[Part], catalog: &ExtractorCatalog) -> Self {
        let bindings = parts
            .iter()
            .map(|part| {
                let extractor = catalog.lookup(&part.host);
                if extractor.is_none() {
                    debug!(host = %part.host, "No extractor for part");
                }
                extractor
            })
            .collect();

        Self {
            parts: parts.to_vec(),
            bindings,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Host of the extractor bound to each part, `None` where unbound.
    pub fn signature(&self) -> Vec<Option<&'static str>> {
        self.bindings
            .iter()
            .map(|binding| binding.as_ref().map(|e| e.host()))
            .collect()
    }

    /// Value of `property`.
    ///
    /// # Errors
    ///
    /// - `PropertyNotSupported` if no part yields a value and at least one
    ///   bound extractor declares the property not supported
    /// - `ExtractorNotFound` if the answer has parts but none is bound
    /// - whatever the extractor rule raises (e.g. `UnrecognizedFormat`)
    pub fn get(&self, property: Property) -> Result<Option<PropertyValue>, WhoisError> {
        self.ensure_bound()?;

        let mut not_supported = false;
        for index in (0..self.parts.len()).rev() {
            if self.bindings[index].is_none() {
                continue;
            }
            match self.resolve(index, property)? {
                Resolution::Value(value) => return Ok(value),
                Resolution::NotSupported => not_supported = true,
                Resolution::Undeclared => {}
            }
        }

        if not_supported {
            Err(WhoisError::property_not_supported(property.name()))
        } else {
            Ok(None)
        }
    }

    /// Value of the property called `name`.
    pub fn get_by_name(&self, name: &str) -> Result<Option<PropertyValue>, WhoisError> {
        self.get(name.parse()?)
    }

    /// Whether `property` has a value. Not-supported properties are absent.
    pub fn is_present(&self, property: Property) -> Result<bool, WhoisError> {
        match self.get(property) {
            Ok(value) => Ok(value.is_some()),
            Err(WhoisError::PropertyNotSupported { .. }) => Ok(false),
            Err(e) => Err(e),
        }
    }

    /// Whether some bound extractor declares or can derive `property`.
    pub fn is_supported(&self, property: Property) -> bool {
        self.bound()
            .any(|extractor| support(extractor, property) == Support::Supported)
    }

    /// Whether some bound extractor says anything at all about `property`.
    pub fn is_declared(&self, property: Property) -> bool {
        self.bound()
            .any(|extractor| extractor.declare(property).is_some())
    }

    /// Whether any bound extractor recognizes its part as a throttling notice.
    pub fn is_throttled(&self) -> bool {
        self.parts
            .iter()
            .zip(&self.bindings)
            .any(|(part, binding)| binding.as_ref().map_or(false, |e| e.is_throttled(&part.body)))
    }

    /// Semantic equality over every property.
    ///
    /// # Errors
    ///
    /// Returns `IncomparableAnswer` when the two facades are bound to
    /// different extractors.
    pub fn unchanged(&self, other: &ExtractorFacade) -> Result<bool, WhoisError> {
        if std::ptr::eq(self, other) {
            return Ok(true);
        }

        let (left, right) = (self.signature(), other.signature());
        if left != right {
            return Err(WhoisError::incomparable(
                describe_signature(&left),
                describe_signature(&right),
            ));
        }

        for property in Property::ALL {
            if self.comparable(property)? != other.comparable(property)? {
                debug!(property = %property, "Answers differ");
                return Ok(false);
            }
        }
        Ok(true)
    }

    pub fn changed(&self, other: &ExtractorFacade) -> Result<bool, WhoisError> {
        self.unchanged(other).map(|same| !same)
    }

    /// Value used for comparison; not-supported compares equal to absent.
    fn comparable(&self, property: Property) -> Result<Option<PropertyValue>, WhoisError> {
        match self.get(property) {
            Err(WhoisError::PropertyNotSupported { .. }) => Ok(None),
            other => other,
        }
    }

    fn bound(&self) -> impl Iterator<Item = &Arc<dyn Extractor>> {
        self.bindings.iter().flatten()
    }

    fn ensure_bound(&self) -> Result<(), WhoisError> {
        match self.parts.last() {
            Some(last) if self.bindings.iter().all(Option::is_none) => {
                Err(WhoisError::extractor_not_found(last.host.clone()))
            }
            _ => Ok(()),
        }
    }

    fn resolve(&self, index: usize, property: Property) -> Result<Resolution, WhoisError> {
        let extractor = match &self.bindings[index] {
            Some(extractor) => extractor,
            None => return Ok(Resolution::Undeclared),
        };

        match extractor.declare(property) {
            Some(Declaration::Supported(rule)) => {
                Ok(Resolution::Value(self.compute(index, property, rule)?))
            }
            Some(Declaration::NotSupported) => Ok(Resolution::NotSupported),
            None => self.derive(index, property),
        }
    }

    /// Defaults for undeclared status and registration queries.
    fn derive(&self, index: usize, property: Property) -> Result<Resolution, WhoisError> {
        match property {
            Property::Status => match self.resolve(index, Property::Available)? {
                Resolution::Value(Some(PropertyValue::Flag(available))) => {
                    Ok(Resolution::Value(Some(PropertyValue::Status(if available {
                        DomainStatus::Available
                    } else {
                        DomainStatus::Registered
                    }))))
                }
                _ => Ok(Resolution::Undeclared),
            },
            Property::Registered => {
                if let Resolution::Value(Some(PropertyValue::Flag(available))) =
                    self.resolve(index, Property::Available)?
                {
                    return Ok(Resolution::Value(Some(PropertyValue::Flag(!available))));
                }
                match self.resolve(index, Property::Status)? {
                    Resolution::Value(Some(PropertyValue::Status(status))) => Ok(
                        Resolution::Value(Some(PropertyValue::Flag(status == DomainStatus::Registered))),
                    ),
                    _ => Ok(Resolution::Undeclared),
                }
            }
            _ => Ok(Resolution::Undeclared),
        }
    }

    /// Run `rule` for one part, at most once.
    ///
    /// The cache lock is not held while the rule runs.
    fn compute(
        &self,
        index: usize,
        property: Property,
        rule: Rule,
    ) -> Result<Option<PropertyValue>, WhoisError> {
        let key = (index, property);
        if let Some(value) = self.cache().get(&key) {
            return Ok(value.clone());
        }

        let value = rule(&self.parts[index].body)?;
        if let Some(found) = &value {
            if !property.accepts(found) {
                return Err(WhoisError::internal(format!(
                    "Extractor for {} produced {:?} for '{}'",
                    self.parts[index].host, found, property
                )));
            }
        }

        self.cache().insert(key, value.clone());
        Ok(value)
    }

    fn cache(&self) -> MutexGuard<'_, Cache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for ExtractorFacade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractorFacade")
            .field("signature", &self.signature())
            .finish()
    }
}

/// Declaration-level support, including derivable defaults.
fn support(extractor: &Arc<dyn Extractor>, property: Property) -> Support {
    match extractor.declare(property) {
        Some(Declaration::Supported(_)) => Support::Supported,
        Some(Declaration::NotSupported) => Support::NotSupported,
        None => match property {
            Property::Status => derived(support(extractor, Property::Available)),
            Property::Registered => {
                if support(extractor, Property::Available) == Support::Supported {
                    Support::Supported
                } else {
                    derived(support(extractor, Property::Status))
                }
            }
            _ => Support::Undeclared,
        },
    }
}

fn derived(source: Support) -> Support {
    match source {
        Support::Supported => Support::Supported,
        _ => Support::Undeclared,
    }
}

fn describe_signature(signature: &[Option<&'static str>]) -> String {
    signature
        .iter()
        .map(|host| host.unwrap_or("?"))
        .collect::<Vec<_>>()
        .join(", ")
}
