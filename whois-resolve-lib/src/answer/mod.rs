//! The result of a WHOIS query.
//!
//! An [`Answer`] holds the ordered parts collected while chasing referrals
//! and, on first property access, builds an [`ExtractorFacade`] that reads
//! structured properties out of them.
//!
//! Two notions of equality coexist:
//!
//! - `==` is structural. Two answers are equal when their parts are equal,
//!   regardless of the server definition, and an answer equals a string
//!   when its content does.
//! - [`Answer::unchanged`] is semantic. It compares every property, so
//!   answers that differ only in formatting noise are unchanged.

mod facade;
mod property;

pub use facade::ExtractorFacade;
pub use property::{Contact, ContactRole, DomainStatus, Property, PropertyValue, Registrar};

use crate::error::WhoisError;
use crate::extractors::ExtractorCatalog;
use crate::types::{Part, ServerDefinition};
use chrono::NaiveDateTime;
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Ordered server replies for one query.
#[derive(Serialize)]
pub struct Answer {
    server: Option<ServerDefinition>,
    parts: Vec<Part>,
    #[serde(skip)]
    catalog: Arc<ExtractorCatalog>,
    #[serde(skip)]
    facade: OnceLock<ExtractorFacade>,
}

impl Answer {
    /// Create an answer read with the built-in extractors.
    pub fn new(server: Option<ServerDefinition>, parts: Vec<Part>) -> Self {
        Self {
            server,
            parts,
            catalog: ExtractorCatalog::builtin(),
            facade: OnceLock::new(),
        }
    }

    /// Read this answer with `catalog` instead of the built-in extractors.
    pub fn with_catalog(mut self, catalog: Arc<ExtractorCatalog>) -> Self {
        self.catalog = catalog;
        self.facade = OnceLock::new();
        self
    }

    /// Definition of the server first queried, if known.
    pub fn server(&self) -> Option<&ServerDefinition> {
        self.server.as_ref()
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// Part bodies joined with a newline.
    pub fn content(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.body.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_match(&self, pattern: &Regex) -> bool {
        pattern.is_match(&self.content())
    }

    /// First match of `pattern` in the content.
    pub fn find(&self, pattern: &Regex) -> Option<String> {
        pattern
            .find(&self.content())
            .map(|found| found.as_str().to_string())
    }

    /// The property view, built once and reused.
    pub fn facade(&self) -> &ExtractorFacade {
        self.facade
            .get_or_init(|| ExtractorFacade::new(&self.parts, &self.catalog))
    }

    pub fn get(&self, property: Property) -> Result<Option<PropertyValue>, WhoisError> {
        self.facade().get(property)
    }

    /// Property by name, e.g. `"created_on"` or `"available?"`.
    pub fn get_by_name(&self, name: &str) -> Result<Option<PropertyValue>, WhoisError> {
        self.facade().get_by_name(name)
    }

    pub fn is_supported(&self, property: Property) -> bool {
        self.facade().is_supported(property)
    }

    pub fn is_present(&self, property: Property) -> Result<bool, WhoisError> {
        self.facade().is_present(property)
    }

    /// Whether the reply is a throttling notice instead of data.
    pub fn is_throttled(&self) -> bool {
        self.facade().is_throttled()
    }

    fn typed<T>(
        &self,
        property: Property,
        convert: fn(PropertyValue) -> Option<T>,
    ) -> Result<Option<T>, WhoisError> {
        Ok(self.get(property)?.and_then(convert))
    }

    pub fn disclaimer(&self) -> Result<Option<String>, WhoisError> {
        self.typed(Property::Disclaimer, PropertyValue::into_text)
    }

    pub fn domain(&self) -> Result<Option<String>, WhoisError> {
        self.typed(Property::Domain, PropertyValue::into_text)
    }

    pub fn domain_id(&self) -> Result<Option<String>, WhoisError> {
        self.typed(Property::DomainId, PropertyValue::into_text)
    }

    pub fn referral_whois(&self) -> Result<Option<String>, WhoisError> {
        self.typed(Property::ReferralWhois, PropertyValue::into_text)
    }

    pub fn referral_url(&self) -> Result<Option<String>, WhoisError> {
        self.typed(Property::ReferralUrl, PropertyValue::into_text)
    }

    pub fn status(&self) -> Result<Option<DomainStatus>, WhoisError> {
        self.typed(Property::Status, PropertyValue::into_status)
    }

    /// `false` when the extractor cannot tell.
    pub fn is_available(&self) -> Result<bool, WhoisError> {
        Ok(self
            .typed(Property::Available, PropertyValue::into_flag)?
            .unwrap_or(false))
    }

    /// `false` when the extractor cannot tell.
    pub fn is_registered(&self) -> Result<bool, WhoisError> {
        Ok(self
            .typed(Property::Registered, PropertyValue::into_flag)?
            .unwrap_or(false))
    }

    pub fn created_on(&self) -> Result<Option<NaiveDateTime>, WhoisError> {
        self.typed(Property::CreatedOn, PropertyValue::into_time)
    }

    pub fn updated_on(&self) -> Result<Option<NaiveDateTime>, WhoisError> {
        self.typed(Property::UpdatedOn, PropertyValue::into_time)
    }

    pub fn expires_on(&self) -> Result<Option<NaiveDateTime>, WhoisError> {
        self.typed(Property::ExpiresOn, PropertyValue::into_time)
    }

    pub fn registrar(&self) -> Result<Option<Registrar>, WhoisError> {
        self.typed(Property::Registrar, PropertyValue::into_registrar)
    }

    pub fn registrant_contact(&self) -> Result<Option<Contact>, WhoisError> {
        self.typed(Property::RegistrantContact, PropertyValue::into_contact)
    }

    pub fn admin_contact(&self) -> Result<Option<Contact>, WhoisError> {
        self.typed(Property::AdminContact, PropertyValue::into_contact)
    }

    pub fn technical_contact(&self) -> Result<Option<Contact>, WhoisError> {
        self.typed(Property::TechnicalContact, PropertyValue::into_contact)
    }

    pub fn nameservers(&self) -> Result<Option<Vec<String>>, WhoisError> {
        self.typed(Property::Nameservers, PropertyValue::into_list)
    }

    /// Every available contact, in registrant, admin, technical order.
    ///
    /// Contacts the extractor does not support are skipped.
    pub fn contacts(&self) -> Result<Vec<Contact>, WhoisError> {
        let mut contacts = Vec::new();
        for property in [
            Property::RegistrantContact,
            Property::AdminContact,
            Property::TechnicalContact,
        ] {
            match self.typed(property, PropertyValue::into_contact) {
                Ok(Some(contact)) => contacts.push(contact),
                Ok(None) | Err(WhoisError::PropertyNotSupported { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(contacts)
    }

    /// All properties. Not-supported ones map to `None`.
    pub fn properties(&self) -> Result<BTreeMap<Property, Option<PropertyValue>>, WhoisError> {
        let mut properties = BTreeMap::new();
        for property in Property::ALL {
            let value = match self.get(property) {
                Ok(value) => value,
                Err(WhoisError::PropertyNotSupported { .. }) => None,
                Err(e) => return Err(e),
            };
            properties.insert(property, value);
        }
        Ok(properties)
    }

    /// Whether `other` carries the same property values.
    ///
    /// # Errors
    ///
    /// Returns `WhoisError::IncomparableAnswer` when the answers were read by
    /// different extractors. Comparing an answer with itself always succeeds.
    pub fn unchanged(&self, other: &Answer) -> Result<bool, WhoisError> {
        if std::ptr::eq(self, other) {
            return Ok(true);
        }
        self.facade().unchanged(other.facade())
    }

    pub fn changed(&self, other: &Answer) -> Result<bool, WhoisError> {
        self.unchanged(other).map(|same| !same)
    }
}

impl Clone for Answer {
    fn clone(&self) -> Self {
        Self {
            server: self.server.clone(),
            parts: self.parts.clone(),
            catalog: Arc::clone(&self.catalog),
            facade: OnceLock::new(),
        }
    }
}

impl fmt::Debug for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Answer")
            .field("server", &self.server)
            .field("parts", &self.parts)
            .finish()
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.content())
    }
}

impl PartialEq for Answer {
    fn eq(&self, other: &Answer) -> bool {
        std::ptr::eq(self, other) || self.parts == other.parts
    }
}

impl PartialEq<str> for Answer {
    fn eq(&self, other: &str) -> bool {
        self.content() == other
    }
}

impl PartialEq<&str> for Answer {
    fn eq(&self, other: &&str) -> bool {
        self.content() == *other
    }
}

impl PartialEq<String> for Answer {
    fn eq(&self, other: &String) -> bool {
        self.content() == *other
    }
}

impl PartialEq<Answer> for String {
    fn eq(&self, other: &Answer) -> bool {
        *self == other.content()
    }
}

impl PartialEq<Answer> for &str {
    fn eq(&self, other: &Answer) -> bool {
        *self == other.content()
    }
}
