//! Extractor for whois.coza.net.za (.co.za).
//!
//! The server answers a bare `Available` for free names and a free-form
//! record otherwise. An empty reply means the client was throttled.

use super::{Declaration, Extractor};
use crate::answer::{Property, PropertyValue};
use crate::error::WhoisError;

pub struct CozaNetZa;

impl Extractor for CozaNetZa {
    fn host(&self) -> &'static str {
        "whois.coza.net.za"
    }

    fn declare(&self, property: Property) -> Option<Declaration> {
        match property {
            Property::Available => Some(Declaration::Supported(available)),
            Property::Status | Property::Registered => None,
            _ => Some(Declaration::NotSupported),
        }
    }

    fn is_throttled(&self, content: &str) -> bool {
        content.trim().is_empty()
    }
}

fn available(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(Some(PropertyValue::Flag(content.trim() == "Available")))
}
