//! Extractor for whois.nic.ac (.ac).

use super::{capture, Declaration, Extractor};
use crate::answer::{Property, PropertyValue};
use crate::error::WhoisError;
use regex::Regex;

lazy_static::lazy_static! {
    static ref DOMAIN_RE: Regex = Regex::new(r#"Domain "?([^"\s]+)"?"#).unwrap();
    static ref AVAILABLE_RE: Regex = Regex::new(r"(?i)-\s*Available").unwrap();
}

pub struct NicAc;

impl Extractor for NicAc {
    fn host(&self) -> &'static str {
        "whois.nic.ac"
    }

    fn declare(&self, property: Property) -> Option<Declaration> {
        match property {
            Property::Domain => Some(Declaration::Supported(domain)),
            Property::Available => Some(Declaration::Supported(available)),
            Property::Status | Property::Registered => None,
            _ => Some(Declaration::NotSupported),
        }
    }
}

fn domain(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(capture(&DOMAIN_RE, content).map(|d| PropertyValue::Text(d.to_lowercase())))
}

fn available(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(Some(PropertyValue::Flag(AVAILABLE_RE.is_match(content))))
}

#[cfg(test)]
mod tests {
    use super::*;

    const AVAILABLE: &str = "Domain \"u34jedzcq.ac\" - Available\n";
    const REGISTERED: &str = "Domain \"GOOGLE.AC\" - Not available\nRegistrant: Google Inc.\n";

    #[test]
    fn test_domain() {
        assert_eq!(
            domain(REGISTERED).unwrap(),
            Some(PropertyValue::Text("google.ac".to_string()))
        );
    }

    #[test]
    fn test_available() {
        assert_eq!(available(AVAILABLE).unwrap(), Some(PropertyValue::Flag(true)));
        assert_eq!(available(REGISTERED).unwrap(), Some(PropertyValue::Flag(false)));
    }

    #[test]
    fn test_nameservers_not_supported() {
        assert!(matches!(
            NicAc.declare(Property::Nameservers),
            Some(Declaration::NotSupported)
        ));
    }
}
