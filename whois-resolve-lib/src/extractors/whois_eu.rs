//! Extractor for whois.eu (.eu).

use super::{block_lines, capture, Declaration, Extractor};
use crate::answer::{DomainStatus, Property, PropertyValue, Registrar};
use crate::error::WhoisError;
use regex::Regex;

lazy_static::lazy_static! {
    static ref DOMAIN_RE: Regex = Regex::new(r"(?m)^Domain:[ \t]*(.+)").unwrap();
    static ref AVAILABLE_RE: Regex = Regex::new(r"Status:\s+AVAILABLE").unwrap();
    static ref REGISTRAR_RE: Regex =
        Regex::new(r"(?m)^Registrar:[ \t]*\r?\n((?:[ \t]+.+\n?)+)").unwrap();
    static ref REGISTRAR_NAME_RE: Regex = Regex::new(r"Name:[ \t]*(.+)").unwrap();
    static ref REGISTRAR_WEBSITE_RE: Regex = Regex::new(r"Website:[ \t]*(.+)").unwrap();
    static ref NAMESERVERS_RE: Regex =
        Regex::new(r"(?m)^Name ?servers:[ \t]*\r?\n((?:.+\n?)+)").unwrap();
}

pub struct WhoisEu;

impl Extractor for WhoisEu {
    fn host(&self) -> &'static str {
        "whois.eu"
    }

    fn declare(&self, property: Property) -> Option<Declaration> {
        let declaration = match property {
            Property::Domain => Declaration::Supported(domain),
            Property::Status => Declaration::Supported(status),
            Property::Available => Declaration::Supported(available),
            Property::Registrar => Declaration::Supported(registrar),
            Property::Nameservers => Declaration::Supported(nameservers),
            Property::Disclaimer
            | Property::DomainId
            | Property::ReferralWhois
            | Property::ReferralUrl
            | Property::CreatedOn
            | Property::UpdatedOn
            | Property::ExpiresOn
            | Property::RegistrantContact
            | Property::AdminContact
            | Property::TechnicalContact => Declaration::NotSupported,
            // derived from availability
            Property::Registered => return None,
        };
        Some(declaration)
    }
}

fn is_available(content: &str) -> bool {
    AVAILABLE_RE.is_match(content)
}

fn domain(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(capture(&DOMAIN_RE, content).map(|d| PropertyValue::Text(d.to_lowercase())))
}

fn status(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    let status = if is_available(content) {
        DomainStatus::Available
    } else {
        DomainStatus::Registered
    };
    Ok(Some(PropertyValue::Status(status)))
}

fn available(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(Some(PropertyValue::Flag(is_available(content))))
}

fn registrar(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    let section = match REGISTRAR_RE.captures(content).and_then(|c| c.get(1)) {
        Some(section) => section.as_str(),
        None => return Ok(None),
    };

    let registrar = Registrar {
        name: capture(&REGISTRAR_NAME_RE, section),
        url: capture(&REGISTRAR_WEBSITE_RE, section),
        ..Default::default()
    };

    if registrar.name.is_none() && registrar.url.is_none() {
        Ok(None)
    } else {
        Ok(Some(PropertyValue::Registrar(registrar)))
    }
}

/// Entries may carry glue addresses, e.g. `ns1.example.eu (192.0.2.1)`.
fn nameservers(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    let names = block_lines(&NAMESERVERS_RE, content)
        .iter()
        .filter_map(|line| line.split_whitespace().next())
        .map(str::to_lowercase)
        .collect();
    Ok(Some(PropertyValue::List(names)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REGISTERED: &str = "Domain:\tgoogle.eu\n\nRegistrant:\n        NOT DISCLOSED!\n\nRegistrar:\n        Name:\tMarkMonitor Inc.\n        Website:\twww.markmonitor.com\n\nName servers:\n        ns1.google.com\n        ns2.google.com (192.0.2.1)\n\n";
    const AVAILABLE: &str = "Domain:\tu34jedzcq.eu\n\nStatus:\tAVAILABLE\n";

    #[test]
    fn test_registered_domain() {
        assert_eq!(
            domain(REGISTERED).unwrap(),
            Some(PropertyValue::Text("google.eu".to_string()))
        );
        assert_eq!(available(REGISTERED).unwrap(), Some(PropertyValue::Flag(false)));
        assert_eq!(
            status(REGISTERED).unwrap(),
            Some(PropertyValue::Status(DomainStatus::Registered))
        );
    }

    #[test]
    fn test_available_domain() {
        assert_eq!(available(AVAILABLE).unwrap(), Some(PropertyValue::Flag(true)));
        assert_eq!(registrar(AVAILABLE).unwrap(), None);
        assert_eq!(nameservers(AVAILABLE).unwrap(), Some(PropertyValue::List(vec![])));
    }

    #[test]
    fn test_registrar_section() {
        assert_eq!(
            registrar(REGISTERED).unwrap(),
            Some(PropertyValue::Registrar(Registrar {
                name: Some("MarkMonitor Inc.".to_string()),
                url: Some("www.markmonitor.com".to_string()),
                ..Default::default()
            }))
        );
    }

    #[test]
    fn test_nameservers_drop_glue_addresses() {
        assert_eq!(
            nameservers(REGISTERED).unwrap(),
            Some(PropertyValue::List(vec![
                "ns1.google.com".to_string(),
                "ns2.google.com".to_string()
            ]))
        );
    }

    #[test]
    fn test_dates_are_not_supported() {
        assert!(matches!(
            WhoisEu.declare(Property::CreatedOn),
            Some(Declaration::NotSupported)
        ));
        assert!(WhoisEu.declare(Property::Registered).is_none());
    }
}
