//! Extractor for whois.registry.gy (.gy).

use super::{block_lines, capture, captured_time, fragment, Declaration, Extractor};
use crate::answer::{DomainStatus, Property, PropertyValue};
use crate::error::WhoisError;
use regex::Regex;

lazy_static::lazy_static! {
    static ref DOMAIN_RE: Regex = Regex::new(r"Domain Name:[ \t]*(.+)").unwrap();
    static ref STATUS_RE: Regex = Regex::new(r"Status:[ \t]*(.+)").unwrap();
    static ref CREATED_RE: Regex = Regex::new(r"Created:[ \t]*(.+)").unwrap();
    static ref MODIFIED_RE: Regex = Regex::new(r"Modified:[ \t]*(.+)").unwrap();
    static ref EXPIRES_RE: Regex = Regex::new(r"Expires:[ \t]*(.+)").unwrap();
    static ref NAMESERVERS_RE: Regex =
        Regex::new(r"Name Servers:[ \t]*\r?\n((?:.+\n?)+)").unwrap();
}

pub struct RegistryGy;

impl Extractor for RegistryGy {
    fn host(&self) -> &'static str {
        "whois.registry.gy"
    }

    fn declare(&self, property: Property) -> Option<Declaration> {
        let declaration = match property {
            Property::Domain => Declaration::Supported(domain),
            Property::Status => Declaration::Supported(status),
            Property::Available => Declaration::Supported(available),
            Property::Registered => Declaration::Supported(registered),
            Property::CreatedOn => Declaration::Supported(created_on),
            Property::UpdatedOn => Declaration::Supported(updated_on),
            Property::ExpiresOn => Declaration::Supported(expires_on),
            Property::Nameservers => Declaration::Supported(nameservers),
            Property::Disclaimer
            | Property::DomainId
            | Property::ReferralWhois
            | Property::ReferralUrl
            | Property::Registrar
            | Property::RegistrantContact
            | Property::AdminContact
            | Property::TechnicalContact => Declaration::NotSupported,
        };
        Some(declaration)
    }
}

/// The registry reports exactly two states; anything else is a format change.
fn domain_status(content: &str) -> Result<DomainStatus, WhoisError> {
    let token = capture(&STATUS_RE, content).ok_or_else(|| {
        WhoisError::unrecognized_format(Property::Status.name(), fragment(content))
    })?;

    match token.to_lowercase().as_str() {
        "active" => Ok(DomainStatus::Registered),
        "not registered" => Ok(DomainStatus::Available),
        _ => Err(WhoisError::unrecognized_format(
            Property::Status.name(),
            token,
        )),
    }
}

fn domain(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(capture(&DOMAIN_RE, content).map(|d| PropertyValue::Text(d.to_lowercase())))
}

fn status(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    domain_status(content).map(|s| Some(PropertyValue::Status(s)))
}

fn available(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    domain_status(content).map(|s| Some(PropertyValue::Flag(s == DomainStatus::Available)))
}

fn registered(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    domain_status(content).map(|s| Some(PropertyValue::Flag(s == DomainStatus::Registered)))
}

fn created_on(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    captured_time(Property::CreatedOn, &CREATED_RE, content)
}

fn updated_on(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    captured_time(Property::UpdatedOn, &MODIFIED_RE, content)
}

fn expires_on(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    captured_time(Property::ExpiresOn, &EXPIRES_RE, content)
}

fn nameservers(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    let names = block_lines(&NAMESERVERS_RE, content)
        .into_iter()
        .map(|line| line.to_lowercase())
        .collect();
    Ok(Some(PropertyValue::List(names)))
}
