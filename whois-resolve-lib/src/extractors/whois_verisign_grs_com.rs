//! Extractor for whois.verisign-grs.com (.com, .net).
//!
//! Thin registry records carry only the sponsoring registrar, the referral
//! server, name servers and dates. Status and registration are left to the
//! facade, which derives them from availability.

use super::{capture, captured_time, Declaration, Extractor};
use crate::answer::{Property, PropertyValue, Registrar};
use crate::error::WhoisError;
use regex::Regex;

lazy_static::lazy_static! {
    static ref DISCLAIMER_RE: Regex = Regex::new(r"(?s)NOTICE:[ \t]*(.+?)\r?\n\r?\n").unwrap();
    static ref DOMAIN_RE: Regex = Regex::new(r"Domain Name:[ \t]*(.+)").unwrap();
    static ref NO_MATCH_RE: Regex = Regex::new(r#"No match for ""#).unwrap();
    static ref WHOIS_SERVER_RE: Regex = Regex::new(r"Whois Server:[ \t]*(.+)").unwrap();
    static ref REFERRAL_URL_RE: Regex = Regex::new(r"Referral URL:[ \t]*(.+)").unwrap();
    static ref REGISTRAR_RE: Regex = Regex::new(r"(?m)^[ \t]*Registrar:[ \t]*(.+)").unwrap();
    static ref CREATED_RE: Regex = Regex::new(r"Creation Date:[ \t]*(.+)").unwrap();
    static ref UPDATED_RE: Regex = Regex::new(r"Updated Date:[ \t]*(.+)").unwrap();
    static ref EXPIRES_RE: Regex = Regex::new(r"Expiration Date:[ \t]*(.+)").unwrap();
    static ref NAME_SERVER_RE: Regex = Regex::new(r"Name Server:[ \t]*(.+)").unwrap();
    static ref WHITESPACE_RE: Regex = Regex::new(r"\s+").unwrap();
}

pub struct VerisignGrs;

impl Extractor for VerisignGrs {
    fn host(&self) -> &'static str {
        "whois.verisign-grs.com"
    }

    fn declare(&self, property: Property) -> Option<Declaration> {
        let declaration = match property {
            Property::Disclaimer => Declaration::Supported(disclaimer),
            Property::Domain => Declaration::Supported(domain),
            Property::ReferralWhois => Declaration::Supported(referral_whois),
            Property::ReferralUrl => Declaration::Supported(referral_url),
            Property::Available => Declaration::Supported(available),
            Property::CreatedOn => Declaration::Supported(created_on),
            Property::UpdatedOn => Declaration::Supported(updated_on),
            Property::ExpiresOn => Declaration::Supported(expires_on),
            Property::Registrar => Declaration::Supported(registrar),
            Property::Nameservers => Declaration::Supported(nameservers),
            Property::DomainId
            | Property::RegistrantContact
            | Property::AdminContact
            | Property::TechnicalContact => Declaration::NotSupported,
            Property::Status | Property::Registered => return None,
        };
        Some(declaration)
    }
}

fn text(re: &Regex, content: &str) -> Option<PropertyValue> {
    capture(re, content).map(PropertyValue::Text)
}

fn disclaimer(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(capture(&DISCLAIMER_RE, content)
        .map(|notice| PropertyValue::Text(WHITESPACE_RE.replace_all(&notice, " ").into_owned())))
}

fn domain(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(capture(&DOMAIN_RE, content).map(|d| PropertyValue::Text(d.to_lowercase())))
}

fn referral_whois(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(text(&WHOIS_SERVER_RE, content))
}

fn referral_url(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(text(&REFERRAL_URL_RE, content))
}

fn available(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(Some(PropertyValue::Flag(NO_MATCH_RE.is_match(content))))
}

fn created_on(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    captured_time(Property::CreatedOn, &CREATED_RE, content)
}

fn updated_on(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    captured_time(Property::UpdatedOn, &UPDATED_RE, content)
}

fn expires_on(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    captured_time(Property::ExpiresOn, &EXPIRES_RE, content)
}

fn registrar(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    Ok(capture(&REGISTRAR_RE, content).map(|name| {
        PropertyValue::Registrar(Registrar {
            name: Some(name),
            url: capture(&REFERRAL_URL_RE, content),
            ..Default::default()
        })
    }))
}

fn nameservers(content: &str) -> Result<Option<PropertyValue>, WhoisError> {
    let names = NAME_SERVER_RE
        .captures_iter(content)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_lowercase())
        .filter(|name| !name.is_empty() && name != "no nameserver")
        .collect();
    Ok(Some(PropertyValue::List(names)))
}
