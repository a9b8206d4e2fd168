//! The closed property set and typed property values.

use crate::error::WhoisError;
use chrono::NaiveDateTime;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Every property an extractor can expose.
///
/// Names outside this set are rejected with `WhoisError::UnknownProperty`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Property {
    Disclaimer,
    Domain,
    DomainId,
    ReferralWhois,
    ReferralUrl,
    Status,
    Available,
    Registered,
    CreatedOn,
    UpdatedOn,
    ExpiresOn,
    Registrar,
    RegistrantContact,
    AdminContact,
    TechnicalContact,
    Nameservers,
}

impl Property {
    /// All properties, in display order.
    pub const ALL: [Property; 16] = [
        Property::Disclaimer,
        Property::Domain,
        Property::DomainId,
        Property::ReferralWhois,
        Property::ReferralUrl,
        Property::Status,
        Property::Available,
        Property::Registered,
        Property::CreatedOn,
        Property::UpdatedOn,
        Property::ExpiresOn,
        Property::Registrar,
        Property::RegistrantContact,
        Property::AdminContact,
        Property::TechnicalContact,
        Property::Nameservers,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Property::Disclaimer => "disclaimer",
            Property::Domain => "domain",
            Property::DomainId => "domain_id",
            Property::ReferralWhois => "referral_whois",
            Property::ReferralUrl => "referral_url",
            Property::Status => "status",
            Property::Available => "available?",
            Property::Registered => "registered?",
            Property::CreatedOn => "created_on",
            Property::UpdatedOn => "updated_on",
            Property::ExpiresOn => "expires_on",
            Property::Registrar => "registrar",
            Property::RegistrantContact => "registrant_contact",
            Property::AdminContact => "admin_contact",
            Property::TechnicalContact => "technical_contact",
            Property::Nameservers => "nameservers",
        }
    }

    /// Boolean "is-X?" properties.
    pub fn is_query(&self) -> bool {
        matches!(self, Property::Available | Property::Registered)
    }

    /// Whether `value` has the shape this property carries.
    pub fn accepts(&self, value: &PropertyValue) -> bool {
        match self {
            Property::Disclaimer
            | Property::Domain
            | Property::DomainId
            | Property::ReferralWhois
            | Property::ReferralUrl => matches!(value, PropertyValue::Text(_)),
            Property::Status => matches!(value, PropertyValue::Status(_)),
            Property::Available | Property::Registered => matches!(value, PropertyValue::Flag(_)),
            Property::CreatedOn | Property::UpdatedOn | Property::ExpiresOn => {
                matches!(value, PropertyValue::Time(_))
            }
            Property::Registrar => matches!(value, PropertyValue::Registrar(_)),
            Property::RegistrantContact | Property::AdminContact | Property::TechnicalContact => {
                matches!(value, PropertyValue::Contact(_))
            }
            Property::Nameservers => matches!(value, PropertyValue::List(_)),
        }
    }
}

impl FromStr for Property {
    type Err = WhoisError;

    /// Parse a property name. The trailing `?` is optional for the two
    /// query properties.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        let bare = name.strip_suffix('?').unwrap_or(&name);

        Property::ALL
            .iter()
            .copied()
            .find(|p| {
                if p.is_query() {
                    p.name().trim_end_matches('?') == bare
                } else {
                    p.name() == name
                }
            })
            .ok_or_else(|| WhoisError::unknown_property(s.trim()))
    }
}

impl fmt::Display for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl Serialize for Property {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

/// Registration state of a domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainStatus {
    Available,
    Registered,
}

impl fmt::Display for DomainStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DomainStatus::Available => write!(f, "available"),
            DomainStatus::Registered => write!(f, "registered"),
        }
    }
}

/// Sponsoring registrar.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Registrar {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Which contact slot a [`Contact`] fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactRole {
    Registrant,
    Admin,
    Technical,
}

/// A registrant, administrative or technical contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Contact {
    pub role: ContactRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub zip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Contact {
    /// An empty contact for `role`.
    pub fn new(role: ContactRole) -> Self {
        Self {
            role,
            id: None,
            name: None,
            organization: None,
            address: None,
            city: None,
            zip: None,
            country_code: None,
            phone: None,
            email: None,
        }
    }
}

/// A computed property value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Text(String),
    Status(DomainStatus),
    Flag(bool),
    Time(NaiveDateTime),
    Registrar(Registrar),
    Contact(Contact),
    List(Vec<String>),
}

impl PropertyValue {
    pub fn into_text(self) -> Option<String> {
        match self {
            PropertyValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_status(self) -> Option<DomainStatus> {
        match self {
            PropertyValue::Status(s) => Some(s),
            _ => None,
        }
    }

    pub fn into_flag(self) -> Option<bool> {
        match self {
            PropertyValue::Flag(b) => Some(b),
            _ => None,
        }
    }

    pub fn into_time(self) -> Option<NaiveDateTime> {
        match self {
            PropertyValue::Time(t) => Some(t),
            _ => None,
        }
    }

    pub fn into_registrar(self) -> Option<Registrar> {
        match self {
            PropertyValue::Registrar(r) => Some(r),
            _ => None,
        }
    }

    pub fn into_contact(self) -> Option<Contact> {
        match self {
            PropertyValue::Contact(c) => Some(c),
            _ => None,
        }
    }

    pub fn into_list(self) -> Option<Vec<String>> {
        match self {
            PropertyValue::List(l) => Some(l),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyValue::Text(s) => write!(f, "{}", s),
            PropertyValue::Status(s) => write!(f, "{}", s),
            PropertyValue::Flag(b) => write!(f, "{}", b),
            PropertyValue::Time(t) => write!(f, "{}", t),
            PropertyValue::Registrar(r) => {
                let label = r
                    .name
                    .as_deref()
                    .or(r.organization.as_deref())
                    .or(r.id.as_deref())
                    .unwrap_or("-");
                match &r.url {
                    Some(url) => write!(f, "{} ({})", label, url),
                    None => write!(f, "{}", label),
                }
            }
            PropertyValue::Contact(c) => {
                let label = c
                    .name
                    .as_deref()
                    .or(c.organization.as_deref())
                    .or(c.id.as_deref())
                    .unwrap_or("-");
                match &c.email {
                    Some(email) => write!(f, "{} <{}>", label, email),
                    None => write!(f, "{}", label),
                }
            }
            PropertyValue::List(items) => write!(f, "{}", items.join(", ")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_property_names() {
        assert_eq!("created_on".parse::<Property>().unwrap(), Property::CreatedOn);
        assert_eq!("available?".parse::<Property>().unwrap(), Property::Available);
        assert_eq!("registered".parse::<Property>().unwrap(), Property::Registered);
        assert_eq!(" Nameservers ".parse::<Property>().unwrap(), Property::Nameservers);
    }

    #[test]
    fn test_unknown_property_name() {
        assert_eq!(
            "favourite_color".parse::<Property>(),
            Err(WhoisError::unknown_property("favourite_color"))
        );
        // Only query properties take the `?` suffix.
        assert!("status?".parse::<Property>().is_err());
    }

    #[test]
    fn test_every_property_round_trips_through_its_name() {
        for property in Property::ALL {
            assert_eq!(property.name().parse::<Property>().unwrap(), property);
        }
    }

    #[test]
    fn test_accepts_checks_value_shape() {
        assert!(Property::Status.accepts(&PropertyValue::Status(DomainStatus::Available)));
        assert!(!Property::Status.accepts(&PropertyValue::Text("available".into())));
        assert!(Property::Nameservers.accepts(&PropertyValue::List(vec![])));
    }

    #[test]
    fn test_value_display() {
        let registrar = PropertyValue::Registrar(Registrar {
            name: Some("MarkMonitor Inc.".into()),
            url: Some("http://www.markmonitor.com".into()),
            ..Default::default()
        });
        assert_eq!(
            registrar.to_string(),
            "MarkMonitor Inc. (http://www.markmonitor.com)"
        );
        assert_eq!(
            PropertyValue::List(vec!["ns1.test".into(), "ns2.test".into()]).to_string(),
            "ns1.test, ns2.test"
        );
    }
}
