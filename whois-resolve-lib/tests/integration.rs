// whois-resolve-lib/tests/integration.rs

//! Integration tests for whois-resolve-lib exports and the query pipeline

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use whois_resolve_lib::{
    AdapterKind, Answer, ClientSettings, Declaration, DomainStatus, Extractor, ExtractorCatalog,
    Part, Property, PropertyValue, Request, ServerDefinition, ServerRegistry, Transport,
    WhoisClient, WhoisError,
};

/// Replays canned responses in order and records the hosts asked.
struct ScriptedTransport {
    responses: Mutex<VecDeque<String>>,
    hosts: Mutex<Vec<String>>,
}

impl ScriptedTransport {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            hosts: Mutex::new(Vec::new()),
        })
    }

    fn hosts(&self) -> Vec<String> {
        self.hosts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn ask(&self, request: &Request<'_>) -> Result<String, WhoisError> {
        self.hosts.lock().unwrap().push(request.host.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| WhoisError::connection(request.host, "no scripted response"))
    }
}

/// Accepts the request and never answers.
struct StalledTransport;

#[async_trait]
impl Transport for StalledTransport {
    async fn ask(&self, _request: &Request<'_>) -> Result<String, WhoisError> {
        std::future::pending().await
    }
}

/// Replays canned responses, then never answers again.
struct StallAfterTransport {
    responses: Mutex<VecDeque<String>>,
    calls: Mutex<usize>,
}

impl StallAfterTransport {
    fn new(responses: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.iter().map(|r| r.to_string()).collect()),
            calls: Mutex::new(0),
        })
    }

    fn calls(&self) -> usize {
        *self.calls.lock().unwrap()
    }
}

#[async_trait]
impl Transport for StallAfterTransport {
    async fn ask(&self, _request: &Request<'_>) -> Result<String, WhoisError> {
        *self.calls.lock().unwrap() += 1;
        let next = self.responses.lock().unwrap().pop_front();
        match next {
            Some(response) => Ok(response),
            None => std::future::pending().await,
        }
    }
}

/// Always answers with an empty body.
struct BlankTransport;

#[async_trait]
impl Transport for BlankTransport {
    async fn ask(&self, _request: &Request<'_>) -> Result<String, WhoisError> {
        Ok(String::new())
    }
}

fn client_with(transport: Arc<dyn Transport>) -> WhoisClient {
    WhoisClient::with_settings(ClientSettings::default().with_retry_delay(Duration::ZERO))
        .with_transport(transport)
}

fn gy_answer(body: &str) -> Answer {
    Answer::new(None, vec![Part::new(body, "whois.registry.gy")])
}

#[test]
fn test_library_exports_work() {
    let info = whois_resolve_lib::info();
    assert!(!info.version.is_empty());
    assert_eq!(info.extractors.len(), 5);
    assert!(info.extractors.contains(&"whois.verisign-grs.com"));
    assert_eq!(Property::ALL.len(), 16);
}

#[test]
fn test_builtin_registry_longest_suffix() {
    let registry = ServerRegistry::builtin();
    assert_eq!(
        registry.resolve("example.co.za").unwrap().host.as_deref(),
        Some("whois.coza.net.za")
    );
    assert_eq!(
        registry.resolve("example.za").unwrap().kind,
        AdapterKind::Web
    );
    assert!(matches!(
        registry.resolve("example.invalid-tld"),
        Err(WhoisError::NoServerFound { .. })
    ));
}

#[tokio::test]
async fn test_referral_produces_two_parts() {
    let registry_reply = "Domain Name: EXAMPLE.BZ\nWhois Server: whois.belizenic.bz\nStatus: OK\n";
    let registrar_reply = "Registrant: Example Ltd.\n";
    let transport = ScriptedTransport::new(&[registry_reply, registrar_reply]);

    let answer = client_with(transport.clone())
        .query("example.bz")
        .await
        .unwrap();

    assert_eq!(
        answer.parts(),
        &[
            Part::new(registry_reply, "whois.afilias-grs.info"),
            Part::new(registrar_reply, "whois.belizenic.bz"),
        ]
    );
    assert_eq!(answer.content(), format!("{}\n{}", registry_reply, registrar_reply));
    assert_eq!(
        transport.hosts(),
        vec!["whois.afilias-grs.info".to_string(), "whois.belizenic.bz".to_string()]
    );
}

#[tokio::test]
async fn test_not_defined_referral_is_not_followed() {
    let reply = "Domain Name: EXAMPLE.BZ\nWhois Server: not defined\n";
    let transport = ScriptedTransport::new(&[reply]);

    let answer = client_with(transport.clone())
        .query("example.bz")
        .await
        .unwrap();

    assert_eq!(answer.parts().len(), 1);
    assert_eq!(transport.hosts().len(), 1);
}

#[tokio::test]
async fn test_verisign_availability_is_complementary() {
    let transport = ScriptedTransport::new(&["No match for \"U34JEDZCQ.COM\".\n"]);
    let answer = client_with(transport).query("u34jedzcq.com").await.unwrap();

    assert!(answer.is_available().unwrap());
    assert!(!answer.is_registered().unwrap());
    assert_eq!(answer.status().unwrap(), Some(DomainStatus::Available));
}

#[tokio::test]
async fn test_gy_status_end_to_end() {
    let active = client_with(ScriptedTransport::new(&["Status: ACTIVE\n"]))
        .query("google.gy")
        .await
        .unwrap();
    assert!(active.is_registered().unwrap());
    assert!(!active.is_available().unwrap());

    let free = client_with(ScriptedTransport::new(&["Status: NOT REGISTERED\n"]))
        .query("u34jedzcq.gy")
        .await
        .unwrap();
    assert!(free.is_available().unwrap());
    assert_eq!(free.status().unwrap(), Some(DomainStatus::Available));

    let pending = client_with(ScriptedTransport::new(&["Status: PENDING\n"]))
        .query("pending.gy")
        .await
        .unwrap();
    assert!(matches!(
        pending.status(),
        Err(WhoisError::UnrecognizedFormat { ref fragment, .. }) if fragment == "PENDING"
    ));
}

#[tokio::test]
async fn test_timeout_is_bounded() {
    let client = WhoisClient::with_settings(
        ClientSettings::default().with_timeout(Duration::from_secs(1)),
    )
    .with_transport(Arc::new(StalledTransport));

    let started = Instant::now();
    let result = client.query("google.com").await;

    assert!(matches!(result, Err(WhoisError::Timeout { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_timeout_on_referral_hop_discards_parts() {
    let registry_reply = "Domain Name: EXAMPLE.BZ\nWhois Server: whois.belizenic.bz\n";
    let transport = StallAfterTransport::new(&[registry_reply]);
    let client = WhoisClient::with_settings(
        ClientSettings::default()
            .with_timeout(Duration::from_secs(1))
            .with_retry_delay(Duration::ZERO),
    )
    .with_transport(transport.clone());

    let started = Instant::now();
    let result = client.query("example.bz").await;

    assert!(matches!(result, Err(WhoisError::Timeout { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn test_timeout_during_retries_discards_parts() {
    let client = WhoisClient::with_settings(
        ClientSettings::default()
            .with_timeout(Duration::from_secs(1))
            .with_retry_delay(Duration::from_secs(5)),
    )
    .with_transport(Arc::new(BlankTransport));

    let started = Instant::now();
    let result = client.query("example.co.za").await;

    assert!(matches!(result, Err(WhoisError::Timeout { .. })));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn test_web_registry_fails_without_network() {
    let transport = ScriptedTransport::new(&[]);
    let result = client_with(transport.clone()).query("example.es").await;

    assert!(matches!(
        result,
        Err(WhoisError::UnsupportedAdapter { ref url, .. }) if url.is_some()
    ));
    assert!(transport.hosts().is_empty());
}

#[test]
fn test_not_supported_property_raises() {
    let answer = gy_answer("Status: ACTIVE\n");
    assert_eq!(
        answer.registrar(),
        Err(WhoisError::property_not_supported("registrar"))
    );
    assert_eq!(answer.is_present(Property::Registrar), Ok(false));
    assert!(!answer.is_supported(Property::Registrar));
}

#[test]
fn test_structural_and_semantic_equality() {
    let a = gy_answer("Status: ACTIVE\nName Servers:\nNS1.EXAMPLE.GY\n\n");
    let b = gy_answer("Status:   active\nName Servers:\n  ns1.example.gy\n\n");

    // Different text, same meaning
    assert_ne!(a, b);
    assert_eq!(a.changed(&b), Ok(false));

    // Same text compares equal to the string, and to a copy
    assert_eq!(a, "Status: ACTIVE\nName Servers:\nNS1.EXAMPLE.GY\n\n");
    assert_eq!(a, a.clone());
    assert_eq!(a.unchanged(&a), Ok(true));

    let c = gy_answer("Status: NOT REGISTERED\n");
    assert_eq!(a.changed(&c), Ok(true));
}

#[test]
fn test_custom_extractor_plugs_in() {
    struct Corp;

    impl Extractor for Corp {
        fn host(&self) -> &'static str {
            "whois.corp.test"
        }

        fn declare(&self, property: Property) -> Option<Declaration> {
            match property {
                Property::Available => Some(Declaration::Supported(|content| {
                    Ok(Some(PropertyValue::Flag(content.contains("FREE"))))
                })),
                Property::Nameservers => Some(Declaration::NotSupported),
                _ => None,
            }
        }
    }

    let catalog = Arc::new(ExtractorCatalog::new().with(Corp));
    let answer = Answer::new(
        Some(ServerDefinition::new(
            AdapterKind::Standard,
            ".corp",
            Some("whois.corp.test"),
        )),
        vec![Part::new("example.corp is FREE\n", "whois.corp.test")],
    )
    .with_catalog(catalog);

    assert!(answer.is_available().unwrap());
    assert_eq!(answer.status().unwrap(), Some(DomainStatus::Available));
    assert!(!answer.is_registered().unwrap());
    assert!(matches!(
        answer.nameservers(),
        Err(WhoisError::PropertyNotSupported { .. })
    ));
    assert_eq!(answer.created_on(), Ok(None));
}

#[test]
fn test_answer_serializes_to_json() {
    let answer = gy_answer("Status: ACTIVE\n");
    let json = serde_json::to_value(&answer).unwrap();
    assert_eq!(json["parts"][0]["host"], "whois.registry.gy");

    let properties = serde_json::to_value(answer.properties().unwrap()).unwrap();
    assert_eq!(properties["status"], "registered");
    assert_eq!(properties["registered?"], true);
    assert!(properties["registrar"].is_null());
}
