//! Adapter strategies and the referral-chasing request engine.
//!
//! Every server definition names an adapter kind. The kind selects a
//! [`Strategy`], which decides how the query line is written, whether a
//! response refers to another server, and whether a response looks like a
//! throttled non-answer. [`Adapter::request`] drives the exchange:
//!
//! 1. Query the definition host and record the reply as the first part.
//! 2. Look for a referral in the latest reply.
//! 3. Follow it with the original query, recording each reply, up to the
//!    strategy's hop limit.
//!
//! Empty or throttled replies are retried a bounded number of times.

use crate::answer::Answer;
use crate::error::WhoisError;
use crate::protocols::transport::{Request, Transport};
use crate::types::{AdapterKind, ClientSettings, Part, ServerDefinition, DEFAULT_WHOIS_PORT};
use crate::utils::validate_query;
use regex::Regex;
use std::time::Duration;
use tracing::{debug, instrument, warn};

/// Default number of referral hops a referral-following strategy may take.
pub const DEFAULT_REFERRAL_LIMIT: usize = 2;

/// Total attempts for a single hop when the reply looks incomplete.
pub const INCOMPLETE_ATTEMPTS: usize = 3;

/// Text some registries send instead of an answer when throttling.
const THROTTLE_SENTINELS: &[&str] = &[
    "rate limit exceeded",
    "too many requests",
    "quota exceeded",
    "query rate limit",
    "limit exceeded",
    "throttled",
    "rate-limited",
];

/// Replies longer than this are records, even if their terms mention throttling.
const THROTTLE_NOTICE_MAX_LINES: usize = 3;
const THROTTLE_NOTICE_MAX_BYTES: usize = 200;

lazy_static::lazy_static! {
    static ref WHOIS_SERVER_RE: Regex =
        Regex::new(r"(?mi)Whois Server:[ \t]*(.+?)[ \t]*\r?$").unwrap();
}

/// One protocol strategy, with one method per protocol step.
///
/// Every method has a default, so a strategy only overrides what differs
/// from a plain single-shot exchange.
pub trait Strategy: Send + Sync {
    /// Adapter name used in logs and errors.
    fn name(&self) -> &'static str;

    /// Fail early when the server cannot be queried over WHOIS at all.
    fn ensure_queryable(
        &self,
        _query: &str,
        _definition: &ServerDefinition,
    ) -> Result<(), WhoisError> {
        Ok(())
    }

    /// The line sent on the initial hop. Referral hops always send the bare query.
    fn query_line(&self, query: &str, definition: &ServerDefinition) -> String {
        format!("{}{}", definition.option("prefix").unwrap_or(""), query)
    }

    /// Host named by a referral in `response`, if any.
    fn detect_referral(&self, _response: &str) -> Option<String> {
        None
    }

    /// Whether `response` is a throttled or empty non-answer worth retrying.
    fn is_incomplete(&self, response: &str) -> bool {
        looks_incomplete(response)
    }

    /// Maximum number of referral hops, never less than 1.
    fn referral_limit(&self, definition: &ServerDefinition) -> usize {
        definition
            .option("referral_limit")
            .and_then(|limit| limit.trim().parse::<usize>().ok())
            .unwrap_or(DEFAULT_REFERRAL_LIMIT)
            .max(1)
    }
}

/// Single request, single response.
pub struct StandardStrategy;

impl Strategy for StandardStrategy {
    fn name(&self) -> &'static str {
        "standard"
    }
}

/// Verisign thin registry: `=` prefixed queries, follows `Whois Server:` referrals.
pub struct VerisignStrategy;

impl Strategy for VerisignStrategy {
    fn name(&self) -> &'static str {
        "verisign"
    }

    fn query_line(&self, query: &str, definition: &ServerDefinition) -> String {
        format!("{}{}", definition.option("prefix").unwrap_or("="), query)
    }

    fn detect_referral(&self, response: &str) -> Option<String> {
        extract_whois_server(response)
    }
}

/// Afilias registry: plain queries, follows `Whois Server:` referrals.
pub struct AfiliasStrategy;

impl Strategy for AfiliasStrategy {
    fn name(&self) -> &'static str {
        "afilias"
    }

    fn detect_referral(&self, response: &str) -> Option<String> {
        extract_whois_server(response)
    }
}

/// Registry only reachable through a web form.
pub struct WebStrategy;

impl Strategy for WebStrategy {
    fn name(&self) -> &'static str {
        "web"
    }

    fn ensure_queryable(&self, query: &str, definition: &ServerDefinition) -> Result<(), WhoisError> {
        Err(WhoisError::unsupported_adapter(
            query,
            self.name(),
            definition.option("url").map(str::to_string),
        ))
    }
}

/// Registry with no public interface.
pub struct UnsupportedStrategy;

impl Strategy for UnsupportedStrategy {
    fn name(&self) -> &'static str {
        "unsupported"
    }

    fn ensure_queryable(&self, query: &str, _definition: &ServerDefinition) -> Result<(), WhoisError> {
        Err(WhoisError::unsupported_adapter(query, self.name(), None))
    }
}

static STANDARD: StandardStrategy = StandardStrategy;
static VERISIGN: VerisignStrategy = VerisignStrategy;
static AFILIAS: AfiliasStrategy = AfiliasStrategy;
static WEB: WebStrategy = WebStrategy;
static UNSUPPORTED: UnsupportedStrategy = UnsupportedStrategy;

impl AdapterKind {
    /// The strategy implementing this kind.
    pub fn strategy(&self) -> &'static dyn Strategy {
        match self {
            AdapterKind::Standard => &STANDARD,
            AdapterKind::Verisign => &VERISIGN,
            AdapterKind::Afilias => &AFILIAS,
            AdapterKind::Web => &WEB,
            AdapterKind::Unsupported => &UNSUPPORTED,
        }
    }
}

/// Extract the last `Whois Server:` value from a record that matched a domain.
///
/// The field label matches in any case, so `Registrar WHOIS Server:` counts.
/// Returns `None` when the record has no `Domain Name:` field or the server is
/// the `not defined` sentinel.
pub fn extract_whois_server(response: &str) -> Option<String> {
    if !response.contains("Domain Name:") {
        return None;
    }

    let endpoint = WHOIS_SERVER_RE
        .captures_iter(response)
        .last()?
        .get(1)?
        .as_str()
        .trim();

    if endpoint.is_empty() || endpoint.eq_ignore_ascii_case("not defined") {
        None
    } else {
        Some(endpoint.to_string())
    }
}

/// Blank responses and throttling notices.
///
/// A notice is a short reply carrying a throttling sentinel. Full records
/// whose terms of use mention throttling are complete answers.
pub fn looks_incomplete(response: &str) -> bool {
    let trimmed = response.trim();
    if trimmed.is_empty() {
        return true;
    }

    let lines = trimmed.lines().filter(|line| !line.trim().is_empty()).count();
    if lines > THROTTLE_NOTICE_MAX_LINES || trimmed.len() > THROTTLE_NOTICE_MAX_BYTES {
        return false;
    }

    let lower = trimmed.to_lowercase();
    THROTTLE_SENTINELS
        .iter()
        .any(|sentinel| lower.contains(sentinel))
}

/// Runs the request protocol for one server definition.
pub struct Adapter<'a> {
    definition: &'a ServerDefinition,
    strategy: &'static dyn Strategy,
}

impl<'a> Adapter<'a> {
    pub fn new(definition: &'a ServerDefinition) -> Self {
        Self {
            definition,
            strategy: definition.kind.strategy(),
        }
    }

    pub fn definition(&self) -> &ServerDefinition {
        self.definition
    }

    pub fn strategy(&self) -> &'static dyn Strategy {
        self.strategy
    }

    /// Query the server and follow referrals, returning an [`Answer`].
    pub async fn request(
        &self,
        query: &str,
        transport: &dyn Transport,
        settings: &ClientSettings,
    ) -> Result<Answer, WhoisError> {
        let parts = self.request_parts(query, transport, settings).await?;
        Ok(Answer::new(Some(self.definition.clone()), parts))
    }

    /// Query the server and follow referrals, returning the raw parts.
    ///
    /// # Errors
    ///
    /// - `UnsupportedAdapter` for web-only or unsupported registries
    /// - `ReferralLoop` when the hop limit is exceeded or a referral points
    ///   back to a host already queried
    /// - any transport error from a hop
    #[instrument(skip(self, transport, settings), fields(adapter = self.strategy.name()))]
    pub async fn request_parts(
        &self,
        query: &str,
        transport: &dyn Transport,
        settings: &ClientSettings,
    ) -> Result<Vec<Part>, WhoisError> {
        let query = validate_query(query)?;
        self.strategy.ensure_queryable(query, self.definition)?;

        let host = self.definition.require_host()?;
        let port = self.definition.port()?;
        let line = self.strategy.query_line(query, self.definition);

        let body = self
            .ask(transport, host, port, &line, settings.retry_delay)
            .await?;
        let mut parts = vec![Part::new(body, host)];

        let limit = self.strategy.referral_limit(self.definition);
        let mut visited = vec![host.to_lowercase()];
        let mut hops = 0;

        loop {
            let (referral, current) = match parts.last() {
                Some(last) => match self.strategy.detect_referral(&last.body) {
                    Some(referral) => (referral, last.host.clone()),
                    None => break,
                },
                None => break,
            };

            if referral.eq_ignore_ascii_case(&current) {
                break;
            }

            let referral_key = referral.to_lowercase();
            if hops >= limit || visited.contains(&referral_key) {
                warn!(referral = %referral, hops = hops, limit = limit, "Referral limit exceeded");
                return Err(WhoisError::referral_loop(query, referral, limit));
            }

            hops += 1;
            visited.push(referral_key);
            debug!(referral = %referral, hop = hops, "Following referral");

            let body = self
                .ask(transport, &referral, DEFAULT_WHOIS_PORT, query, settings.retry_delay)
                .await?;
            parts.push(Part::new(body, referral));
        }

        Ok(parts)
    }

    /// Send one line to one host, retrying incomplete replies.
    ///
    /// After [`INCOMPLETE_ATTEMPTS`] attempts the last reply is returned as-is.
    async fn ask(
        &self,
        transport: &dyn Transport,
        host: &str,
        port: u16,
        line: &str,
        retry_delay: Duration,
    ) -> Result<String, WhoisError> {
        let request = Request { host, port, line };
        let mut attempt = 1;

        loop {
            let body = transport.ask(&request).await?;

            if !self.strategy.is_incomplete(&body) {
                return Ok(body);
            }

            if attempt >= INCOMPLETE_ATTEMPTS {
                warn!(host = %host, attempts = attempt, "Giving up on incomplete response");
                return Ok(body);
            }

            debug!(host = %host, attempt = attempt, "Incomplete response, retrying");
            attempt += 1;
            if !retry_delay.is_zero() {
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}
