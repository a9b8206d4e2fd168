//! Display logic for the whois-resolve CLI.
//!
//! Renders answers, property tables and errors. Styled text goes through the
//! `console` crate, which drops colors when stdout is not a terminal.

use console::{pad_str, style, Alignment};
use serde_json::{json, Map, Value};
use whois_resolve_lib::{Answer, Property, PropertyValue, WhoisError};

const PROPERTY_WIDTH: usize = 20;

/// What reading one property produced.
enum Cell {
    Value(PropertyValue),
    Absent,
    NotSupported,
    Failed(WhoisError),
}

fn read(answer: &Answer, property: Property) -> Cell {
    match answer.get(property) {
        Ok(Some(value)) => Cell::Value(value),
        Ok(None) => Cell::Absent,
        Err(WhoisError::PropertyNotSupported { .. }) => Cell::NotSupported,
        Err(e) => Cell::Failed(e),
    }
}

// ── Errors ───────────────────────────────────────────────────────────────────

/// Print a top-level error to stderr.
pub fn print_error(message: &str) {
    eprintln!("{} {}", style("Error:").red().bold(), message);
}

/// Print the failure of a single query to stderr.
pub fn print_query_error(query: &str, error: &WhoisError) {
    eprintln!(
        "{} {}  {}",
        style("Error:").red().bold(),
        style(query).white().bold(),
        error
    );
    if error.is_network() {
        eprintln!(
            "  {} {}",
            style("└─").dim(),
            style("check connectivity or raise --timeout").dim()
        );
    }
}

// ── Raw answers ──────────────────────────────────────────────────────────────

/// Print a separator naming the query and the hosts that answered.
pub fn print_query_header(query: &str, answer: &Answer) {
    let hosts: Vec<&str> = answer.parts().iter().map(|p| p.host.as_str()).collect();
    println!(
        "{} {} {}",
        style(format!("── {} ", query)).cyan().bold(),
        style(hosts.join(" → ")).dim(),
        style("─".repeat(20)).cyan().dim(),
    );
}

// ── Property table ───────────────────────────────────────────────────────────

/// Print every property of `answer` as an aligned table.
pub fn print_properties(query: &str, answer: &Answer) {
    print_query_header(query, answer);

    if let Cell::Failed(e @ WhoisError::ExtractorNotFound { .. }) =
        read(answer, Property::Domain)
    {
        println!("  {}", style(e).yellow());
        println!();
        return;
    }

    for property in Property::ALL {
        let label = pad_str(property.name(), PROPERTY_WIDTH, Alignment::Left, None);
        match read(answer, property) {
            Cell::Value(PropertyValue::List(items)) if !items.is_empty() => {
                println!("  {}{}", style(&label).white(), style(&items[0]).green());
                let blank = " ".repeat(PROPERTY_WIDTH);
                for item in &items[1..] {
                    println!("  {}{}", blank, style(item).green());
                }
            }
            Cell::Value(value) => {
                println!("  {}{}", style(&label).white(), style(value).green());
            }
            Cell::Absent => {
                println!("  {}{}", style(&label).white(), style("-").dim());
            }
            Cell::NotSupported => {
                println!("  {}{}", style(&label).dim(), style("not supported").dim());
            }
            Cell::Failed(e) => {
                println!("  {}{}", style(&label).white(), style(e).yellow());
            }
        }
    }

    if answer.is_throttled() {
        println!("  {}", style("Server reports throttling").yellow());
    }
    println!();
}

// ── JSON ─────────────────────────────────────────────────────────────────────

/// JSON document for a successful query.
///
/// Not-supported properties are omitted; properties that failed to parse are
/// listed under `errors`.
pub fn answer_json(query: &str, answer: &Answer) -> Value {
    let mut properties = Map::new();
    let mut errors = Map::new();

    for property in Property::ALL {
        match read(answer, property) {
            Cell::Value(value) => {
                properties.insert(property.name().to_string(), json!(value));
            }
            Cell::Absent => {
                properties.insert(property.name().to_string(), Value::Null);
            }
            Cell::NotSupported => {}
            Cell::Failed(e) => {
                errors.insert(property.name().to_string(), json!(e.to_string()));
            }
        }
    }

    let mut document = json!({
        "query": query,
        "server": answer.server(),
        "parts": answer.parts(),
        "properties": properties,
    });
    if !errors.is_empty() {
        document["errors"] = Value::Object(errors);
    }
    document
}

/// JSON document for a failed query.
pub fn error_json(query: &str, error: &WhoisError) -> Value {
    json!({
        "query": query,
        "error": error.to_string(),
    })
}
