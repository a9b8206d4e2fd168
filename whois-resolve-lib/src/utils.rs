//! Utility functions for query processing and validation.
//!
//! This module contains helpers shared by the registry and the client for
//! turning user input into something that can be matched and sent.

use crate::error::WhoisError;

/// Validate a query string before it is sent to a server.
///
/// The wire protocol is line based, so embedded line breaks would let a
/// query smuggle extra requests.
///
/// # Arguments
///
/// * `query` - The query as given by the caller
///
/// # Returns
///
/// The trimmed query, ready to be sent.
pub fn validate_query(query: &str) -> Result<&str, WhoisError> {
    let trimmed = query.trim();

    if trimmed.is_empty() {
        return Err(WhoisError::invalid_query(query, "Query cannot be empty"));
    }

    if trimmed.contains(['\r', '\n']) {
        return Err(WhoisError::invalid_query(
            query,
            "Query cannot contain line breaks",
        ));
    }

    Ok(trimmed)
}

/// Normalize a query for matching against server allocations.
///
/// Lowercases the query and strips a trailing root dot
/// (e.g. "Example.COM." -> "example.com").
pub fn normalize_query(query: &str) -> Result<String, WhoisError> {
    let trimmed = validate_query(query)?;
    let normalized = trimmed.trim_end_matches('.').to_lowercase();

    if normalized.is_empty() {
        return Err(WhoisError::invalid_query(query, "Query cannot be empty"));
    }

    Ok(normalized)
}
