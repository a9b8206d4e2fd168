//! Protocol implementations for WHOIS resolution.
//!
//! This module contains the server registry, the connection-level transport
//! and the adapter strategies that chase referrals between servers.

/// Adapter strategies and referral chasing
pub mod adapter;

/// Server definition table and resolution
pub mod registry;

/// Connection-level request/response exchange
pub mod transport;

// Re-export commonly used functions and types
pub use adapter::{extract_whois_server, Adapter, Strategy};
pub use registry::{ServerRegistry, ServerTable};
pub use transport::{Request, TcpTransport, Transport};
