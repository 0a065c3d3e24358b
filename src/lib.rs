//! # Whois Lookup Library
//!
//! A WHOIS client for Rust that finds the right registry server, follows
//! referrals to the authoritative one, and turns the raw response into flat
//! key/value data.
//!
//! ## Features
//!
//! - Built-in suffix table with per-registry query templates
//! - IPv4/IPv6 lookups through the regional registries
//! - Referral following with a bounded budget
//! - Direct TCP (optionally bound to a local address) or SOCKS4/5 proxies
//! - IDNA (punycode) queries and custom response encodings
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use whois_lookup::{LookupResult, WhoisClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = WhoisClient::new();
//!     if let LookupResult::Single(data) = client.lookup("google.com").await? {
//!         println!("Registrar: {:?}", data.get("registrar"));
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod endpoint;
pub mod errors;
pub mod parser;
pub mod referral;
pub mod resolver;
pub mod servers;
pub mod transport;
pub mod whois;

#[cfg(test)]
pub(crate) mod testing;

// Re-export main types for easy access
pub use config::{Config, LookupOptions};
pub use endpoint::{ProxyEndpoint, ProxyProtocol, ServerEndpoint};
pub use errors::WhoisError;
pub use parser::{parse_raw_data, ParsedMapping};
pub use servers::ServerTable;
pub use transport::{Connector, TcpConnector};
pub use whois::{Attempt, WhoisService};

use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Parsed response of one server in a verbose lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerData {
    pub server: String,
    pub data: ParsedMapping,
}

/// Outcome of a lookup: the authoritative mapping, or every server's mapping
/// in query order when `verbose` is set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LookupResult {
    Single(ParsedMapping),
    Verbose(Vec<ServerData>),
}

/// High-level whois client
#[derive(Clone)]
pub struct WhoisClient {
    service: WhoisService,
    table: Arc<ServerTable>,
}

impl Default for WhoisClient {
    fn default() -> Self {
        Self::new()
    }
}

impl WhoisClient {
    /// Client using the built-in server table and plain TCP / SOCKS.
    pub fn new() -> Self {
        Self::with_parts(ServerTable::builtin(), Arc::new(TcpConnector))
    }

    /// Client with a custom server table and transport.
    pub fn with_parts(table: Arc<ServerTable>, connector: Arc<dyn Connector>) -> Self {
        Self {
            service: WhoisService::new(connector),
            table,
        }
    }

    /// Look up `address` with default options.
    pub async fn lookup(&self, address: &str) -> Result<LookupResult, WhoisError> {
        self.lookup_with_options(address, &LookupOptions::default()).await
    }

    pub async fn lookup_with_options(
        &self,
        address: &str,
        options: &LookupOptions,
    ) -> Result<LookupResult, WhoisError> {
        let chain = self.lookup_chain(address, options).await?;

        if options.verbose {
            let parts = chain
                .iter()
                .map(|attempt| ServerData {
                    server: attempt.server.host.trim().to_string(),
                    data: parse_raw_data(&attempt.raw),
                })
                .collect();
            return Ok(LookupResult::Verbose(parts));
        }

        let data = chain
            .last()
            .map(|attempt| parse_raw_data(&attempt.raw))
            .unwrap_or_default();
        Ok(LookupResult::Single(data))
    }

    /// Resolve and query, returning the unparsed attempts in query order.
    ///
    /// Surrounding whitespace is trimmed from `address` before resolution, so
    /// a pasted `" example.com\n"` queries `example.com`.
    pub async fn lookup_chain(
        &self,
        address: &str,
        options: &LookupOptions,
    ) -> Result<Vec<Attempt>, WhoisError> {
        let address = address.trim();
        let initial = resolver::resolve(address, options.server.as_ref(), &self.table)?;
        tracing::debug!("Looking up {} starting at {}", address, initial);
        self.service.follow(address, initial, options).await
    }
}

/// Look up `address` with a default client.
pub async fn lookup(address: &str, options: &LookupOptions) -> Result<LookupResult, WhoisError> {
    WhoisClient::new().lookup_with_options(address, options).await
}
