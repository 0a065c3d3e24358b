use crate::{endpoint::ServerEndpoint, errors::WhoisError, servers::ServerTable};
use std::net::IpAddr;
use tracing::debug;

/// Pick the server to query first for `address`.
///
/// An explicit override always wins. Otherwise email-like addresses are
/// rejected, IP literals go to the table's IP entry, and anything else is
/// treated as a domain and matched against progressively shorter suffixes.
pub fn resolve(
    address: &str,
    explicit: Option<&ServerEndpoint>,
    table: &ServerTable,
) -> Result<ServerEndpoint, WhoisError> {
    if let Some(server) = explicit {
        debug!("Using explicit whois server {} for {}", server, address);
        return Ok(server.clone());
    }

    if address.contains('@') {
        return Err(WhoisError::UnsupportedAddressKind(address.to_string()));
    }

    if address.parse::<IpAddr>().is_ok() {
        return table
            .ip_server()
            .cloned()
            .ok_or_else(|| WhoisError::NoServerKnown(address.to_string()));
    }

    let ascii = to_ascii(address).unwrap_or_default();
    let mut suffix = ascii.as_str();
    loop {
        if let Some(server) = table.get(suffix) {
            debug!("Matched suffix '{}' for {} -> {}", suffix, address, server);
            return Ok(server.clone());
        }
        if suffix.is_empty() {
            break;
        }
        suffix = strip_leftmost_label(suffix);
    }

    Err(WhoisError::NoServerKnown(address.to_string()))
}

/// IDNA (punycode) form of a domain, or `None` if it is not a valid name.
pub fn to_ascii(domain: &str) -> Option<String> {
    idna::domain_to_ascii(domain).ok()
}

/// `"a.b.c"` → `"b.c"`, `"c"` → `""`. The first character is never treated as
/// a separator, so `".com"` strips to `""`.
fn strip_leftmost_label(suffix: &str) -> &str {
    let first = suffix.chars().next().map(char::len_utf8).unwrap_or(0);
    match suffix[first..].find('.') {
        Some(i) => &suffix[first + i + 1..],
        None => "",
    }
}
