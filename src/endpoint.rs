//! Canonical server and proxy endpoints.
//!
//! Overrides arrive as `"host"` / `"host:port"` strings from the CLI, the
//! environment, or the caller. They are normalized once, here, and the rest of
//! the crate only ever sees the structured form.

use crate::errors::WhoisError;
use std::{fmt, net::Ipv6Addr, str::FromStr};

pub const DEFAULT_WHOIS_PORT: u16 = 43;
pub const DEFAULT_QUERY_TEMPLATE: &str = "$addr\r\n";
pub const ADDRESS_PLACEHOLDER: &str = "$addr";

/// A WHOIS server and how to talk to it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerEndpoint {
    pub host: String,
    pub port: u16,
    /// Query line sent to the server; `$addr` is replaced by the queried address.
    pub query_template: String,
    /// Whether the address is IDNA-encoded before substitution.
    pub punycode: bool,
}

impl ServerEndpoint {
    /// Endpoint on port 43 with the default query template.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_WHOIS_PORT,
            query_template: DEFAULT_QUERY_TEMPLATE.to_string(),
            punycode: true,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_query(mut self, template: impl Into<String>) -> Self {
        self.query_template = template.into();
        self
    }

    pub fn without_punycode(mut self) -> Self {
        self.punycode = false;
        self
    }

    /// Build the query line for `address` (already encoded as needed).
    pub fn render_query(&self, address: &str) -> String {
        self.query_template.replacen(ADDRESS_PLACEHOLDER, address, 1)
    }
}

impl fmt::Display for ServerEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for ServerEndpoint {
    type Err = WhoisError;

    /// Port text that is missing or not a valid port falls back to 43.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = split_host_port(s);
        if host.is_empty() {
            return Err(WhoisError::InvalidServer(s.to_string()));
        }
        let port = port
            .and_then(|p| p.trim().parse::<u16>().ok())
            .unwrap_or(DEFAULT_WHOIS_PORT);
        Ok(ServerEndpoint::new(host).with_port(port))
    }
}

/// SOCKS protocol version spoken by the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProxyProtocol {
    Socks4,
    #[default]
    Socks5,
}

impl ProxyProtocol {
    pub fn from_type(version: u8) -> Result<Self, WhoisError> {
        match version {
            4 => Ok(ProxyProtocol::Socks4),
            5 => Ok(ProxyProtocol::Socks5),
            other => Err(WhoisError::InvalidProxy(format!(
                "unsupported SOCKS protocol type {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyEndpoint {
    pub host: String,
    pub port: u16,
    pub protocol: ProxyProtocol,
}

impl ProxyEndpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            protocol: ProxyProtocol::default(),
        }
    }

    pub fn with_protocol(mut self, protocol: ProxyProtocol) -> Self {
        self.protocol = protocol;
        self
    }
}

impl FromStr for ProxyEndpoint {
    type Err = WhoisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (host, port) = split_host_port(s);
        if host.is_empty() {
            return Err(WhoisError::InvalidProxy(s.to_string()));
        }
        let port = port
            .and_then(|p| p.trim().parse::<u16>().ok())
            .ok_or_else(|| WhoisError::InvalidProxy(format!("{}: missing or invalid port", s)))?;
        Ok(ProxyEndpoint::new(host, port))
    }
}

/// Split `host[:port]`, accepting `[v6]:port` and bare IPv6 literals.
fn split_host_port(s: &str) -> (&str, Option<&str>) {
    let s = s.trim();
    if let Some(rest) = s.strip_prefix('[') {
        if let Some((host, tail)) = rest.split_once(']') {
            return (host, tail.strip_prefix(':'));
        }
    }
    if s.parse::<Ipv6Addr>().is_ok() {
        return (s, None);
    }
    match s.split_once(':') {
        Some((host, port)) => (host.trim(), Some(port)),
        None => (s, None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_defaults() {
        let server: ServerEndpoint = "whois.gandi.net".parse().unwrap();
        assert_eq!(server.host, "whois.gandi.net");
        assert_eq!(server.port, 43);
        assert_eq!(server.query_template, "$addr\r\n");
        assert!(server.punycode);
    }

    #[test]
    fn test_host_with_port() {
        let server: ServerEndpoint = "whois.tucows.com:4343".parse().unwrap();
        assert_eq!(server.host, "whois.tucows.com");
        assert_eq!(server.port, 4343);
    }

    #[test]
    fn test_bad_port_falls_back_to_default() {
        let server: ServerEndpoint = "whois.example.net:abc".parse().unwrap();
        assert_eq!(server.port, 43);
        let server: ServerEndpoint = "whois.example.net:".parse().unwrap();
        assert_eq!(server.port, 43);
    }

    #[test]
    fn test_ipv6_hosts() {
        let server: ServerEndpoint = "[2001:db8::1]:4343".parse().unwrap();
        assert_eq!(server.host, "2001:db8::1");
        assert_eq!(server.port, 4343);
        assert_eq!(server.to_string(), "[2001:db8::1]:4343");

        let server: ServerEndpoint = "2001:db8::1".parse().unwrap();
        assert_eq!(server.host, "2001:db8::1");
        assert_eq!(server.port, 43);
    }

    #[test]
    fn test_empty_server_rejected() {
        assert!(matches!(
            "".parse::<ServerEndpoint>(),
            Err(WhoisError::InvalidServer(_))
        ));
    }

    #[test]
    fn test_render_query() {
        let server = ServerEndpoint::new("whois.denic.de").with_query("-T dn $addr\r\n");
        assert_eq!(server.render_query("example.de"), "-T dn example.de\r\n");
    }

    #[test]
    fn test_proxy_parsing() {
        let proxy: ProxyEndpoint = "127.0.0.1:1080".parse().unwrap();
        assert_eq!(proxy.host, "127.0.0.1");
        assert_eq!(proxy.port, 1080);
        assert_eq!(proxy.protocol, ProxyProtocol::Socks5);

        assert!(matches!(
            "127.0.0.1".parse::<ProxyEndpoint>(),
            Err(WhoisError::InvalidProxy(_))
        ));
        assert!(ProxyProtocol::from_type(3).is_err());
        assert_eq!(ProxyProtocol::from_type(4).unwrap(), ProxyProtocol::Socks4);
    }
}
