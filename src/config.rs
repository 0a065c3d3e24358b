use crate::{
    endpoint::{ProxyEndpoint, ProxyProtocol, ServerEndpoint},
    errors::WhoisError,
    transport::ConnectOptions,
};
use serde::{Deserialize, Serialize};
use std::{net::IpAddr, time::Duration};

pub const DEFAULT_FOLLOW: u32 = 2;
pub const DEFAULT_TIMEOUT_MS: u64 = 60_000;

/// Process-level defaults, loaded from the environment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub follow: u32,
    pub timeout_ms: u64,
    #[serde(default)]
    pub server: Option<String>,
    #[serde(default)]
    pub proxy: Option<String>,
    pub proxy_type: u8,
    #[serde(default)]
    pub bind: Option<String>,
    #[serde(default)]
    pub encoding: Option<String>,
    pub punycode: bool,
    pub verbose: bool,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_with(|name| std::env::var(name).ok())
    }

    /// Same as [`Config::load`], reading variables through `lookup`.
    pub fn load_with<F>(lookup: F) -> Result<Self, config::ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = config::Config::builder()
            .set_default("follow", DEFAULT_FOLLOW as i64)?
            .set_default("timeout_ms", DEFAULT_TIMEOUT_MS as i64)?
            .set_default("proxy_type", 5)?
            .set_default("punycode", true)?
            .set_default("verbose", false)?;

        let env_mappings = [
            ("WHOIS_FOLLOW", "follow"),
            ("WHOIS_TIMEOUT", "timeout_ms"),
            ("WHOIS_TIMEOUT_MS", "timeout_ms"),
            ("WHOIS_SERVER", "server"),
            ("WHOIS_PROXY", "proxy"),
            ("WHOIS_PROXY_TYPE", "proxy_type"),
            ("WHOIS_BIND", "bind"),
            ("WHOIS_ENCODING", "encoding"),
            ("WHOIS_PUNYCODE", "punycode"),
            ("WHOIS_VERBOSE", "verbose"),
        ];

        for (env_var, config_key) in env_mappings {
            if let Some(value) = lookup(env_var).filter(|v| !v.trim().is_empty()) {
                settings = settings.set_override(config_key, value)?;
            }
        }

        settings.build()?.try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            follow: DEFAULT_FOLLOW,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            server: None,
            proxy: None,
            proxy_type: 5,
            bind: None,
            encoding: None,
            punycode: true,
            verbose: false,
        }
    }
}

/// Per-lookup options. A lookup never mutates them; the remaining follow
/// budget is tracked separately for each attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupOptions {
    /// Skip resolution and query this server first.
    pub server: Option<ServerEndpoint>,
    /// Maximum number of referrals to follow.
    pub follow: u32,
    /// Limit for connect + query of one attempt; 0 disables it.
    pub timeout_ms: u64,
    pub proxy: Option<ProxyEndpoint>,
    pub verbose: bool,
    pub bind: Option<IpAddr>,
    /// WHATWG encoding label used to decode responses (UTF-8 when unset).
    pub encoding: Option<String>,
    pub punycode: bool,
}

impl Default for LookupOptions {
    fn default() -> Self {
        Self {
            server: None,
            follow: DEFAULT_FOLLOW,
            timeout_ms: DEFAULT_TIMEOUT_MS,
            proxy: None,
            verbose: false,
            bind: None,
            encoding: None,
            punycode: true,
        }
    }
}

impl LookupOptions {
    pub fn from_config(config: &Config) -> Result<Self, WhoisError> {
        let server = config
            .server
            .as_deref()
            .map(str::parse::<ServerEndpoint>)
            .transpose()?;
        let proxy = match config.proxy.as_deref() {
            Some(proxy) => Some(
                proxy
                    .parse::<ProxyEndpoint>()?
                    .with_protocol(ProxyProtocol::from_type(config.proxy_type)?),
            ),
            None => None,
        };
        let bind = config.bind.as_deref().map(parse_bind_address).transpose()?;

        Ok(Self {
            server,
            follow: config.follow,
            timeout_ms: config.timeout_ms,
            proxy,
            verbose: config.verbose,
            bind,
            encoding: config.encoding.clone(),
            punycode: config.punycode,
        })
    }

    pub fn with_server(mut self, server: ServerEndpoint) -> Self {
        self.server = Some(server);
        self
    }

    pub fn with_follow(mut self, follow: u32) -> Self {
        self.follow = follow;
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_proxy(mut self, proxy: ProxyEndpoint) -> Self {
        self.proxy = Some(proxy);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_bind(mut self, bind: IpAddr) -> Self {
        self.bind = Some(bind);
        self
    }

    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = Some(label.into());
        self
    }

    pub fn with_punycode(mut self, punycode: bool) -> Self {
        self.punycode = punycode;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_ms > 0).then(|| Duration::from_millis(self.timeout_ms))
    }

    pub fn connect_options(&self) -> ConnectOptions {
        ConnectOptions {
            proxy: self.proxy.clone(),
            bind: self.bind,
        }
    }
}

pub fn parse_bind_address(value: &str) -> Result<IpAddr, WhoisError> {
    value
        .trim()
        .parse()
        .map_err(|_| WhoisError::InvalidBindAddress(value.to_string()))
}
