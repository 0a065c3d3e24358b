use anyhow::Context;
use clap::Parser;
use std::net::IpAddr;
use tracing::debug;

use whois_lookup::{
    Config, LookupOptions, LookupResult, ParsedMapping, ProxyEndpoint, ProxyProtocol,
    ServerEndpoint, WhoisClient,
};

#[derive(Parser, Debug)]
#[command(name = "whois", version, about = "Query WHOIS servers and follow registry referrals")]
struct Cli {
    /// Domain name or IP address to look up
    address: String,

    /// whois server, as host or host:port
    #[arg(short, long)]
    server: Option<ServerEndpoint>,

    /// number of times to follow referrals
    #[arg(short, long)]
    follow: Option<u32>,

    /// SOCKS proxy, as host:port
    #[arg(short, long)]
    proxy: Option<ProxyEndpoint>,

    /// SOCKS protocol version of the proxy (4 or 5)
    #[arg(long, value_parser = clap::value_parser!(u8).range(4..=5))]
    proxy_type: Option<u8>,

    /// show the response of every server queried
    #[arg(short, long)]
    verbose: bool,

    /// bind to a local IP address
    #[arg(short, long)]
    bind: Option<IpAddr>,

    /// timeout in milliseconds (0 disables it)
    #[arg(short, long)]
    timeout: Option<u64>,

    /// text encoding of the response, e.g. latin1
    #[arg(long)]
    encoding: Option<String>,

    /// send the address as given instead of its punycode form
    #[arg(long)]
    no_punycode: bool,

    /// print the unparsed response
    #[arg(long, conflicts_with = "json")]
    raw: bool,

    /// print the result as JSON
    #[arg(long)]
    json: bool,
}

impl Cli {
    /// Command-line flags take precedence over configuration.
    fn apply(&self, config: &Config) -> anyhow::Result<LookupOptions> {
        let mut options = LookupOptions::from_config(config)?;
        if let Some(server) = &self.server {
            options.server = Some(server.clone());
        }
        if let Some(follow) = self.follow {
            options.follow = follow;
        }
        // A proxy given on the command line still speaks the configured
        // protocol unless --proxy-type says otherwise.
        if let Some(proxy) = &self.proxy {
            let protocol = ProxyProtocol::from_type(self.proxy_type.unwrap_or(config.proxy_type))?;
            options.proxy = Some(proxy.clone().with_protocol(protocol));
        } else if let Some(version) = self.proxy_type {
            let protocol = ProxyProtocol::from_type(version)?;
            options.proxy = options.proxy.map(|proxy| proxy.with_protocol(protocol));
        }
        if self.verbose {
            options.verbose = true;
        }
        if let Some(bind) = self.bind {
            options.bind = Some(bind);
        }
        if let Some(timeout) = self.timeout {
            options.timeout_ms = timeout;
        }
        if let Some(encoding) = &self.encoding {
            options.encoding = Some(encoding.clone());
        }
        if self.no_punycode {
            options.punycode = false;
        }
        Ok(options)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Logs go to stderr so stdout only carries results
    tracing_subscriber::fmt()
        .with_env_filter(std::env::var("RUST_LOG").unwrap_or_else(|_| "whois_lookup=warn".into()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::load().context("failed to load configuration")?;
    let options = cli.apply(&config)?;
    debug!("Lookup options: {:?}", options);

    let client = WhoisClient::new();

    if cli.raw {
        let chain = client
            .lookup_chain(&cli.address, &options)
            .await
            .with_context(|| format!("lookup of {} failed", cli.address))?;
        if options.verbose {
            for attempt in &chain {
                println!("{}", attempt.server.host);
                println!("{}", attempt.raw);
                println!();
            }
        } else if let Some(last) = chain.last() {
            println!("{}", last.raw);
        }
        return Ok(());
    }

    let result = client
        .lookup_with_options(&cli.address, &options)
        .await
        .with_context(|| format!("lookup of {} failed", cli.address))?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    match result {
        LookupResult::Single(data) => print_mapping(&data),
        LookupResult::Verbose(parts) => {
            for part in parts {
                println!("{}", part.server);
                print_mapping(&part.data);
                println!();
            }
        }
    }

    Ok(())
}

fn print_mapping(data: &ParsedMapping) {
    for (key, value) in data {
        println!("{}: {}", key, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("whois").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_cli_proxy_keeps_configured_type() {
        let config = Config {
            proxy_type: 4,
            ..Config::default()
        };
        let options = parse(&["-p", "127.0.0.1:1080", "example.com"]).apply(&config).unwrap();
        let proxy = options.proxy.unwrap();
        assert_eq!(proxy.port, 1080);
        assert_eq!(proxy.protocol, ProxyProtocol::Socks4);
    }

    #[test]
    fn test_cli_proxy_type_overrides_config() {
        let config = Config {
            proxy: Some("10.0.0.1:9050".into()),
            proxy_type: 4,
            ..Config::default()
        };
        let options = parse(&["--proxy-type", "5", "example.com"]).apply(&config).unwrap();
        let proxy = options.proxy.unwrap();
        assert_eq!(proxy.host, "10.0.0.1");
        assert_eq!(proxy.protocol, ProxyProtocol::Socks5);
    }

    #[test]
    fn test_cli_flags_override_config() {
        let config = Config {
            follow: 5,
            ..Config::default()
        };
        let options = parse(&["-f", "0", "-t", "0", "--no-punycode", "example.com"])
            .apply(&config)
            .unwrap();
        assert_eq!(options.follow, 0);
        assert_eq!(options.timeout(), None);
        assert!(!options.punycode);
        assert!(options.proxy.is_none());
    }
}
