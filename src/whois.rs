use crate::{
    config::LookupOptions,
    endpoint::ServerEndpoint,
    errors::WhoisError,
    referral::extract_referral,
    resolver::to_ascii,
    transport::Connector,
};
use encoding_rs::{Encoding, UTF_8};
use std::sync::Arc;
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    time::timeout,
};
use tracing::{debug, info, warn};

const READ_BUFFER_SIZE: usize = 8192;

/// One query/response round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attempt {
    pub server: ServerEndpoint,
    pub raw: String,
}

/// What the next attempt needs to know. Built fresh for every step instead
/// of mutating the caller's options.
#[derive(Debug, Clone)]
struct AttemptContext {
    server: ServerEndpoint,
    remaining_follow: u32,
}

impl AttemptContext {
    /// The context for the referral in `raw`, if it should be followed.
    fn referral(&self, raw: &str) -> Option<AttemptContext> {
        if self.remaining_follow == 0 {
            return None;
        }
        let host = extract_referral(raw)?;
        if host.eq_ignore_ascii_case(&self.server.host) {
            debug!("Ignoring self-referral to {}", host);
            return None;
        }
        Some(AttemptContext {
            server: ServerEndpoint::new(host),
            remaining_follow: self.remaining_follow - 1,
        })
    }
}

/// Runs queries and follows referrals between registries.
#[derive(Clone)]
pub struct WhoisService {
    connector: Arc<dyn Connector>,
}

impl WhoisService {
    pub fn new(connector: Arc<dyn Connector>) -> Self {
        Self { connector }
    }

    /// Query `initial`, then keep following referrals while the budget in
    /// `options.follow` allows. Any failure discards the whole chain.
    ///
    /// Only a referral back to the current host is suppressed; longer cycles
    /// are bounded by the budget alone.
    pub async fn follow(
        &self,
        address: &str,
        initial: ServerEndpoint,
        options: &LookupOptions,
    ) -> Result<Vec<Attempt>, WhoisError> {
        let mut chain = Vec::new();
        let mut context = AttemptContext {
            server: initial,
            remaining_follow: options.follow,
        };

        loop {
            let raw = match self.attempt(address, &context.server, options).await {
                Ok(raw) => raw,
                Err(e) => {
                    if !chain.is_empty() {
                        warn!(
                            "Lookup of {} failed at {} after {} successful attempt(s): {}",
                            address,
                            context.server,
                            chain.len(),
                            e
                        );
                    }
                    return Err(e);
                }
            };

            match context.referral(&raw) {
                Some(next) => {
                    info!("Following referral from {} to {}", context.server.host, next.server.host);
                    chain.push(Attempt { server: context.server, raw });
                    context = next;
                }
                None => {
                    chain.push(Attempt { server: context.server, raw });
                    return Ok(chain);
                }
            }
        }
    }

    /// Connect and query once, all under the configured time limit.
    async fn attempt(
        &self,
        address: &str,
        server: &ServerEndpoint,
        options: &LookupOptions,
    ) -> Result<String, WhoisError> {
        let exchange = async {
            let stream = self.connector.connect(server, &options.connect_options()).await?;
            query_stream(stream, server, address, options).await
        };

        match options.timeout() {
            Some(limit) => timeout(limit, exchange).await?,
            None => exchange.await,
        }
    }
}

/// Write the query line for `address` and read until the peer closes the
/// stream. The stream is dropped, and so closed, on return.
pub async fn query_stream<S>(
    mut stream: S,
    server: &ServerEndpoint,
    address: &str,
    options: &LookupOptions,
) -> Result<String, WhoisError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let encoding = text_encoding(options.encoding.as_deref())?;

    let query_address = if server.punycode && options.punycode {
        to_ascii(address).unwrap_or_else(|| address.to_string())
    } else {
        address.to_string()
    };
    let query = server.render_query(&query_address);
    debug!("Sending {:?} to {}", query.trim_end(), server);

    stream.write_all(query.as_bytes()).await?;
    stream.flush().await?;

    let mut buffer = [0u8; READ_BUFFER_SIZE];
    let mut response = Vec::new();
    loop {
        match stream.read(&mut buffer).await {
            Ok(0) => break, // EOF
            Ok(n) => response.extend_from_slice(&buffer[..n]),
            Err(e) => return Err(WhoisError::IoError(e)),
        }
    }
    debug!("Received {} bytes from {}", response.len(), server);

    let (text, _, had_errors) = encoding.decode(&response);
    if had_errors {
        debug!("Response from {} contained bytes invalid for {}", server, encoding.name());
    }
    Ok(text.into_owned())
}

fn text_encoding(label: Option<&str>) -> Result<&'static Encoding, WhoisError> {
    match label {
        None => Ok(UTF_8),
        Some(label) => Encoding::for_label(label.trim().as_bytes())
            .ok_or_else(|| WhoisError::UnknownEncoding(label.to_string())),
    }
}
