//! Byte-stream connections to WHOIS servers.
//!
//! The follower only needs "give me a stream to this server"; the
//! [`Connector`] trait is that seam, so tests can hand back in-memory streams.

use crate::{
    endpoint::{ProxyEndpoint, ProxyProtocol, ServerEndpoint},
    errors::WhoisError,
};
use async_trait::async_trait;
use std::net::{IpAddr, SocketAddr};
use tokio::{
    io::{AsyncRead, AsyncWrite},
    net::{lookup_host, TcpSocket, TcpStream},
};
use tokio_socks::tcp::{Socks4Stream, Socks5Stream};
use tracing::debug;

/// Anything the query engine can write a query to and read a response from.
pub trait WhoisStream: AsyncRead + AsyncWrite + Unpin + Send {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send> WhoisStream for T {}

pub type BoxedStream = Box<dyn WhoisStream>;

/// How to reach the server: through a proxy, or directly from an optional
/// local address.
#[derive(Debug, Clone, Default)]
pub struct ConnectOptions {
    pub proxy: Option<ProxyEndpoint>,
    pub bind: Option<IpAddr>,
}

#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(
        &self,
        server: &ServerEndpoint,
        options: &ConnectOptions,
    ) -> Result<BoxedStream, WhoisError>;
}

/// Plain TCP, or TCP tunneled through a SOCKS4/5 proxy.
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpConnector;

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(
        &self,
        server: &ServerEndpoint,
        options: &ConnectOptions,
    ) -> Result<BoxedStream, WhoisError> {
        let target = (server.host.as_str(), server.port);

        let stream: BoxedStream = match &options.proxy {
            Some(proxy) => {
                debug!(
                    "Connecting to {} via {:?} proxy {}:{}",
                    server, proxy.protocol, proxy.host, proxy.port
                );
                let proxy_addr = (proxy.host.as_str(), proxy.port);
                match proxy.protocol {
                    ProxyProtocol::Socks5 => Box::new(Socks5Stream::connect(proxy_addr, target).await?),
                    ProxyProtocol::Socks4 => Box::new(Socks4Stream::connect(proxy_addr, target).await?),
                }
            }
            None => {
                let stream = connect_direct(server, options.bind).await?;
                // Optimize TCP performance
                if let Err(e) = stream.set_nodelay(true) {
                    debug!("Failed to set TCP_NODELAY: {}", e);
                }
                Box::new(stream)
            }
        };

        Ok(stream)
    }
}

async fn connect_direct(server: &ServerEndpoint, bind: Option<IpAddr>) -> Result<TcpStream, WhoisError> {
    let Some(local) = bind else {
        debug!("Connecting to {}", server);
        return Ok(TcpStream::connect((server.host.as_str(), server.port)).await?);
    };

    // The remote address has to match the bound socket's family.
    let remote = lookup_host((server.host.as_str(), server.port))
        .await?
        .find(|addr| addr.is_ipv4() == local.is_ipv4())
        .ok_or_else(|| {
            WhoisError::InvalidBindAddress(format!(
                "{} has no address in the same family as {}",
                server.host, local
            ))
        })?;

    let socket = if local.is_ipv4() {
        TcpSocket::new_v4()?
    } else {
        TcpSocket::new_v6()?
    };
    socket.bind(SocketAddr::new(local, 0))?;

    debug!("Connecting to {} ({}) from {}", server, remote, local);
    Ok(socket.connect(remote).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    #[tokio::test]
    async fn test_direct_connect_with_bind() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let accept = tokio::spawn(async move {
            let (mut socket, peer) = listener.accept().await.unwrap();
            socket.write_all(b"hello").await.unwrap();
            peer
        });

        let server = ServerEndpoint::new("127.0.0.1").with_port(port);
        let options = ConnectOptions {
            proxy: None,
            bind: Some("127.0.0.1".parse().unwrap()),
        };
        let mut stream = TcpConnector.connect(&server, &options).await.unwrap();

        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).await.unwrap();
        assert_eq!(buf, b"hello");
        assert!(accept.await.unwrap().ip().is_loopback());
    }

    #[tokio::test]
    async fn test_bind_family_mismatch() {
        let server = ServerEndpoint::new("127.0.0.1").with_port(43);
        let options = ConnectOptions {
            proxy: None,
            bind: Some("::1".parse().unwrap()),
        };
        let result = TcpConnector.connect(&server, &options).await;
        assert!(matches!(result, Err(WhoisError::InvalidBindAddress(_))));
    }
}
