//! In-memory connector for exercising the follower without a network.

use crate::{
    endpoint::ServerEndpoint,
    errors::WhoisError,
    transport::{BoxedStream, ConnectOptions, Connector},
};
use async_trait::async_trait;
use std::{collections::VecDeque, io, sync::Mutex};
use tokio::io::DuplexStream;
use tokio_test::io::Builder;

pub(crate) enum Script {
    /// Expect exactly `query` to be written, then send `response` and close.
    Respond { query: Vec<u8>, response: Vec<u8> },
    /// Fail the connect with this error kind.
    Refuse(io::ErrorKind),
    /// Accept the query and never answer.
    Hang,
}

impl Script {
    pub(crate) fn respond(query: &str, response: &str) -> Self {
        Script::Respond {
            query: query.as_bytes().to_vec(),
            response: response.as_bytes().to_vec(),
        }
    }
}

#[derive(Default)]
pub(crate) struct ScriptedConnector {
    scripts: Mutex<VecDeque<Script>>,
    connected: Mutex<Vec<ServerEndpoint>>,
    held: Mutex<Vec<DuplexStream>>,
}

impl ScriptedConnector {
    pub(crate) fn new(scripts: Vec<Script>) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            ..Self::default()
        }
    }

    /// Servers connected to so far, in order.
    pub(crate) fn connected(&self) -> Vec<ServerEndpoint> {
        self.connected.lock().unwrap().clone()
    }
}

#[async_trait]
impl Connector for ScriptedConnector {
    async fn connect(
        &self,
        server: &ServerEndpoint,
        _options: &ConnectOptions,
    ) -> Result<BoxedStream, WhoisError> {
        self.connected.lock().unwrap().push(server.clone());
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected connection to {}", server));

        match script {
            Script::Respond { query, response } => {
                Ok(Box::new(Builder::new().write(&query).read(&response).build()))
            }
            Script::Refuse(kind) => Err(WhoisError::IoError(io::Error::new(kind, "scripted failure"))),
            Script::Hang => {
                let (client, server_half) = tokio::io::duplex(4096);
                self.held.lock().unwrap().push(server_half);
                Ok(Box::new(client))
            }
        }
    }
}
