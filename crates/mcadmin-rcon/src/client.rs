//! Authenticated RCON session with reconnect-and-retry.

use bytes::{Bytes, BytesMut};
use mcadmin_core::RconSettings;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};
use tracing::{debug, info, warn};

use crate::error::RconError;
use crate::packet::{
    Packet, RequestIds, SERVERDATA_AUTH, SERVERDATA_AUTH_RESPONSE, SERVERDATA_EXECCOMMAND,
    SERVERDATA_RESPONSE_VALUE, read_packet, write_packet,
};

/// Attempts made by [`RconClient::command`].
pub const DEFAULT_RETRIES: u32 = 3;

/// Replies inspected while waiting for the auth response.
const AUTH_REPLY_LIMIT: usize = 3;

/// Pause between a command and its end-of-response sentinel.
const SENTINEL_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone)]
struct Endpoint {
    host: String,
    port: u16,
    password: String,
    connect_timeout: Duration,
    io_timeout: Duration,
}

#[derive(Debug, Default)]
struct Session {
    stream: Option<TcpStream>,
    ids: RequestIds,
}

/// RCON client for a single server.
///
/// One logical session is shared by all callers: the internal mutex
/// serializes connect, command and disconnect so request/response pairs never
/// interleave on the socket.
#[derive(Debug)]
pub struct RconClient {
    endpoint: Endpoint,
    session: Mutex<Session>,
}

impl RconClient {
    pub fn new(settings: &RconSettings, password: impl Into<String>) -> Self {
        Self {
            endpoint: Endpoint {
                host: settings.host.clone(),
                port: settings.port,
                password: password.into(),
                connect_timeout: settings.connect_timeout(),
                io_timeout: settings.io_timeout(),
            },
            session: Mutex::new(Session::default()),
        }
    }

    /// Open and authenticate the session. No-op when already connected.
    pub async fn connect(&self) -> Result<(), RconError> {
        self.session.lock().await.connect(&self.endpoint).await
    }

    /// Run `command` with the default retry budget.
    pub async fn command(&self, command: &str) -> Result<String, RconError> {
        self.command_with_retry(command, DEFAULT_RETRIES).await
    }

    /// Run `command`, reconnecting and retrying the whole exchange on
    /// connection-level failures. `retry` is the total attempt count.
    pub async fn command_with_retry(&self, command: &str, retry: u32) -> Result<String, RconError> {
        let attempts = retry.max(1);
        let mut session = self.session.lock().await;
        let mut last_error = String::new();

        for attempt in 1..=attempts {
            match session.execute(&self.endpoint, command).await {
                Ok(response) => return Ok(response),
                Err(e) if e.is_retryable() => {
                    warn!(attempt, attempts, error = %e, "RCON exchange failed");
                    session.disconnect().await;
                    last_error = e.to_string();
                    if attempt < attempts {
                        info!("Reconnecting to RCON server");
                    }
                }
                Err(e) => {
                    session.disconnect().await;
                    return Err(e);
                }
            }
        }

        Err(RconError::Exhausted {
            attempts,
            last: last_error,
        })
    }

    /// Close the socket if open and reset request ids. Idempotent.
    pub async fn disconnect(&self) {
        self.session.lock().await.disconnect().await;
    }

    pub async fn is_connected(&self) -> bool {
        self.session.lock().await.stream.is_some()
    }
}

impl Session {
    async fn connect(&mut self, endpoint: &Endpoint) -> Result<(), RconError> {
        if self.stream.is_some() {
            return Ok(());
        }

        let addr = (endpoint.host.as_str(), endpoint.port);
        let stream = match timeout(endpoint.connect_timeout, TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(RconError::Unreachable(e.to_string())),
            Err(_) => return Err(RconError::Unreachable("connect timed out".to_string())),
        };
        debug!(host = %endpoint.host, port = endpoint.port, "RCON socket open");
        self.stream = Some(stream);

        match self.authenticate(endpoint).await {
            Ok(()) => {
                info!(host = %endpoint.host, port = endpoint.port, "Connected to RCON server");
                Ok(())
            }
            Err(e) => {
                self.disconnect().await;
                Err(e)
            }
        }
    }

    async fn authenticate(&mut self, endpoint: &Endpoint) -> Result<(), RconError> {
        let id = self.ids.next();
        let stream = self.stream_mut()?;

        let login = Packet::new(
            id,
            SERVERDATA_AUTH,
            Bytes::copy_from_slice(endpoint.password.as_bytes()),
        );
        write_packet(stream, &login, endpoint.io_timeout).await?;

        // Some servers send an empty RESPONSE_VALUE ahead of the auth reply.
        for _ in 0..AUTH_REPLY_LIMIT {
            let reply = read_packet(stream, endpoint.io_timeout).await?;
            if reply.id == -1 {
                break;
            }
            if reply.kind == SERVERDATA_AUTH_RESPONSE && reply.id == id {
                return Ok(());
            }
        }

        warn!("RCON authentication rejected");
        Err(RconError::Auth)
    }

    async fn execute(&mut self, endpoint: &Endpoint, command: &str) -> Result<String, RconError> {
        self.connect(endpoint).await?;

        let command_id = self.ids.next();
        let sentinel_id = self.ids.next();
        let io = endpoint.io_timeout;
        let stream = self.stream_mut()?;

        let request = Packet::new(
            command_id,
            SERVERDATA_EXECCOMMAND,
            Bytes::copy_from_slice(command.as_bytes()),
        );
        write_packet(stream, &request, io).await?;

        // The sentinel reply marks the end of a possibly fragmented response.
        sleep(SENTINEL_DELAY).await;
        let sentinel = Packet::new(sentinel_id, SERVERDATA_EXECCOMMAND, Bytes::new());
        write_packet(stream, &sentinel, io).await?;

        let mut response = BytesMut::new();
        loop {
            let packet = read_packet(stream, io).await?;
            if packet.kind != SERVERDATA_RESPONSE_VALUE {
                continue;
            }
            if packet.id == sentinel_id {
                break;
            }
            if packet.id == command_id {
                response.extend_from_slice(&packet.payload);
            }
        }

        debug!(command, bytes = response.len(), "RCON command answered");
        Ok(String::from_utf8_lossy(&response).into_owned())
    }

    async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "RCON socket shutdown failed");
            }
            info!("Disconnected from RCON server");
        }
        self.ids.reset();
    }

    fn stream_mut(&mut self) -> Result<&mut TcpStream, RconError> {
        self.stream
            .as_mut()
            .ok_or_else(|| RconError::ConnectionLost("not connected".to_string()))
    }
}
