//! `TactixServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → room registry.
//! The registry is constructed once here and handed to every
//! connection handler through shared state — never ambient globals.

use std::sync::Arc;

use tactix_protocol::JsonCodec;
use tactix_room::RoomRegistry;
use tactix_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::handler::handle_connection;
use crate::TactixError;

/// Shared server state passed to each connection handler task.
///
/// The mutex guards only the registry map (lookup, spawn, sweep);
/// per-room game state lives in the room actors and never contends
/// across rooms.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Tactix server.
///
/// # Example
///
/// ```rust,ignore
/// let server = TactixServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct TactixServerBuilder {
    bind_addr: String,
}

impl TactixServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self { bind_addr: "127.0.0.1:8080".to_string() }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Binds the listener and assembles the server.
    pub async fn build(self) -> Result<TactixServer, TactixError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new()),
            codec: JsonCodec,
        });

        Ok(TactixServer { transport, state })
    }
}

impl Default for TactixServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Tactix server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TactixServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl TactixServer {
    /// Creates a new builder.
    pub fn builder() -> TactixServerBuilder {
        TactixServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop: each incoming connection gets its own
    /// handler task. Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), TactixError> {
        tracing::info!("Tactix server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
