//! Message endpoint lifecycle
//!
//! This module owns starting and stopping the transport that terminates the
//! upgrade handshake: a single-route server whose lifetime is exactly the
//! connected-network interval.

mod monitor;

pub use monitor::{ConnectivityMonitor, NetworkEvent};

use crate::channel::{ws_handler, ChannelState, MessageChannel};
use crate::config::EndpointConfig;
use crate::error::{AgentError, Result};
use axum::{routing::get, Router};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// Factory for the running endpoint; start() hands out an [`EndpointHandle`]
pub struct EndpointServer {
    config: EndpointConfig,
    channel: Arc<MessageChannel>,
}

impl EndpointServer {
    /// Create a server that will expose `channel` on the configured route
    pub fn new(config: EndpointConfig, channel: Arc<MessageChannel>) -> Self {
        Self { config, channel }
    }

    /// Bind the listener and start serving the message endpoint
    pub async fn start(&self) -> Result<EndpointHandle> {
        // One teardown flag, watched by the accept loop and by every
        // connection it spawns. A level rather than an edge so receivers
        // cloned mid-teardown still observe it.
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let state = ChannelState {
            channel: self.channel.clone(),
            shutdown: shutdown_rx.clone(),
        };
        let app = Router::new()
            .route(&self.config.route, get(ws_handler))
            .with_state(state);

        let listener = TcpListener::bind((self.config.bind_address.as_str(), self.config.bind_port))
            .await
            .map_err(|e| {
                AgentError::Endpoint(format!(
                    "Failed to bind {}:{}: {}",
                    self.config.bind_address, self.config.bind_port, e
                ))
            })?;

        let addr = listener.local_addr()?;

        let mut accept_shutdown = shutdown_rx;
        let task = tokio::spawn(async move {
            let shutdown = async move {
                let _ = accept_shutdown.wait_for(|stopping| *stopping).await;
            };
            if let Err(e) = axum::serve(listener, app)
                .with_graceful_shutdown(shutdown)
                .await
            {
                error!("endpoint serve error: {}", e);
            }
        });

        info!(
            "message endpoint listening on {} (route {})",
            addr, self.config.route
        );

        Ok(EndpointHandle {
            addr,
            shutdown: shutdown_tx,
            task,
        })
    }
}

/// Ownership token for the running message endpoint.
///
/// Exists 0-or-1 at a time; dropping or stopping it takes the endpoint down.
pub struct EndpointHandle {
    addr: SocketAddr,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl EndpointHandle {
    /// Address the endpoint is actually bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop the endpoint, closing the listener and any open connections.
    ///
    /// Fires the teardown signal and joins the serve task; connection
    /// loops watch the same signal and close their sockets, so nothing
    /// survives past the join.
    pub async fn stop(self) -> Result<()> {
        info!("stopping message endpoint on {}", self.addr);
        let _ = self.shutdown.send(true);

        self.task.await.map_err(|e| {
            AgentError::Endpoint(format!("Endpoint task failed during teardown: {}", e))
        })
    }
}
