//! Connectivity monitor
//!
//! Reacts to external network-up/network-down signals by starting and
//! stopping the message endpoint exactly once per transition. All access to
//! the endpoint handle goes through one exclusive lock so a stop in progress
//! can never race a start.

use crate::endpoint::{EndpointHandle, EndpointServer};
use crate::error::Result;
use std::net::SocketAddr;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info, warn};

/// Connectivity transition delivered by the network layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetworkEvent {
    /// The device acquired network connectivity
    Up,
    /// The device lost network connectivity
    Down,
}

/// Starts and stops the message endpoint on connectivity transitions
pub struct ConnectivityMonitor {
    server: EndpointServer,
    handle: Mutex<Option<EndpointHandle>>,
}

impl ConnectivityMonitor {
    /// Create a monitor managing the given endpoint server
    pub fn new(server: EndpointServer) -> Self {
        Self {
            server,
            handle: Mutex::new(None),
        }
    }

    /// Apply one connectivity transition
    pub async fn handle_event(&self, event: NetworkEvent) -> Result<()> {
        match event {
            NetworkEvent::Up => self.network_up().await,
            NetworkEvent::Down => self.network_down().await,
        }
    }

    /// Start the endpoint if it is not already running.
    ///
    /// Idempotent: a second up-signal while connected is a no-op.
    pub async fn network_up(&self) -> Result<()> {
        let mut handle = self.handle.lock().await;

        if handle.is_some() {
            debug!("network up while endpoint already running, ignoring");
            return Ok(());
        }

        info!("network up, starting message endpoint");
        *handle = Some(self.server.start().await?);
        Ok(())
    }

    /// Stop the endpoint if one is running.
    ///
    /// A down-signal with no endpoint is a no-op. A teardown failure is
    /// logged and the handle is dropped anyway; an endpoint that failed to
    /// stop cleanly must not be reachable through a stale handle.
    pub async fn network_down(&self) -> Result<()> {
        let mut handle = self.handle.lock().await;

        match handle.take() {
            Some(endpoint) => {
                info!("network down, stopping message endpoint");
                if let Err(e) = endpoint.stop().await {
                    warn!("failed to stop message endpoint: {}", e);
                }
                Ok(())
            }
            None => {
                debug!("network down with no endpoint running, ignoring");
                Ok(())
            }
        }
    }

    /// Whether an endpoint is currently running
    pub async fn is_running(&self) -> bool {
        self.handle.lock().await.is_some()
    }

    /// Address of the running endpoint, if any
    pub async fn local_addr(&self) -> Option<SocketAddr> {
        self.handle.lock().await.as_ref().map(|h| h.local_addr())
    }

    /// Consume connectivity events from the network layer until the
    /// sender side is dropped
    pub async fn run(&self, mut events: mpsc::Receiver<NetworkEvent>) {
        while let Some(event) = events.recv().await {
            if let Err(e) = self.handle_event(event).await {
                error!("connectivity transition failed: {}", e);
            }
        }
        debug!("connectivity event source closed");
    }
}
