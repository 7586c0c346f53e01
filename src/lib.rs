//! pinlink-agent: Network-connected GPIO control endpoint
//!
//! This library exposes a single bidirectional WebSocket channel on a device
//! and maps the text commands `"start"` / `"stop"` onto a named GPIO output
//! line. Every accepted frame is echoed back to the sender byte-identically,
//! whether or not it was a recognized command.
//!
//! # Architecture
//!
//! The agent is driven by external network connectivity signals: the message
//! endpoint is started when the network comes up and torn down when it goes
//! away. The underlying network stack (association, DHCP, link-state events)
//! is an external collaborator that feeds those signals in.
//!
//! # Modules
//!
//! - `config`: Configuration parsing and management
//! - `channel`: Message framing contract and command dispatch
//! - `endpoint`: Endpoint lifecycle and connectivity monitoring
//! - `gpio`: Output line control with pluggable drivers
//! - `error`: Error types and handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod channel;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod gpio;

// Re-export commonly used types
pub use error::{AgentError, Result};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
