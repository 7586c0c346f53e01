//! Command parsing and dispatch
//!
//! Recognized payloads are a small closed set matched byte-for-byte; there
//! is deliberately no parser beyond exact comparison.

use crate::error::Result;
use crate::gpio::PinController;
use std::sync::Arc;
use tracing::{debug, info};

/// Command derived from a received payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Drive the output line high
    Start,
    /// Drive the output line low
    Stop,
    /// Anything else; echoed but without side effect
    Unrecognized,
}

impl Command {
    /// Map a payload to a command by exact, case-sensitive comparison
    pub fn parse(payload: &[u8]) -> Self {
        match payload {
            b"start" => Command::Start,
            b"stop" => Command::Stop,
            _ => Command::Unrecognized,
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Command::Start => write!(f, "start"),
            Command::Stop => write!(f, "stop"),
            Command::Unrecognized => write!(f, "unrecognized"),
        }
    }
}

/// Maps received payloads to pin transitions
pub struct CommandProcessor {
    pin: Arc<PinController>,
}

impl CommandProcessor {
    /// Create a processor driving the given output line
    pub fn new(pin: Arc<PinController>) -> Self {
        Self { pin }
    }

    /// Evaluate a payload for side effects and return the parsed command.
    ///
    /// Unrecognized payloads touch nothing. A pin write failure is the only
    /// error source here; parsing itself cannot fail.
    pub async fn dispatch(&self, payload: &[u8]) -> Result<Command> {
        let command = Command::parse(payload);

        match command {
            Command::Start => {
                self.pin.set_high().await?;
                info!("output line turned on");
            }
            Command::Stop => {
                self.pin.set_low().await?;
                info!("output line turned off");
            }
            Command::Unrecognized => {
                debug!("payload of {} bytes not a command, no side effect", payload.len());
            }
        }

        Ok(command)
    }
}
