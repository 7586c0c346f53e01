//! Configuration validation functions
//!
//! This module provides validation for all configuration fields including
//! bind addresses, the endpoint route, frame bounds, and GPIO chip names.

use crate::error::{AgentError, Result};
use std::net::IpAddr;

/// Upper bound on the configurable frame length; anything larger makes no
/// sense for a command channel.
const MAX_FRAME_LEN_CEILING: usize = 64 * 1024;

/// Validate a bind address (must be a literal IP address)
pub fn validate_bind_address(addr: &str) -> Result<()> {
    addr.parse::<IpAddr>()
        .map_err(|_| AgentError::Config(format!("Invalid bind address: {}", addr)))?;
    Ok(())
}

/// Validate the endpoint route (absolute path, no whitespace)
pub fn validate_route(route: &str) -> Result<()> {
    if !route.starts_with('/') {
        return Err(AgentError::Config(format!(
            "Route '{}' must start with '/'",
            route
        )));
    }

    if route.chars().any(char::is_whitespace) {
        return Err(AgentError::Config(format!(
            "Route '{}' contains whitespace",
            route
        )));
    }

    Ok(())
}

/// Validate the maximum frame length (non-zero, bounded)
pub fn validate_max_frame_len(len: usize) -> Result<()> {
    if len == 0 {
        return Err(AgentError::Config(
            "max_frame_len cannot be 0".to_string(),
        ));
    }

    if len > MAX_FRAME_LEN_CEILING {
        return Err(AgentError::Config(format!(
            "max_frame_len {} exceeds ceiling of {} bytes",
            len, MAX_FRAME_LEN_CEILING
        )));
    }

    Ok(())
}

/// Validate a GPIO chip device name (alphanumeric, no path components)
pub fn validate_chip_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(AgentError::Config(
            "GPIO chip name cannot be empty".to_string(),
        ));
    }

    if !name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '-') {
        return Err(AgentError::Config(format!(
            "GPIO chip name '{}' contains invalid characters (only alphanumeric, '_', and '-' allowed)",
            name
        )));
    }

    Ok(())
}
