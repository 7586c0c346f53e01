//! Configuration management
//!
//! This module handles parsing and validation of the agent configuration
//! from a static TOML file.

mod validation;

use crate::error::{AgentError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Message endpoint configuration
    #[serde(default)]
    pub endpoint: EndpointConfig,

    /// Output line configuration
    #[serde(default)]
    pub pin: PinConfig,
}

/// Configuration for the message endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointConfig {
    /// Bind address for the endpoint listener
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// Bind port for the endpoint listener
    #[serde(default = "default_bind_port")]
    pub bind_port: u16,

    /// Route that upgrades to the message channel
    #[serde(default = "default_route")]
    pub route: String,

    /// Maximum accepted frame payload length in bytes
    #[serde(default = "default_max_frame_len")]
    pub max_frame_len: usize,
}

/// Configuration for the controlled output line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PinConfig {
    /// GPIO chip device name (e.g., "gpiochip0")
    #[serde(default = "default_chip")]
    pub chip: String,

    /// Line offset on the GPIO chip
    #[serde(default = "default_line")]
    pub line: u32,

    /// Set an idle bias (pull resistor) together with each level write.
    /// When false, levels are written with the bias left untouched.
    #[serde(default)]
    pub configure_idle_bias: bool,
}

impl Config {
    /// Create a configuration with all defaults
    pub fn new() -> Self {
        Self {
            endpoint: EndpointConfig::default(),
            pin: PinConfig::default(),
        }
    }

    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            AgentError::Config(format!(
                "Failed to read config file {:?}: {}",
                path.as_ref(),
                e
            ))
        })?;
        Self::from_toml(&contents)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        Ok(config)
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<()> {
        self.endpoint
            .validate()
            .map_err(|e| AgentError::Config(format!("Endpoint: {}", e)))?;
        self.pin
            .validate()
            .map_err(|e| AgentError::Config(format!("Pin: {}", e)))?;
        Ok(())
    }
}

impl EndpointConfig {
    /// Validate endpoint configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_bind_address(&self.bind_address)?;
        validation::validate_route(&self.route)?;
        validation::validate_max_frame_len(self.max_frame_len)?;
        Ok(())
    }
}

impl PinConfig {
    /// Validate pin configuration
    pub fn validate(&self) -> Result<()> {
        validation::validate_chip_name(&self.chip)?;
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Default for EndpointConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            bind_port: default_bind_port(),
            route: default_route(),
            max_frame_len: default_max_frame_len(),
        }
    }
}

impl Default for PinConfig {
    fn default() -> Self {
        Self {
            chip: default_chip(),
            line: default_line(),
            configure_idle_bias: false,
        }
    }
}

// Default value functions for serde
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_bind_port() -> u16 {
    8080
}

fn default_route() -> String {
    "/ws".to_string()
}

fn default_max_frame_len() -> usize {
    1024
}

fn default_chip() -> String {
    "gpiochip0".to_string()
}

fn default_line() -> u32 {
    2
}
