//! GPIO driver backends
//!
//! The agent controls exactly one output line, but hardware access is kept
//! behind a small trait so tests can observe writes without touching
//! `/dev/gpiochipN`.

use crate::config::PinConfig;
use crate::error::{AgentError, Result};
use crate::gpio::PinState;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use tokio_gpiod::{Bias, Chip, Lines, Options, Output};

/// One observed level write, as seen by a driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinWrite {
    /// Level that was driven
    pub level: PinState,
    /// Whether an idle bias was configured together with the write
    pub bias_configured: bool,
}

/// GPIO driver trait - the seam between the controller and the hardware
#[async_trait]
pub trait PinDriver: Send + Sync {
    /// Driver name for diagnostics
    fn name(&self) -> &'static str;

    /// Request the line as an output and drive it low.
    ///
    /// Called once at startup; a failure here is a fatal configuration
    /// error (invalid chip, missing line, direction not available).
    async fn probe(&self, pin: &PinConfig) -> Result<()>;

    /// Drive the line to `level`, setting the idle bias first when the
    /// pin configuration asks for it.
    async fn write_level(&self, pin: &PinConfig, level: PinState) -> Result<()>;
}

/// Driver using the libgpiod v2 character device interface (`/dev/gpiochipN`)
pub struct GpiodDriver;

impl GpiodDriver {
    /// Create a new gpiod driver
    pub fn new() -> Self {
        Self
    }

    async fn open_chip(pin: &PinConfig) -> Result<Chip> {
        Chip::new(&pin.chip).await.map_err(|e| {
            AgentError::Gpio(format!("Failed to open GPIO chip '{}': {}", pin.chip, e))
        })
    }

    /// Request the line as an output driven to `level`, with the idle bias
    /// pulled in the direction of the level when the pin asks for it.
    async fn request_output(
        chip: &Chip,
        pin: &PinConfig,
        level: PinState,
    ) -> Result<Lines<Output>> {
        let value = level.is_high();

        let mut opts = Options::output([pin.line]).values([value]);
        if pin.configure_idle_bias {
            let bias = if value { Bias::PullUp } else { Bias::PullDown };
            opts = opts.bias(bias);
        }

        chip.request_lines(opts.consumer(crate::APP_NAME))
            .await
            .map_err(|e| {
                AgentError::Gpio(format!(
                    "Failed to request line {} on chip '{}' as output: {}",
                    pin.line, pin.chip, e
                ))
            })
    }
}

impl Default for GpiodDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PinDriver for GpiodDriver {
    fn name(&self) -> &'static str {
        "gpiod"
    }

    async fn probe(&self, pin: &PinConfig) -> Result<()> {
        let chip = Self::open_chip(pin).await?;
        Self::request_output(&chip, pin, PinState::Low).await?;
        Ok(())
    }

    async fn write_level(&self, pin: &PinConfig, level: PinState) -> Result<()> {
        let chip = Self::open_chip(pin).await?;
        let lines = Self::request_output(&chip, pin, level).await?;

        lines.set_values([level.is_high()]).await.map_err(|e| {
            AgentError::Gpio(format!(
                "Failed to write line {} on chip '{}': {}",
                pin.line, pin.chip, e
            ))
        })?;

        Ok(())
    }
}

/// In-memory driver for tests: records every write, can be told to fail
#[derive(Clone, Default)]
pub struct MockPinDriver {
    writes: Arc<Mutex<Vec<PinWrite>>>,
    probed: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    fail_probe: Arc<AtomicBool>,
}

impl MockPinDriver {
    /// Create a new mock driver
    pub fn new() -> Self {
        Self::default()
    }

    // A poisoned lock still holds the recorded writes
    fn writes_lock(&self) -> std::sync::MutexGuard<'_, Vec<PinWrite>> {
        self.writes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// All writes observed so far, in order
    pub fn writes(&self) -> Vec<PinWrite> {
        self.writes_lock().clone()
    }

    /// Level of the most recent write, if any
    pub fn last_level(&self) -> Option<PinState> {
        self.writes_lock().last().map(|w| w.level)
    }

    /// Whether `probe` has been called
    pub fn probed(&self) -> bool {
        self.probed.load(Ordering::SeqCst)
    }

    /// Make subsequent `write_level` calls fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Make subsequent `probe` calls fail
    pub fn set_fail_probe(&self, fail: bool) {
        self.fail_probe.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl PinDriver for MockPinDriver {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn probe(&self, _pin: &PinConfig) -> Result<()> {
        if self.fail_probe.load(Ordering::SeqCst) {
            return Err(AgentError::Gpio("mock probe failure".to_string()));
        }
        self.probed.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn write_level(&self, pin: &PinConfig, level: PinState) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AgentError::Gpio("mock write failure".to_string()));
        }
        self.writes_lock().push(PinWrite {
            level,
            bias_configured: pin.configure_idle_bias,
        });
        Ok(())
    }
}
