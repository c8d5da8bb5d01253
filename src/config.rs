use serde::{Deserialize, Serialize};
use std::path::Path;
use anyhow::{Context, Result};
use crate::error::DeviceError;

pub const MNIST_W: usize = 28;
pub const MNIST_H: usize = 28;
pub const MNIST_SIZE: usize = MNIST_W * MNIST_H;
pub const NUM_CLASSES: usize = 10;

// Enough for 784 values of up to 4 chars each plus separators.
pub const SERIAL_BUFFER_SIZE: usize = 4096;

// SSD1306 panel wired to i2c1 on GPIO 14/15.
pub const WIDTH: usize = 128;
pub const HEIGHT: usize = 64;
pub const I2C_PORT: u8 = 1;
pub const I2C_SDA: u8 = 14;
pub const I2C_SCL: u8 = 15;
pub const I2C_BAUD_HZ: u32 = 400_000;
pub const SSD1306_ADDR: u8 = 0x3C;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DeviceConfig {
    pub display_width: usize,
    pub display_height: usize,
    pub external_vcc: bool,
    pub i2c_address: u8,
    pub i2c_port: u8,
    pub serial_buffer_size: usize,
    pub read_timeout_ms: Option<u64>,
    /// Flush a blank frame before drawing the sample (visible blink while inferring).
    pub blank_before_render: bool,
    /// The firmware waits for the USB host to enumerate before printing anything.
    pub startup_delay_ms: u64,
    pub exit_on_fault: bool,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            display_width: WIDTH,
            display_height: HEIGHT,
            external_vcc: false,
            i2c_address: SSD1306_ADDR,
            i2c_port: I2C_PORT,
            serial_buffer_size: SERIAL_BUFFER_SIZE,
            read_timeout_ms: None,
            blank_before_render: true,
            startup_delay_ms: 0,
            exit_on_fault: false,
        }
    }
}

impl DeviceConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("read device config: {}", path.as_ref().display()))?;
        let cfg: DeviceConfig = serde_json::from_str(&raw).context("parse device config")?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), DeviceError> {
        if self.display_width < MNIST_W || self.display_height < MNIST_H {
            return Err(DeviceError::InvalidConfig(format!(
                "display {}x{} cannot hold a {}x{} sample",
                self.display_width, self.display_height, MNIST_W, MNIST_H
            )));
        }
        if self.serial_buffer_size == 0 {
            return Err(DeviceError::InvalidConfig("serial buffer size must be non-zero".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_board_wiring() {
        let cfg = DeviceConfig::default();
        assert_eq!(cfg.display_width, 128);
        assert_eq!(cfg.display_height, 64);
        assert_eq!(cfg.i2c_address, 0x3C);
        assert!(cfg.blank_before_render);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn partial_json_fills_defaults() {
        let cfg: DeviceConfig = serde_json::from_str(r#"{"read_timeout_ms": 250}"#).unwrap();
        assert_eq!(cfg.read_timeout_ms, Some(250));
        assert_eq!(cfg.serial_buffer_size, SERIAL_BUFFER_SIZE);
    }

    #[test]
    fn rejects_small_display() {
        let cfg = DeviceConfig { display_width: 27, ..DeviceConfig::default() };
        assert!(matches!(cfg.validate(), Err(DeviceError::InvalidConfig(_))));
    }

    #[test]
    fn accepts_height_off_page_boundary() {
        let cfg = DeviceConfig { display_height: 30, ..DeviceConfig::default() };
        assert!(cfg.validate().is_ok());
    }
}
