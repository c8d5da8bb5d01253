//! OLED preview of the received sample.
//!
//! The panel driver itself (command framing, page addressing, I2C transfers)
//! sits behind [`Oled`]; this module only decides what goes into the
//! framebuffer and when it is flushed.

pub mod emulator;
pub mod framebuffer;

pub use emulator::EmulatorOled;
pub use framebuffer::Framebuffer;

use log::{debug, trace};
use crate::config::{DeviceConfig, MNIST_H, MNIST_SIZE, MNIST_W};
use crate::error::DeviceError;
use crate::sample::RawSample;

/// Grey level at which the default `draw_mnist` lights a pixel.
pub const MNIST_THRESHOLD: u8 = 128;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OledConfig {
    pub width: usize,
    pub height: usize,
    pub external_vcc: bool,
    pub address: u8,
    pub port: u8,
}

impl OledConfig {
    pub fn from_device(cfg: &DeviceConfig) -> Self {
        Self {
            width: cfg.display_width,
            height: cfg.display_height,
            external_vcc: cfg.external_vcc,
            address: cfg.i2c_address,
            port: cfg.i2c_port,
        }
    }
}

pub trait Oled {
    fn init(&mut self, cfg: &OledConfig) -> Result<(), DeviceError>;
    fn configure(&mut self) -> Result<(), DeviceError>;
    fn send_data(&mut self, fb: &Framebuffer) -> Result<(), DeviceError>;

    fn fill(&mut self, fb: &mut Framebuffer, on: bool) { fb.fill(on); }

    fn draw_mnist(&mut self, fb: &mut Framebuffer, src: &[u8; MNIST_SIZE], x0: usize, y0: usize) {
        for y in 0..MNIST_H {
            for x in 0..MNIST_W {
                fb.set_pixel(x0 + x, y0 + y, src[y * MNIST_W + x] >= MNIST_THRESHOLD);
            }
        }
    }
}

pub struct DisplayAdapter<D> {
    oled: D,
    fb: Framebuffer,
    blank_before_render: bool,
}

impl<D: Oled> DisplayAdapter<D> {
    /// Bring the panel up and show a blank frame.
    pub fn new(mut oled: D, cfg: OledConfig, blank_before_render: bool) -> Result<Self, DeviceError> {
        if cfg.width < MNIST_W || cfg.height < MNIST_H {
            return Err(DeviceError::InvalidConfig(format!("display {}x{} smaller than sample", cfg.width, cfg.height)));
        }
        oled.init(&cfg)?;
        oled.configure()?;
        let mut fb = Framebuffer::new(cfg.width, cfg.height);
        oled.fill(&mut fb, false);
        oled.send_data(&fb)?;
        debug!("oled {}x{} at 0x{:02X} on i2c{}", cfg.width, cfg.height, cfg.address, cfg.port);
        Ok(Self { oled, fb, blank_before_render })
    }

    pub fn origin(&self) -> (usize, usize) {
        ((self.fb.width() - MNIST_W) / 2, (self.fb.height() - MNIST_H) / 2)
    }

    pub fn render(&mut self, sample: &RawSample) -> Result<(), DeviceError> {
        self.oled.fill(&mut self.fb, false);
        if self.blank_before_render {
            self.oled.send_data(&self.fb)?;
        }
        let (x0, y0) = self.origin();
        self.oled.draw_mnist(&mut self.fb, sample.as_bytes(), x0, y0);
        trace!("sample drawn at ({}, {}), {} pixels lit", x0, y0, self.fb.lit_pixels());
        self.oled.send_data(&self.fb)
    }

    pub fn framebuffer(&self) -> &Framebuffer { &self.fb }
    pub fn oled(&self) -> &D { &self.oled }
    pub fn oled_mut(&mut self) -> &mut D { &mut self.oled }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(w: usize, h: usize) -> OledConfig {
        OledConfig { width: w, height: h, external_vcc: false, address: 0x3C, port: 1 }
    }

    #[test]
    fn startup_flushes_blank_frame() {
        let d = DisplayAdapter::new(EmulatorOled::default(), cfg(128, 64), true).unwrap();
        assert_eq!(d.oled().frames().len(), 1);
        assert_eq!(d.oled().frames()[0].lit_pixels(), 0);
    }

    #[test]
    fn rejects_panel_smaller_than_sample() {
        let r = DisplayAdapter::new(EmulatorOled::default(), cfg(128, 16), true);
        assert!(matches!(r, Err(DeviceError::InvalidConfig(_))));
    }

    #[test]
    fn origin_is_centered() {
        let d = DisplayAdapter::new(EmulatorOled::default(), cfg(128, 64), false).unwrap();
        assert_eq!(d.origin(), (50, 18));
        let d = DisplayAdapter::new(EmulatorOled::default(), cfg(29, 32), false).unwrap();
        assert_eq!(d.origin(), (0, 2));
    }

    #[test]
    fn partial_last_page_renders() {
        let mut d = DisplayAdapter::new(EmulatorOled::default(), cfg(128, 30), false).unwrap();
        assert_eq!(d.origin(), (50, 1));
        let s = RawSample::from_pixels([255u8; MNIST_SIZE]);
        d.render(&s).unwrap();
        assert_eq!(d.framebuffer().lit_pixels(), MNIST_SIZE);
        assert!(d.framebuffer().get_pixel(77, 28));
    }
}
