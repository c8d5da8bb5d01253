//! Software stand-in for the SSD1306 on host builds: keeps every flushed
//! frame instead of pushing it over I2C.

use log::{debug, log_enabled, Level};
use crate::display::{Framebuffer, Oled, OledConfig};
use crate::error::DeviceError;

/// Frames kept by [`EmulatorOled::default`].
pub const DEFAULT_FRAME_HISTORY: usize = 64;

#[derive(Debug)]
pub struct EmulatorOled {
    cfg: Option<OledConfig>,
    configured: bool,
    frames: Vec<Framebuffer>,
    fail_sends: bool,
    /// Cap on retained frames, at least 1.
    keep: usize,
}

impl Default for EmulatorOled {
    fn default() -> Self {
        Self { cfg: None, configured: false, frames: Vec::new(), fail_sends: false, keep: DEFAULT_FRAME_HISTORY }
    }
}

impl EmulatorOled {
    /// Retain only the newest `keep` frames; 0 is treated as 1.
    pub fn with_history(keep: usize) -> Self { Self { keep: keep.max(1), ..Self::default() } }

    pub fn frames(&self) -> &[Framebuffer] { &self.frames }

    pub fn last_frame(&self) -> Option<&Framebuffer> { self.frames.last() }

    pub fn config(&self) -> Option<&OledConfig> { self.cfg.as_ref() }

    pub fn is_configured(&self) -> bool { self.configured }

    /// Make every following flush fail, as a wedged bus would.
    pub fn set_fail_sends(&mut self, fail: bool) { self.fail_sends = fail; }
}

impl Oled for EmulatorOled {
    fn init(&mut self, cfg: &OledConfig) -> Result<(), DeviceError> {
        self.cfg = Some(*cfg);
        Ok(())
    }

    fn configure(&mut self) -> Result<(), DeviceError> {
        if self.cfg.is_none() {
            return Err(DeviceError::Display("configure before init".into()));
        }
        self.configured = true;
        Ok(())
    }

    fn send_data(&mut self, fb: &Framebuffer) -> Result<(), DeviceError> {
        if !self.configured {
            return Err(DeviceError::Display("panel not configured".into()));
        }
        if self.fail_sends {
            return Err(DeviceError::Display("i2c write not acknowledged".into()));
        }
        if log_enabled!(Level::Debug) && fb.lit_pixels() > 0 {
            debug!("oled frame:\n{}", fb.to_ascii());
        }
        if self.frames.len() >= self.keep {
            self.frames.remove(0);
        }
        self.frames.push(fb.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn panel(keep: usize) -> EmulatorOled {
        let mut o = EmulatorOled::with_history(keep);
        o.init(&OledConfig { width: 32, height: 32, external_vcc: false, address: 0x3C, port: 1 }).unwrap();
        o.configure().unwrap();
        o
    }

    #[test]
    fn history_is_bounded() {
        let mut o = panel(3);
        let fb = Framebuffer::new(32, 32);
        for _ in 0..10 { o.send_data(&fb).unwrap(); }
        assert_eq!(o.frames().len(), 3);
    }

    #[test]
    fn zero_history_keeps_last_frame() {
        let mut o = panel(0);
        let mut fb = Framebuffer::new(32, 32);
        o.send_data(&fb).unwrap();
        fb.set_pixel(1, 1, true);
        o.send_data(&fb).unwrap();
        assert_eq!(o.frames().len(), 1);
        assert_eq!(o.last_frame().map(|f| f.lit_pixels()), Some(1));
    }

    #[test]
    fn default_history_is_finite() {
        let mut o = EmulatorOled::default();
        o.init(&OledConfig { width: 32, height: 32, external_vcc: false, address: 0x3C, port: 1 }).unwrap();
        o.configure().unwrap();
        let fb = Framebuffer::new(32, 32);
        for _ in 0..DEFAULT_FRAME_HISTORY + 5 { o.send_data(&fb).unwrap(); }
        assert_eq!(o.frames().len(), DEFAULT_FRAME_HISTORY);
    }
}
