//! Per-tensor affine INT8 quantization: `x ≈ (q - z) * s`.
//!
//! Rounding is to-nearest with ties away from zero (`f32::round`), which is
//! what the model was calibrated with. Swapping in banker's rounding flips
//! boundary pixels.

use crate::error::DeviceError;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuantParams {
    pub scale: f32,
    pub zero_point: i32,
}

impl QuantParams {
    pub fn new(scale: f32, zero_point: i32) -> Self { Self { scale, zero_point } }

    /// Scale must be finite and positive, zero point must fit an i8.
    pub fn validate(&self, tensor: &str) -> Result<(), DeviceError> {
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(DeviceError::InvalidConfig(format!("{} scale {} is not positive", tensor, self.scale)));
        }
        if !(-128..=127).contains(&self.zero_point) {
            return Err(DeviceError::InvalidConfig(format!("{} zero point {} outside i8", tensor, self.zero_point)));
        }
        Ok(())
    }

    #[inline]
    pub fn quantize(&self, x: f32) -> i8 { quantize(x, self.scale, self.zero_point) }

    #[inline]
    pub fn dequantize(&self, q: i8) -> f32 { dequantize(q, self.scale, self.zero_point) }
}

#[inline]
pub fn quantize(x: f32, scale: f32, zero_point: i32) -> i8 {
    // `as i64` saturates on overflow and maps NaN to 0.
    let q = ((x / scale).round() as i64).saturating_add(zero_point as i64);
    q.clamp(i8::MIN as i64, i8::MAX as i64) as i8
}

#[inline]
pub fn dequantize(q: i8, scale: f32, zero_point: i32) -> f32 {
    (q as i32 - zero_point) as f32 * scale
}

/// Index of the first maximum. Empty input yields 0.
pub fn argmax_i8(v: &[i8]) -> usize {
    let mut best = 0usize;
    let mut bestv = match v.first() { Some(&x) => x, None => return 0 };
    for (i, &x) in v.iter().enumerate().skip(1) {
        if x > bestv {
            bestv = x;
            best = i;
        }
    }
    best
}
