//! Decimal sample ingest: one line of 784 whitespace-separated integers.

use log::{debug, trace, warn};
use crate::config::MNIST_SIZE;
use crate::error::{DeviceError, ReadFault};
use crate::host::{HostChannel, HostRead};
use crate::sample::RawSample;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IngestReport {
    /// Values outside [0, 255] that were clamped.
    pub clamped: usize,
    /// Bytes left unparsed after the last pixel.
    pub trailing: usize,
}

#[inline]
fn is_sep(b: u8) -> bool { matches!(b, b' ' | b'\t' | b'\r' | b'\n') }

/// `strtol(.., 10)` over `s`: optional sign then digits, saturating.
/// Returns the value and bytes consumed; 0 consumed means no number.
fn scan_long(s: &[u8]) -> (i64, usize) {
    let mut i = 0usize;
    let neg = match s.first() {
        Some(b'-') => { i = 1; true }
        Some(b'+') => { i = 1; false }
        _ => false,
    };
    let start = i;
    let mut v: i64 = 0;
    while let Some(&c) = s.get(i) {
        if !c.is_ascii_digit() { break; }
        let d = (c - b'0') as i64;
        v = if neg { v.saturating_mul(10).saturating_sub(d) } else { v.saturating_mul(10).saturating_add(d) };
        i += 1;
    }
    if i == start { (0, 0) } else { (v, i) }
}

/// Parse one text record into `out`. `out` is only meaningful on `Ok`.
pub fn parse_sample(line: &[u8], out: &mut RawSample) -> Result<IngestReport, DeviceError> {
    let pixels = out.as_mut_bytes();
    let mut report = IngestReport::default();
    let mut pos = 0usize;
    let mut count = 0usize;
    while count < MNIST_SIZE {
        while pos < line.len() && is_sep(line[pos]) { pos += 1; }
        if pos >= line.len() || line[pos] == 0 {
            return Err(DeviceError::IncompleteSample { count });
        }
        let (value, used) = scan_long(&line[pos..]);
        if used == 0 {
            return Err(DeviceError::FramingError { index: count });
        }
        if !(0..=255).contains(&value) {
            trace!("pixel {} = {} clamped", count, value);
            report.clamped += 1;
        }
        pixels[count] = value.clamp(0, 255) as u8;
        count += 1;
        pos += used;
    }
    let rest = &line[pos..];
    report.trailing = rest.iter().filter(|&&b| !is_sep(b)).count();
    Ok(report)
}

/// Owns the reusable line buffer that every cycle reads into.
pub struct SampleIngest {
    line: Vec<u8>,
}

impl SampleIngest {
    pub fn new(buffer_size: usize) -> Self { Self { line: vec![0u8; buffer_size] } }

    pub fn capacity(&self) -> usize { self.line.len() }

    pub fn ingest<H: HostChannel + ?Sized>(&mut self, host: &mut H, out: &mut RawSample) -> Result<IngestReport, DeviceError> {
        let len = match host.read_line(&mut self.line) {
            HostRead::Line(n) => n,
            HostRead::Overflow => {
                warn!("host line longer than {} bytes", self.line.len());
                return Err(DeviceError::Overflow { limit: self.line.len() });
            }
            HostRead::Timeout => return Err(DeviceError::Timeout),
            HostRead::Eof => return Err(DeviceError::ReadFailure(ReadFault::Closed)),
            HostRead::IoError(kind) => return Err(DeviceError::ReadFailure(ReadFault::Io(kind))),
        };
        let report = parse_sample(&self.line[..len], out)?;
        if report.clamped > 0 {
            warn!("{} pixel values outside 0-255 were clamped", report.clamped);
        }
        if report.trailing > 0 {
            debug!("ignored {} bytes after the last pixel", report.trailing);
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strtol_shapes() {
        assert_eq!(scan_long(b"42 "), (42, 2));
        assert_eq!(scan_long(b"-5x"), (-5, 2));
        assert_eq!(scan_long(b"+7"), (7, 2));
        assert_eq!(scan_long(b"-"), (0, 0));
        assert_eq!(scan_long(b"abc"), (0, 0));
        assert_eq!(scan_long(b"99999999999999999999999").0, i64::MAX);
    }

    #[test]
    fn adjacent_numbers_without_space() {
        let mut line = b"12-3".to_vec();
        line.extend(std::iter::repeat(b" 1").take(782).flatten());
        let mut s = RawSample::zeros();
        parse_sample(&line, &mut s).unwrap();
        assert_eq!(s.as_bytes()[0], 12);
        assert_eq!(s.as_bytes()[1], 0);
        assert_eq!(s.as_bytes()[2], 1);
    }

    #[test]
    fn trailing_garbage_after_number_is_framing() {
        let mut s = RawSample::zeros();
        assert_eq!(parse_sample(b"5 12abc 3", &mut s), Err(DeviceError::FramingError { index: 2 }));
    }

    #[test]
    fn empty_line_is_incomplete_zero() {
        let mut s = RawSample::zeros();
        assert_eq!(parse_sample(b"  \t\r", &mut s), Err(DeviceError::IncompleteSample { count: 0 }));
    }
}
