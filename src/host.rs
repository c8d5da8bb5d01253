//! Line-oriented host link (USB CDC on the board, stdio on a host build).

use std::io::{self, BufRead, Read, Write};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::thread;
use std::time::Duration;
use log::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRead {
    /// A full line of `len` bytes, terminator stripped.
    Line(usize),
    /// The line did not fit the buffer; its remainder was discarded.
    Overflow,
    Eof,
    Timeout,
    IoError(io::ErrorKind),
}

pub trait HostChannel {
    fn read_line(&mut self, buf: &mut [u8]) -> HostRead;
    /// Consume everything up to and including the next LF.
    fn wait_ack(&mut self) -> HostRead;
    fn write_line(&mut self, line: &str) -> io::Result<()>;
}

pub struct LineChannel<R, W> {
    reader: R,
    writer: W,
    /// A line was cut short by a timeout; its tail is still on the wire.
    resync: bool,
}

impl<R: BufRead, W: Write> LineChannel<R, W> {
    pub fn new(reader: R, writer: W) -> Self { Self { reader, writer, resync: false } }

    pub fn into_parts(self) -> (R, W) { (self.reader, self.writer) }

    pub fn writer(&self) -> &W { &self.writer }

    // Drops the rest of a line abandoned by an earlier timeout.
    fn skip_stale_tail(&mut self) -> Result<(), HostRead> {
        let mut dropped = 0usize;
        while self.resync {
            let (used, done) = {
                let available = match self.reader.fill_buf() {
                    Ok(b) => b,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                        return Err(HostRead::Timeout);
                    }
                    Err(e) => return Err(HostRead::IoError(e.kind())),
                };
                if available.is_empty() {
                    self.resync = false;
                    return Err(HostRead::Eof);
                }
                match available.iter().position(|&b| b == b'\n') {
                    Some(i) => (i + 1, true),
                    None => (available.len(), false),
                }
            };
            self.reader.consume(used);
            dropped += used;
            if done { self.resync = false; }
        }
        if dropped > 0 { debug!("skipped {} bytes left over from a timed-out line", dropped); }
        Ok(())
    }

    // Walks the reader up to LF, handing each piece of the line to `sink`.
    // Returns the number of line bytes seen, or the terminal read status.
    fn scan_line(&mut self, mut sink: impl FnMut(&[u8])) -> Result<usize, HostRead> {
        self.skip_stale_tail()?;
        let mut seen = 0usize;
        loop {
            let (used, done) = {
                let available = match self.reader.fill_buf() {
                    Ok(b) => b,
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) if matches!(e.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) => {
                        if seen > 0 {
                            warn!("dropping {} bytes of a partial line after timeout", seen);
                            self.resync = true;
                        }
                        return Err(HostRead::Timeout);
                    }
                    Err(e) => return Err(HostRead::IoError(e.kind())),
                };
                if available.is_empty() {
                    // Unterminated last line still counts.
                    return if seen > 0 { Ok(seen) } else { Err(HostRead::Eof) };
                }
                match available.iter().position(|&b| b == b'\n') {
                    Some(i) => { sink(&available[..i]); seen += i; (i + 1, true) }
                    None => { sink(available); seen += available.len(); (available.len(), false) }
                }
            };
            self.reader.consume(used);
            if done { return Ok(seen); }
        }
    }
}

impl<R: BufRead, W: Write> HostChannel for LineChannel<R, W> {
    fn read_line(&mut self, buf: &mut [u8]) -> HostRead {
        let mut len = 0usize;
        let mut overflow = false;
        let res = self.scan_line(|part| {
            let room = buf.len() - len;
            if part.len() > room {
                overflow = true;
            }
            let n = part.len().min(room);
            buf[len..len + n].copy_from_slice(&part[..n]);
            len += n;
        });
        match res {
            Ok(seen) if overflow => {
                debug!("discarded {} bytes past the {} byte line buffer", seen - len, buf.len());
                HostRead::Overflow
            }
            Ok(_) => HostRead::Line(len),
            Err(status) => status,
        }
    }

    fn wait_ack(&mut self) -> HostRead {
        match self.scan_line(|_| {}) {
            Ok(n) => HostRead::Line(n),
            Err(status) => status,
        }
    }

    fn write_line(&mut self, line: &str) -> io::Result<()> {
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()
    }
}

/// Reader with a per-read deadline. A background thread owns the blocking
/// source and forwards chunks; an expired deadline reads as `TimedOut`.
pub struct TimedReader {
    rx: Receiver<io::Result<Vec<u8>>>,
    pending: Vec<u8>,
    pos: usize,
    timeout: Duration,
    eof: bool,
}

impl TimedReader {
    pub fn spawn<S: Read + Send + 'static>(mut source: S, timeout: Duration) -> io::Result<Self> {
        let (tx, rx) = mpsc::sync_channel::<io::Result<Vec<u8>>>(4);
        thread::Builder::new().name("host-rx".into()).spawn(move || {
            let mut chunk = [0u8; 512];
            loop {
                match source.read(&mut chunk) {
                    Ok(0) => { let _ = tx.send(Ok(Vec::new())); break; }
                    Ok(n) => { if tx.send(Ok(chunk[..n].to_vec())).is_err() { break; } }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => { let _ = tx.send(Err(e)); break; }
                }
            }
        })?;
        Ok(Self { rx, pending: Vec::new(), pos: 0, timeout, eof: false })
    }

    fn drain_pending(&mut self, out: &mut [u8]) -> usize {
        let n = (self.pending.len() - self.pos).min(out.len());
        out[..n].copy_from_slice(&self.pending[self.pos..self.pos + n]);
        self.pos += n;
        n
    }
}

impl Read for TimedReader {
    fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
        if self.pos < self.pending.len() {
            return Ok(self.drain_pending(out));
        }
        if self.eof {
            return Ok(0);
        }
        match self.rx.recv_timeout(self.timeout) {
            Ok(Ok(chunk)) if chunk.is_empty() => { self.eof = true; Ok(0) }
            Ok(Ok(chunk)) => {
                self.pending = chunk;
                self.pos = 0;
                Ok(self.drain_pending(out))
            }
            Ok(Err(e)) => Err(e),
            Err(RecvTimeoutError::Timeout) => Err(io::Error::new(io::ErrorKind::TimedOut, "host read timed out")),
            Err(RecvTimeoutError::Disconnected) => { self.eof = true; Ok(0) }
        }
    }
}
