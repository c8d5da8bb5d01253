//! Top-level cyclic state machine:
//!
//! ```text
//! INIT ──ok──► READY ─► AWAIT_SAMPLE ─► RENDER_AND_INFER ─► REPORT ─► AWAIT_ACK ─┐
//!  │             ▲           │ err              │ err                           │
//!  │             └───────────┴──────────────────┴───────────────────────────────┘
//!  └─err─► FAULT (terminal, parked until reset)
//! ```

use std::thread;
use std::time::Duration;
use log::{error, info, trace, warn};
use crate::config::DeviceConfig;
use crate::display::{DisplayAdapter, Oled, OledConfig};
use crate::driver::InferenceDriver;
use crate::engine::InferenceEngine;
use crate::error::{DeviceError, ReadFault};
use crate::host::{HostChannel, HostRead};
use crate::ingest::SampleIngest;
use crate::sample::{format_report, Classification, RawSample};

pub const BANNER: &str = "=== MNIST TinyML via USB no Pico W ===";
pub const PROMPT: &str = "Envie a amostra MNIST (784 valores 0-255 separados por espaço):";
pub const RECEIVED: &str = "Amostra MNIST recebida com sucesso!";
pub const DISCARDED: &str = "Entrada inválida, descartando amostra.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Init,
    Ready,
    AwaitSample,
    RenderAndInfer,
    Report,
    AwaitAck,
    Fault,
}

#[derive(Debug, Clone, PartialEq)]
pub enum CycleOutcome {
    Reported(Classification),
    Dropped(DeviceError),
    /// The host side of the link went away.
    HostClosed,
}

pub struct Device<E, D, H> {
    ingest: SampleIngest,
    sample: RawSample,
    driver: InferenceDriver<E>,
    display: DisplayAdapter<D>,
    host: H,
    state: State,
    cycles: u64,
}

impl<E: InferenceEngine, D: Oled, H: HostChannel> Device<E, D, H> {
    /// INIT: bring up the display and the runtime and print diagnostics.
    /// On error the diagnostic has already been sent to the host; the caller
    /// should [`halt`].
    pub fn init(cfg: &DeviceConfig, engine: E, oled: D, mut host: H) -> Result<Self, DeviceError> {
        if cfg.startup_delay_ms > 0 {
            thread::sleep(Duration::from_millis(cfg.startup_delay_ms));
        }
        say_init(&mut host, "");
        say_init(&mut host, BANNER);
        let started = cfg
            .validate()
            .and_then(|_| {
                DisplayAdapter::new(oled, OledConfig::from_device(cfg), cfg.blank_before_render).map_err(|e| match e {
                    DeviceError::Display(msg) => {
                        warn!("oled bring-up: {}", msg);
                        DeviceError::InitFailure { stage: "ssd1306_init", code: -1 }
                    }
                    other => other,
                })
            })
            .and_then(|display| InferenceDriver::start(engine).map(|driver| (display, driver)));
        let (display, driver) = match started {
            Ok(parts) => parts,
            Err(e) => {
                trace!("state {:?} -> {:?}", State::Init, State::Fault);
                say_init(&mut host, &e.host_message());
                return Err(e);
            }
        };
        for line in driver.info().host_lines() {
            say_init(&mut host, &line);
        }
        info!("device ready, ingest buffer {} bytes", cfg.serial_buffer_size);
        Ok(Self {
            ingest: SampleIngest::new(cfg.serial_buffer_size),
            sample: RawSample::zeros(),
            driver,
            display,
            host,
            state: State::Ready,
            cycles: 0,
        })
    }

    pub fn state(&self) -> State { self.state }
    pub fn cycles(&self) -> u64 { self.cycles }
    pub fn sample(&self) -> &RawSample { &self.sample }
    pub fn driver(&self) -> &InferenceDriver<E> { &self.driver }
    pub fn driver_mut(&mut self) -> &mut InferenceDriver<E> { &mut self.driver }
    pub fn display(&self) -> &DisplayAdapter<D> { &self.display }
    pub fn display_mut(&mut self) -> &mut DisplayAdapter<D> { &mut self.display }
    pub fn host(&self) -> &H { &self.host }

    pub fn into_host(self) -> H { self.host }

    fn enter(&mut self, next: State) {
        trace!("state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    // False once the host can no longer be written to.
    fn say(&mut self, line: &str) -> bool {
        match self.host.write_line(line) {
            Ok(()) => true,
            Err(e) => { warn!("host write failed: {}", e); false }
        }
    }

    // Bad input also gets the discard notice; display and runtime faults
    // only get their own diagnostic.
    fn drop_sample(&mut self, e: DeviceError) -> CycleOutcome {
        warn!("cycle {} dropped: {}", self.cycles, e);
        let closed = matches!(e, DeviceError::ReadFailure(ReadFault::Closed));
        let mut ok = self.say(&e.host_message());
        if ok && e.is_ingest() {
            ok = self.say(DISCARDED);
        }
        self.enter(State::Ready);
        if closed || !ok { CycleOutcome::HostClosed } else { CycleOutcome::Dropped(e) }
    }

    /// One READY -> ... -> READY pass.
    pub fn cycle(&mut self) -> CycleOutcome {
        self.cycles += 1;
        self.enter(State::Ready);
        if !self.say(PROMPT) { return CycleOutcome::HostClosed; }

        self.enter(State::AwaitSample);
        if let Err(e) = self.ingest.ingest(&mut self.host, &mut self.sample) {
            return self.drop_sample(e);
        }
        if !self.say(RECEIVED) { return CycleOutcome::HostClosed; }

        self.enter(State::RenderAndInfer);
        if let Err(e) = self.display.render(&self.sample) {
            return self.drop_sample(e);
        }
        let result = match self.driver.infer(&self.sample) {
            Ok(c) => c,
            Err(e) => return self.drop_sample(e),
        };

        self.enter(State::Report);
        for line in format_report(&result) {
            if !self.say(&line) { return CycleOutcome::HostClosed; }
        }

        self.enter(State::AwaitAck);
        match self.host.wait_ack() {
            HostRead::Line(_) | HostRead::Overflow => {}
            other => trace!("ack read ended with {:?}", other),
        }
        self.enter(State::Ready);
        CycleOutcome::Reported(result)
    }

    /// Cycle until the host goes away. On the board that never happens.
    pub fn run(&mut self) -> u64 {
        let mut reported = 0u64;
        loop {
            match self.cycle() {
                CycleOutcome::Reported(_) => reported += 1,
                CycleOutcome::Dropped(_) => {}
                CycleOutcome::HostClosed => break,
            }
        }
        info!("host closed after {} cycles, {} reported", self.cycles, reported);
        reported
    }
}

// INIT output is best effort: the host may not be listening yet.
fn say_init<H: HostChannel>(host: &mut H, line: &str) {
    if let Err(e) = host.write_line(line) {
        warn!("host write failed during init: {}", e);
    }
}

/// FAULT: log the terminal error and idle until reset. With `exit` set the
/// call returns instead so a host build can terminate.
pub fn halt(err: &DeviceError, exit: bool) {
    error!("fault: {}", err);
    if exit { return; }
    loop { thread::park(); }
}
