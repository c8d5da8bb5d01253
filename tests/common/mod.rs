#![allow(dead_code)]
use mnist_edge::{EmulatorOled, EngineStatus, InferenceEngine, LineChannel};
use std::io::Cursor;

/// Scripted runtime: fixed output vector, injectable failures.
pub struct StubEngine {
    pub input: Vec<i8>,
    pub output: Vec<i8>,
    pub in_scale: f32,
    pub in_zp: i32,
    pub out_scale: f32,
    pub out_zp: i32,
    pub init_status: Option<i32>,
    pub invoke_status: Option<i32>,
    pub invokes: usize,
}

impl StubEngine {
    pub fn new() -> Self {
        let mut output = vec![-128i8; 10];
        output[3] = 100;
        output[8] = 20;
        Self {
            input: vec![0; 784],
            output,
            in_scale: 1.0 / 255.0,
            in_zp: -128,
            out_scale: 1.0 / 256.0,
            out_zp: -128,
            init_status: None,
            invoke_status: None,
            invokes: 0,
        }
    }
}

impl InferenceEngine for StubEngine {
    fn init(&mut self) -> Result<(), EngineStatus> {
        match self.init_status { Some(code) => Err(EngineStatus::new(code)), None => Ok(()) }
    }
    fn arena_used_bytes(&self) -> usize { 4096 }
    fn input_mut(&mut self) -> &mut [i8] { &mut self.input }
    fn output(&self) -> &[i8] { &self.output }
    fn input_scale(&self) -> f32 { self.in_scale }
    fn input_zero_point(&self) -> i32 { self.in_zp }
    fn output_scale(&self) -> f32 { self.out_scale }
    fn output_zero_point(&self) -> i32 { self.out_zp }
    fn invoke(&mut self) -> Result<(), EngineStatus> {
        self.invokes += 1;
        match self.invoke_status { Some(code) => Err(EngineStatus::new(code)), None => Ok(()) }
    }
}

pub type TestHost = LineChannel<Cursor<Vec<u8>>, Vec<u8>>;
pub type TestDevice = mnist_edge::Device<StubEngine, EmulatorOled, TestHost>;

pub fn host(input: &str) -> TestHost {
    LineChannel::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
}

pub fn zeros_line() -> String {
    vec!["0"; 784].join(" ")
}

pub fn transcript(dev: &TestDevice) -> String {
    String::from_utf8_lossy(dev.host().writer()).into_owned()
}
