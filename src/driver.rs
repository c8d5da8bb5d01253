//! Inference driver: quantize the sample into the runtime's input tensor,
//! invoke, and read back class scores.

use log::{debug, info};
use crate::config::{MNIST_SIZE, NUM_CLASSES};
use crate::engine::InferenceEngine;
use crate::error::DeviceError;
use crate::quant::{argmax_i8, QuantParams};
use crate::sample::{Classification, RawSample, Scores};

/// Startup facts worth reporting to the host.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineInfo {
    pub arena_used: usize,
    pub input_bytes: usize,
    pub output_bytes: usize,
    pub input: QuantParams,
    pub output: QuantParams,
}

impl EngineInfo {
    pub fn host_lines(&self) -> [String; 3] {
        [
            format!("Arena usada: {} bytes", self.arena_used),
            format!("IN : scale={:.6} zp={}", self.input.scale, self.input.zero_point),
            format!("OUT: scale={:.6} zp={}", self.output.scale, self.output.zero_point),
        ]
    }
}

pub struct InferenceDriver<E> {
    engine: E,
    info: EngineInfo,
}

impl<E: InferenceEngine> InferenceDriver<E> {
    /// Initialize the runtime and check its tensors can carry one sample.
    /// Every error here is terminal.
    pub fn start(mut engine: E) -> Result<Self, DeviceError> {
        engine.init().map_err(|s| DeviceError::InitFailure { stage: "tflm_init", code: s.code })?;
        let input_bytes = engine.input_mut().len();
        let output_bytes = engine.output().len();
        if input_bytes < MNIST_SIZE {
            return Err(DeviceError::TensorShapeMismatch { tensor: "input", required: MNIST_SIZE, actual: input_bytes });
        }
        if output_bytes < NUM_CLASSES {
            return Err(DeviceError::TensorShapeMismatch { tensor: "output", required: NUM_CLASSES, actual: output_bytes });
        }
        let input = engine.input_params();
        let output = engine.output_params();
        input.validate("input")?;
        output.validate("output")?;
        let info = EngineInfo { arena_used: engine.arena_used_bytes(), input_bytes, output_bytes, input, output };
        info!(
            "runtime ready: arena {} bytes, in {}B s={} z={}, out {}B s={} z={}",
            info.arena_used, input_bytes, input.scale, input.zero_point, output_bytes, output.scale, output.zero_point
        );
        Ok(Self { engine, info })
    }

    pub fn info(&self) -> &EngineInfo { &self.info }

    pub fn engine(&self) -> &E { &self.engine }

    pub fn engine_mut(&mut self) -> &mut E { &mut self.engine }

    /// Normalize to [0, 1] and quantize every pixel into the input tensor.
    pub fn load_input(&mut self, sample: &RawSample) {
        let p = self.info.input;
        let input = self.engine.input_mut();
        for (dst, &px) in input.iter_mut().zip(sample.as_bytes().iter()) {
            *dst = p.quantize(px as f32 / 255.0);
        }
    }

    pub fn read_output(&self) -> Classification {
        let out = &self.engine.output()[..NUM_CLASSES];
        let p = self.info.output;
        let mut scores = [0f32; NUM_CLASSES];
        for (s, &q) in scores.iter_mut().zip(out.iter()) {
            *s = p.dequantize(q);
        }
        // dequantize is monotonic for scale > 0, so argmax on raw bytes agrees
        Classification { prediction: argmax_i8(out), scores: Scores(scores) }
    }

    pub fn infer(&mut self, sample: &RawSample) -> Result<Classification, DeviceError> {
        self.load_input(sample);
        self.engine.invoke().map_err(|s| DeviceError::InvokeFailure { code: s.code })?;
        let c = self.read_output();
        debug!("prediction {} (raw {:?})", c.prediction, &self.engine.output()[..NUM_CLASSES]);
        Ok(c)
    }
}
