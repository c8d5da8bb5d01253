//! Boundary to the INT8 inference runtime.

pub mod loader;
pub mod mlp;

pub use loader::{QuantMeta, QuantModel};
pub use mlp::QuantMlp;

use crate::error::EngineStatus;
use crate::quant::QuantParams;

impl EngineStatus {
    pub const ERROR: EngineStatus = EngineStatus { code: 1 };
    pub const ARENA_EXHAUSTED: EngineStatus = EngineStatus { code: 2 };
    pub const NOT_INITIALIZED: EngineStatus = EngineStatus { code: 3 };
}

/// What the driver needs from a runtime: two tensors, their quantization
/// and an invoke. Tensors live in the runtime's arena; the slices borrow it.
pub trait InferenceEngine {
    fn init(&mut self) -> Result<(), EngineStatus>;
    fn arena_used_bytes(&self) -> usize;
    fn input_mut(&mut self) -> &mut [i8];
    fn output(&self) -> &[i8];
    fn input_scale(&self) -> f32;
    fn input_zero_point(&self) -> i32;
    fn output_scale(&self) -> f32;
    fn output_zero_point(&self) -> i32;
    fn invoke(&mut self) -> Result<(), EngineStatus>;

    fn input_params(&self) -> QuantParams { QuantParams::new(self.input_scale(), self.input_zero_point()) }
    fn output_params(&self) -> QuantParams { QuantParams::new(self.output_scale(), self.output_zero_point()) }
}

impl<E: InferenceEngine + ?Sized> InferenceEngine for Box<E> {
    fn init(&mut self) -> Result<(), EngineStatus> { (**self).init() }
    fn arena_used_bytes(&self) -> usize { (**self).arena_used_bytes() }
    fn input_mut(&mut self) -> &mut [i8] { (**self).input_mut() }
    fn output(&self) -> &[i8] { (**self).output() }
    fn input_scale(&self) -> f32 { (**self).input_scale() }
    fn input_zero_point(&self) -> i32 { (**self).input_zero_point() }
    fn output_scale(&self) -> f32 { (**self).output_scale() }
    fn output_zero_point(&self) -> i32 { (**self).output_zero_point() }
    fn invoke(&mut self) -> Result<(), EngineStatus> { (**self).invoke() }
}
