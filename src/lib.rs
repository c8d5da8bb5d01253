// INT8 MNIST classifier driver: serial ingest -> quantize -> invoke -> report,
// with the sample mirrored on a 1-bit OLED.
pub mod config;
pub mod controller;
pub mod display;
pub mod driver;
pub mod engine;
pub mod error;
pub mod host;
pub mod ingest;
pub mod quant;
pub mod sample;

pub use config::DeviceConfig;
pub use controller::{halt, CycleOutcome, Device, State};
pub use display::{DisplayAdapter, EmulatorOled, Framebuffer, Oled, OledConfig};
pub use driver::{EngineInfo, InferenceDriver};
pub use engine::{InferenceEngine, QuantMlp, QuantModel};
pub use error::{DeviceError, EngineStatus, ReadFault};
pub use host::{HostChannel, HostRead, LineChannel, TimedReader};
pub use ingest::{parse_sample, IngestReport, SampleIngest};
pub use quant::{argmax_i8, dequantize, quantize, QuantParams};
pub use sample::{format_report, Classification, RawSample, Scores};
