use std::io;
use thiserror::Error;
use crate::config::MNIST_SIZE;

/// Why a host read produced no line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReadFault {
    #[error("host channel closed")]
    Closed,
    #[error("i/o error: {0:?}")]
    Io(io::ErrorKind),
}

/// Non-zero status code returned by the inference runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("runtime status {code}")]
pub struct EngineStatus {
    pub code: i32,
}

impl EngineStatus {
    pub fn new(code: i32) -> Self { Self { code } }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceError {
    #[error("init failure in {stage}: code {code}")]
    InitFailure { stage: &'static str, code: i32 },
    #[error("tensor {tensor} holds {actual} bytes, need at least {required}")]
    TensorShapeMismatch { tensor: &'static str, required: usize, actual: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("host read failed: {0}")]
    ReadFailure(ReadFault),
    #[error("host read timed out")]
    Timeout,
    #[error("input line exceeds {limit} bytes")]
    Overflow { limit: usize },
    #[error("incomplete sample: {count} of {} values", MNIST_SIZE)]
    IncompleteSample { count: usize },
    #[error("framing error at element {index}")]
    FramingError { index: usize },
    #[error("invoke failed with code {code}")]
    InvokeFailure { code: i32 },
    #[error("display transfer failed: {0}")]
    Display(String),
}

impl DeviceError {
    /// Terminal errors leave the device in FAULT until reset.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            DeviceError::InitFailure { .. }
                | DeviceError::TensorShapeMismatch { .. }
                | DeviceError::InvalidConfig(_)
        )
    }

    /// Raised while reading or parsing a sample, before anything was drawn.
    pub fn is_ingest(&self) -> bool {
        matches!(
            self,
            DeviceError::ReadFailure(_)
                | DeviceError::Timeout
                | DeviceError::Overflow { .. }
                | DeviceError::IncompleteSample { .. }
                | DeviceError::FramingError { .. }
        )
    }

    /// Diagnostic line sent to the host for this error.
    pub fn host_message(&self) -> String {
        match self {
            DeviceError::InitFailure { stage, code } => format!("Erro {}: {}", stage, code),
            DeviceError::TensorShapeMismatch { tensor, required, actual } => {
                format!("Tensor {} com {} bytes (minimo {})", tensor, actual, required)
            }
            DeviceError::InvalidConfig(msg) => format!("Configuração inválida: {}", msg),
            DeviceError::ReadFailure(_) => "Erro ao ler da serial".to_string(),
            DeviceError::Timeout => "Tempo esgotado aguardando a amostra".to_string(),
            DeviceError::Overflow { limit } => format!("Linha excede {} bytes, descartada", limit),
            DeviceError::IncompleteSample { count } => format!("Amostra incompleta ({} / {})", count, MNIST_SIZE),
            DeviceError::FramingError { index } => format!("Erro de parsing no elemento {}", index),
            DeviceError::InvokeFailure { code } => format!("Erro invoke: {}", code),
            DeviceError::Display(msg) => format!("Erro no display: {}", msg),
        }
    }
}

pub type DeviceResult<T> = Result<T, DeviceError>;
