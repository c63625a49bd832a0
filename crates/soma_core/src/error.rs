//! Error types.
//!
//! The simulation step itself never fails. Errors only arise when building an
//! actor from an inconsistent configuration or when a telemetry sink cannot
//! deliver; the latter is logged by the caller and never aborts a frame.

use thiserror::Error;

/// Errors raised while assembling the pipeline.
#[derive(Debug, Error)]
pub enum SomaError {
    /// Configuration that cannot produce a correctly sized actor.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
}

impl SomaError {
    /// Create an invalid configuration error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }
}

/// Errors a telemetry sink may report. Opaque to the physiological core.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The receiving side of the telemetry channel has gone away.
    #[error("Telemetry channel closed")]
    ChannelClosed,

    /// The channel is full; the batch was dropped.
    #[error("Telemetry channel full, dropped {0} samples")]
    Backpressure(usize),

    /// Underlying writer failed.
    #[error("Telemetry I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Sample could not be encoded.
    #[error("Telemetry encode error: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Result type for pipeline assembly.
pub type Result<T> = std::result::Result<T, SomaError>;
