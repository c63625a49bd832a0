//! Telemetry contract between the pipeline and whatever records it.
//!
//! The actor builds one [`FrameSample`] per frame and hands it to a
//! [`TelemetrySink`] if the caller supplied one. Nothing the sink does can
//! change the simulation: its errors are logged by the actor and dropped.

use crate::emotion::EMOTION_DIM;
use crate::error::TelemetryError;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;

/// `[ATP, PCr, glycogen, lactate, pyruvate, RPE]`
pub const METABOLIC_DIM: usize = 6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameSample {
    /// Simulated seconds since the actor was built.
    pub timestamp: f64,
    /// [`EmotionProfile::to_vector`](crate::EmotionProfile::to_vector), `EMOTION_DIM` entries.
    pub emotion: Vec<f32>,
    pub metabolism: [f32; METABOLIC_DIM],
    pub muscle_activations: Vec<f32>,
    /// Joint angles, three per joint, see [`quantize_angle`].
    pub pose: Vec<u16>,
}

impl FrameSample {
    pub fn is_well_formed(&self) -> bool {
        self.emotion.len() == EMOTION_DIM && self.pose.len() % 3 == 0
    }
}

/// Receives one sample per frame.
pub trait TelemetrySink {
    fn record(&mut self, sample: FrameSample) -> Result<(), TelemetryError>;

    /// Push any buffered samples downstream. Default: nothing buffered.
    fn flush(&mut self) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl TelemetrySink for NullSink {
    fn record(&mut self, _sample: FrameSample) -> Result<(), TelemetryError> {
        Ok(())
    }
}

/// Collects samples in memory.
impl TelemetrySink for Vec<FrameSample> {
    fn record(&mut self, sample: FrameSample) -> Result<(), TelemetryError> {
        self.push(sample);
        Ok(())
    }
}

/// Map an angle in radians onto the full `u16` range, `-π → 0`, `π → 65535`.
/// Angles outside `[-π, π]` saturate.
pub fn quantize_angle(angle: f32) -> u16 {
    if !angle.is_finite() {
        return u16::MAX / 2;
    }
    let t = ((angle + PI) / (2.0 * PI)).clamp(0.0, 1.0);
    (t * u16::MAX as f32).round() as u16
}

/// Inverse of [`quantize_angle`], up to quantisation error.
pub fn dequantize_angle(q: u16) -> f32 {
    (q as f32 / u16::MAX as f32) * 2.0 * PI - PI
}
