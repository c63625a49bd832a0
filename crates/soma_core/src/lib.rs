//! # Soma Core
//!
//! Shared vocabulary for the physiological pipeline. Every layer crate
//! (limbic, spinal, body, actor) depends on this one and nothing here depends
//! on them.
//!
//! - [`EmotionProfile`]: instantaneous discrete emotions plus persistent mood
//! - [`SomaConfig`]: accuracy tier, feature toggles, budget, anatomy
//! - [`TelemetrySink`]: the injected capability that receives frame samples
//! - [`math`]: clamping and epsilon guards used by every integrator

pub mod config;
pub mod emotion;
pub mod error;
pub mod math;
pub mod telemetry;

pub use config::{
    Accuracy, AnatomyConfig, AppraisalConfig, EmotionChannel, EmotionOverride, FeatureFlags,
    HumanParams, MoodConfig, PerformanceBudget, SomaConfig,
};
pub use emotion::{EmotionProfile, MoodState, PrimaryEmotions, SocialEmotions, EMOTION_DIM};
pub use error::{Result, SomaError, TelemetryError};
pub use telemetry::{
    dequantize_angle, quantize_angle, FrameSample, NullSink, TelemetrySink, METABOLIC_DIM,
};

pub use nalgebra::{UnitQuaternion, Vector3};

/// Three-component vector used for joint angles, velocities and forces.
pub type Vec3 = Vector3<f32>;
