//! # Soma Actor
//!
//! Ties the layer crates into one body that the host steps once per
//! animation frame.
//!
//! ```text
//! stimuli ──► appraisal ──► mood ─┐
//!                                 ▼
//! desired torques ──► spinal cord ──► overrides ──► muscles ──► tendons
//!                                                      │
//!                      metabolism ◄────────────────────┤
//!                                                      ▼
//!                                   pose ◄── skeleton ◄┘
//! ```
//!
//! - [`PhysiologicalActor`]: owns every layer and runs the fixed frame order
//! - [`LoadGovernor`]: prospective throttling and tier changes under load
//! - [`pose`]: stateless adapters to a caller-owned pose buffer
//! - [`BufferedRecorder`]: batching telemetry sink over a tokio channel

pub mod actor;
pub mod governor;
pub mod pose;
pub mod recorder;

pub use actor::{FrameInput, FrameOutput, PhysiologicalActor, METABOLIC_INTERVAL};
pub use governor::{LoadGovernor, TierChange};
pub use recorder::{BufferedRecorder, SampleBatch, BATCH_SIZE};

// Host-side vocabulary, so callers need only this crate
pub use soma_core::{FrameSample, SomaConfig, TelemetrySink};
pub use soma_limbic::{Stimulus, StimulusKind};
