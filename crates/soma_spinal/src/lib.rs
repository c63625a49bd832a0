//! # Soma Spinal Layer
//!
//! Turns a desired joint torque into antagonist motor commands the way a
//! spinal segment does: central drive recruits motor neurons by size, stretch
//! (spindle) feedback adds drive, tendon (Ib) feedback and Renshaw recurrent
//! inhibition subtract it.
//!
//! - [`MotorNeuronPool`]: size-principle recruitment, refractory period,
//!   per-neuron fatigue
//! - [`SpinalSegment`]: a flexor pool and an extensor pool driving one joint
//! - [`SpinalCord`]: all segments, stepped in parallel
//!
//! Fear raises the stretch-reflex gain (gamma bias). The gain is stored on
//! the segment and takes effect on the next step.

mod cord;
mod pool;
mod segment;

pub use cord::SpinalCord;
pub use pool::{MotorNeuron, MotorNeuronPool};
pub use segment::{SegmentFeedback, SpinalSegment};

/// Firing rate treated as full activation when mapping onto muscles.
pub const FULL_ACTIVATION_HZ: f32 = 50.0;
