//! # Soma Limbic Layer
//!
//! The emotional front end of the pipeline. Runs first in every frame:
//!
//! 1. Each [`Stimulus`] is appraised into an instantaneous [`EmotionProfile`]
//!    (primary appraisal by category, secondary appraisal of coping potential,
//!    mood amplification, goal-relevance gate). Several stimuli in one frame
//!    combine by component-wise maximum.
//! 2. [`MoodDynamics`] integrates the instantaneous emotion into two slow
//!    accumulators (stress, depression) that outlive the frame and bias the
//!    next frame's appraisal and spinal gain.
//!
//! ## Time Scales
//!
//! - Appraisal: instantaneous, rebuilt every frame
//! - Stress: half-life of one hour
//! - Depression: half-life of one day
//!
//! [`EmotionProfile`]: soma_core::EmotionProfile

mod appraisal;
mod mood;

pub use appraisal::{AppraisalOutput, CognitiveAppraiser, Stimulus, StimulusKind};
pub use mood::MoodDynamics;
