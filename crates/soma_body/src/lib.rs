//! # Soma Body Layer
//!
//! The physical half of the pipeline, downstream of the spinal cord:
//!
//! - [`muscle`]: Huxley cross-bridge fibers aggregated into whole muscles
//! - [`tendon`]: nonlinear viscoelastic series element with Prony memory
//! - [`metabolism`]: ATP / PCr / glycogen / lactate energetics, fatigue, RPE
//! - [`skeleton`]: ball joints under semi-implicit Euler, inverse dynamics
//!
//! Every integrator here clamps its state after each update and sanitises
//! non-finite values back to rest. None of them can fail.

pub mod metabolism;
pub mod muscle;
pub mod skeleton;
pub mod tendon;

pub use metabolism::MetabolicSystem;
pub use muscle::{Attachment, HuxleyFiber, Muscle, MuscleParams};
pub use skeleton::{ArticulatedSkeleton, BallJoint, Capsule};
pub use tendon::{PronyTerm, Tendon};
