//! Articulated skeleton of 3-DOF ball joints.
//!
//! Per joint and axis the net torque is
//!
//! ```text
//! τ = τ_muscle − k·(θ − θ_rest) − 500·violation³ − c·ω + (r × F) + τ_friction
//! ```
//!
//! integrated with semi-implicit Euler and a small velocity decay. Angles are
//! clamped to the joint limits after every step, with any outward velocity
//! removed at the stop. Joints do not interact, so they integrate in parallel.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use soma_core::math::{clamp_finite, safe_div, sanitize_f32};
use soma_core::Vec3;

/// Cubic stiffness beyond the range-of-motion limits, N·m/rad³.
const LIMIT_STIFFNESS: f32 = 500.0;
/// Below this angular speed (rad/s) friction is static.
const STICTION_SPEED: f32 = 0.01;
/// Per-step velocity retention.
const VELOCITY_DECAY: f32 = 0.999;
/// Segment mass used for the gravity load in inverse dynamics, kg.
const SEGMENT_MASS: f32 = 10.0;
const GRAVITY: f32 = 9.81;
/// Largest angular speed kept after integration, rad/s.
const MAX_SPEED: f32 = 100.0;

pub const SPINE: usize = 0;
pub const SHOULDER: usize = 1;

/// Passive properties of the joint capsule and ligaments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capsule {
    pub damping: f32,
    pub stiffness: f32,
    pub friction: f32,
    pub rest_angle: Vec3,
    pub limit_min: Vec3,
    pub limit_max: Vec3,
}

impl Default for Capsule {
    fn default() -> Self {
        Self {
            damping: 2.5,
            stiffness: 100.0,
            friction: 1.0,
            rest_angle: Vec3::zeros(),
            limit_min: Vec3::new(-2.8, -1.5, -0.8),
            limit_max: Vec3::new(2.8, 1.5, 0.8),
        }
    }
}

impl Capsule {
    pub fn spine() -> Self {
        Self {
            stiffness: 150.0,
            ..Self::default()
        }
    }

    pub fn shoulder() -> Self {
        Self {
            limit_min: Vec3::new(-2.0, -1.0, -0.5),
            limit_max: Vec3::new(0.5, 1.0, 0.5),
            ..Self::default()
        }
    }

    /// Elastic plus viscous torque at the given state.
    pub fn passive_torque(&self, angle: &Vec3, velocity: &Vec3) -> Vec3 {
        let mut out = Vec3::zeros();
        for i in 0..3 {
            let delta = angle[i] - self.rest_angle[i];
            let mut elastic = -self.stiffness * delta;
            let violation = if angle[i] < self.limit_min[i] {
                angle[i] - self.limit_min[i]
            } else if angle[i] > self.limit_max[i] {
                angle[i] - self.limit_max[i]
            } else {
                0.0
            };
            elastic -= LIMIT_STIFFNESS * violation * violation * violation;
            out[i] = elastic - self.damping * velocity[i];
        }
        out
    }
}

/// Torque of force `force` applied at lever `(lever_arm, 0, 0)`.
pub fn lever_torque(force: &Vec3, lever_arm: f32) -> Vec3 {
    Vec3::new(lever_arm, 0.0, 0.0).cross(force)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BallJoint {
    angle: Vec3,
    velocity: Vec3,
    torque: Vec3,
    pub capsule: Capsule,
}

impl BallJoint {
    pub fn new(capsule: Capsule) -> Self {
        Self {
            angle: capsule.rest_angle,
            capsule,
            ..Self::default()
        }
    }

    pub fn angle(&self) -> &Vec3 {
        &self.angle
    }

    pub fn velocity(&self) -> &Vec3 {
        &self.velocity
    }

    pub fn torque(&self) -> &Vec3 {
        &self.torque
    }

    /// Place the joint, clamped to its limits, at rest velocity.
    pub fn set_angle(&mut self, angle: Vec3) {
        for i in 0..3 {
            self.angle[i] = clamp_finite(
                angle[i],
                self.capsule.rest_angle[i],
                self.capsule.limit_min[i],
                self.capsule.limit_max[i],
            );
        }
        self.velocity = Vec3::zeros();
    }

    /// Sum every torque acting on the joint into `self.torque`.
    pub fn compute_torque(&mut self, muscle_torque: &Vec3, external_force: &Vec3, lever_arm: f32) {
        let passive = self.capsule.passive_torque(&self.angle, &self.velocity);
        let external = lever_torque(external_force, lever_arm);
        let applied = muscle_torque + passive + external;

        let mut friction = Vec3::zeros();
        let limit = self.capsule.friction;
        for i in 0..3 {
            friction[i] = if self.velocity[i].abs() < STICTION_SPEED {
                -applied[i].clamp(-limit, limit)
            } else {
                -limit * self.velocity[i].signum()
            };
        }
        self.torque = applied + friction;
    }

    pub fn forward_dynamics(&mut self, inertia: f32, dt: f32) {
        let inertia = inertia.max(soma_core::math::EPSILON);
        for i in 0..3 {
            let acc = safe_div(self.torque[i], inertia);
            let mut w = (self.velocity[i] + acc * dt) * VELOCITY_DECAY;
            w = clamp_finite(w, 0.0, -MAX_SPEED, MAX_SPEED);
            let lo = self.capsule.limit_min[i];
            let hi = self.capsule.limit_max[i];
            let mut theta = sanitize_f32(self.angle[i] + w * dt, self.capsule.rest_angle[i]);
            if theta <= lo {
                theta = lo;
                w = w.max(0.0);
            } else if theta >= hi {
                theta = hi;
                w = w.min(0.0);
            }
            self.angle[i] = theta;
            self.velocity[i] = w;
        }
    }
}

#[derive(Debug, Clone)]
pub struct ArticulatedSkeleton {
    joints: Vec<BallJoint>,
    inertia: Vec<f32>,
    external_forces: Vec<Vec3>,
    lever_arm: f32,
}

impl ArticulatedSkeleton {
    /// Default human layout: spine stiffer, shoulder with an asymmetric range.
    pub fn new(joint_count: usize) -> Self {
        let joints = (0..joint_count)
            .map(|i| match i {
                SPINE => BallJoint::new(Capsule::spine()),
                SHOULDER => BallJoint::new(Capsule::shoulder()),
                _ => BallJoint::new(Capsule::default()),
            })
            .collect();
        Self {
            joints,
            inertia: vec![1.0; joint_count],
            external_forces: vec![Vec3::zeros(); joint_count],
            lever_arm: 0.1,
        }
    }

    pub fn len(&self) -> usize {
        self.joints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    pub fn joints(&self) -> &[BallJoint] {
        &self.joints
    }

    pub fn joint_mut(&mut self, index: usize) -> Option<&mut BallJoint> {
        self.joints.get_mut(index)
    }

    pub fn lever_arm(&self) -> f32 {
        self.lever_arm
    }

    pub fn set_external_force(&mut self, joint: usize, force: Vec3) {
        if let Some(slot) = self.external_forces.get_mut(joint) {
            *slot = force;
        }
    }

    pub fn set_inertia(&mut self, joint: usize, inertia: f32) {
        if let Some(slot) = self.inertia.get_mut(joint) {
            *slot = inertia.max(soma_core::math::EPSILON);
        }
    }

    /// Integrate every joint under the given muscle torques (one per joint).
    /// Returns `false` and leaves the skeleton untouched on a length mismatch.
    pub fn step(&mut self, muscle_torques: &[Vec3], dt: f32) -> bool {
        if muscle_torques.len() != self.joints.len() {
            tracing::debug!(
                "Skeleton step skipped: {} torques for {} joints",
                muscle_torques.len(),
                self.joints.len()
            );
            return false;
        }
        let dt = dt.max(0.0);
        let lever_arm = self.lever_arm;
        self.joints
            .par_iter_mut()
            .zip(self.inertia.par_iter())
            .zip(self.external_forces.par_iter())
            .zip(muscle_torques.par_iter())
            .for_each(|(((joint, &inertia), force), torque)| {
                joint.compute_torque(torque, force, lever_arm);
                joint.forward_dynamics(inertia, dt);
            });
        true
    }

    pub fn joint_angles(&self) -> Vec<Vec3> {
        self.joints.iter().map(|j| *j.angle()).collect()
    }

    pub fn joint_velocities(&self) -> Vec<Vec3> {
        self.joints.iter().map(|j| *j.velocity()).collect()
    }

    /// Antagonist muscle forces that hold each joint at the desired state
    /// against gravity, the given external forces and the passive capsule.
    /// Two entries per joint: `[2i]` flexor, `[2i + 1]` extensor, both ≥ 0.
    /// Joints beyond the shortest input slice get zero.
    pub fn inverse_dynamics(
        &self,
        angles: &[Vec3],
        velocities: &[Vec3],
        external_forces: &[Vec3],
    ) -> Vec<f32> {
        let l = self.lever_arm;
        let gravity = Vec3::new(0.0, -GRAVITY * SEGMENT_MASS, 0.0);
        let n = self
            .joints
            .len()
            .min(angles.len())
            .min(velocities.len())
            .min(external_forces.len());

        let mut out = vec![0.0; self.joints.len() * 2];
        out.par_chunks_mut(2)
            .take(n)
            .enumerate()
            .for_each(|(i, pair)| {
                let load = lever_torque(&(gravity + external_forces[i]), l);
                let passive = self.joints[i]
                    .capsule
                    .passive_torque(&angles[i], &velocities[i]);
                let required = -(load + passive);
                pair[0] = safe_div(required.z, l).max(0.0);
                pair[1] = safe_div(-required.z, l).max(0.0);
            });
        out
    }
}
