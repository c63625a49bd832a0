//! Cross-bridge muscle model.
//!
//! Each [`HuxleyFiber`] tracks the bound fraction `n(x)` of myosin heads as a
//! function of their strain `x`, on a grid spanning `[0, 50 nm)`. Heads
//! attach at rate `f(x)` (fast near zero strain, scaled by activation) and
//! detach at rate `g(x)` (growing with strain and shortening speed); sliding
//! convects the distribution along `x`.
//!
//! ```text
//! dn/dt = f(x)·(1 − n) − g(x)·n − v·∂n/∂x
//! ```
//!
//! A [`Muscle`] owns an ensemble of identical fibers, steps them in parallel
//! and reports the mean fiber force scaled by its physiological size.
//!
//! # Stability
//!
//! The explicit update is positivity-preserving and monotone while
//! `dt <= stable_dt(v)`, where
//!
//! ```text
//! stable_dt(v) = 1 / (f1 + g1 + g2·x_max/λ + 10·|v| + |v|/dx)
//! ```
//!
//! A muscle splits its frame into as many sub-steps as this bound asks for,
//! up to the accuracy tier's cap, which covers any frame up to 1/30 s. Beyond
//! the cap the clamp keeps `n` in `[0, 1]` but the update is no longer
//! monotone.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use soma_core::math::{clamp_finite, safe_div, sanitize_f32, unit};
use soma_core::Accuracy;

/// Attachment rate at zero strain, 1/s.
const F1: f32 = 200.0;
/// Baseline detachment rate, 1/s.
const G1: f32 = 10.0;
/// Strain-dependent detachment rate, 1/s.
const G2: f32 = 50.0;
/// Characteristic strain, nm.
const LAMBDA: f32 = 10.0;
/// Extra detachment per unit of relative sliding speed, 1/s.
const VELOCITY_DETACH: f32 = 10.0;
/// Extent of the strain grid, nm.
const DOMAIN_NM: f32 = 50.0;
/// Hill-type lengthening correction: amplitude and curvature.
const HILL_A: f32 = 0.5;
const HILL_B: f32 = 0.25;

/// One cross-bridge population on a fixed strain grid.
#[derive(Debug, Clone)]
pub struct HuxleyFiber {
    n: Vec<f32>,
    scratch: Vec<f32>,
    dx: f32,
    /// Σ n·x·dx of the fully activated isometric steady state.
    reference: f32,
    activation: f32,
    force: f32,
}

impl HuxleyFiber {
    /// Fiber with `resolution` nodes on the one-sided strain domain
    /// `x ∈ [0, 50 nm)`; no negative-strain nodes exist.
    pub fn new(resolution: usize) -> Self {
        let g = resolution.max(2);
        let dx = DOMAIN_NM / g as f32;
        Self {
            n: vec![0.0; g],
            scratch: vec![0.0; g],
            dx,
            reference: isometric_reference(g, dx),
            activation: 0.0,
            force: 0.0,
        }
    }

    pub fn resolution(&self) -> usize {
        self.n.len()
    }

    /// Grid spacing, nm.
    pub fn dx(&self) -> f32 {
        self.dx
    }

    /// Bound fraction per node.
    pub fn bound(&self) -> &[f32] {
        &self.n
    }

    /// Activation received on the last step.
    pub fn activation(&self) -> f32 {
        self.activation
    }

    /// Dimensionless force, ≈1 at isometric tetanus.
    pub fn force(&self) -> f32 {
        self.force
    }

    /// Largest step that keeps the update monotone at relative speed `v_rel`.
    pub fn stable_dt(&self, v_rel: f32) -> f32 {
        let v = v_rel.abs();
        1.0 / (F1 + G1 + G2 * DOMAIN_NM / LAMBDA + VELOCITY_DETACH * v + v / self.dx)
    }

    /// Advance by `dt` seconds. `v_rel` is the sliding speed as a fraction of
    /// the muscle's maximum, positive while lengthening.
    pub fn step(&mut self, activation: f32, v_rel: f32, dt: f32) {
        let a = unit(activation);
        let v = clamp_finite(v_rel, 0.0, -1.0, 1.0);
        let dt = dt.max(0.0);
        self.activation = a;

        let Self {
            n, scratch, dx, ..
        } = self;
        let dx = *dx;
        scratch.copy_from_slice(n);
        let prev = &*scratch;
        let last = prev.len() - 1;

        let mut sum = 0.0f32;
        for (i, node) in n.iter_mut().enumerate() {
            let x = i as f32 * dx;
            let ni = prev[i];
            let f = F1 * (-x / LAMBDA).exp() * a;
            let g = G1 + G2 * (x / LAMBDA).max(0.0) + VELOCITY_DETACH * v.abs();
            // First-order upwind on the previous step's grid
            let grad = if v > 0.0 {
                (ni - prev[i.saturating_sub(1)]) / dx
            } else {
                (prev[(i + 1).min(last)] - ni) / dx
            };
            let dn = f * (1.0 - ni) - g * ni - v * grad;
            *node = clamp_finite(ni + dn * dt, 0.0, 0.0, 1.0);
            sum += *node * x * dx;
        }

        let mut force = safe_div(sum, self.reference);
        if v > 0.0 {
            force += HILL_A * a * v / (HILL_B + v);
        }
        self.force = sanitize_f32(force, 0.0);
    }

    /// Move the bound-fraction profile onto a grid of `resolution` nodes by
    /// linear interpolation.
    pub fn resample(&mut self, resolution: usize) {
        let g = resolution.max(2);
        if g == self.n.len() {
            return;
        }
        let new_dx = DOMAIN_NM / g as f32;
        let old = &self.n;
        let last = old.len() - 1;
        let resampled: Vec<f32> = (0..g)
            .map(|j| {
                let s = j as f32 * new_dx / self.dx;
                let i0 = (s.floor() as usize).min(last);
                let i1 = (i0 + 1).min(last);
                let t = (s - i0 as f32).clamp(0.0, 1.0);
                unit(old[i0] + (old[i1] - old[i0]) * t)
            })
            .collect();
        self.n = resampled;
        self.scratch = vec![0.0; g];
        self.dx = new_dx;
        self.reference = isometric_reference(g, new_dx);
    }
}

fn isometric_reference(g: usize, dx: f32) -> f32 {
    (0..g)
        .map(|i| {
            let x = i as f32 * dx;
            let f = F1 * (-x / LAMBDA).exp();
            let gg = G1 + G2 * x / LAMBDA;
            f / (f + gg) * x * dx
        })
        .sum()
}

/// Where a muscle attaches: bone name and fractional position along it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attachment {
    pub bone: String,
    pub position: f32,
}

impl Attachment {
    pub fn new(bone: impl Into<String>, position: f32) -> Self {
        Self {
            bone: bone.into(),
            position: unit(position),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MuscleParams {
    /// rad
    pub pennation: f32,
    /// kg
    pub mass: f32,
    /// m
    pub rest_length: f32,
    /// Peak isometric force per kilogram of muscle, N/kg.
    pub specific_force: f32,
    /// m/s
    pub max_velocity: f32,
    /// m
    pub moment_arm: f32,
    /// Fraction of fast-twitch (type II) fibers. Scales force and speed
    /// around the even mix at 0.5.
    pub fast_fraction: f32,
}

impl Default for MuscleParams {
    fn default() -> Self {
        Self {
            pennation: 0.0,
            mass: 0.3,
            rest_length: 0.3,
            specific_force: 2300.0,
            max_velocity: 1.2,
            moment_arm: 0.04,
            fast_fraction: 0.5,
        }
    }
}

impl MuscleParams {
    #[must_use]
    pub fn with_pennation(mut self, pennation: f32) -> Self {
        self.pennation = pennation.clamp(0.0, std::f32::consts::FRAC_PI_2);
        self
    }

    #[must_use]
    pub fn with_moment_arm(mut self, moment_arm: f32) -> Self {
        self.moment_arm = moment_arm.abs();
        self
    }

    #[must_use]
    pub fn with_fast_fraction(mut self, fast_fraction: f32) -> Self {
        self.fast_fraction = clamp_finite(fast_fraction, 0.5, 0.0, 1.0);
        self
    }

    /// Force at full isometric tetanus, N.
    pub fn max_force(&self) -> f32 {
        let composition = 0.8 + 0.4 * self.fast_fraction;
        self.specific_force * composition * self.mass * self.pennation.cos()
    }

    /// Unloaded shortening speed of the fiber mix, m/s.
    pub fn shortening_velocity(&self) -> f32 {
        self.max_velocity * (0.5 + self.fast_fraction)
    }
}

/// A whole muscle: fiber ensemble plus gross geometry.
#[derive(Debug, Clone)]
pub struct Muscle {
    params: MuscleParams,
    fibers: Vec<HuxleyFiber>,
    accuracy: Accuracy,
    length: f32,
    velocity: f32,
    activation: f32,
    force: f32,
    pub origin: Attachment,
    pub insertion: Attachment,
}

impl Muscle {
    pub fn new(params: MuscleParams, fiber_count: usize, accuracy: Accuracy) -> Self {
        let resolution = accuracy.grid_resolution();
        let length = params.rest_length;
        Self {
            params,
            fibers: (0..fiber_count.max(1))
                .map(|_| HuxleyFiber::new(resolution))
                .collect(),
            accuracy,
            length,
            velocity: 0.0,
            activation: 0.0,
            force: 0.0,
            origin: Attachment::new("", 0.0),
            insertion: Attachment::new("", 1.0),
        }
    }

    #[must_use]
    pub fn with_attachments(mut self, origin: Attachment, insertion: Attachment) -> Self {
        self.origin = origin;
        self.insertion = insertion;
        self
    }

    pub fn params(&self) -> &MuscleParams {
        &self.params
    }

    pub fn fibers(&self) -> &[HuxleyFiber] {
        &self.fibers
    }

    pub fn accuracy(&self) -> Accuracy {
        self.accuracy
    }

    pub fn activation(&self) -> f32 {
        self.activation
    }

    /// N
    pub fn force(&self) -> f32 {
        self.force
    }

    /// Force as a fraction of [`MuscleParams::max_force`].
    pub fn normalized_force(&self) -> f32 {
        safe_div(self.force, self.params.max_force())
    }

    /// m/s, positive while lengthening.
    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    /// Number of fiber sub-steps a frame of `dt` seconds will use.
    pub fn substeps_for(&self, dt: f32) -> usize {
        let v_rel = self.relative_velocity(self.velocity);
        let stable = self.fibers[0].stable_dt(v_rel);
        let wanted = (dt.max(0.0) / stable).ceil() as usize;
        wanted.clamp(1, self.accuracy.substep_cap())
    }

    fn relative_velocity(&self, velocity: f32) -> f32 {
        safe_div(velocity, self.params.shortening_velocity()).clamp(-1.0, 1.0)
    }

    /// Advance one frame.
    ///
    /// `velocity` is the muscle's lengthening speed (m/s) from the previous
    /// frame's joint motion. When `throttled`, every fourth fiber (index
    /// `0, 4, 8, ...`) receives half the activation.
    pub fn step(&mut self, activation: f32, velocity: f32, dt: f32, throttled: bool) {
        let a = unit(activation);
        let dt = dt.max(0.0);
        self.activation = a;
        self.velocity = clamp_finite(velocity, 0.0, -10.0, 10.0);
        let rest = self.params.rest_length;
        self.length = clamp_finite(self.length + self.velocity * dt, rest, 0.5 * rest, 1.5 * rest);

        let v_rel = self.relative_velocity(self.velocity);
        let substeps = self.substeps_for(dt);
        let sub_dt = dt / substeps as f32;

        self.fibers
            .par_iter_mut()
            .enumerate()
            .for_each(|(j, fiber)| {
                let a_j = if throttled && j % 4 == 0 { 0.5 * a } else { a };
                for _ in 0..substeps {
                    fiber.step(a_j, v_rel, sub_dt);
                }
            });

        // Sequential reduction keeps the sum independent of scheduling
        let sum: f32 = self.fibers.iter().map(HuxleyFiber::force).sum();
        let mean = sum / self.fibers.len() as f32;
        self.force = sanitize_f32(mean * self.params.max_force(), 0.0).max(0.0);
    }

    /// Rebuild every fiber at the grid resolution of `accuracy`, carrying the
    /// bound-fraction profiles across.
    pub fn rebuild_at_resolution(&mut self, accuracy: Accuracy) {
        if accuracy == self.accuracy {
            return;
        }
        let resolution = accuracy.grid_resolution();
        self.fibers
            .par_iter_mut()
            .for_each(|fiber| fiber.resample(resolution));
        self.accuracy = accuracy;
    }
}
