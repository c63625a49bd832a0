//! Nonlinear viscoelastic tendon.
//!
//! Total stress is the sum of a J-shaped elastic response, a strain-stiffened
//! viscous term and five Prony-series memory terms (time constants 0.1 s to
//! 1000 s). Energy dissipated by the viscous term during unloading
//! accumulates into a monotone hysteresis-loss counter.
//!
//! In linear mode (the cheapest accuracy tier) viscosity and the Prony
//! moduli are zero; the elastic curve and the saturation ceiling are kept.

use serde::{Deserialize, Serialize};
use soma_core::math::{clamp_finite, safe_div, EPSILON};

const E_LINEAR: f32 = 1.2e9;
const E_NONLINEAR: f32 = 8.0e10;
const STRAIN_MAX: f32 = 0.08;
/// Pa·s
const VISCOSITY: f32 = 1500.0;
/// Cross-sectional area, m².
const AREA: f32 = 5.0e-5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PronyTerm {
    /// Pa
    pub modulus: f32,
    /// s
    pub tau: f32,
    pub memory: f32,
}

impl PronyTerm {
    const fn new(modulus: f32, tau: f32) -> Self {
        Self {
            modulus,
            tau,
            memory: 0.0,
        }
    }
}

const DEFAULT_TERMS: [PronyTerm; 5] = [
    PronyTerm::new(0.5e9, 0.1),
    PronyTerm::new(0.3e9, 1.0),
    PronyTerm::new(0.2e9, 10.0),
    PronyTerm::new(0.1e9, 100.0),
    PronyTerm::new(0.05e9, 1000.0),
];

#[derive(Debug, Clone)]
pub struct Tendon {
    terms: [PronyTerm; 5],
    e_linear: f32,
    e_nonlinear: f32,
    strain_max: f32,
    viscosity: f32,
    area: f32,
    last_strain: f32,
    hysteresis_loss: f32,
    stress: f32,
    linear: bool,
}

impl Default for Tendon {
    fn default() -> Self {
        Self::new()
    }
}

impl Tendon {
    pub fn new() -> Self {
        Self {
            terms: DEFAULT_TERMS,
            e_linear: E_LINEAR,
            e_nonlinear: E_NONLINEAR,
            strain_max: STRAIN_MAX,
            viscosity: VISCOSITY,
            area: AREA,
            last_strain: 0.0,
            hysteresis_loss: 0.0,
            stress: 0.0,
            linear: false,
        }
    }

    /// Drop viscosity and Prony memory.
    pub fn set_linear_mode(&mut self) {
        for term in &mut self.terms {
            term.modulus = 0.0;
        }
        self.viscosity = 0.0;
        self.linear = true;
    }

    /// Restore viscosity and the Prony moduli. Accumulated memory is kept.
    pub fn set_viscoelastic_mode(&mut self) {
        for (term, default) in self.terms.iter_mut().zip(DEFAULT_TERMS) {
            term.modulus = default.modulus;
        }
        self.viscosity = VISCOSITY;
        self.linear = false;
    }

    pub fn is_linear(&self) -> bool {
        self.linear
    }

    /// Saturation stress, Pa: the quadratic modulus at maximum strain.
    pub fn ceiling(&self) -> f32 {
        self.e_nonlinear * self.strain_max * self.strain_max
    }

    /// Stress from the last step, Pa.
    pub fn stress(&self) -> f32 {
        self.stress
    }

    /// Stress as a fraction of the ceiling, what the Golgi tendon organ sees.
    pub fn normalized_force(&self) -> f32 {
        safe_div(self.stress, self.ceiling())
    }

    pub fn hysteresis_loss(&self) -> f32 {
        self.hysteresis_loss
    }

    pub fn reset_hysteresis(&mut self) {
        self.hysteresis_loss = 0.0;
    }

    pub fn prony_memory(&self) -> [f32; 5] {
        self.terms.map(|t| t.memory)
    }

    /// Strain a series force of `force` newtons produces on the linear modulus.
    pub fn strain_for_force(&self, force: f32) -> f32 {
        safe_div(force, self.e_linear * self.area)
    }

    /// Total stress (Pa) for the given strain history sample.
    pub fn compute_stress(&mut self, strain: f32, strain_rate: f32, dt: f32) -> f32 {
        let strain = clamp_finite(strain, 0.0, -1.0, 1.0);
        let strain_rate = clamp_finite(strain_rate, 0.0, -100.0, 100.0);
        let dt = dt.max(0.0);

        let eps = strain.clamp(0.0, self.strain_max);
        let elastic = self.e_linear * eps + self.e_nonlinear * eps * eps;
        let viscous = self.viscosity * strain_rate * (1.0 + 5.0 * eps);

        let mut history = 0.0;
        for term in &mut self.terms {
            term.memory = term.memory * (-dt / term.tau).exp() + strain * dt;
            history += term.modulus * term.memory / (term.tau + EPSILON);
        }

        // Viscous work counts as lost only while unloading against the rate
        if strain_rate * (strain - self.last_strain) < 0.0 {
            self.hysteresis_loss += (viscous * strain_rate * dt).abs();
        }
        self.last_strain = strain;

        let total = elastic + viscous + history;
        self.stress = clamp_finite(total, 0.0, 0.0, self.ceiling());
        self.stress
    }

    /// Drive the tendon from the muscle force in series with it.
    /// Returns the normalised force.
    pub fn step(&mut self, muscle_force: f32, strain_rate: f32, dt: f32) -> f32 {
        let strain = self.strain_for_force(muscle_force.max(0.0));
        self.compute_stress(strain, strain_rate, dt);
        self.normalized_force()
    }
}
