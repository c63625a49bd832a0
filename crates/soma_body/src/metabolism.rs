//! Muscle energetics: ATP, phosphocreatine, glycogen, lactate, pyruvate.
//!
//! All concentrations are normalised. ATP is buffered by PCr through
//! creatine kinase, glycolysis runs on glycogen in proportion to activation
//! and is inhibited by acidosis, and oxidative metabolism ramps in over the
//! first 30 s of continuous exercise.
//!
//! Fatigue combines the ATP/PCr energy deficit with acidosis above the
//! lactate threshold. Perceived exertion maps it onto the Borg
//! 6–20 scale.

use serde::{Deserialize, Serialize};
use soma_core::math::{clamp_finite, sigmoid, smoothstep, unit};

const K_ATPASE: f32 = 0.05;
const K_CK: f32 = 2.5;
const K_PCR_RECOVERY: f32 = 0.25;
const K_GLYCOLYSIS: f32 = 0.03;
const K_OXIDATIVE: f32 = 0.02;
const K_LACTATE_CLEARANCE: f32 = 0.01;
const GLYCOGEN_PER_GLYCOLYSIS: f32 = 0.1;
const GLYCOGEN_RESYNTHESIS: f32 = 0.005;
const LACTATE_THRESHOLD: f32 = 0.4;
/// Activation below which the muscle counts as resting.
const REST_ACTIVATION: f32 = 0.05;
/// Seconds for oxidative metabolism to come fully online.
const OXIDATIVE_RAMP: f32 = 30.0;

const PCR_FLOOR: f32 = 0.3;
const PYRUVATE_CEILING: f32 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetabolicSystem {
    atp: f32,
    pcr: f32,
    glycogen: f32,
    lactate: f32,
    pyruvate: f32,
    exercise_time: f32,
}

impl Default for MetabolicSystem {
    fn default() -> Self {
        Self {
            atp: 1.0,
            pcr: 1.0,
            glycogen: 1.0,
            lactate: 0.0,
            pyruvate: 0.0,
            exercise_time: 0.0,
        }
    }
}

impl MetabolicSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn atp(&self) -> f32 {
        self.atp
    }

    pub fn pcr(&self) -> f32 {
        self.pcr
    }

    pub fn glycogen(&self) -> f32 {
        self.glycogen
    }

    pub fn lactate(&self) -> f32 {
        self.lactate
    }

    pub fn pyruvate(&self) -> f32 {
        self.pyruvate
    }

    /// Seconds of uninterrupted activity.
    pub fn exercise_time(&self) -> f32 {
        self.exercise_time
    }

    /// Integrate one step of `dt` seconds at mean muscle activation `activation`.
    pub fn update(&mut self, activation: f32, dt: f32) {
        let a = unit(activation);
        let dt = clamp_finite(dt, 0.0, 0.0, f32::MAX);

        if a > REST_ACTIVATION {
            self.exercise_time += dt;
        } else {
            self.exercise_time = 0.0;
        }

        let atpase = K_ATPASE * a;
        let ck = K_CK * self.pcr * (1.0 - self.atp);
        let pcr_recovery = K_PCR_RECOVERY * (1.0 - self.pcr);

        // Proton load inhibits phosphofructokinase
        let h = 0.1 * self.lactate;
        let inhibition = sigmoid((0.05 - h) / 0.01);
        let glycolysis = K_GLYCOLYSIS * self.glycogen * a * inhibition;

        let oxidative =
            K_OXIDATIVE * smoothstep(self.exercise_time, 0.0, OXIDATIVE_RAMP) * self.pyruvate;

        let lactate_production = 0.5 * glycolysis;
        let lactate_clearance = K_LACTATE_CLEARANCE * self.lactate / (1.0 + self.lactate);
        let pyruvate_in = 0.5 * glycolysis - 0.7 * oxidative;
        let pyruvate_out = 0.7 * oxidative;

        let glycogen_use = GLYCOGEN_PER_GLYCOLYSIS * glycolysis;
        let glycogen_resynthesis = GLYCOGEN_RESYNTHESIS * (1.0 - a);

        self.atp += dt * (ck - atpase);
        self.pcr += dt * (pcr_recovery - ck);
        self.glycogen += dt * (glycogen_resynthesis - glycogen_use);
        self.lactate += dt * (lactate_production - lactate_clearance);
        self.pyruvate += dt * (pyruvate_in - pyruvate_out);

        self.atp = clamp_finite(self.atp, 1.0, 0.0, 1.0);
        self.pcr = clamp_finite(self.pcr, 1.0, PCR_FLOOR, 1.0);
        self.glycogen = clamp_finite(self.glycogen, 1.0, 0.0, 1.0);
        self.lactate = clamp_finite(self.lactate, 0.0, 0.0, 1.0);
        self.pyruvate = clamp_finite(self.pyruvate, 0.0, 0.0, PYRUVATE_CEILING);
    }

    /// 0 at rest, 1 at exhaustion.
    pub fn fatigue(&self) -> f32 {
        let energy_deficit = 0.4 * (1.0 - self.atp) + 0.4 * (1.0 - self.pcr);
        let acidosis = 1.5 * (self.lactate - LACTATE_THRESHOLD).max(0.0);
        unit(energy_deficit + acidosis)
    }

    /// Borg rating of perceived exertion, 6–20.
    pub fn perceived_exertion(&self) -> f32 {
        6.0 + 14.0 * self.fatigue()
    }

    /// Seconds until PCr and lactate are both back to baseline.
    pub fn recovery_estimate(&self) -> f32 {
        let pcr = (1.0 - self.pcr) / K_PCR_RECOVERY;
        let lactate = self.lactate / K_LACTATE_CLEARANCE;
        pcr.max(lactate)
    }

    /// `[ATP, PCr, glycogen, lactate, pyruvate, RPE]`
    pub fn state_vector(&self) -> [f32; 6] {
        [
            self.atp,
            self.pcr,
            self.glycogen,
            self.lactate,
            self.pyruvate,
            self.perceived_exertion(),
        ]
    }
}
