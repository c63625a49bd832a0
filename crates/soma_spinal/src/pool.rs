use serde::{Deserialize, Serialize};
use soma_core::math::{clamp_finite, unit};

/// Rate gain per unit of suprathreshold drive, Hz.
const RATE_GAIN: f32 = 50.0;
const MAX_RATE: f32 = 200.0;
/// Fatigue gained per spike-second.
const FATIGUE_PER_SPIKE: f32 = 1e-4;
/// Fatigue recovered per second of silence.
const FATIGUE_RECOVERY: f32 = 0.01;
/// After-hyperpolarisation following a discharge, seconds.
const REFRACTORY: f32 = 0.2;
const IB_THRESHOLD: f32 = 0.8;
const IB_GAIN: f32 = 2.0;

const SPINDLE_WEIGHT: f32 = 0.3;
const IB_WEIGHT: f32 = 0.5;
const RENSHAW_WEIGHT: f32 = 0.2;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct MotorNeuron {
    /// Hz
    pub firing_rate: f32,
    /// Static, in `[0, 1)`, increasing with index.
    pub recruitment_threshold: f32,
    pub fatigue: f32,
    /// Seconds left in the refractory period.
    pub refractory: f32,
}

/// Alpha motor neuron pool recruited by the size principle.
#[derive(Debug, Clone)]
pub struct MotorNeuronPool {
    neurons: Vec<MotorNeuron>,
    central_drive: f32,
    spindle_feedback: f32,
    tendon_force: f32,
    ib_inhibition: f32,
    renshaw_inhibition: f32,
}

impl MotorNeuronPool {
    pub fn new(size: usize) -> Self {
        let n = size.max(1);
        let neurons = (0..n)
            .map(|i| MotorNeuron {
                recruitment_threshold: (i as f32 / n as f32).powf(1.5),
                ..MotorNeuron::default()
            })
            .collect();
        Self {
            neurons,
            central_drive: 0.0,
            spindle_feedback: 0.0,
            tendon_force: 0.0,
            ib_inhibition: 0.0,
            renshaw_inhibition: 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.neurons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.neurons.is_empty()
    }

    pub fn neurons(&self) -> &[MotorNeuron] {
        &self.neurons
    }

    pub fn set_central_drive(&mut self, drive: f32) {
        self.central_drive = unit(drive);
    }

    pub fn set_spindle_feedback(&mut self, feedback: f32) {
        self.spindle_feedback = clamp_finite(feedback, 0.0, -1e4, 1e4);
    }

    pub fn spindle_feedback(&self) -> f32 {
        self.spindle_feedback
    }

    /// Normalised tendon force seen by the Golgi tendon organs.
    pub fn set_tendon_force(&mut self, force: f32) {
        self.tendon_force = clamp_finite(force, 0.0, 0.0, 10.0);
    }

    pub fn update_ib_inhibition(&mut self) {
        self.ib_inhibition = if self.tendon_force > IB_THRESHOLD {
            IB_GAIN * (self.tendon_force - IB_THRESHOLD)
        } else {
            0.0
        };
    }

    pub fn ib_inhibition(&self) -> f32 {
        self.ib_inhibition
    }

    pub fn reset_renshaw(&mut self) {
        self.renshaw_inhibition = 0.0;
    }

    pub fn add_renshaw_inhibition(&mut self, inhibition: f32) {
        self.renshaw_inhibition += inhibition.max(0.0);
    }

    pub fn renshaw_inhibition(&self) -> f32 {
        self.renshaw_inhibition
    }

    /// Central drive plus weighted feedback, clamped to `[0, 1]`.
    pub fn net_drive(&self) -> f32 {
        unit(
            self.central_drive + SPINDLE_WEIGHT * self.spindle_feedback
                - IB_WEIGHT * self.ib_inhibition
                - RENSHAW_WEIGHT * self.renshaw_inhibition,
        )
    }

    pub fn step(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        let total = self.net_drive();
        for n in &mut self.neurons {
            let headroom = total - n.recruitment_threshold;
            if headroom > 0.0 && n.refractory <= 0.0 {
                n.firing_rate = (RATE_GAIN * headroom * (1.0 - n.fatigue)).clamp(0.0, MAX_RATE);
                n.fatigue = unit(n.fatigue + n.firing_rate * dt * FATIGUE_PER_SPIKE);
                n.refractory = REFRACTORY;
            } else {
                n.firing_rate = 0.0;
                n.fatigue = unit(n.fatigue - dt * FATIGUE_RECOVERY);
                n.refractory = (n.refractory - dt).max(0.0);
            }
        }
    }

    /// Mean firing rate across the pool, Hz.
    pub fn mean_rate(&self) -> f32 {
        let sum: f32 = self.neurons.iter().map(|n| n.firing_rate).sum();
        sum / self.neurons.len() as f32
    }

    pub fn mean_fatigue(&self) -> f32 {
        let sum: f32 = self.neurons.iter().map(|n| n.fatigue).sum();
        sum / self.neurons.len() as f32
    }
}
