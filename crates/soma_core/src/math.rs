//! Numeric guards shared by every integrator.
//!
//! The pipeline never validates ahead of time. Each stage integrates, then
//! clamps and sanitises whatever came out ("clamp, don't reject").

/// Floor applied to any denominator that may approach zero
/// (strain rate, stiffness, inertia, time constants).
pub const EPSILON: f32 = 1e-6;

/// Guard against NaN and Infinity in state values.
/// If the value is NaN or Inf, replace with the provided fallback (rest value).
#[inline]
pub fn sanitize_f32(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in simulation state, resetting to {}", fallback);
        fallback
    }
}

/// Sanitise then clamp into `[lo, hi]`.
#[inline]
pub fn clamp_finite(v: f32, fallback: f32, lo: f32, hi: f32) -> f32 {
    sanitize_f32(v, fallback).clamp(lo, hi)
}

/// Sanitise then clamp into the unit interval.
#[inline]
pub fn unit(v: f32) -> f32 {
    clamp_finite(v, 0.0, 0.0, 1.0)
}

/// Division whose denominator is kept at least [`EPSILON`] away from zero,
/// preserving its sign.
#[inline]
pub fn safe_div(num: f32, den: f32) -> f32 {
    let guarded = if den.abs() < EPSILON {
        if den.is_sign_negative() {
            -EPSILON
        } else {
            EPSILON
        }
    } else {
        den
    };
    num / guarded
}

/// Cubic Hermite ease between `edge0` and `edge1`.
#[inline]
pub fn smoothstep(x: f32, edge0: f32, edge1: f32) -> f32 {
    let t = safe_div(x - edge0, edge1 - edge0).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Logistic sigmoid.
#[inline]
pub fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
