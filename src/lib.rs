//! Quantum Walkers - Diffusion Monte Carlo sampling of 2D orbital densities
//!
//! Core modules:
//! - `sim`: Deterministic walker simulation (diffusion, reweighting, resampling, rasterization)
//! - `settings`: Serializable configuration and quality presets
//! - `error`: Setup-time errors (ticks themselves never fail)

pub mod error;
pub mod settings;
pub mod sim;

pub use error::SimError;
pub use settings::{QualityPreset, Settings};

use glam::Vec2;

/// Simulation configuration constants
pub mod consts {
    /// Smallest imaginary-time step accepted by any component
    pub const MIN_DELTA_TAU: f32 = 1.0e-5;

    /// Hard clamp applied to the reweighting exponent `-Δτ·(V - E_ref)`
    pub const MAX_WEIGHT_EXPONENT: f32 = 12.0;
    /// Surviving walker weights are clamped into this range
    pub const MIN_LIVE_WEIGHT: f32 = 1.0e-30;
    pub const MAX_WEIGHT: f32 = 1.0e30;

    /// Reference energy controller gain bounds
    pub const MIN_CONTROLLER_GAIN: f32 = 0.01;
    pub const MAX_CONTROLLER_GAIN: f32 = 1.0;
    /// Mean weight floor before taking the logarithm
    pub const MIN_MEAN_WEIGHT: f64 = 1.0e-6;
    /// Per-tick reference energy change limit, in units of 1/Δτ
    pub const MAX_ENERGY_STEP: f32 = 2.0;
    /// Reference energy boost on total collapse, in units of 1/Δτ
    pub const COLLAPSE_ENERGY_BOOST: f32 = 0.5;

    /// Per-tick decay of the Langevin external force accumulator
    pub const FORCE_DECAY: f32 = 0.85;
    /// Force sources older than this many decay constants are expired
    pub const FORCE_EXPIRY_DECAYS: f32 = 4.0;

    /// Smallest magnitude of an angular/radial factor used as a denominator
    pub const NODE_FLOOR: f32 = 1.0e-3;
}

/// Hermite smoothstep between `edge0` and `edge1`
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    if edge1 <= edge0 {
        return if x < edge0 { 0.0 } else { 1.0 };
    }
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Push `value` away from zero so that `|value| >= floor`, keeping its sign (zero maps to `+floor`)
#[inline]
pub fn signed_floor(value: f32, floor: f32) -> f32 {
    if value.abs() >= floor {
        value
    } else if value < 0.0 {
        -floor
    } else {
        floor
    }
}

/// Rotate a vector by `angle` radians (counter-clockwise)
#[inline]
pub fn rotate(v: Vec2, angle: f32) -> Vec2 {
    Vec2::from_angle(angle).rotate(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_smoothstep_edges() {
        assert_eq!(smoothstep(1.0, 2.0, 0.5), 0.0);
        assert_eq!(smoothstep(1.0, 2.0, 3.0), 1.0);
        assert!((smoothstep(1.0, 2.0, 1.5) - 0.5).abs() < 1e-6);
        // Degenerate edges behave like a step
        assert_eq!(smoothstep(1.0, 1.0, 0.9), 0.0);
        assert_eq!(smoothstep(1.0, 1.0, 1.0), 1.0);
    }

    #[test]
    fn test_signed_floor_keeps_sign() {
        assert_eq!(signed_floor(0.5, 0.1), 0.5);
        assert_eq!(signed_floor(-1e-6, 0.1), -0.1);
        assert_eq!(signed_floor(1e-6, 0.1), 0.1);
        assert_eq!(signed_floor(0.0, 0.1), 0.1);
    }

    #[test]
    fn test_rotate_quarter_turn() {
        let v = rotate(Vec2::X, std::f32::consts::FRAC_PI_2);
        assert!((v - Vec2::Y).length() < 1e-6);
    }
}
