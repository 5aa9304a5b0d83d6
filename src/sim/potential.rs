//! External potentials driving the DMC reweighting

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Potential family
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PotentialKind {
    /// `0.5·ω²·|p - c|²`, params `[ω, cx, cy, _]`
    Harmonic,
    /// `ax·(x² - bx²)² + ay·(y² - by²)²`, params `[ax, bx, ay, by]`
    DoubleWell,
    #[default]
    Zero,
}

/// Potential type plus up to four scalar parameters
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PotentialSpec {
    pub kind: PotentialKind,
    pub params: [f32; 4],
}

impl PotentialSpec {
    pub fn harmonic(omega: f32) -> Self {
        Self {
            kind: PotentialKind::Harmonic,
            params: [omega, 0.0, 0.0, 0.0],
        }
    }

    pub fn double_well(strength: f32, half_separation: f32) -> Self {
        Self {
            kind: PotentialKind::DoubleWell,
            params: [strength, half_separation, strength, half_separation],
        }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Potential energy at `p`
    #[inline]
    pub fn evaluate(&self, p: Vec2) -> f32 {
        let [a, b, c, d] = self.params;
        match self.kind {
            PotentialKind::Harmonic => {
                let offset = p - Vec2::new(b, c);
                0.5 * a * a * offset.length_squared()
            }
            PotentialKind::DoubleWell => {
                let wx = p.x * p.x - b * b;
                let wy = p.y * p.y - d * d;
                a * wx * wx + c * wy * wy
            }
            PotentialKind::Zero => 0.0,
        }
    }
}
