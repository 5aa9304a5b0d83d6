//! Analytic orbital score field
//!
//! Every shape is written as ψ = A(x, y) · L(ρ) · exp(-ρ / n), with A an
//! angular polynomial, L a radial polynomial in ρ = r / A0 and n the shell
//! index. The score of the density |ψ|² is then
//!
//! ```text
//! ∇ ln|ψ|² = 2 ∇A / A + 2 L'(ρ) / L · r̂ / A0 - 2 / (n · A0) · r̂
//! ```
//!
//! Denominators A and L are floored away from zero (sign-preserving) so that
//! nodal lines and radial nodes produce a large but finite drift.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::NODE_FLOOR;
use crate::{rotate, signed_floor};

/// 2D basis shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum OrbitalKind {
    #[default]
    S1,
    S2,
    S3,
    P2x,
    P2y,
    P3x,
    P3y,
    D3xy,
    D3x2y2,
    D4xy,
    F4Cos3,
    F4Sin3,
}

impl OrbitalKind {
    pub const ALL: [OrbitalKind; 12] = [
        OrbitalKind::S1,
        OrbitalKind::S2,
        OrbitalKind::S3,
        OrbitalKind::P2x,
        OrbitalKind::P2y,
        OrbitalKind::P3x,
        OrbitalKind::P3y,
        OrbitalKind::D3xy,
        OrbitalKind::D3x2y2,
        OrbitalKind::D4xy,
        OrbitalKind::F4Cos3,
        OrbitalKind::F4Sin3,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OrbitalKind::S1 => "1s",
            OrbitalKind::S2 => "2s",
            OrbitalKind::S3 => "3s",
            OrbitalKind::P2x => "2px",
            OrbitalKind::P2y => "2py",
            OrbitalKind::P3x => "3px",
            OrbitalKind::P3y => "3py",
            OrbitalKind::D3xy => "3dxy",
            OrbitalKind::D3x2y2 => "3dx2y2",
            OrbitalKind::D4xy => "4dxy",
            OrbitalKind::F4Cos3 => "4fcos3",
            OrbitalKind::F4Sin3 => "4fsin3",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.to_lowercase();
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }

    /// Shell index n in the exp(-ρ/n) envelope
    fn shell(&self) -> f32 {
        match self {
            OrbitalKind::S1 => 1.0,
            OrbitalKind::S2 | OrbitalKind::P2x | OrbitalKind::P2y => 2.0,
            OrbitalKind::S3
            | OrbitalKind::P3x
            | OrbitalKind::P3y
            | OrbitalKind::D3xy
            | OrbitalKind::D3x2y2 => 3.0,
            OrbitalKind::D4xy | OrbitalKind::F4Cos3 | OrbitalKind::F4Sin3 => 4.0,
        }
    }

    /// Angular polynomial A and its gradient at q (units of A0)
    fn angular(&self, q: Vec2) -> Option<(f32, Vec2)> {
        let (x, y) = (q.x, q.y);
        match self {
            OrbitalKind::S1 | OrbitalKind::S2 | OrbitalKind::S3 => None,
            OrbitalKind::P2x | OrbitalKind::P3x => Some((x, Vec2::X)),
            OrbitalKind::P2y | OrbitalKind::P3y => Some((y, Vec2::Y)),
            OrbitalKind::D3xy | OrbitalKind::D4xy => Some((x * y, Vec2::new(y, x))),
            OrbitalKind::D3x2y2 => Some((x * x - y * y, Vec2::new(2.0 * x, -2.0 * y))),
            OrbitalKind::F4Cos3 => Some((
                x * x * x - 3.0 * x * y * y,
                Vec2::new(3.0 * x * x - 3.0 * y * y, -6.0 * x * y),
            )),
            OrbitalKind::F4Sin3 => Some((
                3.0 * x * x * y - y * y * y,
                Vec2::new(6.0 * x * y, 3.0 * x * x - 3.0 * y * y),
            )),
        }
    }

    /// Radial polynomial L(ρ) and dL/dρ
    fn radial(&self, rho: f32) -> Option<(f32, f32)> {
        match self {
            OrbitalKind::S2 => Some((2.0 - rho, -1.0)),
            OrbitalKind::S3 => Some((27.0 - 18.0 * rho + 2.0 * rho * rho, -18.0 + 4.0 * rho)),
            OrbitalKind::P3x | OrbitalKind::P3y => Some((6.0 - rho, -1.0)),
            OrbitalKind::D4xy => Some((12.0 - rho, -1.0)),
            _ => None,
        }
    }
}

/// Target orbital shape and its placement in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OrbitalParams {
    pub kind: OrbitalKind,
    /// Length scale A0 (world units)
    pub length_scale: f32,
    pub center: Vec2,
    /// Orientation (radians, counter-clockwise)
    pub angle: f32,
    /// Maximum score magnitude; <= 0 disables the clamp
    pub drift_clamp: f32,
    /// Radius floor near the origin (world units)
    pub epsilon: f32,
}

impl Default for OrbitalParams {
    fn default() -> Self {
        Self {
            kind: OrbitalKind::S1,
            length_scale: 1.0,
            center: Vec2::ZERO,
            angle: 0.0,
            drift_clamp: 50.0,
            epsilon: 1.0e-3,
        }
    }
}

/// Gradient of ln|ψ|² at `point`, in world space
pub fn score(point: Vec2, params: &OrbitalParams) -> Vec2 {
    let a0 = params.length_scale.abs().max(f32::EPSILON);
    let local = rotate(point - params.center, -params.angle);

    let r = local.length().max(params.epsilon.max(0.0));
    let r_hat = if r > 0.0 { local / r } else { Vec2::ZERO };
    let q = local / a0;
    let rho = r / a0;
    let kind = params.kind;

    // Envelope exp(-ρ/n)
    let mut s = -2.0 / kind.shell() * r_hat;

    if let Some((a, grad_a)) = kind.angular(q) {
        s += 2.0 * grad_a / signed_floor(a, NODE_FLOOR);
    }
    if let Some((l, dl)) = kind.radial(rho) {
        s += 2.0 * dl / signed_floor(l, NODE_FLOOR) * r_hat;
    }

    // Dimensionless score -> world units
    let mut s = s / a0;
    if !s.is_finite() {
        s = Vec2::ZERO;
    }
    if params.drift_clamp > 0.0 {
        s = s.clamp_length_max(params.drift_clamp);
    }

    rotate(s, params.angle)
}
