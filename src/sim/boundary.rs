//! Boundary policies keeping walkers inside the simulation rectangle
//!
//! The DMC path (`apply`) reflects velocity along with position; the Langevin
//! path (`reflect_and_clamp`) only mirrors position and leaves velocity alone.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::state::SimulationBounds;

/// How a walker leaving the bounds is brought back
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BoundaryMode {
    /// Mirror across the violated edge and invert that velocity component
    #[default]
    Reflect,
    /// Pin to the edge and halve that velocity component
    Clamp,
    /// Wrap to the opposite edge, velocity untouched
    Periodic,
}

/// Apply `mode` to a walker on the DMC path
pub fn apply(mode: BoundaryMode, bounds: &SimulationBounds, position: &mut Vec2, velocity: &mut Vec2) {
    let (lo, hi) = (bounds.min(), bounds.max());
    for axis in 0..2 {
        if !position[axis].is_finite() {
            position[axis] = bounds.center[axis];
            velocity[axis] = 0.0;
            continue;
        }
        match mode {
            BoundaryMode::Reflect => {
                if position[axis] < lo[axis] {
                    position[axis] = 2.0 * lo[axis] - position[axis];
                    velocity[axis] = -velocity[axis];
                } else if position[axis] > hi[axis] {
                    position[axis] = 2.0 * hi[axis] - position[axis];
                    velocity[axis] = -velocity[axis];
                }
                // A kick larger than the box can overshoot the opposite edge
                position[axis] = position[axis].clamp(lo[axis], hi[axis]);
            }
            BoundaryMode::Clamp => {
                if position[axis] < lo[axis] || position[axis] > hi[axis] {
                    position[axis] = position[axis].clamp(lo[axis], hi[axis]);
                    velocity[axis] *= 0.5;
                }
            }
            BoundaryMode::Periodic => {
                let size = hi[axis] - lo[axis];
                position[axis] = if size > 0.0 {
                    (lo[axis] + (position[axis] - lo[axis]).rem_euclid(size)).clamp(lo[axis], hi[axis])
                } else {
                    lo[axis]
                };
            }
        }
    }
}

/// Langevin path: mirror position across a violated edge, then clamp.
///
/// Velocity is deliberately not reflected here, unlike `apply`.
pub fn reflect_and_clamp(bounds: &SimulationBounds, position: &mut Vec2) {
    let (lo, hi) = (bounds.min(), bounds.max());
    for axis in 0..2 {
        let p = position[axis];
        if !p.is_finite() {
            position[axis] = bounds.center[axis];
            continue;
        }
        let reflected = if p < lo[axis] {
            2.0 * lo[axis] - p
        } else if p > hi[axis] {
            2.0 * hi[axis] - p
        } else {
            p
        };
        position[axis] = reflected.clamp(lo[axis], hi[axis]);
    }
}
