//! Damped Langevin exploration walk
//!
//! Semi-implicit Euler on velocity, then an overdamped drift toward the
//! orbital score plus thermal noise. Boundary handling mirrors position
//! only; velocity keeps its sign on reflection (see `boundary`).

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::boundary;
use super::force::{self, ForceSource};
use super::orbital::{self, OrbitalParams};
use super::rng::WalkerRng;
use super::state::{SimulationBounds, Walker};
use crate::consts::FORCE_DECAY;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LangevinParams {
    /// Fraction of velocity removed per tick, in [0, 1]
    pub damping: f32,
    /// Force-to-acceleration scale (inverse mass)
    pub force_to_accel: f32,
    /// Speed clamp; <= 0 disables it
    pub max_speed: f32,
}

impl Default for LangevinParams {
    fn default() -> Self {
        Self {
            damping: 0.1,
            force_to_accel: 1.0,
            max_speed: 20.0,
        }
    }
}

/// Read-only inputs shared by every walker in one Langevin tick
#[derive(Debug, Clone, Copy)]
pub struct LangevinStep<'a> {
    pub bounds: &'a SimulationBounds,
    pub orbital: &'a OrbitalParams,
    pub params: &'a LangevinParams,
    pub dt: f32,
    pub diffusion: f32,
}

/// Advance one walker given its accumulated external force
#[inline]
pub fn step_walker(walker: &mut Walker, force: Vec2, step: &LangevinStep) {
    let dt = step.dt;
    let retain = 1.0 - step.params.damping.clamp(0.0, 1.0);

    walker.velocity += force * step.params.force_to_accel * dt;
    walker.velocity *= retain;
    if step.params.max_speed > 0.0 {
        walker.velocity = walker.velocity.clamp_length_max(step.params.max_speed);
    }
    if !walker.velocity.is_finite() {
        walker.velocity = Vec2::ZERO;
    }

    let score = orbital::score(walker.position, step.orbital);
    let mut rng = WalkerRng::new(&mut walker.rng_state);
    let noise = rng.gaussian2() * (2.0 * step.diffusion * dt).sqrt();

    walker.position += step.diffusion * score * dt + noise + walker.velocity * dt;
    boundary::reflect_and_clamp(step.bounds, &mut walker.position);
}

/// Parallel Langevin pass: decay each force accumulator, add the current
/// source forces, then integrate.
pub fn step_population(
    walkers: &mut [Walker],
    forces: &mut [Vec2],
    sources: &[ForceSource],
    now: f32,
    step: &LangevinStep,
) {
    walkers
        .par_iter_mut()
        .zip(forces.par_iter_mut())
        .for_each(|(walker, accumulated)| {
            *accumulated = *accumulated * FORCE_DECAY + force::total_force(sources, walker.position, now);
            step_walker(walker, *accumulated, step);
        });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_step<'a>(
        bounds: &'a SimulationBounds,
        orbital: &'a OrbitalParams,
        params: &'a LangevinParams,
    ) -> LangevinStep<'a> {
        LangevinStep {
            bounds,
            orbital,
            params,
            dt: 0.1,
            diffusion: 0.0,
        }
    }

    #[test]
    fn test_force_accelerates_walker() {
        let bounds = SimulationBounds::default();
        let orbital = OrbitalParams::default();
        let params = LangevinParams {
            damping: 0.0,
            max_speed: 0.0,
            ..Default::default()
        };
        let step = quiet_step(&bounds, &orbital, &params);
        let mut walker = Walker::new(Vec2::new(1.0, 0.0), 3);
        step_walker(&mut walker, Vec2::new(10.0, 0.0), &step);
        assert!((walker.velocity - Vec2::new(1.0, 0.0)).length() < 1e-6);
        assert!((walker.position - Vec2::new(1.1, 0.0)).length() < 1e-6);
    }

    #[test]
    fn test_damping_and_speed_clamp() {
        let bounds = SimulationBounds::default();
        let orbital = OrbitalParams::default();
        let params = LangevinParams {
            damping: 0.5,
            force_to_accel: 1.0,
            max_speed: 2.0,
        };
        let step = quiet_step(&bounds, &orbital, &params);
        let mut walker = Walker::new(Vec2::ZERO, 3);
        walker.velocity = Vec2::new(2.0, 0.0);
        step_walker(&mut walker, Vec2::ZERO, &step);
        assert!((walker.velocity.x - 1.0).abs() < 1e-6);

        walker.velocity = Vec2::new(100.0, 0.0);
        step_walker(&mut walker, Vec2::ZERO, &step);
        assert!(walker.velocity.length() <= 2.0 + 1e-5);
    }

    #[test]
    fn test_score_drift_moves_toward_center() {
        let bounds = SimulationBounds::default();
        let orbital = OrbitalParams::default();
        let params = LangevinParams::default();
        let step = LangevinStep {
            diffusion: 0.5,
            ..quiet_step(&bounds, &orbital, &params)
        };
        let mut walkers: Vec<Walker> = (0..1000)
            .map(|i| Walker::new(Vec2::new(4.0, 0.0), (i as u32 + 1).wrapping_mul(0x9E37_79B9)))
            .collect();
        let mut forces = vec![Vec2::ZERO; walkers.len()];
        for _ in 0..20 {
            step_population(&mut walkers, &mut forces, &[], 0.0, &step);
        }
        let mean_x = walkers.iter().map(|w| w.position.x).sum::<f32>() / 1000.0;
        assert!(mean_x < 3.0, "mean x {mean_x}");
    }

    #[test]
    fn test_accumulator_decays() {
        let bounds = SimulationBounds::default();
        let orbital = OrbitalParams::default();
        let params = LangevinParams::default();
        let step = quiet_step(&bounds, &orbital, &params);
        let mut walkers = vec![Walker::new(Vec2::ZERO, 9)];
        let mut forces = vec![Vec2::new(4.0, 0.0)];
        step_population(&mut walkers, &mut forces, &[], 0.0, &step);
        assert!((forces[0].x - 3.4).abs() < 1e-6);
    }

    /// Reflection at a wall mirrors position but keeps the outgoing velocity.
    #[test]
    fn test_reflection_keeps_velocity_direction() {
        let bounds = SimulationBounds::new(Vec2::ZERO, Vec2::splat(1.0));
        let orbital = OrbitalParams {
            drift_clamp: 0.0,
            ..Default::default()
        };
        let params = LangevinParams {
            damping: 0.0,
            max_speed: 0.0,
            ..Default::default()
        };
        let step = quiet_step(&bounds, &orbital, &params);
        let mut walker = Walker::new(Vec2::new(0.95, 0.0), 3);
        walker.velocity = Vec2::new(1.0, 0.0);
        step_walker(&mut walker, Vec2::ZERO, &step);
        assert!(walker.position.x <= 1.0);
        assert!((walker.position.x - 0.95).abs() < 1e-5);
        assert_eq!(walker.velocity, Vec2::new(1.0, 0.0));
    }
}
