//! Diffusion Monte Carlo step: Gaussian kick, boundary handling and
//! potential-based exponential reweighting of every walker.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::boundary::{self, BoundaryMode};
use super::orbital::{self, OrbitalParams};
use super::potential::PotentialSpec;
use super::rng::WalkerRng;
use super::state::{SimulationBounds, Walker};
use crate::consts::{MAX_WEIGHT, MAX_WEIGHT_EXPONENT, MIN_DELTA_TAU, MIN_LIVE_WEIGHT};

/// Imaginary-time stepping parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuantumParams {
    /// Imaginary-time step Δτ (> 0)
    pub delta_tau: f32,
    /// Diffusion constant D (>= 0)
    pub diffusion: f32,
    /// Shared reference energy, rewritten once per tick by the controller
    pub reference_energy: f32,
    pub boundary_mode: BoundaryMode,
}

impl Default for QuantumParams {
    fn default() -> Self {
        Self {
            delta_tau: 0.005,
            diffusion: 0.5,
            reference_energy: 0.0,
            boundary_mode: BoundaryMode::Reflect,
        }
    }
}

impl QuantumParams {
    /// Δτ floored at `MIN_DELTA_TAU` (non-finite maps to the floor)
    #[inline]
    pub fn effective_delta_tau(&self) -> f32 {
        if self.delta_tau.is_finite() {
            self.delta_tau.max(MIN_DELTA_TAU)
        } else {
            MIN_DELTA_TAU
        }
    }

    /// D floored at zero
    #[inline]
    pub fn effective_diffusion(&self) -> f32 {
        if self.diffusion.is_finite() {
            self.diffusion.max(0.0)
        } else {
            0.0
        }
    }
}

/// Read-only inputs shared by every walker update in one tick
#[derive(Debug, Clone, Copy)]
pub struct DmcStep<'a> {
    pub bounds: &'a SimulationBounds,
    pub potential: &'a PotentialSpec,
    pub delta_tau: f32,
    pub diffusion: f32,
    pub reference_energy: f32,
    pub boundary_mode: BoundaryMode,
    /// Orbital score used as drift, if any
    pub drift: Option<&'a OrbitalParams>,
}

impl<'a> DmcStep<'a> {
    pub fn new(
        quantum: &QuantumParams,
        bounds: &'a SimulationBounds,
        potential: &'a PotentialSpec,
        drift: Option<&'a OrbitalParams>,
    ) -> Self {
        Self {
            bounds,
            potential,
            delta_tau: quantum.effective_delta_tau(),
            diffusion: quantum.effective_diffusion(),
            reference_energy: quantum.reference_energy,
            boundary_mode: quantum.boundary_mode,
            drift,
        }
    }
}

/// Multiply `weight` by `exp(clamp(-Δτ·(V - E_ref), ±12))`.
///
/// Non-finite or non-positive results become 0; survivors are clamped to
/// `[1e-30, 1e30]`.
#[inline]
pub fn reweight(weight: f32, potential: f32, reference_energy: f32, delta_tau: f32) -> f32 {
    let exponent =
        (-delta_tau * (potential - reference_energy)).clamp(-MAX_WEIGHT_EXPONENT, MAX_WEIGHT_EXPONENT);
    let next = weight * exponent.exp();
    if !next.is_finite() || next <= 0.0 {
        0.0
    } else {
        next.clamp(MIN_LIVE_WEIGHT, MAX_WEIGHT)
    }
}

/// Advance one walker by one imaginary-time step
#[inline]
pub fn step_walker(walker: &mut Walker, step: &DmcStep) {
    let sigma = (2.0 * step.diffusion * step.delta_tau).sqrt();
    let mut rng = WalkerRng::new(&mut walker.rng_state);
    let kick = rng.gaussian2() * sigma;

    if let Some(orbital) = step.drift {
        walker.position += step.diffusion * orbital::score(walker.position, orbital) * step.delta_tau;
    }
    walker.position += kick;
    boundary::apply(step.boundary_mode, step.bounds, &mut walker.position, &mut walker.velocity);

    let v = step.potential.evaluate(walker.position);
    walker.weight = reweight(walker.weight, v, step.reference_energy, step.delta_tau);
}

/// Parallel DMC pass over the whole population
pub fn step_population(walkers: &mut [Walker], step: &DmcStep) {
    walkers
        .par_iter_mut()
        .for_each(|walker| step_walker(walker, step));
}
