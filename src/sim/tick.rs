//! Fixed timestep simulation tick
//!
//! One tick is a short pipeline of parallel passes, each a barrier for the
//! next: walk (DMC or Langevin) → reference energy control → slice
//! resampling → density rebuild.

use rand::Rng;

use super::control::{self, ControlOutcome, WeightStats};
use super::dmc::{self, DmcStep};
use super::force::ForceSource;
use super::langevin::{self, LangevinStep};
use super::pool::WorkerPool;
use super::resample::{SliceOutcome, slice_range};
use super::state::{SimState, WalkMode};

/// Host commands for a single tick
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Skip the whole pipeline (tick counter does not advance)
    pub pause: bool,
    /// Re-seed every walker before stepping
    pub clear_all: bool,
    /// Active external force sources (Langevin walk only)
    pub force_sources: Vec<ForceSource>,
}

/// Summary of what one tick did
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TickReport {
    pub tick: u64,
    pub reference_energy: f32,
    /// Weight statistics after reweighting (what the controller saw)
    pub stats: WeightStats,
    /// Slice index resampled this tick, if any
    pub resampled_slice: Option<usize>,
    /// Total weight collapsed to zero this tick
    pub collapsed: bool,
    pub paused: bool,
}

/// Advance the simulation by one tick
pub fn tick(state: &mut SimState, input: &TickInput, pool: &WorkerPool) -> TickReport {
    let width = pool.width();

    if input.clear_all {
        state.reset();
    }

    if input.pause {
        let stats = pool.install(|| control::weight_stats(state.population.walkers(), width));
        return TickReport {
            tick: state.resampling.tick_counter,
            reference_energy: state.quantum.reference_energy,
            stats,
            paused: true,
            ..Default::default()
        };
    }

    pool.install(|| step_pipeline(state, input, width))
}

fn step_pipeline(state: &mut SimState, input: &TickInput, width: usize) -> TickReport {
    let delta_tau = state.quantum.effective_delta_tau();
    let slice = state.resampling.advance();
    let mut report = TickReport::default();

    match state.walk_mode {
        WalkMode::Langevin => {
            let step = LangevinStep {
                bounds: &state.bounds,
                orbital: &state.orbital,
                params: &state.langevin,
                dt: delta_tau,
                diffusion: state.quantum.effective_diffusion(),
            };
            let (walkers, forces) = state.population.walkers_and_forces_mut();
            langevin::step_population(walkers, forces, &input.force_sources, state.time, &step);
            report.stats = control::weight_stats(state.population.walkers(), width);
        }
        WalkMode::Diffusion | WalkMode::DriftDiffusion => {
            let drift = (state.walk_mode == WalkMode::DriftDiffusion).then_some(&state.orbital);
            let step = DmcStep::new(&state.quantum, &state.bounds, &state.potential, drift);
            dmc::step_population(state.population.walkers_mut(), &step);

            report.stats = control::weight_stats(state.population.walkers(), width);
            let outcome = control::update_reference_energy(
                &mut state.quantum.reference_energy,
                &report.stats,
                delta_tau,
                state.resampling.controller_gain,
            );
            if let ControlOutcome::Collapsed { boost } = outcome {
                report.collapsed = true;
                log::warn!(
                    "Population weight collapsed at tick {}; reference energy +{:.3}",
                    state.resampling.tick_counter,
                    boost
                );
            }

            if let Some(slice_index) = slice {
                let range = slice_range(
                    state.population.len(),
                    slice_index,
                    state.resampling.effective_slice_count(),
                );
                let offset: f64 = state.rng.random();
                let outcome = state.resampler.resample_slice(
                    state.population.walkers_mut(),
                    range,
                    offset,
                    state.resampling.clone_jitter_sigma,
                    &state.bounds,
                );
                if let SliceOutcome::WeightsReset { range_len } = outcome {
                    log::warn!("Slice {} had no live weight; reset {} walkers", slice_index, range_len);
                }
                report.resampled_slice = Some(slice_index);
            }
        }
    }

    state.time += delta_tau;

    if state.density_config.enabled {
        state.density.build(
            state.population.walkers(),
            &state.bounds,
            &state.density_config,
            width,
        );
    }

    report.tick = state.resampling.tick_counter;
    report.reference_energy = state.quantum.reference_energy;

    log::debug!(
        "tick {} E_ref={:.4} mean_w={:.4} alive={}/{}",
        report.tick,
        report.reference_energy,
        report.stats.mean,
        report.stats.positive_count,
        report.stats.particle_count
    );

    report
}
