//! Simulation state and core walker types
//!
//! All state that must be persisted for resume/determinism lives here.

use bytemuck::{Pod, Zeroable};
use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::density::{DensityField, DensityFieldConfig};
use super::dmc::QuantumParams;
use super::langevin::LangevinParams;
use super::orbital::OrbitalParams;
use super::potential::PotentialSpec;
use super::resample::{ResamplingControl, Resampler};
use super::rng::{WalkerRng, sanitize_state};
use crate::settings::Settings;

/// Axis-aligned simulation rectangle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulationBounds {
    pub center: Vec2,
    /// Half-size along each axis
    pub extents: Vec2,
}

impl Default for SimulationBounds {
    fn default() -> Self {
        Self {
            center: Vec2::ZERO,
            extents: Vec2::splat(8.0),
        }
    }
}

impl SimulationBounds {
    pub fn new(center: Vec2, extents: Vec2) -> Self {
        Self { center, extents }
    }

    #[inline]
    pub fn min(&self) -> Vec2 {
        self.center - self.extents.abs()
    }

    #[inline]
    pub fn max(&self) -> Vec2 {
        self.center + self.extents.abs()
    }

    #[inline]
    pub fn size(&self) -> Vec2 {
        self.extents.abs() * 2.0
    }

    #[inline]
    pub fn contains(&self, p: Vec2) -> bool {
        p.cmpge(self.min()).all() && p.cmple(self.max()).all()
    }

    #[inline]
    pub fn clamp(&self, p: Vec2) -> Vec2 {
        p.clamp(self.min(), self.max())
    }
}

/// One weighted sample point
///
/// `#[repr(C)]` and `Pod` so the whole population can be handed to a GPU
/// uploader as raw bytes.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable, Serialize, Deserialize)]
pub struct Walker {
    pub position: Vec2,
    /// Only integrated by the Langevin walk
    pub velocity: Vec2,
    /// Finite and >= 0; zero is "dead weight", never removed
    pub weight: f32,
    /// xorshift32 state, never 0 or u32::MAX
    pub rng_state: u32,
}

impl Walker {
    pub fn new(position: Vec2, rng_state: u32) -> Self {
        Self {
            position,
            velocity: Vec2::ZERO,
            weight: 1.0,
            rng_state: sanitize_state(rng_state),
        }
    }

    /// Fresh walker drawn from a Gaussian cloud around the bounds center
    pub fn seeded(bounds: &SimulationBounds, spread: f32, rng: &mut Pcg32) -> Self {
        let mut state = rng.random::<u32>();
        let offset = WalkerRng::new(&mut state).gaussian2() * spread.max(0.0);
        Self::new(bounds.clamp(bounds.center + offset), state)
    }
}

/// Fixed-capacity, index-stable walker array
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Population {
    walkers: Vec<Walker>,
    /// Langevin external force accumulator, one per walker
    #[serde(skip)]
    forces: Vec<Vec2>,
}

impl Population {
    pub fn seeded(count: usize, bounds: &SimulationBounds, spread: f32, rng: &mut Pcg32) -> Self {
        let walkers = (0..count).map(|_| Walker::seeded(bounds, spread, rng)).collect();
        Self {
            walkers,
            forces: vec![Vec2::ZERO; count],
        }
    }

    pub fn from_walkers(walkers: Vec<Walker>) -> Self {
        let forces = vec![Vec2::ZERO; walkers.len()];
        Self { walkers, forces }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.walkers.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.walkers.is_empty()
    }

    #[inline]
    pub fn walkers(&self) -> &[Walker] {
        &self.walkers
    }

    #[inline]
    pub fn walkers_mut(&mut self) -> &mut [Walker] {
        &mut self.walkers
    }

    /// Walkers together with their force accumulators (resized to match if needed)
    pub fn walkers_and_forces_mut(&mut self) -> (&mut [Walker], &mut [Vec2]) {
        self.forces.resize(self.walkers.len(), Vec2::ZERO);
        (&mut self.walkers, &mut self.forces)
    }

    pub fn positions(&self) -> impl ExactSizeIterator<Item = Vec2> + '_ {
        self.walkers.iter().map(|w| w.position)
    }

    pub fn weights(&self) -> impl ExactSizeIterator<Item = f32> + '_ {
        self.walkers.iter().map(|w| w.weight)
    }

    /// Raw walker bytes (position, velocity, weight, rng state; 24 bytes each)
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.walkers)
    }

    /// Grow with freshly seeded walkers or truncate from the tail.
    ///
    /// Existing indices keep their walkers.
    pub fn resize(&mut self, count: usize, bounds: &SimulationBounds, spread: f32, rng: &mut Pcg32) {
        if count < self.walkers.len() {
            self.walkers.truncate(count);
        } else {
            let extra = count - self.walkers.len();
            self.walkers
                .extend((0..extra).map(|_| Walker::seeded(bounds, spread, rng)));
        }
        self.forces.resize(count, Vec2::ZERO);
    }

    /// Index of the walker nearest to `point`
    pub fn closest_walker(&self, point: Vec2) -> Option<usize> {
        self.walkers
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.position
                    .distance_squared(point)
                    .total_cmp(&b.position.distance_squared(point))
            })
            .map(|(i, _)| i)
    }
}

/// Which walk the population performs each tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WalkMode {
    /// Plain diffusion + potential reweighting
    #[default]
    Diffusion,
    /// Diffusion with the orbital score added as drift
    DriftDiffusion,
    /// Damped Langevin exploration walk; no reweighting or resampling
    Langevin,
}

/// Complete simulation state (deterministic, serializable)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimState {
    /// Run seed for reproducibility
    pub seed: u64,
    /// System RNG (resampling offsets, walker seeding)
    pub rng: Pcg32,
    pub population: Population,
    pub bounds: SimulationBounds,
    pub orbital: OrbitalParams,
    pub quantum: QuantumParams,
    pub potential: PotentialSpec,
    pub resampling: ResamplingControl,
    pub density_config: DensityFieldConfig,
    pub langevin: LangevinParams,
    pub walk_mode: WalkMode,
    /// Standard deviation of the initial walker cloud
    pub initial_spread: f32,
    /// Reference energy restored on reset
    pub initial_reference_energy: f32,
    /// Elapsed imaginary time
    pub time: f32,
    /// Published density grid
    #[serde(skip)]
    pub density: DensityField,
    #[serde(skip)]
    pub(crate) resampler: Resampler,
}

impl SimState {
    /// Build a fresh state from settings (values are sanitized first)
    pub fn new(settings: &Settings) -> Self {
        let settings = settings.sanitized();
        let mut rng = Pcg32::seed_from_u64(settings.seed);
        let count = settings.population_size();
        let population = Population::seeded(count, &settings.bounds, settings.initial_spread, &mut rng);

        log::info!(
            "Seeded {} walkers (seed {}, orbital {}, mode {:?})",
            count,
            settings.seed,
            settings.orbital.kind.as_str(),
            settings.walk_mode
        );

        Self {
            seed: settings.seed,
            rng,
            population,
            bounds: settings.bounds,
            orbital: settings.orbital,
            quantum: settings.quantum,
            potential: settings.potential,
            resampling: settings.resampling,
            density_config: settings.density,
            langevin: settings.langevin,
            walk_mode: settings.walk_mode,
            initial_spread: settings.initial_spread,
            initial_reference_energy: settings.quantum.reference_energy,
            time: 0.0,
            density: DensityField::new(settings.density.width, settings.density.height),
            resampler: Resampler::default(),
        }
    }

    /// Re-seed every walker and restore the initial reference energy.
    ///
    /// Population size and the tick counter are kept.
    pub fn reset(&mut self) {
        let count = self.population.len();
        self.population = Population::seeded(count, &self.bounds, self.initial_spread, &mut self.rng);
        self.quantum.reference_energy = self.initial_reference_energy;
        log::info!("Reset {} walkers at tick {}", count, self.resampling.tick_counter);
    }

    /// Change the population size between runs (grow in place / truncate tail)
    pub fn resize(&mut self, count: usize) {
        let before = self.population.len();
        self.population
            .resize(count, &self.bounds, self.initial_spread, &mut self.rng);
        log::info!("Resized population {} -> {}", before, count);
    }
}
