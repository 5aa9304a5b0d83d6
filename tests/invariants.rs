//! Property-based tests for the walker simulation using proptest
//!
//! These tests verify invariants hold across random seeds and configurations:
//! - Walker RNG states never reach an absorbing value
//! - Weights stay finite and within [0, 1e30]
//! - Positions stay inside the simulation bounds
//! - Resampling only copies live ancestors and restores unit weights
//! - Density mass matches the in-bounds weight sum

use glam::Vec2;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use quantum_walkers::Settings;
use quantum_walkers::consts::MAX_WEIGHT;
use quantum_walkers::sim::{
    BoundaryMode, DensityFieldConfig, OrbitalKind, OrbitalParams, PotentialSpec, Resampler,
    ResamplingControl, SimState, SimulationBounds, TickInput, WalkMode, Walker, WalkerRng,
    WorkerPool, slice_range, tick,
};

const POPULATION: usize = 128;
const TICKS: usize = 12;

fn boundary_mode() -> impl Strategy<Value = BoundaryMode> {
    prop_oneof![
        Just(BoundaryMode::Reflect),
        Just(BoundaryMode::Clamp),
        Just(BoundaryMode::Periodic),
    ]
}

fn walk_mode() -> impl Strategy<Value = WalkMode> {
    prop_oneof![
        Just(WalkMode::Diffusion),
        Just(WalkMode::DriftDiffusion),
        Just(WalkMode::Langevin),
    ]
}

fn potential() -> impl Strategy<Value = PotentialSpec> {
    prop_oneof![
        (0.1f32..5.0).prop_map(PotentialSpec::harmonic),
        (0.1f32..2.0, 0.5f32..3.0).prop_map(|(k, a)| PotentialSpec::double_well(k, a)),
        Just(PotentialSpec::zero()),
    ]
}

fn settings_strategy() -> impl Strategy<Value = Settings> {
    (
        any::<u64>(),
        boundary_mode(),
        walk_mode(),
        potential(),
        0..OrbitalKind::ALL.len(),
        (1e-4f32..0.05, 0.0f32..2.0),
        (1u32..6, 1u32..5, 0.0f32..0.3),
        (0.5f32..6.0, 0.1f32..4.0),
    )
        .prop_map(
            |(seed, boundary, walk, potential, orbital, (dt, d), (interval, slices, jitter), (extent, spread))| {
                let mut settings = Settings {
                    seed,
                    population: Some(POPULATION),
                    worker_count: 2,
                    initial_spread: spread,
                    walk_mode: walk,
                    bounds: SimulationBounds::new(Vec2::ZERO, Vec2::splat(extent)),
                    orbital: OrbitalParams {
                        kind: OrbitalKind::ALL[orbital],
                        ..Default::default()
                    },
                    potential,
                    resampling: ResamplingControl {
                        tick_interval: interval,
                        slice_count: slices,
                        clone_jitter_sigma: jitter,
                        ..Default::default()
                    },
                    density: DensityFieldConfig {
                        width: 16,
                        height: 16,
                        ..Default::default()
                    },
                    ..Default::default()
                };
                settings.quantum.delta_tau = dt;
                settings.quantum.diffusion = d;
                settings.quantum.boundary_mode = boundary;
                settings
            },
        )
}

fn walkers_with_weights(weights: &[f32], seed: u64) -> Vec<Walker> {
    let bounds = SimulationBounds::default();
    let mut rng = Pcg32::seed_from_u64(seed);
    weights
        .iter()
        .map(|&weight| Walker {
            weight,
            ..Walker::seeded(&bounds, 2.0, &mut rng)
        })
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// No seed (including 0 and u32::MAX) leaves the generator stuck
    #[test]
    fn rng_state_never_absorbing(seed in any::<u32>()) {
        let mut state = seed;
        let mut rng = WalkerRng::new(&mut state);
        for _ in 0..256 {
            let x = rng.next_f32();
            prop_assert!((0.0..1.0).contains(&x));
        }
        prop_assert_ne!(state, 0);
        prop_assert_ne!(state, u32::MAX);
    }

    /// Weights, positions and reference energy stay well-formed for any configuration
    #[test]
    fn tick_keeps_population_well_formed(settings in settings_strategy()) {
        let pool = WorkerPool::new(settings.worker_count).unwrap();
        let mut state = SimState::new(&settings);

        for _ in 0..TICKS {
            let report = tick(&mut state, &TickInput::default(), &pool);
            prop_assert!(report.reference_energy.is_finite());
            prop_assert_eq!(report.stats.particle_count, POPULATION);
        }

        prop_assert_eq!(state.population.len(), POPULATION);
        for walker in state.population.walkers() {
            prop_assert!(walker.weight.is_finite());
            prop_assert!((0.0..=MAX_WEIGHT).contains(&walker.weight), "weight {}", walker.weight);
            prop_assert!(state.bounds.contains(walker.position), "position {:?}", walker.position);
            prop_assert!(walker.velocity.is_finite());
            prop_assert_ne!(walker.rng_state, 0);
            prop_assert_ne!(walker.rng_state, u32::MAX);
        }
    }

    /// Zero-jitter resampling only copies positions of walkers that had positive weight
    #[test]
    fn resampled_positions_have_live_ancestors(
        weights in prop::collection::vec(prop_oneof![Just(0.0f32), 1e-3f32..10.0], 1..64),
        slice_count in 1usize..5,
        slice_index in 0usize..5,
        offset in 0.0f64..1.0,
        seed in any::<u64>(),
    ) {
        let mut walkers = walkers_with_weights(&weights, seed);
        let live: Vec<Vec2> = walkers.iter().filter(|w| w.weight > 0.0).map(|w| w.position).collect();
        prop_assume!(!live.is_empty());

        let range = slice_range(walkers.len(), slice_index, slice_count);
        let untouched: Vec<Walker> = walkers
            .iter()
            .enumerate()
            .filter(|(i, _)| !range.contains(i))
            .map(|(_, w)| *w)
            .collect();

        let mut resampler = Resampler::default();
        resampler.resample_slice(&mut walkers, range.clone(), offset, 0.0, &SimulationBounds::default());

        for walker in &walkers[range.clone()] {
            prop_assert_eq!(walker.weight, 1.0);
            prop_assert!(live.contains(&walker.position));
        }
        let after: Vec<Walker> = walkers
            .iter()
            .enumerate()
            .filter(|(i, _)| !range.contains(i))
            .map(|(_, w)| *w)
            .collect();
        prop_assert_eq!(after, untouched);
    }

    /// Resampling every slice once leaves total weight equal to N
    #[test]
    fn full_resample_cycle_restores_unit_mass(
        weights in prop::collection::vec(1e-3f32..10.0, 1..64),
        slice_count in 1usize..6,
        seed in any::<u64>(),
    ) {
        let mut walkers = walkers_with_weights(&weights, seed);
        let mut resampler = Resampler::default();
        for s in 0..slice_count {
            let range = slice_range(walkers.len(), s, slice_count);
            resampler.resample_slice(&mut walkers, range, 0.5, 0.0, &SimulationBounds::default());
        }
        let total: f64 = walkers.iter().map(|w| w.weight as f64).sum();
        prop_assert_eq!(total, walkers.len() as f64);
    }

    /// Density grid mass equals the in-bounds weight sum
    #[test]
    fn density_mass_matches_weight_sum(settings in settings_strategy()) {
        let pool = WorkerPool::new(settings.worker_count).unwrap();
        let mut state = SimState::new(&settings);
        for _ in 0..3 {
            tick(&mut state, &TickInput::default(), &pool);
        }
        let weight_sum: f64 = state
            .population
            .weights()
            .filter(|w| w.is_finite() && *w > 0.0)
            .map(|w| w as f64)
            .sum();
        let mass = state.density.total_mass();
        let tolerance = 1e-4 * weight_sum.max(1.0);
        prop_assert!((mass - weight_sum).abs() <= tolerance, "mass {} vs weights {}", mass, weight_sum);
    }
}

/// Four equal walkers, one full-slice resample: positions are a permutation
/// of the originals and every weight is 1.
#[test]
fn four_equal_walkers_resample_to_same_multiset() {
    let mut walkers = walkers_with_weights(&[1.0; 4], 2024);
    let mut before: Vec<(u32, u32)> = walkers
        .iter()
        .map(|w| (w.position.x.to_bits(), w.position.y.to_bits()))
        .collect();

    let mut rng = Pcg32::seed_from_u64(99);
    let offset: f64 = rand::Rng::random(&mut rng);
    let mut resampler = Resampler::default();
    resampler.resample_slice(&mut walkers, 0..4, offset, 0.0, &SimulationBounds::default());

    let mut after: Vec<(u32, u32)> = walkers
        .iter()
        .map(|w| (w.position.x.to_bits(), w.position.y.to_bits()))
        .collect();
    before.sort_unstable();
    after.sort_unstable();
    assert_eq!(before, after);
    assert!(walkers.iter().all(|w| w.weight == 1.0));
}
