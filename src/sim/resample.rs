//! Slice-based systematic resampling
//!
//! Every `tick_interval` ticks one of `slice_count` contiguous slices of the
//! population is redrawn in proportion to weight, so the O(N) cost is spread
//! over `slice_count` acting ticks. Ancestors may come from anywhere in the
//! population (including the slice itself), which is why weights and
//! positions are snapshotted before any write.

use std::ops::Range;

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::rng::WalkerRng;
use super::state::{SimulationBounds, Walker};

/// Resampling cadence and controller tuning
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResamplingControl {
    /// Resample every this many ticks (floored at 1)
    pub tick_interval: u32,
    /// Number of population partitions (floored at 1)
    pub slice_count: u32,
    /// Gaussian positional jitter applied to clones; 0 copies exactly
    pub clone_jitter_sigma: f32,
    /// Reference energy controller gain kappa
    pub controller_gain: f32,
    /// Monotonic tick counter
    pub tick_counter: u64,
}

impl Default for ResamplingControl {
    fn default() -> Self {
        Self {
            tick_interval: 8,
            slice_count: 4,
            clone_jitter_sigma: 0.0,
            controller_gain: 0.1,
            tick_counter: 0,
        }
    }
}

impl ResamplingControl {
    /// Count one tick; returns the slice to resample if this tick acts
    pub fn advance(&mut self) -> Option<usize> {
        self.tick_counter += 1;
        let interval = self.tick_interval.max(1) as u64;
        if self.tick_counter % interval != 0 {
            return None;
        }
        let slices = self.slice_count.max(1) as u64;
        Some(((self.tick_counter / interval) % slices) as usize)
    }

    pub fn effective_slice_count(&self) -> usize {
        self.slice_count.max(1) as usize
    }
}

/// Index range `[N·s/S, N·(s+1)/S)` of slice `s`
pub fn slice_range(len: usize, slice_index: usize, slice_count: usize) -> Range<usize> {
    let slice_count = slice_count.max(1);
    let slice_index = slice_index.min(slice_count - 1);
    let start = (len as u128 * slice_index as u128 / slice_count as u128) as usize;
    let end = (len as u128 * (slice_index as u128 + 1) / slice_count as u128) as usize;
    start..end
}

/// Result of resampling one slice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliceOutcome {
    /// Slice redrawn from the weight CDF
    Resampled { range_len: usize },
    /// Total weight was <= 0; slice weights reset to 1 without redrawing
    WeightsReset { range_len: usize },
}

/// Reusable snapshot buffers
#[derive(Debug, Clone, Default)]
pub struct Resampler {
    cdf: Vec<f64>,
    positions: Vec<Vec2>,
}

impl Resampler {
    /// Redraw walkers in `range` from a snapshot of the whole population.
    ///
    /// `offset` is the single systematic draw in [0, 1); sample `i` uses
    /// `u = (i + offset) / N`.
    pub fn resample_slice(
        &mut self,
        walkers: &mut [Walker],
        range: Range<usize>,
        offset: f64,
        jitter_sigma: f32,
        bounds: &SimulationBounds,
    ) -> SliceOutcome {
        let n = walkers.len();
        let range = range.start.min(n)..range.end.min(n);
        let range_len = range.len();
        if n == 0 || range_len == 0 {
            return SliceOutcome::Resampled { range_len: 0 };
        }

        let total = self.snapshot(walkers);
        if total <= 0.0 || !total.is_finite() {
            for walker in &mut walkers[range] {
                walker.weight = 1.0;
            }
            return SliceOutcome::WeightsReset { range_len };
        }

        let offset = if offset.is_finite() { offset.clamp(0.0, 1.0 - f64::EPSILON) } else { 0.0 };
        let cdf = &self.cdf;
        let positions = &self.positions;
        let start = range.start;

        walkers[range]
            .par_iter_mut()
            .enumerate()
            .for_each(|(k, walker)| {
                let u = ((start + k) as f64 + offset) / n as f64;
                let parent = cdf.partition_point(|&c| c <= u).min(n - 1);
                walker.position = positions[parent];
                if jitter_sigma > 0.0 {
                    let mut rng = WalkerRng::new(&mut walker.rng_state);
                    walker.position = bounds.clamp(walker.position + rng.gaussian2() * jitter_sigma);
                }
                walker.weight = 1.0;
            });

        SliceOutcome::Resampled { range_len }
    }

    /// Copy positions and build the normalized weight CDF; returns total weight
    fn snapshot(&mut self, walkers: &[Walker]) -> f64 {
        self.positions.clear();
        self.positions.par_extend(walkers.par_iter().map(|w| w.position));

        self.cdf.clear();
        self.cdf.reserve(walkers.len());
        let mut running = 0.0f64;
        for walker in walkers {
            if walker.weight.is_finite() && walker.weight > 0.0 {
                running += walker.weight as f64;
            }
            self.cdf.push(running);
        }

        let total = running;
        if total > 0.0 && total.is_finite() {
            let inv = 1.0 / total;
            self.cdf.par_iter_mut().for_each(|c| *c *= inv);
            if let Some(last) = self.cdf.last_mut() {
                *last = 1.0;
            }
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walkers_at(points: &[(f32, f32, f32)]) -> Vec<Walker> {
        points
            .iter()
            .enumerate()
            .map(|(i, &(x, y, w))| Walker {
                weight: w,
                ..Walker::new(Vec2::new(x, y), (i as u32 + 1).wrapping_mul(0x9E37_79B9))
            })
            .collect()
    }

    #[test]
    fn test_advance_schedule() {
        let mut control = ResamplingControl {
            tick_interval: 3,
            slice_count: 2,
            ..Default::default()
        };
        let acted: Vec<Option<usize>> = (0..12).map(|_| control.advance()).collect();
        assert_eq!(
            acted,
            vec![None, None, Some(1), None, None, Some(0), None, None, Some(1), None, None, Some(0)]
        );
        assert_eq!(control.tick_counter, 12);
    }

    #[test]
    fn test_advance_floors_zero_config() {
        let mut control = ResamplingControl {
            tick_interval: 0,
            slice_count: 0,
            ..Default::default()
        };
        assert_eq!(control.advance(), Some(0));
        assert_eq!(control.advance(), Some(0));
    }

    #[test]
    fn test_slice_ranges_partition_population() {
        let n = 103;
        let slices = 4;
        let mut covered = 0;
        let mut expected_start = 0;
        for s in 0..slices {
            let r = slice_range(n, s, slices);
            assert_eq!(r.start, expected_start);
            expected_start = r.end;
            covered += r.len();
        }
        assert_eq!(covered, n);
        assert_eq!(expected_start, n);
    }

    #[test]
    fn test_equal_weights_full_slice_keeps_positions() {
        let mut walkers = walkers_at(&[(0.0, 0.0, 1.0), (1.0, 0.0, 1.0), (0.0, 1.0, 1.0), (1.0, 1.0, 1.0)]);
        let before: Vec<Vec2> = walkers.iter().map(|w| w.position).collect();
        let mut resampler = Resampler::default();
        let outcome =
            resampler.resample_slice(&mut walkers, 0..4, 0.37, 0.0, &SimulationBounds::default());
        assert_eq!(outcome, SliceOutcome::Resampled { range_len: 4 });
        // Equal weights with a non-zero offset map sample i to walker i
        for (w, p) in walkers.iter().zip(&before) {
            assert_eq!(w.position, *p);
            assert_eq!(w.weight, 1.0);
        }
    }

    #[test]
    fn test_heavy_walker_dominates() {
        let mut walkers = walkers_at(&[(0.0, 0.0, 1e-6), (5.0, 5.0, 100.0), (1.0, 1.0, 1e-6), (2.0, 2.0, 1e-6)]);
        let mut resampler = Resampler::default();
        resampler.resample_slice(&mut walkers, 0..4, 0.5, 0.0, &SimulationBounds::default());
        assert!(walkers.iter().all(|w| w.position == Vec2::new(5.0, 5.0)));
    }

    #[test]
    fn test_only_slice_is_written() {
        let mut walkers = walkers_at(&[(0.0, 0.0, 0.0), (1.0, 0.0, 0.0), (2.0, 0.0, 10.0), (3.0, 0.0, 0.5)]);
        let untouched = walkers[2..].to_vec();
        let mut resampler = Resampler::default();
        resampler.resample_slice(&mut walkers, 0..2, 0.1, 0.0, &SimulationBounds::default());
        assert_eq!(&walkers[2..], &untouched[..]);
        assert!(walkers[..2].iter().all(|w| w.weight == 1.0));
        // Dead walkers cannot be ancestors
        assert!(walkers[..2].iter().all(|w| w.position.x >= 2.0));
    }

    #[test]
    fn test_zero_offset_skips_dead_leading_walker() {
        let mut walkers = walkers_at(&[(0.0, 0.0, 0.0), (1.0, 0.0, 1.0), (2.0, 0.0, 1.0)]);
        let mut resampler = Resampler::default();
        resampler.resample_slice(&mut walkers, 0..1, 0.0, 0.0, &SimulationBounds::default());
        assert_eq!(walkers[0].position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_zero_total_resets_slice_weights() {
        let mut walkers = walkers_at(&[(0.0, 0.0, 0.0), (1.0, 0.0, f32::NAN), (2.0, 0.0, 0.0)]);
        let mut resampler = Resampler::default();
        let outcome = resampler.resample_slice(&mut walkers, 1..3, 0.5, 0.0, &SimulationBounds::default());
        assert_eq!(outcome, SliceOutcome::WeightsReset { range_len: 2 });
        assert_eq!(walkers[0].weight, 0.0);
        assert_eq!(walkers[1].weight, 1.0);
        assert_eq!(walkers[2].weight, 1.0);
        assert_eq!(walkers[1].position, Vec2::new(1.0, 0.0));
    }

    #[test]
    fn test_jitter_stays_in_bounds() {
        let bounds = SimulationBounds::new(Vec2::ZERO, Vec2::splat(1.0));
        let mut walkers = walkers_at(&[(1.0, 1.0, 1.0); 64]);
        let mut resampler = Resampler::default();
        resampler.resample_slice(&mut walkers, 0..64, 0.2, 0.5, &bounds);
        assert!(walkers.iter().all(|w| bounds.contains(w.position)));
        assert!(walkers.iter().any(|w| w.position != Vec2::new(1.0, 1.0)));
    }
}
