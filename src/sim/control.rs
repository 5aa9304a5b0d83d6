//! Adaptive reference energy controller
//!
//! Integral control on ln(mean weight): the reference energy is nudged each
//! tick so the mean finite positive walker weight settles near 1.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::pool::chunk_len;
use super::state::Walker;
use crate::consts::{
    COLLAPSE_ENERGY_BOOST, MAX_CONTROLLER_GAIN, MAX_ENERGY_STEP, MIN_CONTROLLER_GAIN,
    MIN_MEAN_WEIGHT,
};

/// Aggregate weight statistics for health displays
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightStats {
    /// Sum of finite, positive weights
    pub total: f64,
    /// `total / positive_count` (0 when nothing is alive)
    pub mean: f64,
    pub positive_count: usize,
    pub particle_count: usize,
}

/// What the controller did this tick
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlOutcome {
    Adjusted { delta_e: f32 },
    /// Total weight <= 0; reference energy pushed up by `boost`
    Collapsed { boost: f32 },
}

/// Parallel sum over per-chunk partial accumulators
pub fn weight_stats(walkers: &[Walker], width: usize) -> WeightStats {
    let chunk = chunk_len(walkers.len(), width);
    let partials: Vec<(f64, usize)> = walkers
        .par_chunks(chunk)
        .map(|chunk| {
            chunk
                .iter()
                .filter(|w| w.weight.is_finite() && w.weight > 0.0)
                .fold((0.0f64, 0usize), |(sum, n), w| (sum + w.weight as f64, n + 1))
        })
        .collect();

    let (total, positive_count) = partials
        .iter()
        .fold((0.0, 0), |(sum, n), &(s, c)| (sum + s, n + c));
    let mean = if positive_count > 0 {
        total / positive_count as f64
    } else {
        0.0
    };

    WeightStats {
        total,
        mean,
        positive_count,
        particle_count: walkers.len(),
    }
}

/// Clamp kappa into the stable gain range
#[inline]
pub fn effective_gain(kappa: f32) -> f32 {
    if kappa.is_finite() {
        kappa.clamp(MIN_CONTROLLER_GAIN, MAX_CONTROLLER_GAIN)
    } else {
        MIN_CONTROLLER_GAIN
    }
}

/// Apply one controller update to `reference_energy`
pub fn update_reference_energy(
    reference_energy: &mut f32,
    stats: &WeightStats,
    delta_tau: f32,
    kappa: f32,
) -> ControlOutcome {
    if stats.total <= 0.0 || !stats.total.is_finite() {
        let boost = COLLAPSE_ENERGY_BOOST / delta_tau;
        *reference_energy += boost;
        return ControlOutcome::Collapsed { boost };
    }

    let gain = effective_gain(kappa) as f64;
    let limit = MAX_ENERGY_STEP / delta_tau;
    let delta_e = (-gain * stats.mean.max(MIN_MEAN_WEIGHT).ln() / delta_tau as f64) as f32;
    let delta_e = delta_e.clamp(-limit, limit);
    *reference_energy += delta_e;
    ControlOutcome::Adjusted { delta_e }
}
