//! Density grid rasterizer
//!
//! Walkers are bilinearly splatted into per-chunk private grids, which are
//! then summed cell by cell into the back buffer. The back buffer is
//! optionally blurred and then swapped to the front, so readers only ever see
//! a fully reduced grid.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use super::pool::chunk_len;
use super::state::{SimulationBounds, Walker};

/// What happens to walkers outside the bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum OutOfBounds {
    #[default]
    Drop,
    /// Snap to the nearest in-bounds point
    Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DensityFieldConfig {
    pub enabled: bool,
    pub width: u32,
    pub height: u32,
    /// Offset for log-domain post-processing downstream
    pub epsilon: f32,
    pub out_of_bounds: OutOfBounds,
    /// Gaussian blur sigma in cells; <= 0 disables the blur
    pub blur_sigma: f32,
}

impl Default for DensityFieldConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            width: 128,
            height: 128,
            epsilon: 1.0e-6,
            out_of_bounds: OutOfBounds::Drop,
            blur_sigma: 0.0,
        }
    }
}

/// Double-buffered W×H accumulated-weight grid
#[derive(Debug, Clone, Default)]
pub struct DensityField {
    width: usize,
    height: usize,
    front: Vec<f32>,
    back: Vec<f32>,
    partials: Vec<Vec<f32>>,
    scratch: Vec<f32>,
}

impl DensityField {
    pub fn new(width: u32, height: u32) -> Self {
        let (width, height) = (width.max(1) as usize, height.max(1) as usize);
        Self {
            width,
            height,
            front: vec![0.0; width * height],
            back: vec![0.0; width * height],
            partials: Vec::new(),
            scratch: Vec::new(),
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Published grid, row-major (`y * width + x`)
    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.front
    }

    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x < self.width && y < self.height {
            self.front.get(y * self.width + x).copied()
        } else {
            None
        }
    }

    /// Sum over all published cells
    pub fn total_mass(&self) -> f64 {
        self.front.iter().map(|&v| v as f64).sum()
    }

    /// Raw grid bytes for a texture upload
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.front)
    }

    /// `ln(v + eps) - ln(eps)` rescaled to [0, 1] by the grid maximum
    pub fn log_normalized(&self, epsilon: f32) -> Vec<f32> {
        let eps = if epsilon.is_finite() && epsilon > 0.0 { epsilon } else { f32::MIN_POSITIVE };
        let base = eps.ln();
        let logs: Vec<f32> = self
            .front
            .par_iter()
            .map(|&v| (v.max(0.0) + eps).ln() - base)
            .collect();
        let max = logs.iter().copied().fold(0.0f32, f32::max);
        if max > 0.0 {
            logs.into_iter().map(|v| v / max).collect()
        } else {
            vec![0.0; logs.len()]
        }
    }

    /// `log_normalized` with the configured epsilon
    pub fn log_normalized_with(&self, config: &DensityFieldConfig) -> Vec<f32> {
        self.log_normalized(config.epsilon)
    }

    /// Rebuild the grid from `walkers` and publish it
    pub fn build(
        &mut self,
        walkers: &[Walker],
        bounds: &SimulationBounds,
        config: &DensityFieldConfig,
        workers: usize,
    ) {
        self.width = config.width.max(1) as usize;
        self.height = config.height.max(1) as usize;
        let (w, h) = (self.width, self.height);
        let cells = w * h;

        // Scatter: one private grid per chunk
        let chunk = chunk_len(walkers.len(), workers);
        let chunks = walkers.len().div_ceil(chunk);
        self.partials.resize_with(chunks, Vec::new);
        let oob = config.out_of_bounds;
        self.partials
            .par_iter_mut()
            .zip(walkers.par_chunks(chunk))
            .for_each(|(grid, chunk)| {
                grid.clear();
                grid.resize(cells, 0.0);
                for walker in chunk {
                    splat(grid, w, h, bounds, walker, oob);
                }
            });

        // Reduce
        self.back.clear();
        self.back.resize(cells, 0.0);
        let partials = &self.partials;
        self.back
            .par_iter_mut()
            .enumerate()
            .for_each(|(i, cell)| *cell = partials.iter().map(|p| p[i]).sum());

        if let Some(kernel) = gaussian_kernel(config.blur_sigma, w.max(h)) {
            blur_separable(&mut self.back, &mut self.scratch, w, h, &kernel);
        }

        std::mem::swap(&mut self.front, &mut self.back);
    }
}

/// Bilinear splat of one walker into `grid`
fn splat(grid: &mut [f32], w: usize, h: usize, bounds: &SimulationBounds, walker: &Walker, oob: OutOfBounds) {
    let weight = walker.weight;
    if !weight.is_finite() || weight <= 0.0 || !walker.position.is_finite() {
        return;
    }
    let p = if bounds.contains(walker.position) {
        walker.position
    } else {
        match oob {
            OutOfBounds::Drop => return,
            OutOfBounds::Clamp => bounds.clamp(walker.position),
        }
    };

    let min = bounds.min();
    let size = bounds.size();
    // Continuous cell coordinates with cell centers at integer + 0.5
    let gx = if size.x > 0.0 { (p.x - min.x) / size.x * w as f32 - 0.5 } else { 0.0 };
    let gy = if size.y > 0.0 { (p.y - min.y) / size.y * h as f32 - 0.5 } else { 0.0 };

    let (x0, fx) = (gx.floor(), gx - gx.floor());
    let (y0, fy) = (gy.floor(), gy - gy.floor());
    let clamp_x = |i: f32| (i.max(0.0) as usize).min(w - 1);
    let clamp_y = |i: f32| (i.max(0.0) as usize).min(h - 1);
    let (xa, xb) = (clamp_x(x0), clamp_x(x0 + 1.0));
    let (ya, yb) = (clamp_y(y0), clamp_y(y0 + 1.0));

    grid[ya * w + xa] += weight * (1.0 - fx) * (1.0 - fy);
    grid[ya * w + xb] += weight * fx * (1.0 - fy);
    grid[yb * w + xa] += weight * (1.0 - fx) * fy;
    grid[yb * w + xb] += weight * fx * fy;
}

/// Normalized 1D Gaussian taps, radius ceil(3σ).
///
/// σ is capped at `max_sigma` cells; `None` when σ is non-positive,
/// non-finite, or so small that `2σ²` is not a normal float.
fn gaussian_kernel(sigma: f32, max_sigma: usize) -> Option<Vec<f32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return None;
    }
    let sigma = sigma.min(max_sigma.max(1) as f32);
    let two_sigma_sq = 2.0 * sigma * sigma;
    if !two_sigma_sq.is_normal() {
        return None;
    }
    let radius = (3.0 * sigma).ceil().max(1.0) as i32;
    let mut taps: Vec<f32> = (-radius..=radius)
        .map(|k| (-(k * k) as f32 / two_sigma_sq).exp())
        .collect();
    let sum: f32 = taps.iter().sum();
    taps.iter_mut().for_each(|t| *t /= sum);
    Some(taps)
}

/// Horizontal then vertical pass, clamp-to-edge
fn blur_separable(grid: &mut [f32], scratch: &mut Vec<f32>, w: usize, h: usize, kernel: &[f32]) {
    let radius = (kernel.len() / 2) as isize;
    scratch.clear();
    scratch.resize(w * h, 0.0);

    let src = &*grid;
    scratch.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            *out = kernel
                .iter()
                .enumerate()
                .map(|(k, &tap)| {
                    let sx = (x as isize + k as isize - radius).clamp(0, w as isize - 1) as usize;
                    src[y * w + sx] * tap
                })
                .sum();
        }
    });

    let src = &*scratch;
    grid.par_chunks_mut(w).enumerate().for_each(|(y, row)| {
        for (x, out) in row.iter_mut().enumerate() {
            *out = kernel
                .iter()
                .enumerate()
                .map(|(k, &tap)| {
                    let sy = (y as isize + k as isize - radius).clamp(0, h as isize - 1) as usize;
                    src[sy * w + x] * tap
                })
                .sum();
        }
    });
}
