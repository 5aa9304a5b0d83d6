//! Simulation settings and presets
//!
//! Persisted as JSON next to the host application.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::consts::MIN_DELTA_TAU;
use crate::error::SimError;
use crate::sim::{
    DensityFieldConfig, LangevinParams, OrbitalParams, PotentialSpec, QuantumParams,
    ResamplingControl, SimulationBounds, WalkMode,
};

/// Quality preset levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum QualityPreset {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityPreset {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityPreset::Low => "Low",
            QualityPreset::Medium => "Medium",
            QualityPreset::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityPreset::Low),
            "medium" | "med" => Some(QualityPreset::Medium),
            "high" => Some(QualityPreset::High),
            _ => None,
        }
    }

    /// Walker count for this preset
    pub fn population(&self) -> usize {
        match self {
            QualityPreset::Low => 10_000,
            QualityPreset::Medium => 200_000,
            QualityPreset::High => 1_000_000,
        }
    }

    /// Density grid edge length for this preset
    pub fn grid_size(&self) -> u32 {
        match self {
            QualityPreset::Low => 64,
            QualityPreset::Medium => 128,
            QualityPreset::High => 256,
        }
    }
}

/// Complete in-memory configuration supplied by the host
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Run seed
    pub seed: u64,
    /// Population/grid preset
    pub quality: QualityPreset,
    /// Explicit walker count (overrides the preset)
    pub population: Option<usize>,
    /// Worker threads (0 = one per core)
    pub worker_count: usize,
    /// Standard deviation of the initial walker cloud
    pub initial_spread: f32,

    pub walk_mode: WalkMode,
    pub bounds: SimulationBounds,
    pub orbital: OrbitalParams,
    pub quantum: QuantumParams,
    pub potential: PotentialSpec,
    pub resampling: ResamplingControl,
    pub density: DensityFieldConfig,
    pub langevin: LangevinParams,
}

impl Default for Settings {
    fn default() -> Self {
        let quality = QualityPreset::Medium;
        Self {
            seed: 0x5EED,
            quality,
            population: None,
            worker_count: 0,
            initial_spread: 1.0,

            walk_mode: WalkMode::Diffusion,
            bounds: SimulationBounds::default(),
            orbital: OrbitalParams::default(),
            quantum: QuantumParams::default(),
            potential: PotentialSpec::harmonic(1.0),
            resampling: ResamplingControl::default(),
            density: DensityFieldConfig {
                width: quality.grid_size(),
                height: quality.grid_size(),
                ..Default::default()
            },
            langevin: LangevinParams::default(),
        }
    }
}

impl Settings {
    /// Create settings from a quality preset (applies preset defaults)
    pub fn from_preset(preset: QualityPreset) -> Self {
        let mut settings = Self::default();
        settings.apply_preset(preset);
        settings
    }

    /// Apply a quality preset (updates grid size; population follows unless overridden)
    pub fn apply_preset(&mut self, preset: QualityPreset) {
        self.quality = preset;
        self.density.width = preset.grid_size();
        self.density.height = preset.grid_size();
        log::info!("Quality preset {}", preset.as_str());
    }

    /// Effective walker count
    pub fn population_size(&self) -> usize {
        self.population.unwrap_or_else(|| self.quality.population())
    }

    /// Copy with every field floored/clamped into its safe range
    pub fn sanitized(&self) -> Self {
        let mut s = self.clone();

        if !(s.quantum.delta_tau.is_finite() && s.quantum.delta_tau >= MIN_DELTA_TAU) {
            log::warn!("delta_tau {} floored to {}", s.quantum.delta_tau, MIN_DELTA_TAU);
            s.quantum.delta_tau = s.quantum.effective_delta_tau();
        }
        if !(s.quantum.diffusion.is_finite() && s.quantum.diffusion >= 0.0) {
            log::warn!("diffusion {} floored to 0", s.quantum.diffusion);
            s.quantum.diffusion = s.quantum.effective_diffusion();
        }
        if !s.quantum.reference_energy.is_finite() {
            log::warn!("reference_energy {} reset to 0", s.quantum.reference_energy);
            s.quantum.reference_energy = 0.0;
        }
        if s.resampling.tick_interval == 0 {
            log::warn!("tick_interval 0 floored to 1");
            s.resampling.tick_interval = 1;
        }
        if s.resampling.slice_count == 0 {
            log::warn!("slice_count 0 floored to 1");
            s.resampling.slice_count = 1;
        }
        if !(s.resampling.clone_jitter_sigma.is_finite() && s.resampling.clone_jitter_sigma >= 0.0) {
            log::warn!("clone jitter {} reset to 0", s.resampling.clone_jitter_sigma);
            s.resampling.clone_jitter_sigma = 0.0;
        }
        if s.density.width == 0 || s.density.height == 0 {
            log::warn!("density grid {}x{} floored to 1", s.density.width, s.density.height);
            s.density.width = s.density.width.max(1);
            s.density.height = s.density.height.max(1);
        }
        let max_blur = s.density.width.max(s.density.height) as f32;
        let blur = if s.density.blur_sigma.is_finite() { s.density.blur_sigma.clamp(0.0, max_blur) } else { 0.0 };
        if blur != s.density.blur_sigma {
            log::warn!("blur sigma {} clamped to {}", s.density.blur_sigma, blur);
            s.density.blur_sigma = blur;
        }
        let damping = if s.langevin.damping.is_finite() { s.langevin.damping.clamp(0.0, 1.0) } else { 0.0 };
        if damping != s.langevin.damping {
            log::warn!("damping {} clamped to {}", s.langevin.damping, damping);
            s.langevin.damping = damping;
        }
        if !(s.initial_spread.is_finite() && s.initial_spread >= 0.0) {
            log::warn!("initial spread {} reset to 0", s.initial_spread);
            s.initial_spread = 0.0;
        }
        if !(s.orbital.length_scale.is_finite() && s.orbital.length_scale > 0.0) {
            log::warn!("orbital length scale {} reset to 1", s.orbital.length_scale);
            s.orbital.length_scale = 1.0;
        }

        s
    }

    /// Load settings from a JSON file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        let settings = serde_json::from_str(&json)?;
        log::info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Save settings as pretty JSON
    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<(), SimError> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| SimError::io(path, e))?;
        log::info!("Settings saved to {}", path.display());
        Ok(())
    }
}
