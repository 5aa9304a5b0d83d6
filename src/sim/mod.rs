//! Deterministic walker simulation
//!
//! All sampling logic lives here. This module must be pure and deterministic:
//! - Fixed imaginary-time step only
//! - Seeded RNG only (per-walker xorshift + one system PCG stream)
//! - Reductions summed in fixed chunk order
//! - No rendering or platform dependencies

pub mod boundary;
pub mod control;
pub mod density;
pub mod dmc;
pub mod force;
pub mod langevin;
pub mod orbital;
pub mod pool;
pub mod potential;
pub mod resample;
pub mod rng;
pub mod state;
pub mod tick;

pub use boundary::BoundaryMode;
pub use control::{ControlOutcome, WeightStats, update_reference_energy, weight_stats};
pub use density::{DensityField, DensityFieldConfig, OutOfBounds};
pub use dmc::{DmcStep, QuantumParams};
pub use force::ForceSource;
pub use langevin::{LangevinParams, LangevinStep};
pub use orbital::{OrbitalKind, OrbitalParams, score};
pub use pool::WorkerPool;
pub use potential::{PotentialKind, PotentialSpec};
pub use resample::{ResamplingControl, Resampler, SliceOutcome, slice_range};
pub use rng::{RNG_SENTINEL, WalkerRng};
pub use state::{Population, SimState, SimulationBounds, WalkMode, Walker};
pub use tick::{TickInput, TickReport, tick};
