//! Quantum Walkers headless host
//!
//! Usage: `quantum-walkers [settings.json] [ticks]`
//!
//! Loads settings (writing defaults if the file does not exist yet), then
//! runs the tick loop and logs population statistics. Set `RUST_LOG=debug`
//! for per-tick output.

use std::path::PathBuf;
use std::time::Instant;

use quantum_walkers::Settings;
use quantum_walkers::SimError;
use quantum_walkers::sim::{SimState, TickInput, WorkerPool, tick};

const DEFAULT_TICKS: u64 = 2_000;
const REPORT_EVERY: u64 = 200;

fn main() -> Result<(), SimError> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut args = std::env::args().skip(1);
    let settings_path = args.next().map(PathBuf::from);
    let ticks = args
        .next()
        .and_then(|s| s.parse::<u64>().ok())
        .unwrap_or(DEFAULT_TICKS);

    let settings = match &settings_path {
        Some(path) if path.exists() => Settings::load_from(path)?,
        Some(path) => {
            let settings = Settings::default();
            settings.save_to(path)?;
            settings
        }
        None => Settings::default(),
    };

    let pool = WorkerPool::new(settings.worker_count)?;
    let mut state = SimState::new(&settings);
    let input = TickInput::default();

    log::info!(
        "Running {} ticks: {} walkers, Δτ={}, mode {:?}",
        ticks,
        state.population.len(),
        state.quantum.effective_delta_tau(),
        state.walk_mode
    );

    let started = Instant::now();
    let mut collapses = 0u64;
    for _ in 0..ticks {
        let report = tick(&mut state, &input, &pool);
        if report.collapsed {
            collapses += 1;
        }
        if report.tick % REPORT_EVERY == 0 {
            log::info!(
                "tick {:>6}  t={:.3}  E_ref={:+.5}  mean_w={:.4}  alive={}/{}",
                report.tick,
                state.time,
                report.reference_energy,
                report.stats.mean,
                report.stats.positive_count,
                report.stats.particle_count
            );
        }
    }

    let elapsed = started.elapsed().as_secs_f64();
    log::info!(
        "Done: {} ticks in {:.2}s ({:.1} ticks/s), {} collapses, density mass {:.3}",
        ticks,
        elapsed,
        ticks as f64 / elapsed.max(1e-9),
        collapses,
        state.density.total_mass()
    );

    Ok(())
}
