//! Per-walker xorshift32 generator
//!
//! Each walker carries its own 32-bit state so that parallel passes stay
//! deterministic regardless of how work is split across threads. Zero and
//! all-ones are never stored: any such state is replaced by `RNG_SENTINEL`
//! immediately after it is produced.

use glam::Vec2;

/// Replacement for absorbing generator states
pub const RNG_SENTINEL: u32 = 0x9E37_79B9;

/// Smallest first uniform fed to Box-Muller (keeps `ln` finite)
const MIN_BOX_MULLER_UNIFORM: f32 = 1.0e-7;

/// Map absorbing states to the sentinel
#[inline]
pub fn sanitize_state(state: u32) -> u32 {
    if state == 0 || state == u32::MAX {
        RNG_SENTINEL
    } else {
        state
    }
}

/// Borrowed view over a walker's persisted generator state
#[derive(Debug)]
pub struct WalkerRng<'a> {
    state: &'a mut u32,
}

impl<'a> WalkerRng<'a> {
    pub fn new(state: &'a mut u32) -> Self {
        *state = sanitize_state(*state);
        Self { state }
    }

    /// Advance and return the new state
    #[inline]
    pub fn next_u32(&mut self) -> u32 {
        let mut x = *self.state;
        x ^= x << 13;
        x ^= x >> 17;
        x ^= x << 5;
        let x = sanitize_state(x);
        *self.state = x;
        x
    }

    /// Uniform in [0, 1) from the top 24 bits
    #[inline]
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 * (1.0 / (1u32 << 24) as f32)
    }

    /// Standard normal pair via Box-Muller (two uniforms per 2D kick)
    #[inline]
    pub fn gaussian2(&mut self) -> Vec2 {
        let u1 = self.next_f32().max(MIN_BOX_MULLER_UNIFORM);
        let u2 = self.next_f32();
        let r = (-2.0 * u1.ln()).sqrt();
        let theta = std::f32::consts::TAU * u2;
        Vec2::new(r * theta.cos(), r * theta.sin())
    }
}
