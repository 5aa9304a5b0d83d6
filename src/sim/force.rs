//! Transient external force sources for the Langevin walk
//!
//! Owned by the host; this module only evaluates them.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::FORCE_EXPIRY_DECAYS;
use crate::smoothstep;

/// Radial push centered on a point, fading with distance and time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForceSource {
    pub center: Vec2,
    /// Full strength inside this radius
    pub inner_radius: f32,
    /// No effect beyond this radius
    pub outer_radius: f32,
    /// Positive pushes away from `center`, negative pulls toward it
    pub strength: f32,
    pub start_time: f32,
    pub decay_time_constant: f32,
}

impl ForceSource {
    #[inline]
    pub fn age(&self, now: f32) -> f32 {
        now - self.start_time
    }

    /// Old enough for the owner to drop it
    pub fn is_expired(&self, now: f32) -> bool {
        self.decay_time_constant <= 0.0 || self.age(now) > FORCE_EXPIRY_DECAYS * self.decay_time_constant
    }

    /// Force on a walker at `p` at time `now`
    pub fn force_at(&self, p: Vec2, now: f32) -> Vec2 {
        let age = self.age(now);
        if age < 0.0 || self.decay_time_constant <= 0.0 {
            return Vec2::ZERO;
        }
        let offset = p - self.center;
        let dist = offset.length();
        let falloff = 1.0 - smoothstep(self.inner_radius, self.outer_radius, dist);
        if falloff <= 0.0 {
            return Vec2::ZERO;
        }
        let decay = (-age / self.decay_time_constant).exp();
        offset.normalize_or_zero() * self.strength * falloff * decay
    }
}

/// Sum of every source's force at `p`
#[inline]
pub fn total_force(sources: &[ForceSource], p: Vec2, now: f32) -> Vec2 {
    sources.iter().map(|s| s.force_at(p, now)).sum()
}
