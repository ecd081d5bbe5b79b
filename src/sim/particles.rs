//! Decorative particle bursts
//!
//! Particles never read or write gameplay state; the tick loop only feeds
//! them an origin and its dedicated RNG stream.

use glam::Vec2;
use rand::Rng;

use crate::consts::*;

/// A particle for visual effects
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub pos: Vec2,
    pub vel: Vec2,
    /// 0-1, decreases over time
    pub life: f32,
    /// Palette index for color lookup
    pub color: u32,
}

/// Live particles with a hard cap on their number
#[derive(Debug, Clone, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    max: usize,
}

impl ParticleSystem {
    pub fn new(max: usize) -> Self {
        Self {
            particles: Vec::new(),
            max,
        }
    }

    /// Emit `count` particles radiating evenly from `origin`
    ///
    /// Speed is drawn per particle from `[BURST_MIN_SPEED, BURST_MAX_SPEED)`.
    /// When the cap is exceeded the oldest particles are dropped.
    pub fn emit<R: Rng>(&mut self, origin: Vec2, count: usize, rng: &mut R) {
        if self.max == 0 || count == 0 {
            return;
        }

        for i in 0..count {
            let angle = std::f32::consts::TAU * i as f32 / count as f32;
            let speed = rng.random_range(BURST_MIN_SPEED..BURST_MAX_SPEED);
            self.particles.push(Particle {
                pos: origin,
                vel: Vec2::new(angle.cos(), angle.sin()) * speed,
                life: 1.0,
                color: rng.random_range(0..PARTICLE_COLORS),
            });
        }

        let overflow = self.particles.len().saturating_sub(self.max);
        if overflow > 0 {
            self.particles.drain(..overflow);
        }
    }

    /// Ballistic motion and decay; exhausted particles are removed
    pub fn advance(&mut self) {
        for p in &mut self.particles {
            p.pos += p.vel;
            p.vel.y += PARTICLE_GRAVITY;
            p.life -= PARTICLE_DECAY;
        }
        self.particles.retain(|p| p.life > 0.0);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Particle> {
        self.particles.iter()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Change the cap; live particles beyond it are dropped oldest first
    pub fn set_limit(&mut self, max: usize) {
        self.max = max;
        let overflow = self.particles.len().saturating_sub(max);
        self.particles.drain(..overflow);
    }
}
