//! Fixed-capacity debris particle pool
//!
//! Slots are handed out from a wrapping ring cursor. The pool never grows and
//! never refuses a spawn: when every slot is busy the oldest ones get reused.

use glam::Vec3;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::Color;

/// Downward acceleration on debris (units/s²)
pub const PARTICLE_GRAVITY: f32 = 20.0;
/// Particles falling below this height are recycled
pub const PARTICLE_FLOOR: f32 = -5.0;

/// A debris particle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub active: bool,
    pub pos: Vec3,
    pub vel: Vec3,
    pub rot: Vec3,
    pub rot_vel: Vec3,
    pub scale: f32,
    /// 1.0 at spawn, inactive at 0
    pub life: f32,
    pub color: Color,
}

impl Default for Particle {
    fn default() -> Self {
        Self {
            active: false,
            pos: Vec3::ZERO,
            vel: Vec3::ZERO,
            rot: Vec3::ZERO,
            rot_vel: Vec3::ZERO,
            scale: 0.0,
            life: 0.0,
            color: Color::WHITE,
        }
    }
}

impl Particle {
    /// Size to draw at, shrinking as the particle dies
    pub fn render_scale(&self) -> f32 {
        if self.active {
            self.scale * self.life
        } else {
            0.0
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParticlePool {
    particles: Vec<Particle>,
    /// Next slot to hand out
    cursor: usize,
    rng: Pcg32,
}

impl ParticlePool {
    pub fn new(capacity: usize, rng: Pcg32) -> Self {
        let capacity = capacity.max(1);
        Self {
            particles: vec![Particle::default(); capacity],
            cursor: 0,
            rng,
        }
    }

    pub fn capacity(&self) -> usize {
        self.particles.len()
    }

    /// All slots, active or not, for instanced renderers
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn active_count(&self) -> usize {
        self.particles.iter().filter(|p| p.active).count()
    }

    /// Deactivate everything
    pub fn clear(&mut self) {
        for p in &mut self.particles {
            *p = Particle::default();
        }
        self.cursor = 0;
    }

    /// Burst `count` particles out of `position`
    pub fn spawn(&mut self, position: Vec3, color: Color, count: u32) {
        let count = (count as usize).min(self.capacity());
        for _ in 0..count {
            let slot = self.cursor;
            self.cursor = (self.cursor + 1) % self.capacity();

            let rng = &mut self.rng;
            let vel = Vec3::new(
                rng.random_range(-5.0..5.0),
                rng.random_range(2.0..10.0),
                rng.random_range(-5.0..5.0),
            );
            let rot = Vec3::new(
                rng.random_range(0.0..std::f32::consts::PI),
                rng.random_range(0.0..std::f32::consts::PI),
                rng.random_range(0.0..std::f32::consts::PI),
            );
            let rot_vel = Vec3::new(
                rng.random_range(-6.0..6.0),
                rng.random_range(-6.0..6.0),
                rng.random_range(-6.0..6.0),
            );
            let scale = rng.random_range(0.2..0.7);

            self.particles[slot] = Particle {
                active: true,
                pos: position,
                vel,
                rot,
                rot_vel,
                scale,
                life: 1.0,
                color,
            };
        }
    }

    /// Advance every active particle.
    ///
    /// Motion is scaled by `time_scale`; life always drains on real `dt` so
    /// slow motion can't pin the pool full.
    pub fn advance(&mut self, dt: f32, time_scale: f32) {
        let sim_dt = dt * time_scale;
        for p in self.particles.iter_mut().filter(|p| p.active) {
            p.life -= dt;
            p.vel.y -= PARTICLE_GRAVITY * sim_dt;
            p.pos += p.vel * sim_dt;
            p.rot += p.rot_vel * sim_dt;

            if p.life <= 0.0 || p.pos.y < PARTICLE_FLOOR {
                p.active = false;
                p.life = 0.0;
            }
        }
    }
}
