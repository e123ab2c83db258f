//! Effect commands emitted by the simulation
//!
//! The resolver never calls the particle pool, audio or haptics directly. It
//! pushes commands here and the session drains them once per frame.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::Color;

/// One-shot sounds the simulation can ask for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SoundCue {
    BrittleBreak,
    FrozenBreak,
    /// Game-over sting
    Terminal,
}

/// Semantic haptic strength, mapped to a device pattern by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HapticImpact {
    Light,
    Medium,
    Heavy,
    Success,
}

/// Something the outside world should react to
#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    SpawnParticles { position: Vec3, color: Color, count: u32 },
    PlaySound { cue: SoundCue, pitch: f32 },
    Haptic(HapticImpact),
    /// An obstacle was shattered
    Shattered { id: u32, points: u64, combo: u32 },
    FeverStarted,
    /// Combo dropped to zero (idle, damage or miss)
    ComboLost { combo: u32 },
    LifeLost { life: u8 },
    LifeRestored { life: u8 },
    GameOver { score: u64, max_combo: u32 },
}

/// Per-frame command queue
#[derive(Debug, Default)]
pub struct EffectQueue {
    events: Vec<GameEvent>,
}

impl EffectQueue {
    pub fn new() -> Self {
        Self {
            events: Vec::with_capacity(32),
        }
    }

    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Take every queued command in emission order
    pub fn drain(&mut self) -> std::vec::Drain<'_, GameEvent> {
        self.events.drain(..)
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Inspect without draining
    pub fn iter(&self) -> impl Iterator<Item = &GameEvent> {
        self.events.iter()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Remove and return only the particle spawn commands
    pub fn take_particle_spawns(&mut self) -> Vec<(Vec3, Color, u32)> {
        let mut spawns = Vec::new();
        self.events.retain(|event| match *event {
            GameEvent::SpawnParticles {
                position,
                color,
                count,
            } => {
                spawns.push((position, color, count));
                false
            }
            _ => true,
        });
        spawns
    }
}
