//! Obstacle spawning and resolution
//!
//! Owns every live obstacle. Each frame, in strict order:
//! 1. spawn one obstacle if the look-ahead window has room
//! 2. resolve hits, collisions and misses (at most once per obstacle)
//! 3. drop obstacles that scrolled behind the player
//! 4. decay an idle combo

use rand::Rng;
use rand_pcg::Pcg32;

use super::events::{EffectQueue, GameEvent, HapticImpact, SoundCue};
use super::obstacle::{Obstacle, ObstacleKind, SizeClass};
use super::state::GameState;
use crate::FEVER_PALETTE;
use crate::consts::*;
use crate::tuning::Tuning;

const SPAWN_RNG_SALT: u64 = 0x5057_4e52;

/// The set of live obstacles and the spawn cursor
#[derive(Debug, Clone)]
pub struct ObstacleField {
    obstacles: Vec<Obstacle>,
    /// Z of the most recently spawned obstacle
    last_spawn_z: f32,
    rng: Pcg32,
}

impl ObstacleField {
    /// Create a field with the opening obstacles already placed
    pub fn new(state: &mut GameState, tuning: &Tuning) -> Self {
        let mut field = Self {
            obstacles: Vec::new(),
            last_spawn_z: 0.0,
            rng: state.rng_state.fork(SPAWN_RNG_SALT),
        };
        field.reset(state, tuning);
        field
    }

    /// Clear the field and lay out the opening obstacles
    pub fn reset(&mut self, state: &mut GameState, tuning: &Tuning) {
        self.obstacles.clear();
        self.last_spawn_z = 0.0;
        for i in 1..=tuning.initial_obstacles {
            let z = -(i as f32) * tuning.spawn_interval;
            let obstacle = self.create_obstacle(z, state, tuning);
            self.obstacles.push(obstacle);
            self.last_spawn_z = z;
        }
    }

    /// Live obstacles, for renderers
    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn len(&self) -> usize {
        self.obstacles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.obstacles.is_empty()
    }

    pub fn last_spawn_z(&self) -> f32 {
        self.last_spawn_z
    }

    /// Swap in a hand-built field and stop spawning near the start
    #[cfg(test)]
    pub(crate) fn replace_obstacles(&mut self, obstacles: Vec<Obstacle>) {
        self.obstacles = obstacles;
        self.last_spawn_z = -1000.0;
    }

    /// Run one frame of spawn, resolve, cleanup and decay
    pub fn update(&mut self, state: &mut GameState, tuning: &Tuning, events: &mut EffectQueue) {
        if !state.is_running() {
            return;
        }
        let now = state.clock;

        self.spawn(state, tuning);
        self.resolve(now, state, tuning, events);
        self.cleanup(state.player_z, tuning);
        self.decay_combo(now, state, tuning, events);
    }

    /// Spacing to the next obstacle; fever doubles density
    fn spawn_interval(state: &GameState, tuning: &Tuning) -> f32 {
        if state.is_fever && state.combo >= FEVER_COMBO {
            tuning.spawn_interval * 0.5
        } else {
            tuning.spawn_interval
        }
    }

    fn spawn(&mut self, state: &mut GameState, tuning: &Tuning) {
        if state.player_z >= self.last_spawn_z + tuning.spawn_distance {
            return;
        }
        let z = self.last_spawn_z - Self::spawn_interval(state, tuning);
        let obstacle = self.create_obstacle(z, state, tuning);
        log::trace!(
            "Spawned obstacle {} lane {} at z={:.1}",
            obstacle.id,
            obstacle.lane,
            z
        );
        self.obstacles.push(obstacle);
        self.last_spawn_z = z;
    }

    fn create_obstacle(&mut self, z: f32, state: &mut GameState, tuning: &Tuning) -> Obstacle {
        let lane = self.rng.random_range(MIN_LANE..=MAX_LANE);
        let size = if self.rng.random_bool(tuning.large_chance) {
            SizeClass::Large
        } else {
            SizeClass::Normal
        };
        let kind = if self.rng.random_bool(tuning.brittle_chance) {
            ObstacleKind::Brittle
        } else {
            ObstacleKind::Frozen
        };
        let tint = if state.is_fever {
            Some(FEVER_PALETTE[self.rng.random_range(0..FEVER_PALETTE.len())])
        } else {
            None
        };

        Obstacle {
            id: state.next_entity_id(),
            lane,
            z,
            kind,
            size,
            tint,
            resolved: false,
        }
    }

    fn resolve(
        &mut self,
        now: f64,
        state: &mut GameState,
        tuning: &Tuning,
        events: &mut EffectQueue,
    ) {
        let mut i = 0;
        while i < self.obstacles.len() {
            if state.is_game_over {
                break;
            }
            let obstacle = &mut self.obstacles[i];
            if obstacle.resolved {
                i += 1;
                continue;
            }

            let same_lane = obstacle.lane == state.player_lane;
            let distance = (obstacle.z - state.player_z).abs();
            let in_reach = same_lane && distance < obstacle.collision_radius();

            if in_reach && state.is_attacking {
                obstacle.resolved = true;
                let obstacle = self.obstacles.remove(i);
                Self::shatter(&obstacle, now, state, tuning, events);
                continue;
            }

            if in_reach {
                let combo = state.combo;
                if state.apply_damage(now, tuning) {
                    obstacle.resolved = true;
                    events.push(GameEvent::LifeLost { life: state.life });
                    events.push(GameEvent::Haptic(HapticImpact::Heavy));
                    if combo > 0 {
                        events.push(GameEvent::ComboLost { combo });
                    }
                }
            } else if obstacle.z > state.player_z + tuning.miss_margin {
                obstacle.resolved = true;
                if !state.is_fever {
                    if state.combo > 0 {
                        log::debug!("Missed obstacle {}, combo {} lost", obstacle.id, state.combo);
                        events.push(GameEvent::ComboLost { combo: state.combo });
                    }
                    state.reset_combo();
                }
            }
            i += 1;
        }
    }

    /// Scoring update and destruction effects for a hit obstacle
    fn shatter(
        obstacle: &Obstacle,
        now: f64,
        state: &mut GameState,
        tuning: &Tuning,
        events: &mut EffectQueue,
    ) {
        let outcome = state.register_hit(now, tuning);

        events.push(GameEvent::Shattered {
            id: obstacle.id,
            points: outcome.points,
            combo: outcome.combo,
        });
        events.push(GameEvent::SpawnParticles {
            position: obstacle.position(),
            color: obstacle.color(),
            count: tuning.shatter_particles * obstacle.size.multiplier() as u32,
        });
        let cue = match obstacle.kind {
            ObstacleKind::Brittle => SoundCue::BrittleBreak,
            ObstacleKind::Frozen => SoundCue::FrozenBreak,
        };
        events.push(GameEvent::PlaySound {
            cue,
            pitch: state.pitch_factor(),
        });
        events.push(GameEvent::Haptic(match obstacle.size {
            SizeClass::Normal => HapticImpact::Light,
            SizeClass::Large => HapticImpact::Medium,
        }));

        if outcome.entered_fever {
            log::info!("Fever! combo {}", outcome.combo);
            events.push(GameEvent::FeverStarted);
            events.push(GameEvent::Haptic(HapticImpact::Success));
        }
        if outcome.life_restored {
            events.push(GameEvent::LifeRestored { life: state.life });
            events.push(GameEvent::Haptic(HapticImpact::Success));
        }
    }

    fn cleanup(&mut self, player_z: f32, tuning: &Tuning) {
        let limit = player_z + tuning.cleanup_buffer;
        self.obstacles.retain(|o| o.z <= limit);
    }

    fn decay_combo(
        &mut self,
        now: f64,
        state: &mut GameState,
        tuning: &Tuning,
        events: &mut EffectQueue,
    ) {
        if state.combo > 0 && now - state.last_hit_time > tuning.idle_combo_timeout {
            log::debug!("Combo {} decayed after idling", state.combo);
            events.push(GameEvent::ComboLost { combo: state.combo });
            state.reset_combo();
        }
    }
}
