//! Per-frame simulation step
//!
//! Advances motion, obstacles and particles in a fixed order. Audio, haptics
//! and storage are not touched here; their commands stay in the effect queue
//! for the session to dispatch.

use rand_pcg::Pcg32;

use super::events::{EffectQueue, GameEvent, SoundCue};
use super::motion::{InputEvent, MotionController};
use super::particles::ParticlePool;
use super::spawner::ObstacleField;
use super::state::GameState;
use crate::consts::MAX_FRAME_DT;
use crate::tuning::Tuning;

const PARTICLE_RNG_SALT: u64 = 0x5041_5254;
/// Longest forward move in one sub-step; half the smallest collision
/// diameter (2 * 1.0)
const MAX_STEP_TRAVEL: f32 = 1.0;

/// Input commands for a single frame
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    /// Gameplay events in arrival order
    pub events: Vec<InputEvent>,
    /// Pause toggle
    pub pause: bool,
}

/// Everything the simulation owns besides `GameState`
#[derive(Debug, Clone)]
pub struct World {
    pub field: ObstacleField,
    pub particles: ParticlePool,
    pub motion: MotionController,
}

impl World {
    pub fn new(state: &mut GameState, tuning: &Tuning, particle_capacity: usize) -> Self {
        let rng: Pcg32 = state.rng_state.fork(PARTICLE_RNG_SALT);
        Self {
            field: ObstacleField::new(state, tuning),
            particles: ParticlePool::new(particle_capacity, rng),
            motion: MotionController::new(),
        }
    }

    /// Back to the opening layout for a fresh session
    pub fn reset(&mut self, state: &mut GameState, tuning: &Tuning) {
        self.field.reset(state, tuning);
        self.particles.clear();
        self.motion.reset();
    }
}

/// Advance the session by one frame of `dt` real seconds
pub fn tick(
    state: &mut GameState,
    world: &mut World,
    tuning: &Tuning,
    input: &TickInput,
    events: &mut EffectQueue,
    dt: f32,
) {
    if input.pause && !state.is_game_over {
        state.is_paused = !state.is_paused;
        log::info!("{}", if state.is_paused { "Paused" } else { "Resumed" });
    }

    for event in &input.events {
        world.motion.push_input(*event);
    }

    // Don't tick if paused or game over
    if !state.is_running() {
        world.motion.update(state, tuning, 0.0);
        return;
    }

    let dt = dt.clamp(0.0, MAX_FRAME_DT);

    // Split the frame so no step jumps over an obstacle's reach
    let travel = state.speed * state.time_scale * dt;
    let steps = (travel / MAX_STEP_TRAVEL).ceil().max(1.0) as u32;
    let step_dt = dt / steps as f32;
    for _ in 0..steps {
        state.clock += step_dt as f64;
        state.tick_timers(step_dt);

        world.motion.update(state, tuning, step_dt);
        world.field.update(state, tuning, events);
        state.settle();
        if state.is_game_over {
            break;
        }
    }

    if state.is_game_over {
        log::info!(
            "Game over: score {} (best combo {})",
            state.score,
            state.max_combo
        );
        events.push(GameEvent::PlaySound {
            cue: SoundCue::Terminal,
            pitch: 1.0,
        });
        events.push(GameEvent::GameOver {
            score: state.score,
            max_combo: state.max_combo,
        });
    }

    for (position, color, count) in events.take_particle_spawns() {
        world.particles.spawn(position, color, count);
    }
    world.particles.advance(dt, state.time_scale);
}

/// Deterministic session for tests and the headless runner
pub fn new_session(seed: u64, tuning: &Tuning, particle_capacity: usize) -> (GameState, World) {
    let mut state = GameState::new(seed);
    let world = World::new(&mut state, tuning, particle_capacity);
    (state, world)
}
