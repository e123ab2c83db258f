//! Game state and the session state machine
//!
//! `GameState` is the system of record for a run. Every subsystem receives it
//! by `&mut` during its per-frame update; nothing else holds session data.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::tuning::Tuning;

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Fresh RNG for a named subsystem, decorrelated from the others
    pub fn fork(&self, salt: u64) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed ^ salt.wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }
}

/// Result of registering a successful hit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitOutcome {
    /// Points added by this hit
    pub points: u64,
    /// Combo after the hit
    pub combo: u32,
    /// This hit pushed the run into fever
    pub entered_fever: bool,
    /// This hit hit a combo milestone and restored a life
    pub life_restored: bool,
}

/// Complete session state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    /// Run seed
    pub seed: u64,
    pub rng_state: RngState,

    pub score: u64,
    pub combo: u32,
    /// Best combo reached this run
    pub max_combo: u32,
    pub is_fever: bool,

    pub life: u8,
    /// Session time of the last applied damage (seconds)
    pub last_damage_time: f64,
    /// Session time of the last successful hit (seconds)
    pub last_hit_time: f64,

    /// World scroll rate (units per second)
    pub speed: f32,
    /// Global slow-motion multiplier for motion and music
    pub time_scale: f32,

    pub player_lane: i8,
    pub player_z: f32,
    /// Shatter action is live
    pub is_attacking: bool,

    pub is_paused: bool,
    pub is_game_over: bool,

    /// Session clock (seconds); frozen while paused or over
    pub clock: f64,
    /// Remaining seconds of the red damage pulse
    #[serde(skip)]
    pub damaged_timer: f32,
    /// Remaining and total seconds of the slow-motion dip
    #[serde(skip)]
    slow_motion: (f32, f32),
    #[serde(skip)]
    slow_motion_floor: f32,

    /// Next entity ID
    next_id: u32,
}

impl GameState {
    /// Create a new game state with the given seed
    pub fn new(seed: u64) -> Self {
        let mut state = Self {
            seed,
            rng_state: RngState::new(seed),
            score: 0,
            combo: 0,
            max_combo: 0,
            is_fever: false,
            life: MAX_LIFE,
            last_damage_time: INITIAL_DAMAGE_TIME,
            last_hit_time: 0.0,
            speed: START_SPEED,
            time_scale: 1.0,
            player_lane: 0,
            player_z: 0.0,
            is_attacking: false,
            is_paused: false,
            is_game_over: false,
            clock: 0.0,
            damaged_timer: 0.0,
            slow_motion: (0.0, 0.0),
            slow_motion_floor: 1.0,
            next_id: 1,
        };
        state.reset_session();
        state
    }

    /// Reinitialize every mutable field to session defaults
    pub fn reset_session(&mut self) {
        self.score = 0;
        self.combo = 0;
        self.max_combo = 0;
        self.speed = START_SPEED;
        self.life = MAX_LIFE;
        self.is_fever = false;
        self.is_paused = false;
        self.is_game_over = false;
        self.is_attacking = false;
        self.player_z = 0.0;
        self.player_lane = 0;
        self.last_damage_time = INITIAL_DAMAGE_TIME;
        self.last_hit_time = 0.0;
        self.clock = 0.0;
        self.time_scale = 1.0;
        self.damaged_timer = 0.0;
        self.slow_motion = (0.0, 0.0);
        self.slow_motion_floor = 1.0;
    }

    /// Allocate a new entity ID
    pub fn next_entity_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Simulation is advancing (not paused, not over)
    pub fn is_running(&self) -> bool {
        !self.is_paused && !self.is_game_over
    }

    /// The red damage flash is showing
    pub fn is_damaged(&self) -> bool {
        self.damaged_timer > 0.0
    }

    /// Sound pitch factor for the current combo
    pub fn pitch_factor(&self) -> f32 {
        (1.0 + self.combo as f32 * 0.1).min(3.0)
    }

    /// Apply one point of damage at session time `now`.
    ///
    /// Returns `false` without touching anything when the run is over, when
    /// fever makes the player invulnerable, or when the previous damage is
    /// still inside the cooldown window.
    pub fn apply_damage(&mut self, now: f64, tuning: &Tuning) -> bool {
        if self.is_game_over || self.is_fever {
            return false;
        }
        if now - self.last_damage_time <= tuning.damage_cooldown {
            return false;
        }

        self.life = self.life.saturating_sub(1);
        self.reset_combo();
        self.last_damage_time = now;
        self.damaged_timer = tuning.damage_pulse;
        if self.life == 0 {
            self.is_game_over = true;
        }
        log::debug!("Damage at {:.2}s, life now {}", now, self.life);
        true
    }

    /// Register a successful shatter and advance the combo/fever machine
    pub fn register_hit(&mut self, now: f64, tuning: &Tuning) -> HitOutcome {
        self.combo += 1;
        self.max_combo = self.max_combo.max(self.combo);
        self.last_hit_time = now;

        let entered_fever = !self.is_fever && self.combo >= FEVER_COMBO;
        if entered_fever {
            self.is_fever = true;
        }

        let fever_mult = if self.is_fever {
            tuning.fever_score_multiplier
        } else {
            1
        };
        let combo_mult = 1 + (self.combo / tuning.combo_bonus_step) as u64;
        let points = tuning.base_score * fever_mult * combo_mult;
        self.score += points;

        let step = if self.is_fever {
            tuning.speed_step * tuning.fever_speed_factor
        } else {
            tuning.speed_step
        };
        self.speed = (self.speed + step).min(MAX_SPEED);

        let mut life_restored = false;
        if self.combo.is_multiple_of(tuning.life_restore_combo) && self.life < MAX_LIFE {
            self.life += 1;
            life_restored = true;
        }

        HitOutcome {
            points,
            combo: self.combo,
            entered_fever,
            life_restored,
        }
    }

    /// Drop the combo and leave fever
    pub fn reset_combo(&mut self) {
        self.combo = 0;
        self.is_fever = false;
    }

    /// Start a slow-motion dip that eases back to normal speed
    pub fn start_slow_motion(&mut self, floor: f32, duration: f32) {
        if duration <= 0.0 {
            return;
        }
        self.slow_motion = (duration, duration);
        self.slow_motion_floor = floor.clamp(0.05, 1.0);
        self.time_scale = self.slow_motion_floor;
    }

    /// Advance real-time timers (damage pulse, slow-motion ease)
    pub fn tick_timers(&mut self, dt: f32) {
        if self.damaged_timer > 0.0 {
            self.damaged_timer = (self.damaged_timer - dt).max(0.0);
        }

        let (remaining, total) = self.slow_motion;
        if remaining > 0.0 {
            let remaining = (remaining - dt).max(0.0);
            self.slow_motion.0 = remaining;
            let t = 1.0 - remaining / total;
            self.time_scale = self.slow_motion_floor + (1.0 - self.slow_motion_floor) * t;
        } else {
            self.time_scale = 1.0;
        }
    }

    /// Enforce cross-field invariants at the end of a tick
    pub fn settle(&mut self) {
        self.life = self.life.min(MAX_LIFE);
        if self.life == 0 {
            self.is_game_over = true;
        }
        if self.is_game_over {
            self.is_attacking = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn tuning() -> Tuning {
        Tuning::default()
    }

    #[test]
    fn test_reset_session_defaults() {
        let mut state = GameState::new(1);
        state.score = 500;
        state.combo = 12;
        state.is_fever = true;
        state.life = 1;
        state.speed = 20.0;
        state.is_paused = true;
        state.is_game_over = true;
        state.player_z = -300.0;
        state.last_damage_time = 42.0;

        state.reset_session();
        assert_eq!(state.score, 0);
        assert_eq!(state.combo, 0);
        assert!(!state.is_fever);
        assert_eq!(state.life, MAX_LIFE);
        assert_eq!(state.speed, START_SPEED);
        assert!(!state.is_paused);
        assert!(!state.is_game_over);
        assert_eq!(state.player_z, 0.0);
        assert_eq!(state.last_damage_time, INITIAL_DAMAGE_TIME);
    }

    #[test]
    fn test_first_damage_never_blocked() {
        let mut state = GameState::new(1);
        assert!(state.apply_damage(0.0, &tuning()));
        assert_eq!(state.life, MAX_LIFE - 1);
        assert!(state.is_damaged());
    }

    #[test]
    fn test_damage_cooldown() {
        let mut state = GameState::new(1);
        state.combo = 4;
        assert!(state.apply_damage(5.0, &tuning()));
        assert_eq!(state.combo, 0);
        assert!(!state.apply_damage(5.5, &tuning()));
        assert!(!state.apply_damage(6.0, &tuning()));
        assert_eq!(state.life, MAX_LIFE - 1);
        assert!(state.apply_damage(6.01, &tuning()));
        assert_eq!(state.life, MAX_LIFE - 2);
    }

    #[test]
    fn test_no_damage_during_fever_or_game_over() {
        let mut state = GameState::new(1);
        state.is_fever = true;
        state.combo = 15;
        assert!(!state.apply_damage(3.0, &tuning()));
        assert_eq!(state.life, MAX_LIFE);
        assert_eq!(state.combo, 15);

        state.is_fever = false;
        state.is_game_over = true;
        assert!(!state.apply_damage(3.0, &tuning()));
        assert_eq!(state.life, MAX_LIFE);
    }

    #[test]
    fn test_last_life_ends_run() {
        // life=1, last damage 2s ago, collision now
        let mut state = GameState::new(1);
        state.life = 1;
        state.combo = 3;
        state.last_damage_time = 8.0;
        assert!(state.apply_damage(10.0, &tuning()));
        assert_eq!(state.life, 0);
        assert!(state.is_game_over);
        assert_eq!(state.combo, 0);
    }

    #[test]
    fn test_hit_at_combo_nine_enters_fever() {
        let mut state = GameState::new(1);
        state.combo = 9;
        let outcome = state.register_hit(1.0, &tuning());
        assert_eq!(state.combo, 10);
        assert!(state.is_fever);
        assert!(outcome.entered_fever);
        assert_eq!(outcome.points, 600);
        assert_eq!(state.score, 600);
    }

    #[test]
    fn test_fever_speed_step() {
        let mut state = GameState::new(1);
        state.register_hit(0.0, &tuning());
        assert!((state.speed - 10.05).abs() < 1e-5);

        state.combo = 20;
        state.is_fever = true;
        state.register_hit(0.0, &tuning());
        assert!((state.speed - 10.175).abs() < 1e-5);
    }

    #[test]
    fn test_combo_milestone_restores_life() {
        let mut state = GameState::new(1);
        state.life = 1;
        state.combo = 49;
        state.is_fever = true;
        let outcome = state.register_hit(0.0, &tuning());
        assert!(outcome.life_restored);
        assert_eq!(state.life, 2);

        // Already at cap: no restore
        let mut state = GameState::new(1);
        state.combo = 99;
        let outcome = state.register_hit(0.0, &tuning());
        assert!(!outcome.life_restored);
        assert_eq!(state.life, MAX_LIFE);
    }

    #[test]
    fn test_slow_motion_eases_back() {
        let mut state = GameState::new(1);
        state.start_slow_motion(0.4, 0.5);
        assert!((state.time_scale - 0.4).abs() < 1e-6);
        state.tick_timers(0.25);
        assert!((state.time_scale - 0.7).abs() < 1e-5);
        state.tick_timers(0.25);
        assert!((state.time_scale - 1.0).abs() < 1e-6);
        state.tick_timers(0.1);
        assert_eq!(state.time_scale, 1.0);
    }

    #[test]
    fn test_damage_pulse_clears() {
        let mut state = GameState::new(1);
        state.apply_damage(0.0, &tuning());
        state.tick_timers(0.1);
        assert!(state.is_damaged());
        state.tick_timers(0.11);
        assert!(!state.is_damaged());
    }

    proptest! {
        #[test]
        fn prop_speed_never_exceeds_cap(hits in 0usize..2000, fever_from in 0u32..100) {
            let mut state = GameState::new(7);
            let tuning = tuning();
            for i in 0..hits {
                if i as u32 == fever_from {
                    state.is_fever = true;
                }
                state.register_hit(i as f64 * 0.1, &tuning);
                prop_assert!(state.speed <= MAX_SPEED);
            }
        }

        #[test]
        fn prop_second_damage_inside_cooldown_is_rejected(t1 in -50.0f64..500.0, gap in 0.0f64..=1.0) {
            let mut state = GameState::new(7);
            let tuning = tuning();
            prop_assert!(state.apply_damage(t1, &tuning));
            let life = state.life;
            prop_assert!(!state.apply_damage(t1 + gap, &tuning));
            prop_assert_eq!(state.life, life);
        }

        #[test]
        fn prop_life_stays_in_bounds(ops in proptest::collection::vec((any::<bool>(), 0.0f64..3.0), 0..200)) {
            let mut state = GameState::new(7);
            let tuning = tuning();
            let mut now = 0.0;
            for (damage, step) in ops {
                now += step;
                if damage {
                    state.apply_damage(now, &tuning);
                } else {
                    state.register_hit(now, &tuning);
                }
                state.settle();
                prop_assert!(state.life <= MAX_LIFE);
                if state.life == 0 {
                    prop_assert!(state.is_game_over);
                }
            }
        }
    }
}
