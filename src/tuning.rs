//! Data-driven game balance
//!
//! Every number the simulation uses to pace a run lives here so it can be
//! tweaked from a JSON file without recompiling. Missing keys fall back to the
//! defaults below.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // === Spawning ===
    /// Look-ahead window: keep obstacles spawned this far in front of the player
    pub spawn_distance: f32,
    /// Nominal spacing between consecutive obstacles (halved during fever)
    pub spawn_interval: f32,
    /// Obstacles pre-placed when a session starts
    pub initial_obstacles: u32,
    /// Probability a spawned obstacle is Large
    pub large_chance: f64,
    /// Probability a spawned obstacle is Brittle (otherwise Frozen)
    pub brittle_chance: f64,

    // === Resolution ===
    /// How far past the player an obstacle must be before it counts as missed
    pub miss_margin: f32,
    /// How far behind the player an obstacle is dropped
    pub cleanup_buffer: f32,
    /// Seconds without a hit before the combo decays
    pub idle_combo_timeout: f64,

    // === Damage ===
    pub damage_cooldown: f64,
    /// Duration of the red "damaged" pulse (seconds)
    pub damage_pulse: f32,

    // === Scoring ===
    pub base_score: u64,
    pub fever_score_multiplier: u64,
    /// Every N combo adds one to the score multiplier
    pub combo_bonus_step: u32,
    pub speed_step: f32,
    /// Speed step multiplier while in fever
    pub fever_speed_factor: f32,
    /// Every N combo restores one life
    pub life_restore_combo: u32,

    // === Player ===
    /// Seconds an attack input stays live
    pub attack_window: f32,
    pub lane_lerp_speed: f32,
    pub camera_lerp_speed: f32,
    /// Minimum horizontal travel (px) for a touch to count as a swipe
    pub swipe_threshold: f32,

    // === Effects ===
    /// Debris particles per shattered Normal obstacle (doubled for Large)
    pub shatter_particles: u32,
    /// Time scale at the bottom of the fever slow-motion dip
    pub slow_motion_scale: f32,
    /// Real seconds for the dip to ease back to 1.0
    pub slow_motion_duration: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            spawn_distance: 50.0,
            spawn_interval: 12.0,
            initial_obstacles: 4,
            large_chance: 0.2,
            brittle_chance: 0.5,

            miss_margin: 2.0,
            cleanup_buffer: 5.0,
            idle_combo_timeout: 2.0,

            damage_cooldown: 1.0,
            damage_pulse: 0.2,

            base_score: 100,
            fever_score_multiplier: 2,
            combo_bonus_step: 5,
            speed_step: 0.05,
            fever_speed_factor: 2.5,
            life_restore_combo: 50,

            attack_window: 0.25,
            lane_lerp_speed: 10.0,
            camera_lerp_speed: 5.0,
            swipe_threshold: 50.0,

            shatter_particles: 20,
            slow_motion_scale: 0.35,
            slow_motion_duration: 0.6,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Load tuning from a file on disk
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject values that would stall or break the simulation
    pub fn validate(&self) -> Result<()> {
        if self.spawn_interval <= 0.0 {
            return Err(Error::InvalidTuning("spawn_interval must be positive".into()));
        }
        if self.spawn_distance < self.spawn_interval {
            return Err(Error::InvalidTuning(
                "spawn_distance must be at least spawn_interval".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.large_chance) || !(0.0..=1.0).contains(&self.brittle_chance)
        {
            return Err(Error::InvalidTuning("chances must be within [0, 1]".into()));
        }
        if self.cleanup_buffer < self.miss_margin {
            return Err(Error::InvalidTuning(
                "cleanup_buffer must not be shorter than miss_margin".into(),
            ));
        }
        if self.damage_cooldown < 0.0 || self.idle_combo_timeout < 0.0 {
            return Err(Error::InvalidTuning("timeouts must not be negative".into()));
        }
        if self.combo_bonus_step == 0 || self.life_restore_combo == 0 {
            return Err(Error::InvalidTuning("combo steps must be non-zero".into()));
        }
        if self.slow_motion_scale <= 0.0 {
            return Err(Error::InvalidTuning("slow_motion_scale must be positive".into()));
        }
        Ok(())
    }
}
