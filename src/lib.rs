//! Shatter Run - a three-lane runner where you smash what you can't dodge
//!
//! Core modules:
//! - `sim`: Simulation (state machine, obstacles, particles, motion)
//! - `audio`: Procedural sound effects and background loop
//! - `game`: Session orchestration and effect dispatch
//! - `platform`: Browser/native platform glue
//! - `tuning`: Data-driven game balance

pub mod audio;
pub mod error;
pub mod game;
pub mod haptics;
pub mod highscores;
pub mod platform;
pub mod settings;
pub mod sim;
pub mod tuning;

pub use error::{Error, Result};
pub use game::Game;
pub use highscores::HighScores;
pub use settings::{QualityPreset, Settings};
pub use tuning::Tuning;

use serde::{Deserialize, Serialize};

/// Game configuration constants
pub mod consts {
    /// Largest frame delta the session will simulate in one step (seconds)
    pub const MAX_FRAME_DT: f32 = 0.1;

    /// Lanes are -1, 0, 1
    pub const MIN_LANE: i8 = -1;
    pub const MAX_LANE: i8 = 1;
    /// World-space distance between lane centers
    pub const LANE_WIDTH: f32 = 2.0;
    /// Obstacle center height above the ground
    pub const OBSTACLE_HEIGHT: f32 = 1.0;

    /// Life cap
    pub const MAX_LIFE: u8 = 3;
    /// Session defaults
    pub const START_SPEED: f32 = 10.0;
    pub const MAX_SPEED: f32 = 25.0;
    /// Far enough in the past that the first hit is never inside the cooldown
    pub const INITIAL_DAMAGE_TIME: f64 = -100.0;

    /// Combo needed to enter fever
    pub const FEVER_COMBO: u32 = 10;

    /// Particle pool floor: never fewer slots than this
    pub const MIN_PARTICLE_CAPACITY: usize = 1000;

    /// Audio output rate
    pub const SAMPLE_RATE: u32 = 44_100;
}

/// Packed 0xRRGGBB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color(pub u32);

impl Color {
    pub const WHITE: Color = Color(0xffffff);
    /// Brittle (glass) obstacles
    pub const BRITTLE: Color = Color(0xaaddff);
    /// Frozen (ice) obstacles
    pub const FROZEN: Color = Color(0xffffff);

    /// Linear-ish RGB in [0, 1], for renderers
    pub fn to_rgb(self) -> [f32; 3] {
        let r = ((self.0 >> 16) & 0xff) as f32 / 255.0;
        let g = ((self.0 >> 8) & 0xff) as f32 / 255.0;
        let b = (self.0 & 0xff) as f32 / 255.0;
        [r, g, b]
    }
}

/// Colors obstacles are tinted with while fever is active
pub const FEVER_PALETTE: [Color; 5] = [
    Color(0xff00ff),
    Color(0x00ffff),
    Color(0xffff00),
    Color(0xff0055),
    Color(0x00ff88),
];

/// World-space x of a lane center
#[inline]
pub fn lane_to_x(lane: i8) -> f32 {
    lane as f32 * consts::LANE_WIDTH
}

/// Clamp an arbitrary lane index into the playable range
#[inline]
pub fn clamp_lane(lane: i32) -> i8 {
    lane.clamp(consts::MIN_LANE as i32, consts::MAX_LANE as i32) as i8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_to_rgb() {
        let [r, g, b] = Color(0xff8000).to_rgb();
        assert_eq!(r, 1.0);
        assert!((g - 128.0 / 255.0).abs() < 1e-6);
        assert_eq!(b, 0.0);
    }

    #[test]
    fn test_clamp_lane() {
        assert_eq!(clamp_lane(-5), -1);
        assert_eq!(clamp_lane(0), 0);
        assert_eq!(clamp_lane(2), 1);
        assert_eq!(lane_to_x(-1), -2.0);
    }
}
