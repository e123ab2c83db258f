//! Player motion: input events → lane, forward position, attack window, camera
//!
//! Raw device input (keys, touches) is translated into `InputEvent`s, queued,
//! and applied at the start of the next `update`. Events that arrive while the
//! run is paused or over are dropped, not replayed on resume.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::state::GameState;
use crate::tuning::Tuning;
use crate::{clamp_lane, lane_to_x};

/// Player avatar center height
pub const PLAYER_HEIGHT: f32 = 0.5;
/// Camera sits up and behind the player
pub const CAMERA_OFFSET: Vec3 = Vec3::new(0.0, 3.0, 5.0);
/// Camera looks this far ahead of the player
pub const CAMERA_LOOK_AHEAD: f32 = 5.0;

/// Discrete gameplay input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    /// Move one lane left (-1) or right (+1)
    LaneChange(i8),
    /// Open the shatter window
    Attack,
}

/// Keyboard keys the game cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Left,
    Right,
    Attack,
    Other,
}

impl Key {
    /// Map a DOM-style key or code name
    pub fn from_name(name: &str) -> Self {
        match name {
            "ArrowLeft" | "KeyA" | "a" | "A" => Key::Left,
            "ArrowRight" | "KeyD" | "d" | "D" => Key::Right,
            "ArrowUp" | "Space" | " " | "KeyW" | "w" | "W" => Key::Attack,
            _ => Key::Other,
        }
    }

    pub fn to_event(self) -> Option<InputEvent> {
        match self {
            Key::Left => Some(InputEvent::LaneChange(-1)),
            Key::Right => Some(InputEvent::LaneChange(1)),
            Key::Attack => Some(InputEvent::Attack),
            Key::Other => None,
        }
    }
}

/// Turns a touch start/end pair into a swipe or a tap
#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    start_x: Option<f32>,
}

impl SwipeTracker {
    pub fn touch_start(&mut self, x: f32) {
        self.start_x = Some(x);
    }

    /// Horizontal travel beyond `threshold` is a lane change, anything
    /// shorter is a tap (attack)
    pub fn touch_end(&mut self, x: f32, threshold: f32) -> Option<InputEvent> {
        let start = self.start_x.take()?;
        let diff = x - start;
        if diff.abs() > threshold {
            Some(InputEvent::LaneChange(if diff > 0.0 { 1 } else { -1 }))
        } else {
            Some(InputEvent::Attack)
        }
    }
}

/// Camera framing for the renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraRig {
    pub position: Vec3,
    pub look_at: Vec3,
}

impl Default for CameraRig {
    fn default() -> Self {
        let player = Vec3::new(0.0, PLAYER_HEIGHT, 0.0);
        Self {
            position: player + CAMERA_OFFSET,
            look_at: player - Vec3::Z * CAMERA_LOOK_AHEAD,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MotionController {
    target_lane: i8,
    /// Visual avatar position (x eases toward the lane, z is authoritative)
    position: Vec3,
    attack_timer: f32,
    camera: CameraRig,
    pending: Vec<InputEvent>,
}

impl MotionController {
    pub fn new() -> Self {
        Self {
            position: Vec3::new(0.0, PLAYER_HEIGHT, 0.0),
            ..Default::default()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Queue an input event for the next update
    pub fn push_input(&mut self, event: InputEvent) {
        self.pending.push(event);
    }

    pub fn target_lane(&self) -> i8 {
        self.target_lane
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn camera(&self) -> CameraRig {
        self.camera
    }

    /// Apply queued input and advance the avatar; writes lane, z and attack
    /// flag into `state`
    pub fn update(&mut self, state: &mut GameState, tuning: &Tuning, dt: f32) {
        if !state.is_running() {
            if !self.pending.is_empty() {
                log::debug!("Dropping {} input(s) while not running", self.pending.len());
                self.pending.clear();
            }
            return;
        }

        for event in self.pending.drain(..) {
            match event {
                InputEvent::LaneChange(dir) => {
                    self.target_lane = clamp_lane(self.target_lane as i32 + dir.signum() as i32);
                }
                InputEvent::Attack => self.attack_timer = tuning.attack_window,
            }
        }

        // Forward along -Z at the scaled world speed
        self.position.z -= state.speed * state.time_scale * dt;

        let target_x = lane_to_x(self.target_lane);
        let t = (tuning.lane_lerp_speed * dt).min(1.0);
        self.position.x += (target_x - self.position.x) * t;

        self.attack_timer = (self.attack_timer - dt).max(0.0);

        state.player_lane = self.target_lane;
        state.player_z = self.position.z;
        state.is_attacking = self.attack_timer > 0.0;

        let cam_target = self.position + CAMERA_OFFSET;
        let t = (tuning.camera_lerp_speed * dt).min(1.0);
        self.camera.position = self.camera.position.lerp(cam_target, t);
        self.camera.look_at = self.position - Vec3::Z * CAMERA_LOOK_AHEAD;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT: f32 = 1.0 / 60.0;

    fn setup() -> (MotionController, GameState, Tuning) {
        (MotionController::new(), GameState::new(1), Tuning::default())
    }

    #[test]
    fn test_moves_forward_at_speed() {
        let (mut motion, mut state, tuning) = setup();
        for _ in 0..60 {
            motion.update(&mut state, &tuning, DT);
        }
        assert!((state.player_z + 10.0).abs() < 1e-3);
    }

    #[test]
    fn test_time_scale_slows_forward_motion() {
        let (mut motion, mut state, tuning) = setup();
        state.time_scale = 0.5;
        motion.update(&mut state, &tuning, 0.1);
        assert!((state.player_z + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_lane_clamped() {
        let (mut motion, mut state, tuning) = setup();
        for _ in 0..3 {
            motion.push_input(InputEvent::LaneChange(1));
        }
        motion.update(&mut state, &tuning, DT);
        assert_eq!(state.player_lane, 1);

        for _ in 0..5 {
            motion.push_input(InputEvent::LaneChange(-1));
        }
        motion.update(&mut state, &tuning, DT);
        assert_eq!(state.player_lane, -1);
    }

    #[test]
    fn test_lane_x_eases_toward_target() {
        let (mut motion, mut state, tuning) = setup();
        motion.push_input(InputEvent::LaneChange(1));
        motion.update(&mut state, &tuning, DT);
        let x1 = motion.position().x;
        assert!(x1 > 0.0 && x1 < 2.0);
        for _ in 0..120 {
            motion.update(&mut state, &tuning, DT);
        }
        assert!((motion.position().x - 2.0).abs() < 1e-3);
    }

    #[test]
    fn test_attack_window() {
        let (mut motion, mut state, tuning) = setup();
        motion.push_input(InputEvent::Attack);
        motion.update(&mut state, &tuning, 0.1);
        assert!(state.is_attacking);
        motion.update(&mut state, &tuning, 0.1);
        assert!(state.is_attacking);
        motion.update(&mut state, &tuning, 0.1);
        assert!(!state.is_attacking);
    }

    #[test]
    fn test_input_dropped_while_paused() {
        let (mut motion, mut state, tuning) = setup();
        state.is_paused = true;
        motion.push_input(InputEvent::LaneChange(1));
        motion.push_input(InputEvent::Attack);
        motion.update(&mut state, &tuning, DT);
        assert_eq!(state.player_lane, 0);
        assert_eq!(state.player_z, 0.0);

        state.is_paused = false;
        motion.update(&mut state, &tuning, DT);
        assert_eq!(state.player_lane, 0);
        assert!(!state.is_attacking);
    }

    #[test]
    fn test_camera_trails_player() {
        let (mut motion, mut state, tuning) = setup();
        for _ in 0..300 {
            motion.update(&mut state, &tuning, DT);
        }
        let cam = motion.camera();
        assert!(cam.position.z > state.player_z);
        assert!((cam.look_at.z - (state.player_z - CAMERA_LOOK_AHEAD)).abs() < 1e-4);
    }

    #[test]
    fn test_swipe_and_tap() {
        let mut swipe = SwipeTracker::default();
        swipe.touch_start(100.0);
        assert_eq!(swipe.touch_end(200.0, 50.0), Some(InputEvent::LaneChange(1)));
        swipe.touch_start(200.0);
        assert_eq!(swipe.touch_end(120.0, 50.0), Some(InputEvent::LaneChange(-1)));
        swipe.touch_start(200.0);
        assert_eq!(swipe.touch_end(210.0, 50.0), Some(InputEvent::Attack));
        assert_eq!(swipe.touch_end(210.0, 50.0), None);
    }

    #[test]
    fn test_key_mapping() {
        assert_eq!(Key::from_name("ArrowLeft").to_event(), Some(InputEvent::LaneChange(-1)));
        assert_eq!(Key::from_name("KeyD").to_event(), Some(InputEvent::LaneChange(1)));
        assert_eq!(Key::from_name("Space").to_event(), Some(InputEvent::Attack));
        assert_eq!(Key::from_name("Escape").to_event(), None);
    }
}
