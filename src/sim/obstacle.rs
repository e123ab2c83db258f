//! Obstacle entities
//!
//! Obstacles never move: the player runs toward them along -Z.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::consts::OBSTACLE_HEIGHT;
use crate::{Color, lane_to_x};

/// Material an obstacle is made of (drives sound and debris color)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObstacleKind {
    /// Glass-like, bright high shatter
    #[default]
    Brittle,
    /// Ice-like, dull low crunch
    Frozen,
}

impl ObstacleKind {
    /// Base color when not tinted
    pub fn base_color(self) -> Color {
        match self {
            ObstacleKind::Brittle => Color::BRITTLE,
            ObstacleKind::Frozen => Color::FROZEN,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SizeClass {
    #[default]
    Normal,
    /// Doubled visual scale and collision reach
    Large,
}

impl SizeClass {
    pub fn multiplier(self) -> f32 {
        match self {
            SizeClass::Normal => 1.0,
            SizeClass::Large => 2.0,
        }
    }
}

/// A destructible obstacle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub id: u32,
    pub lane: i8,
    /// Longitudinal position, fixed at spawn
    pub z: f32,
    pub kind: ObstacleKind,
    pub size: SizeClass,
    /// Fever tint, if spawned during fever
    pub tint: Option<Color>,
    /// Already hit, collided or missed; never resolved twice
    pub resolved: bool,
}

impl Obstacle {
    /// Reach within which the player meets this obstacle
    pub fn collision_radius(&self) -> f32 {
        (0.5 + 0.5 * self.size.multiplier()).max(1.0)
    }

    /// Center in world space
    pub fn position(&self) -> Vec3 {
        Vec3::new(lane_to_x(self.lane), OBSTACLE_HEIGHT, self.z)
    }

    /// Color debris and renderers should use
    pub fn color(&self) -> Color {
        self.tint.unwrap_or_else(|| self.kind.base_color())
    }

    /// Visual scale factor for renderers
    pub fn scale(&self) -> f32 {
        self.size.multiplier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obstacle(size: SizeClass) -> Obstacle {
        Obstacle {
            id: 1,
            lane: 1,
            z: -12.0,
            kind: ObstacleKind::Brittle,
            size,
            tint: None,
            resolved: false,
        }
    }

    #[test]
    fn test_collision_radius() {
        assert_eq!(obstacle(SizeClass::Normal).collision_radius(), 1.0);
        assert_eq!(obstacle(SizeClass::Large).collision_radius(), 1.5);
    }

    #[test]
    fn test_position_and_color() {
        let mut o = obstacle(SizeClass::Normal);
        assert_eq!(o.position(), Vec3::new(2.0, 1.0, -12.0));
        assert_eq!(o.color(), Color::BRITTLE);
        o.tint = Some(Color(0xff00ff));
        assert_eq!(o.color(), Color(0xff00ff));
    }
}
