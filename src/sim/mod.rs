//! Gameplay simulation
//!
//! All gameplay logic lives here. This module stays free of audio, rendering
//! and platform dependencies:
//! - Seeded RNG only
//! - Side effects leave as `GameEvent` commands
//! - Frame order: motion → spawn → resolve → cleanup → combo decay → particles

pub mod events;
pub mod motion;
pub mod notify;
pub mod obstacle;
pub mod particles;
pub mod spawner;
pub mod state;
pub mod tick;

pub use events::{EffectQueue, GameEvent, HapticImpact, SoundCue};
pub use motion::{CameraRig, InputEvent, Key, MotionController, SwipeTracker};
pub use notify::{HudSnapshot, Observers, SubscriptionId};
pub use obstacle::{Obstacle, ObstacleKind, SizeClass};
pub use particles::{Particle, ParticlePool};
pub use spawner::ObstacleField;
pub use state::{GameState, HitOutcome};
pub use tick::{TickInput, World, new_session, tick};
