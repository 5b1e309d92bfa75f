//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod collision;
pub mod difficulty;
pub mod player;
pub mod session;
pub mod state;
pub mod track;

pub use collision::{CollisionOutcome, Scoreboard, evades, resolve};
pub use difficulty::{DifficultyProfile, Director, profile};
pub use player::PlayerController;
pub use session::{InputEvent, Session, SessionConfig};
pub use state::{
    CollectibleKind, EntityKind, EntityView, FrameSnapshot, GameEvent, GameMode, GamePhase, Lane,
    ObstacleKind, PlayerState, PlayerView, RngState, SessionState, VerticalState,
};
pub use track::{SpawnEntity, TrackEntity, TrackGenerator, TrackSegment};
