//! Game state and core simulation types
//!
//! Everything a session needs for determinism lives here: the session state
//! machine, the player, entity kinds, and the seeded RNG wrapper.

use glam::Vec3;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::lane_world_x;

/// Current phase of a game session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title/menu, no simulation state exists yet
    Menu,
    /// Active gameplay
    Running,
    /// Simulation clock frozen, state retained
    Paused,
    /// Run ended (hit or quit); terminal report pending/emitted
    Ended,
}

/// Ruleset the session is currently under. Flips Normal -> Degen at most once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    Normal,
    Degen,
}

/// Discrete horizontal track position. Ordering follows the lane offset
/// (Left < Center < Right), which the track query tie-break relies on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Lane {
    Left,
    Center,
    Right,
}

impl Lane {
    pub const ALL: [Lane; 3] = [Lane::Left, Lane::Center, Lane::Right];

    /// Offset in {-1, 0, 1}
    #[inline]
    pub fn offset(self) -> i32 {
        match self {
            Lane::Left => -1,
            Lane::Center => 0,
            Lane::Right => 1,
        }
    }

    pub fn from_offset(offset: i32) -> Option<Lane> {
        match offset {
            -1 => Some(Lane::Left),
            0 => Some(Lane::Center),
            1 => Some(Lane::Right),
            _ => None,
        }
    }

    /// Shift by delta, clamped at the edges (no wraparound)
    pub fn shifted(self, delta: i32) -> Lane {
        let clamped = (self.offset() + delta).clamp(-1, 1);
        Lane::from_offset(clamped).unwrap_or(self)
    }

    /// World-space X of the lane center
    #[inline]
    pub fn world_x(self) -> f32 {
        lane_world_x(self.offset())
    }
}

/// Vertical state machine: Grounded <-> Jumping and Grounded <-> Sliding,
/// both timer-bounded with automatic return to Grounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VerticalState {
    Grounded,
    Jumping,
    Sliding,
}

/// Obstacle variants. High bars are ducked under, low bars are jumped over,
/// wide blocks span two lanes and can only be dodged laterally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObstacleKind {
    High,
    Low,
    Wide,
}

/// Collectible variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CollectibleKind {
    Coin,
    Token,
}

/// What occupies a spawn slot on the track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Obstacle(ObstacleKind),
    Collectible(CollectibleKind),
}

impl EntityKind {
    #[inline]
    pub fn is_collectible(self) -> bool {
        matches!(self, EntityKind::Collectible(_))
    }

    /// Unavoidable entities cannot be cleared by a vertical move; the
    /// generation invariant is stated over these only.
    #[inline]
    pub fn is_unavoidable(self) -> bool {
        matches!(
            self,
            EntityKind::Obstacle(ObstacleKind::High) | EntityKind::Obstacle(ObstacleKind::Wide)
        )
    }
}

/// Complete player state. Mutated only by the player controller and, on
/// revive, by the session orchestrator (invulnerability window).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerState {
    pub lane: Lane,
    pub vertical: VerticalState,
    /// Height above (positive, jumping) or crouch below (negative, sliding)
    /// the ground plane, for the renderer
    pub vertical_offset: f32,
    /// Current forward speed (m/s), set by the difficulty profile
    pub speed: f32,
    /// Meters traveled; monotonic for the session's lifetime
    pub distance: f32,
    /// Session-clock timestamp until which hits are excused
    pub invulnerable_until: Option<f64>,
}

impl PlayerState {
    pub fn new() -> Self {
        Self {
            lane: Lane::Center,
            vertical: VerticalState::Grounded,
            vertical_offset: 0.0,
            speed: 0.0,
            distance: 0.0,
            invulnerable_until: None,
        }
    }

    #[inline]
    pub fn is_invulnerable(&self, elapsed: f64) -> bool {
        self.invulnerable_until.is_some_and(|until| elapsed < until)
    }
}

impl Default for PlayerState {
    fn default() -> Self {
        Self::new()
    }
}

/// Aggregate session scalars reported to the HUD and, at the end, the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionState {
    pub phase: GamePhase,
    /// Non-decreasing while phase == Running
    pub score: f64,
    pub coins_collected: u32,
    pub combo_multiplier: u32,
    pub mode: GameMode,
    /// Simulated seconds; does not advance while paused
    pub elapsed_time: f64,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            phase: GamePhase::Menu,
            score: 0.0,
            coins_collected: 0,
            combo_multiplier: 1,
            mode: GameMode::Normal,
            elapsed_time: 0.0,
        }
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

/// Observational events surfaced once, on the frame they happen. The renderer
/// keys visual/audio effects off these; gameplay never reads them back.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Started { seed: u64 },
    Collected { kind: CollectibleKind, lane: Lane, distance: f32 },
    Hit { kind: ObstacleKind },
    DegenActivated,
    Revived,
    Paused,
    Resumed,
    Ended,
}

/// RNG state wrapper for serialization
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RngState {
    pub seed: u64,
}

impl RngState {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn to_rng(&self) -> Pcg32 {
        Pcg32::seed_from_u64(self.seed)
    }
}

/// Player view embedded in a frame snapshot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerView {
    pub lane: Lane,
    pub vertical: VerticalState,
    /// World position: x lateral, y vertical offset, z forward distance
    pub world_pos: Vec3,
    pub speed: f32,
    pub invulnerable: bool,
}

/// One visible track entity, positioned relative to the player's distance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityView {
    pub id: u32,
    pub kind: EntityKind,
    pub lane: Lane,
    /// Absolute track distance of the entity (meters)
    pub distance: f32,
    /// World position relative to the player (z = distance ahead)
    pub world_pos: Vec3,
}

/// Immutable per-tick view handed to the rendering layer. The core never
/// queries the renderer; this is the entire outbound surface per frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameSnapshot {
    pub phase: GamePhase,
    pub mode: GameMode,
    pub score: f64,
    pub coins_collected: u32,
    pub combo_multiplier: u32,
    pub elapsed_time: f64,
    pub player: PlayerView,
    pub entities: Vec<EntityView>,
    pub events: Vec<GameEvent>,
    /// Cosmetic variant from the 3-tap unlock gesture; unrelated to `mode`
    pub degen_cosmetic: bool,
}
