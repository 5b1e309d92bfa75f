//! Lemmi Run - simulation core for a lane-based endless runner
//!
//! Core modules:
//! - `sim`: Deterministic simulation (track generation, player, collisions, scoring)
//! - `report`: Terminal session report and the backend notification pipeline
//! - `wallet`: Wallet capability seam and unlock flags
//! - `records`: Persisted high score / coin totals carried between sessions
//!
//! Rendering, audio and the wallet browser extension itself live outside this
//! crate; they consume frame snapshots and implement the trait seams here.

pub mod records;
pub mod report;
pub mod sim;
pub mod wallet;

pub use records::PlayerRecords;
pub use report::{ReportSink, Reporter, SessionReport};
pub use wallet::{UnlockFlags, WalletProvider};

/// Game configuration constants
pub mod consts {
    /// Fixed simulation timestep (120 Hz)
    pub const SIM_DT: f32 = 1.0 / 120.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Cap on a single frame delta; anything larger means a stalled render
    /// loop and would tunnel the player through obstacles
    pub const MAX_FRAME_DELTA: f32 = 0.25;

    /// Lateral spacing between lane centers (world units)
    pub const LANE_WIDTH: f32 = 2.0;
    /// Axis-aligned collision window around the player's distance (meters)
    pub const COLLISION_RADIUS: f32 = 1.0;

    /// Entity placement grid along the track (meters per row)
    pub const GRID_STEP: f32 = 4.0;
    /// Length of one generated segment (meters)
    pub const SEGMENT_LENGTH: f32 = 24.0;
    /// How far ahead of the player the track is kept generated
    pub const LOOKAHEAD: f32 = 120.0;
    /// How far behind the player segments are retained before pruning
    pub const PRUNE_MARGIN: f32 = 20.0;

    /// Floor on the reaction distance, so low speeds still get breathing room
    pub const MIN_REACTION_DISTANCE: f32 = 8.0;

    /// Jump airtime in seconds
    pub const JUMP_DURATION: f32 = 0.5;
    /// Peak jump height (world units, for the renderer)
    pub const JUMP_HEIGHT: f32 = 1.2;
    /// Slide duration in seconds
    pub const SLIDE_DURATION: f32 = 0.6;

    /// Continuous score accrual per second at 1x combo
    pub const BASE_SCORE_RATE: f64 = 10.0;
    /// Discrete bonus for a coin
    pub const COIN_BONUS: f64 = 10.0;
    /// Discrete bonus for a token
    pub const TOKEN_BONUS: f64 = 50.0;
    /// Collectible streak length per combo step
    pub const COMBO_STEP_STREAK: u32 = 5;
    /// Combo multiplier cap
    pub const MAX_COMBO: u32 = 5;
    /// Missed collectibles before the combo resets to 1
    pub const MISS_RESET_THRESHOLD: u32 = 3;

    /// Score at which Degen Mode arms, exactly once per session
    pub const DEGEN_SCORE_THRESHOLD: f64 = 500.0;

    /// Invulnerability window granted by a revive (seconds)
    pub const REVIVE_INVULN_SECS: f64 = 2.0;
}

/// World-space X for a lane offset in {-1, 0, 1}
#[inline]
pub fn lane_world_x(lane_offset: i32) -> f32 {
    lane_offset as f32 * consts::LANE_WIDTH
}
