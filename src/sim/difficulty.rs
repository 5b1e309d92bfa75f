//! Difficulty curve and mode director
//!
//! The profile is a pure function of (distance, mode, unlock curve): discrete,
//! non-decreasing steps at fixed distance checkpoints. The director owns the
//! single-fire Normal -> Degen transition.

use serde::{Deserialize, Serialize};

use crate::consts::DEGEN_SCORE_THRESHOLD;
use crate::consts::MIN_REACTION_DISTANCE;
use super::state::{GameEvent, GameMode};

/// (distance checkpoint, base speed m/s, spawn density)
const CHECKPOINTS: [(f32, f32, f32); 6] = [
    (0.0, 8.0, 0.25),
    (150.0, 9.5, 0.32),
    (350.0, 11.0, 0.40),
    (600.0, 12.5, 0.48),
    (1000.0, 14.0, 0.55),
    (1500.0, 15.5, 0.62),
];

/// Seconds of warning the player gets before an unavoidable obstacle
const REACTION_TIME_NORMAL: f32 = 0.6;
const REACTION_TIME_DEGEN: f32 = 0.45;

/// Obstacle mix weights, indexed [High, Low, Wide]
const MIX_NORMAL: [u32; 3] = [3, 4, 2];
const MIX_DEGEN: [u32; 3] = [4, 2, 4];

/// Spawn parameters handed to the track generator. Derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DifficultyProfile {
    pub base_speed: f32,
    /// Fraction of grid rows that carry an obstacle pattern, 0..1
    pub spawn_density: f32,
    /// Relative weights for [High, Low, Wide] obstacle picks
    pub obstacle_weights: [u32; 3],
    /// Weight of a token relative to a coin when a collectible spawns (0..100)
    pub token_weight: u32,
    /// Seconds of reaction time the generator must honor
    pub reaction_time: f32,
}

impl DifficultyProfile {
    /// Minimum clear-lane window length for a player moving at `speed`
    pub fn reaction_distance(&self, speed: f32) -> f32 {
        (speed * self.reaction_time).max(MIN_REACTION_DISTANCE)
    }
}

/// Checkpoint index reached at `distance`; reported as `level` at session end
pub fn level(distance: f32) -> u32 {
    CHECKPOINTS
        .iter()
        .take_while(|(d, _, _)| distance >= *d)
        .count()
        .saturating_sub(1) as u32
}

/// The difficulty curve. `nft_curve` is the wallet unlock flag read once at
/// session start; it sweetens the collectible mix without touching obstacles.
pub fn profile(distance: f32, mode: GameMode, nft_curve: bool) -> DifficultyProfile {
    let (_, mut base_speed, mut spawn_density) = CHECKPOINTS[level(distance) as usize];

    let (obstacle_weights, reaction_time) = match mode {
        GameMode::Normal => (MIX_NORMAL, REACTION_TIME_NORMAL),
        GameMode::Degen => {
            base_speed += 2.0;
            spawn_density = (spawn_density + 0.15).min(0.8);
            (MIX_DEGEN, REACTION_TIME_DEGEN)
        }
    };

    let token_weight = match (nft_curve, mode) {
        (false, GameMode::Normal) => 5,
        (false, GameMode::Degen) => 10,
        (true, GameMode::Normal) => 12,
        (true, GameMode::Degen) => 20,
    };

    DifficultyProfile {
        base_speed,
        spawn_density,
        obstacle_weights,
        token_weight,
        reaction_time,
    }
}

/// Owns the irreversible mode flip. Re-evaluated against the score each tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Director {
    mode: GameMode,
    fired: bool,
}

impl Director {
    pub fn new() -> Self {
        Self {
            mode: GameMode::Normal,
            fired: false,
        }
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    /// Arm Degen Mode when the score first crosses the threshold. Returns the
    /// activation event exactly once per session.
    pub fn update(&mut self, score: f64) -> Option<GameEvent> {
        if !self.fired && score >= DEGEN_SCORE_THRESHOLD {
            self.fired = true;
            self.mode = GameMode::Degen;
            return Some(GameEvent::DegenActivated);
        }
        None
    }
}

impl Default for Director {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_steps_are_monotonic() {
        let mut prev = profile(0.0, GameMode::Normal, false);
        for d in (0..2500).step_by(10) {
            let p = profile(d as f32, GameMode::Normal, false);
            assert!(p.base_speed >= prev.base_speed);
            assert!(p.spawn_density >= prev.spawn_density);
            prev = p;
        }
    }

    #[test]
    fn test_level_checkpoints() {
        assert_eq!(level(0.0), 0);
        assert_eq!(level(149.9), 0);
        assert_eq!(level(150.0), 1);
        assert_eq!(level(9999.0), 5);
    }

    #[test]
    fn test_degen_profile_is_harsher() {
        let normal = profile(400.0, GameMode::Normal, false);
        let degen = profile(400.0, GameMode::Degen, false);
        assert!(degen.base_speed > normal.base_speed);
        assert!(degen.spawn_density > normal.spawn_density);
        assert!(degen.reaction_time < normal.reaction_time);
    }

    #[test]
    fn test_nft_curve_only_touches_collectibles() {
        let plain = profile(200.0, GameMode::Normal, false);
        let holder = profile(200.0, GameMode::Normal, true);
        assert!(holder.token_weight > plain.token_weight);
        assert_eq!(holder.base_speed, plain.base_speed);
        assert_eq!(holder.obstacle_weights, plain.obstacle_weights);
    }

    #[test]
    fn test_mode_flip_is_single_fire() {
        let mut director = Director::new();
        assert!(director.update(499.9).is_none());
        assert_eq!(director.mode(), GameMode::Normal);

        // Cross the threshold: fires exactly once
        assert_eq!(director.update(500.0), Some(GameEvent::DegenActivated));
        assert_eq!(director.mode(), GameMode::Degen);

        // Crossing again (combo spike after a notional reset) never re-fires
        // and never reverts
        assert!(director.update(480.0).is_none());
        assert_eq!(director.mode(), GameMode::Degen);
        assert!(director.update(700.0).is_none());
        assert_eq!(director.mode(), GameMode::Degen);
    }

    #[test]
    fn test_reaction_distance_floor() {
        let p = profile(0.0, GameMode::Normal, false);
        assert_eq!(p.reaction_distance(0.5), MIN_REACTION_DISTANCE);
        assert!(p.reaction_distance(20.0) > MIN_REACTION_DISTANCE);
    }
}
