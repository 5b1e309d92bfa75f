//! Collision resolution and scoring
//!
//! Each tick the orchestrator hands the player state plus the entities near
//! the player's distance to `resolve`. Overlap is an axis-aligned distance
//! window around the player; lane must match (Wide blocks cover two lanes)
//! and the evasion table may excuse the contact for the current vertical
//! state. Scoring lives next to collision because every scoring change is
//! driven by what resolution reports.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use super::state::{CollectibleKind, EntityKind, ObstacleKind, PlayerState, VerticalState};
use super::track::TrackEntity;

/// What one tick of collision resolution produced
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CollisionOutcome {
    None,
    /// Collectible taken; the orchestrator must consume `id` on the track
    Collected { id: u32, kind: CollectibleKind },
    /// Fatal contact; terminal unless the orchestrator spends a revive
    Hit(ObstacleKind),
}

/// The evasion table: is a contact with `obstacle` excused while in
/// `vertical`? Low bars are jumped over, high bars are slid under, wide
/// blocks yield to nothing but a lane change.
pub fn evades(obstacle: ObstacleKind, vertical: VerticalState) -> bool {
    matches!(
        (obstacle, vertical),
        (ObstacleKind::Low, VerticalState::Jumping) | (ObstacleKind::High, VerticalState::Sliding)
    )
}

/// Resolve the player against nearby entities. A fatal hit outranks a
/// collection in the same tick.
pub fn resolve(player: &PlayerState, entities: &[TrackEntity], elapsed: f64) -> CollisionOutcome {
    let mut collected = CollisionOutcome::None;

    for entity in entities {
        if (entity.distance - player.distance).abs() > COLLISION_RADIUS {
            continue;
        }
        match entity.kind {
            EntityKind::Obstacle(kind) => {
                if entity.covers(player.lane)
                    && !evades(kind, player.vertical)
                    && !player.is_invulnerable(elapsed)
                {
                    return CollisionOutcome::Hit(kind);
                }
            }
            EntityKind::Collectible(kind) => {
                if entity.lane == player.lane && collected == CollisionOutcome::None {
                    collected = CollisionOutcome::Collected {
                        id: entity.id,
                        kind,
                    };
                }
            }
        }
    }

    collected
}

/// Score, coin and combo bookkeeping. Score only ever goes up; the combo
/// multiplier steps up on sustained collectible streaks and drops back to 1
/// once enough collectibles slip past uncollected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scoreboard {
    score: f64,
    coins_collected: u32,
    combo: u32,
    streak: u32,
    miss_streak: u32,
}

impl Scoreboard {
    pub fn new() -> Self {
        Self {
            score: 0.0,
            coins_collected: 0,
            combo: 1,
            streak: 0,
            miss_streak: 0,
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn coins_collected(&self) -> u32 {
        self.coins_collected
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    /// Continuous accrual while running: base rate times combo
    pub fn accrue(&mut self, dt: f32) {
        self.score += BASE_SCORE_RATE * self.combo as f64 * dt as f64;
    }

    /// Discrete bonus for a pickup; extends the streak
    pub fn on_collected(&mut self, kind: CollectibleKind) {
        let bonus = match kind {
            CollectibleKind::Coin => COIN_BONUS,
            CollectibleKind::Token => TOKEN_BONUS,
        };
        self.score += bonus * self.combo as f64;
        self.coins_collected += 1;
        self.miss_streak = 0;
        self.streak += 1;
        if self.streak.is_multiple_of(COMBO_STEP_STREAK) {
            self.combo = (self.combo + 1).min(MAX_COMBO);
        }
    }

    /// Collectibles that scrolled past uncollected. Enough of them in a row
    /// resets the combo; the score itself never decreases.
    pub fn on_missed(&mut self, count: u32) {
        if count == 0 {
            return;
        }
        self.miss_streak += count;
        if self.miss_streak >= MISS_RESET_THRESHOLD {
            self.combo = 1;
            self.streak = 0;
            self.miss_streak = 0;
        }
    }
}

impl Default for Scoreboard {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::Lane;

    fn entity(id: u32, lane: Lane, distance: f32, kind: EntityKind) -> TrackEntity {
        TrackEntity {
            id,
            lane,
            distance,
            kind,
        }
    }

    fn player_at(distance: f32, lane: Lane, vertical: VerticalState) -> PlayerState {
        PlayerState {
            lane,
            vertical,
            vertical_offset: 0.0,
            speed: 8.0,
            distance,
            invulnerable_until: None,
        }
    }

    #[test]
    fn test_low_obstacle_evaded_by_jumping() {
        let entities = [entity(
            1,
            Lane::Center,
            20.0,
            EntityKind::Obstacle(ObstacleKind::Low),
        )];

        let jumping = player_at(20.0, Lane::Center, VerticalState::Jumping);
        assert_eq!(resolve(&jumping, &entities, 0.0), CollisionOutcome::None);

        let grounded = player_at(20.0, Lane::Center, VerticalState::Grounded);
        assert_eq!(
            resolve(&grounded, &entities, 0.0),
            CollisionOutcome::Hit(ObstacleKind::Low)
        );
    }

    #[test]
    fn test_high_obstacle_evaded_by_sliding_only() {
        let entities = [entity(
            1,
            Lane::Center,
            10.0,
            EntityKind::Obstacle(ObstacleKind::High),
        )];

        let sliding = player_at(10.0, Lane::Center, VerticalState::Sliding);
        assert_eq!(resolve(&sliding, &entities, 0.0), CollisionOutcome::None);

        let jumping = player_at(10.0, Lane::Center, VerticalState::Jumping);
        assert_eq!(
            resolve(&jumping, &entities, 0.0),
            CollisionOutcome::Hit(ObstacleKind::High)
        );
    }

    #[test]
    fn test_wide_obstacle_hits_both_covered_lanes() {
        let entities = [entity(
            1,
            Lane::Left,
            10.0,
            EntityKind::Obstacle(ObstacleKind::Wide),
        )];

        for vertical in [
            VerticalState::Grounded,
            VerticalState::Jumping,
            VerticalState::Sliding,
        ] {
            let covered = player_at(10.0, Lane::Center, vertical);
            assert_eq!(
                resolve(&covered, &entities, 0.0),
                CollisionOutcome::Hit(ObstacleKind::Wide)
            );
        }

        let dodged = player_at(10.0, Lane::Right, VerticalState::Grounded);
        assert_eq!(resolve(&dodged, &entities, 0.0), CollisionOutcome::None);
    }

    #[test]
    fn test_lane_mismatch_is_a_miss() {
        let entities = [entity(
            1,
            Lane::Left,
            10.0,
            EntityKind::Obstacle(ObstacleKind::High),
        )];
        let player = player_at(10.0, Lane::Right, VerticalState::Grounded);
        assert_eq!(resolve(&player, &entities, 0.0), CollisionOutcome::None);
    }

    #[test]
    fn test_outside_collision_radius_is_a_miss() {
        let entities = [entity(
            1,
            Lane::Center,
            10.0 + COLLISION_RADIUS + 0.1,
            EntityKind::Obstacle(ObstacleKind::High),
        )];
        let player = player_at(10.0, Lane::Center, VerticalState::Grounded);
        assert_eq!(resolve(&player, &entities, 0.0), CollisionOutcome::None);
    }

    #[test]
    fn test_invulnerability_excuses_hits() {
        let entities = [entity(
            1,
            Lane::Center,
            10.0,
            EntityKind::Obstacle(ObstacleKind::Wide),
        )];
        let mut player = player_at(10.0, Lane::Center, VerticalState::Grounded);
        player.invulnerable_until = Some(5.0);
        assert_eq!(resolve(&player, &entities, 1.0), CollisionOutcome::None);
        assert_eq!(
            resolve(&player, &entities, 6.0),
            CollisionOutcome::Hit(ObstacleKind::Wide)
        );
    }

    #[test]
    fn test_hit_outranks_collection_same_tick() {
        let entities = [
            entity(1, Lane::Center, 10.0, EntityKind::Collectible(CollectibleKind::Coin)),
            entity(2, Lane::Center, 10.2, EntityKind::Obstacle(ObstacleKind::High)),
        ];
        let player = player_at(10.0, Lane::Center, VerticalState::Grounded);
        assert_eq!(
            resolve(&player, &entities, 0.0),
            CollisionOutcome::Hit(ObstacleKind::High)
        );
    }

    #[test]
    fn test_collect_coin() {
        let entities = [entity(
            7,
            Lane::Center,
            20.0,
            EntityKind::Collectible(CollectibleKind::Coin),
        )];
        let player = player_at(19.2, Lane::Center, VerticalState::Grounded);
        assert_eq!(
            resolve(&player, &entities, 0.0),
            CollisionOutcome::Collected {
                id: 7,
                kind: CollectibleKind::Coin
            }
        );
    }

    #[test]
    fn test_score_accrual_scales_with_combo() {
        let mut board = Scoreboard::new();
        board.accrue(1.0);
        assert!((board.score() - BASE_SCORE_RATE).abs() < 1e-9);

        // Push combo to 2x and accrue again
        for _ in 0..COMBO_STEP_STREAK {
            board.on_collected(CollectibleKind::Coin);
        }
        assert_eq!(board.combo(), 2);
        let before = board.score();
        board.accrue(1.0);
        assert!((board.score() - before - 2.0 * BASE_SCORE_RATE).abs() < 1e-9);
    }

    #[test]
    fn test_combo_caps_out() {
        let mut board = Scoreboard::new();
        for _ in 0..(COMBO_STEP_STREAK * MAX_COMBO * 3) {
            board.on_collected(CollectibleKind::Coin);
        }
        assert_eq!(board.combo(), MAX_COMBO);
    }

    #[test]
    fn test_miss_streak_resets_combo() {
        let mut board = Scoreboard::new();
        for _ in 0..COMBO_STEP_STREAK {
            board.on_collected(CollectibleKind::Coin);
        }
        assert_eq!(board.combo(), 2);

        // Misses below the threshold keep the combo
        board.on_missed(MISS_RESET_THRESHOLD - 1);
        assert_eq!(board.combo(), 2);

        // A collection clears the miss streak
        board.on_collected(CollectibleKind::Coin);
        board.on_missed(MISS_RESET_THRESHOLD - 1);
        assert_eq!(board.combo(), 2);

        // Crossing the threshold resets to 1
        board.on_missed(1);
        assert_eq!(board.combo(), 1);
    }

    #[test]
    fn test_score_never_decreases() {
        let mut board = Scoreboard::new();
        let mut last = board.score();
        for i in 0..200 {
            match i % 5 {
                0 => board.on_collected(CollectibleKind::Coin),
                1 => board.on_missed(2),
                _ => board.accrue(0.016),
            }
            assert!(board.score() >= last);
            last = board.score();
        }
    }
}
