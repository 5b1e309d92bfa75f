//! Endless procedural track
//!
//! The track is a sliding window of fixed-length segments generated ahead of
//! the player and pruned once fully passed. Entities sit on a lane/row grid.
//!
//! The one rule that must never break: within any window equal to the
//! player's reaction distance, at least one lane stays free of unavoidable
//! obstacles. The generator enforces it structurally - unavoidable obstacles
//! never cover the current safe lane, and the safe lane only moves after a
//! clear gap of at least one reaction distance.

use std::collections::VecDeque;

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use super::difficulty::DifficultyProfile;
use super::state::{CollectibleKind, EntityKind, Lane, ObstacleKind};

/// Margin applied to the inter-era gap so the invariant survives the player
/// arriving one difficulty checkpoint faster than the generation-time speed.
const GAP_SAFETY: f32 = 1.25;

/// No unavoidable obstacles in the opening stretch
const SAFE_START_DISTANCE: f32 = 30.0;

/// One spawned thing on the track grid
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpawnEntity {
    pub id: u32,
    pub lane: Lane,
    /// Meters from the owning segment's start
    pub distance_offset: f32,
    pub kind: EntityKind,
    /// Collectible already taken this session
    consumed: bool,
    /// Collectible already counted as missed (scrolled past uncollected)
    missed: bool,
}

impl SpawnEntity {
    /// Lanes this entity occupies. Wide obstacles span their lane plus the
    /// next lane to the right; everything else occupies a single lane.
    pub fn covers(&self, lane: Lane) -> bool {
        if lane == self.lane {
            return true;
        }
        matches!(self.kind, EntityKind::Obstacle(ObstacleKind::Wide))
            && lane.offset() == self.lane.offset() + 1
    }
}

/// A distance-bounded slice of generated track
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackSegment {
    pub start_distance: f32,
    pub length: f32,
    /// Ascending by (distance_offset, lane)
    pub entities: Vec<SpawnEntity>,
}

impl TrackSegment {
    fn end_distance(&self) -> f32 {
        self.start_distance + self.length
    }
}

/// Flattened query result: one entity at an absolute track distance
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrackEntity {
    pub id: u32,
    pub lane: Lane,
    pub distance: f32,
    pub kind: EntityKind,
}

impl TrackEntity {
    /// Same coverage rule as `SpawnEntity::covers`
    pub fn covers(&self, lane: Lane) -> bool {
        if lane == self.lane {
            return true;
        }
        matches!(self.kind, EntityKind::Obstacle(ObstacleKind::Wide))
            && lane.offset() == self.lane.offset() + 1
    }
}

/// Owns all segments. The collision engine only ever reads query results;
/// mutation (consume, miss sweep, prune) goes through the generator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackGenerator {
    segments: VecDeque<TrackSegment>,
    /// Absolute distance generated up to
    generated_to: f32,
    next_id: u32,
    /// Lane guaranteed free of unavoidable obstacles in the current era
    safe_lane: Lane,
    /// No unavoidable obstacle may be placed before this distance
    clear_until: f32,
    /// Remaining rows in the active collectible run
    coin_run_left: u8,
    coin_run_lane: Lane,
}

impl TrackGenerator {
    pub fn new() -> Self {
        Self {
            segments: VecDeque::new(),
            generated_to: 0.0,
            next_id: 1,
            safe_lane: Lane::Center,
            clear_until: SAFE_START_DISTANCE,
            coin_run_left: 0,
            coin_run_lane: Lane::Center,
        }
    }

    pub fn generated_to(&self) -> f32 {
        self.generated_to
    }

    /// Extend the retained window so track exists up to `to_distance` plus
    /// the lookahead. Deterministic given the RNG state and profile.
    pub fn advance(&mut self, to_distance: f32, profile: &DifficultyProfile, rng: &mut Pcg32) {
        let target = to_distance + LOOKAHEAD;
        while self.generated_to < target {
            self.generate_segment(profile, rng);
        }
    }

    /// Entities whose absolute distance falls in [from, to], ascending by
    /// distance with ties broken by lane ascending. Ranges outside the
    /// retained window simply come back empty.
    pub fn active_entities(&self, from: f32, to: f32) -> Vec<TrackEntity> {
        let mut out = Vec::new();
        for segment in &self.segments {
            if segment.end_distance() < from {
                continue;
            }
            if segment.start_distance > to {
                break;
            }
            for entity in &segment.entities {
                let distance = segment.start_distance + entity.distance_offset;
                if distance >= from && distance <= to && !entity.consumed {
                    out.push(TrackEntity {
                        id: entity.id,
                        lane: entity.lane,
                        distance,
                        kind: entity.kind,
                    });
                }
            }
        }
        out
    }

    /// Mark a collectible as taken so it is never reported twice
    pub fn consume(&mut self, id: u32) -> bool {
        for segment in &mut self.segments {
            if let Some(entity) = segment.entities.iter_mut().find(|e| e.id == id) {
                if entity.kind.is_collectible() && !entity.consumed {
                    entity.consumed = true;
                    return true;
                }
                return false;
            }
        }
        false
    }

    /// Count collectibles that scrolled behind the player uncollected,
    /// marking each so it is only counted once. Feeds the combo reset.
    pub fn sweep_missed(&mut self, player_distance: f32) -> u32 {
        let cutoff = player_distance - COLLISION_RADIUS;
        let mut missed = 0;
        for segment in &mut self.segments {
            if segment.start_distance > cutoff {
                break;
            }
            for entity in &mut segment.entities {
                let distance = segment.start_distance + entity.distance_offset;
                if distance < cutoff
                    && entity.kind.is_collectible()
                    && !entity.consumed
                    && !entity.missed
                {
                    entity.missed = true;
                    missed += 1;
                }
            }
        }
        missed
    }

    /// Drop segments fully behind the retention margin. Lazy: queries into
    /// pruned territory just return nothing.
    pub fn prune(&mut self, player_distance: f32) {
        let cutoff = player_distance - PRUNE_MARGIN;
        while let Some(front) = self.segments.front() {
            if front.end_distance() < cutoff {
                self.segments.pop_front();
            } else {
                break;
            }
        }
    }

    /// True if some lane has no unavoidable obstacle in [from, from + window]
    pub fn clear_lane_exists(&self, from: f32, window: f32) -> bool {
        let blocking = self.active_entities(from, from + window);
        Lane::ALL.iter().any(|&lane| {
            !blocking
                .iter()
                .any(|e| e.kind.is_unavoidable() && e.covers(lane))
        })
    }

    fn generate_segment(&mut self, profile: &DifficultyProfile, rng: &mut Pcg32) {
        let start = self.generated_to;
        let rows = (SEGMENT_LENGTH / GRID_STEP) as u32;
        let gap = profile.reaction_distance(profile.base_speed) * GAP_SAFETY;

        let mut entities: Vec<SpawnEntity> = Vec::new();

        for row in 0..rows {
            let row_d = start + row as f32 * GRID_STEP;
            let mut placed: Vec<(Lane, EntityKind)> = Vec::new();

            let may_block = row_d >= self.clear_until;
            if may_block && rng.random_bool(profile.spawn_density as f64) {
                // Occasionally drift the safe lane instead of spawning; the
                // clear gap keeps the invariant over the transition
                if rng.random_bool(0.2) {
                    let delta = if rng.random_bool(0.5) { 1 } else { -1 };
                    let moved = self.safe_lane.shifted(delta);
                    if moved != self.safe_lane {
                        self.safe_lane = moved;
                        self.clear_until = row_d + gap;
                    }
                } else {
                    self.place_obstacle_row(profile, rng, &mut placed);
                }
            }

            self.place_collectible(profile, rng, row, &mut placed);

            placed.sort_by_key(|(lane, _)| *lane);
            for (lane, kind) in placed {
                entities.push(SpawnEntity {
                    id: self.next_id,
                    lane,
                    distance_offset: row as f32 * GRID_STEP,
                    kind,
                    consumed: false,
                    missed: false,
                });
                self.next_id += 1;
            }
        }

        self.segments.push_back(TrackSegment {
            start_distance: start,
            length: SEGMENT_LENGTH,
            entities,
        });
        self.generated_to = start + SEGMENT_LENGTH;

        debug_assert!(
            {
                let window = profile.reaction_distance(profile.base_speed);
                let mut d = start;
                let mut ok = true;
                while d < self.generated_to {
                    ok &= self.clear_lane_exists(d, window);
                    d += GRID_STEP;
                }
                ok
            },
            "track generation violated the clear-lane invariant"
        );
    }

    /// Fill one grid row with obstacles, never covering the safe lane
    fn place_obstacle_row(
        &mut self,
        profile: &DifficultyProfile,
        rng: &mut Pcg32,
        placed: &mut Vec<(Lane, EntityKind)>,
    ) {
        let [w_high, w_low, w_wide] = profile.obstacle_weights;
        match pick_weighted(rng, &[w_high, w_low, w_wide]) {
            // Low bar: avoidable by jumping, so it may span any lanes,
            // including the safe one
            1 => match rng.random_range(0..3) {
                0 => {
                    let lane = Lane::ALL[rng.random_range(0..3) as usize];
                    placed.push((lane, EntityKind::Obstacle(ObstacleKind::Low)));
                }
                1 => {
                    let skip = rng.random_range(0..3) as usize;
                    for (i, lane) in Lane::ALL.iter().enumerate() {
                        if i != skip {
                            placed.push((*lane, EntityKind::Obstacle(ObstacleKind::Low)));
                        }
                    }
                }
                _ => {
                    for lane in Lane::ALL {
                        placed.push((lane, EntityKind::Obstacle(ObstacleKind::Low)));
                    }
                }
            },
            // Wide block: covers two adjacent lanes, both must be off the
            // safe lane. Impossible around a Center safe lane; fall back to
            // a single High bar there.
            2 => match self.safe_lane {
                Lane::Left => placed.push((Lane::Center, EntityKind::Obstacle(ObstacleKind::Wide))),
                Lane::Right => placed.push((Lane::Left, EntityKind::Obstacle(ObstacleKind::Wide))),
                Lane::Center => {
                    let lane = if rng.random_bool(0.5) { Lane::Left } else { Lane::Right };
                    placed.push((lane, EntityKind::Obstacle(ObstacleKind::High)));
                }
            },
            // High bar in one or both non-safe lanes
            _ => {
                let free: Vec<Lane> = Lane::ALL
                    .iter()
                    .copied()
                    .filter(|&l| l != self.safe_lane)
                    .collect();
                if rng.random_bool(0.4) {
                    for lane in free {
                        placed.push((lane, EntityKind::Obstacle(ObstacleKind::High)));
                    }
                } else {
                    let lane = free[rng.random_range(0..free.len())];
                    placed.push((lane, EntityKind::Obstacle(ObstacleKind::High)));
                }
            }
        }
    }

    /// Continue or start a collectible run in a lane that is free of
    /// obstacles on this row. Collectibles carry no placement constraint
    /// beyond not sharing a cell with an obstacle.
    fn place_collectible(
        &mut self,
        profile: &DifficultyProfile,
        rng: &mut Pcg32,
        _row: u32,
        placed: &mut Vec<(Lane, EntityKind)>,
    ) {
        if self.coin_run_left == 0 {
            if !rng.random_bool(0.3) {
                return;
            }
            self.coin_run_left = 3 + rng.random_range(0..4) as u8;
            self.coin_run_lane = self.safe_lane;
        }

        let lane = self.coin_run_lane;
        let occupied = placed.iter().any(|(l, kind)| {
            *l == lane
                || (matches!(kind, EntityKind::Obstacle(ObstacleKind::Wide))
                    && lane.offset() == l.offset() + 1)
        });
        if occupied {
            return;
        }

        self.coin_run_left -= 1;
        let kind = if rng.random_range(0..100u32) < profile.token_weight {
            CollectibleKind::Token
        } else {
            CollectibleKind::Coin
        };
        placed.push((lane, EntityKind::Collectible(kind)));
    }
}

impl Default for TrackGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Roll an index from relative weights. Total weight is always positive here.
fn pick_weighted(rng: &mut Pcg32, weights: &[u32]) -> usize {
    let total: u32 = weights.iter().sum();
    let mut roll = rng.random_range(0..total);
    for (i, &w) in weights.iter().enumerate() {
        if roll < w {
            return i;
        }
        roll -= w;
    }
    weights.len() - 1
}
