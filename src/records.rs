//! Persisted player records
//!
//! High score and coin totals shown on the menu screen. Storage itself is a
//! collaborator (browser storage or the backend); this type only owns the
//! data and the update rules, and round-trips through a JSON blob.

use serde::{Deserialize, Serialize};

use crate::report::SessionReport;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecords {
    pub high_score: u64,
    pub total_coins: u64,
    pub best_distance: f32,
    pub runs_played: u32,
    /// Ever reached Degen Mode on this profile
    pub degen_reached: bool,
}

impl PlayerRecords {
    pub fn new() -> Self {
        Self::default()
    }

    /// Would this score beat the stored best?
    pub fn is_new_best(&self, score: u64) -> bool {
        score > self.high_score
    }

    /// Fold a finished session in. Returns true when the high score moved.
    pub fn absorb(&mut self, report: &SessionReport) -> bool {
        self.runs_played += 1;
        self.total_coins += u64::from(report.coins_collected);
        self.best_distance = self.best_distance.max(report.distance);
        self.degen_reached |= report.reached_degen_mode;

        let new_best = self.is_new_best(report.score);
        if new_best {
            self.high_score = report.score;
            log::info!("new high score: {}", report.score);
        }
        new_best
    }

    /// Serialize for the storage collaborator
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Parse a stored blob, falling back to fresh records on corruption
    pub fn from_json(json: &str) -> Self {
        serde_json::from_str(json).unwrap_or_else(|_| {
            log::warn!("corrupt records blob, starting fresh");
            Self::new()
        })
    }
}
