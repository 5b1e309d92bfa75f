//! Player controller
//!
//! Translates discrete input events into lane and vertical state transitions.
//! The vertical machine is closed: Grounded <-> Jumping and Grounded <->
//! Sliding, both on fixed timers that return to Grounded on their own. A jump
//! or slide request while either timer runs is dropped - no chaining.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use super::session::InputEvent;
use super::state::{PlayerState, VerticalState};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerController {
    state: PlayerState,
    jump_timer: f32,
    slide_timer: f32,
}

impl PlayerController {
    pub fn new() -> Self {
        Self {
            state: PlayerState::new(),
            jump_timer: 0.0,
            slide_timer: 0.0,
        }
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Grant a bounded invulnerability window (revive path; orchestrator only)
    pub fn grant_invulnerability(&mut self, until: f64) {
        self.state.invulnerable_until = Some(until);
    }

    /// Apply one input event. Out-of-bounds lane changes clamp, redundant
    /// vertical requests are dropped, non-player events are ignored - input
    /// is never an error.
    pub fn on_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::LaneLeft => self.state.lane = self.state.lane.shifted(-1),
            InputEvent::LaneRight => self.state.lane = self.state.lane.shifted(1),
            InputEvent::Jump => {
                if self.state.vertical == VerticalState::Grounded {
                    self.state.vertical = VerticalState::Jumping;
                    self.jump_timer = JUMP_DURATION;
                }
            }
            InputEvent::Slide => {
                if self.state.vertical == VerticalState::Grounded {
                    self.state.vertical = VerticalState::Sliding;
                    self.slide_timer = SLIDE_DURATION;
                }
            }
            InputEvent::Pause | InputEvent::Quit => {}
        }
    }

    /// Advance one timestep: integrate distance at the profile's base speed,
    /// run down vertical timers, clear expired invulnerability.
    pub fn tick(&mut self, dt: f32, base_speed: f32, elapsed: f64) {
        self.state.speed = base_speed;
        self.state.distance += self.state.speed * dt;

        match self.state.vertical {
            VerticalState::Jumping => {
                self.jump_timer -= dt;
                if self.jump_timer <= 0.0 {
                    self.jump_timer = 0.0;
                    self.state.vertical = VerticalState::Grounded;
                }
            }
            VerticalState::Sliding => {
                self.slide_timer -= dt;
                if self.slide_timer <= 0.0 {
                    self.slide_timer = 0.0;
                    self.state.vertical = VerticalState::Grounded;
                }
            }
            VerticalState::Grounded => {}
        }
        self.state.vertical_offset = self.vertical_offset();

        if let Some(until) = self.state.invulnerable_until {
            if elapsed >= until {
                self.state.invulnerable_until = None;
            }
        }
    }

    /// Renderer-facing height: parabolic jump arc, fixed crouch while sliding
    fn vertical_offset(&self) -> f32 {
        match self.state.vertical {
            VerticalState::Jumping => {
                let t = 1.0 - (self.jump_timer / JUMP_DURATION).clamp(0.0, 1.0);
                JUMP_HEIGHT * 4.0 * t * (1.0 - t)
            }
            VerticalState::Sliding => -0.5,
            VerticalState::Grounded => 0.0,
        }
    }
}

impl Default for PlayerController {
    fn default() -> Self {
        Self::new()
    }
}
