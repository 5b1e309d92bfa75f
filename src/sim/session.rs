//! Game session orchestrator
//!
//! Owns the whole per-session state and the top-level state machine:
//! Menu -> Running -> Paused -> Running -> Ended -> Menu. Each rendered
//! frame calls `update`, which drains buffered input, advances the fixed
//! timestep accumulator and hands back one immutable snapshot. On Ended the
//! terminal report goes to the backend pipeline exactly once.

use glam::Vec3;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::report::{GAME_ID, ReportSink, Reporter, SessionReport};
use crate::wallet::UnlockFlags;
use super::collision::{CollisionOutcome, Scoreboard, resolve};
use super::difficulty::{self, Director};
use super::player::PlayerController;
use super::state::{
    EntityView, FrameSnapshot, GameEvent, GamePhase, PlayerView, RngState, SessionState,
};
use super::track::TrackGenerator;

/// How much track the renderer sees around the player
const VISIBLE_BEHIND: f32 = 5.0;
const VISIBLE_AHEAD: f32 = 80.0;

/// Discrete input events from the keyboard/touch collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InputEvent {
    LaneLeft,
    LaneRight,
    Jump,
    Slide,
    Pause,
    Quit,
}

/// Per-tick input buffer: one pending lane-change (last wins), one pending
/// vertical action (extras dropped), plus pause/quit flags.
#[derive(Debug, Clone, Copy, Default)]
struct InputQueue {
    lane: Option<InputEvent>,
    vertical: Option<InputEvent>,
    pause: bool,
    quit: bool,
}

/// Read-once session parameters from the surrounding app
#[derive(Debug, Clone, Default)]
pub struct SessionConfig {
    pub seed: u64,
    pub wallet_address: Option<String>,
    pub unlock: UnlockFlags,
    /// Cosmetic variant from the 3-tap gesture; display only
    pub degen_cosmetic: bool,
}

/// The session orchestrator. One instance per player; no state is shared
/// between sessions.
pub struct Session {
    config: SessionConfig,
    state: SessionState,
    player: PlayerController,
    track: TrackGenerator,
    scoreboard: Scoreboard,
    director: Director,
    rng: Pcg32,
    input: InputQueue,
    accumulator: f32,
    /// Wall-ish clock for the report pipeline; keeps advancing while paused
    app_time: f64,
    revive_tokens: u32,
    reporter: Reporter,
    events: Vec<GameEvent>,
}

impl Session {
    pub fn new(config: SessionConfig, sink: Box<dyn ReportSink>) -> Self {
        let rng = RngState::new(config.seed).to_rng();
        Self {
            config,
            state: SessionState::new(),
            player: PlayerController::new(),
            track: TrackGenerator::new(),
            scoreboard: Scoreboard::new(),
            director: Director::new(),
            rng,
            input: InputQueue::default(),
            accumulator: 0.0,
            app_time: 0.0,
            revive_tokens: 0,
            reporter: Reporter::new(sink),
            events: Vec::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.state.phase
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Menu -> Running: build the per-run state from the seed
    pub fn start(&mut self) {
        if self.state.phase != GamePhase::Menu {
            return;
        }
        self.state = SessionState::new();
        self.state.phase = GamePhase::Running;
        self.player = PlayerController::new();
        self.track = TrackGenerator::new();
        self.scoreboard = Scoreboard::new();
        self.director = Director::new();
        self.rng = RngState::new(self.config.seed).to_rng();
        self.input = InputQueue::default();
        self.accumulator = 0.0;
        self.revive_tokens = self.config.unlock.revive_tokens();
        self.events.push(GameEvent::Started {
            seed: self.config.seed,
        });
        log::info!("session started (seed {})", self.config.seed);
    }

    /// Buffer an input event. Malformed timing is never an error: extra
    /// events within a tick are simply dropped, lane-changes last-wins.
    pub fn handle_input(&mut self, event: InputEvent) {
        match self.state.phase {
            GamePhase::Running | GamePhase::Paused => {}
            GamePhase::Menu | GamePhase::Ended => return,
        }
        match event {
            InputEvent::LaneLeft | InputEvent::LaneRight => self.input.lane = Some(event),
            InputEvent::Jump | InputEvent::Slide => {
                if self.input.vertical.is_none() {
                    self.input.vertical = Some(event);
                }
            }
            InputEvent::Pause => self.input.pause = true,
            InputEvent::Quit => self.input.quit = true,
        }
    }

    /// Ended -> Menu: the player dismissed the results screen. Run state is
    /// discarded; any pending report delivery keeps retrying.
    pub fn acknowledge(&mut self) {
        if self.state.phase != GamePhase::Ended {
            return;
        }
        self.state = SessionState::new();
        self.player = PlayerController::new();
        self.track = TrackGenerator::new();
        self.scoreboard = Scoreboard::new();
        self.director = Director::new();
        self.events.clear();
    }

    /// Advance by one rendered frame and produce the snapshot for the
    /// rendering layer. The frame delta is clamped so a stalled render loop
    /// cannot tunnel the player through obstacles.
    pub fn update(&mut self, frame_dt: f32) -> FrameSnapshot {
        let dt = frame_dt.clamp(0.0, MAX_FRAME_DELTA);
        self.app_time += dt as f64;
        self.reporter.poll(self.app_time);

        if self.input.quit {
            self.input.quit = false;
            self.input.pause = false;
            self.quit();
        } else if self.input.pause {
            self.input.pause = false;
            self.toggle_pause();
        }

        if self.state.phase == GamePhase::Running {
            let cap = SIM_DT * MAX_SUBSTEPS as f32;
            self.accumulator = (self.accumulator + dt).min(cap);
            while self.accumulator >= SIM_DT && self.state.phase == GamePhase::Running {
                self.tick(SIM_DT);
                self.accumulator -= SIM_DT;
            }
        }

        self.snapshot()
    }

    fn toggle_pause(&mut self) {
        match self.state.phase {
            GamePhase::Running => {
                self.state.phase = GamePhase::Paused;
                self.events.push(GameEvent::Paused);
            }
            GamePhase::Paused => {
                self.state.phase = GamePhase::Running;
                self.events.push(GameEvent::Resumed);
            }
            GamePhase::Menu | GamePhase::Ended => {}
        }
    }

    /// Explicit quit counts as a session end: report, then wait for
    /// acknowledge
    fn quit(&mut self) {
        match self.state.phase {
            GamePhase::Running | GamePhase::Paused => {
                log::info!("session quit at distance {:.1}", self.player.state().distance);
                self.end_run();
            }
            GamePhase::Menu | GamePhase::Ended => {}
        }
    }

    /// One fixed simulation step. Order matters and is one-way:
    /// input -> player -> track -> collision -> scoring -> difficulty.
    fn tick(&mut self, dt: f32) {
        if let Some(event) = self.input.lane.take() {
            self.player.on_input(event);
        }
        if let Some(event) = self.input.vertical.take() {
            self.player.on_input(event);
        }

        self.state.elapsed_time += dt as f64;

        let profile = difficulty::profile(
            self.player.state().distance,
            self.director.mode(),
            self.config.unlock.holds_qualifying_nft,
        );
        self.player.tick(dt, profile.base_speed, self.state.elapsed_time);
        let distance = self.player.state().distance;

        self.track.advance(distance, &profile, &mut self.rng);

        let near = self
            .track
            .active_entities(distance - COLLISION_RADIUS, distance + COLLISION_RADIUS);
        match resolve(self.player.state(), &near, self.state.elapsed_time) {
            CollisionOutcome::None => {}
            CollisionOutcome::Collected { id, kind } => {
                if self.track.consume(id) {
                    self.scoreboard.on_collected(kind);
                    let at = near
                        .iter()
                        .find(|e| e.id == id)
                        .map(|e| e.distance)
                        .unwrap_or(distance);
                    self.events.push(GameEvent::Collected {
                        kind,
                        lane: self.player.state().lane,
                        distance: at,
                    });
                }
            }
            CollisionOutcome::Hit(kind) => {
                self.events.push(GameEvent::Hit { kind });
                if self.revive_tokens > 0 {
                    // Orchestrator-level retry: spend the token before the
                    // next resolve ever happens
                    self.revive_tokens -= 1;
                    self.player
                        .grant_invulnerability(self.state.elapsed_time + REVIVE_INVULN_SECS);
                    self.events.push(GameEvent::Revived);
                    log::info!("revive token spent at distance {distance:.1}");
                } else {
                    self.sync_state();
                    self.end_run();
                    return;
                }
            }
        }

        let missed = self.track.sweep_missed(distance);
        self.scoreboard.on_missed(missed);
        self.scoreboard.accrue(dt);
        self.track.prune(distance);

        if let Some(event) = self.director.update(self.scoreboard.score()) {
            self.events.push(event);
        }
        self.sync_state();
    }

    fn sync_state(&mut self) {
        self.state.score = self.scoreboard.score();
        self.state.coins_collected = self.scoreboard.coins_collected();
        self.state.combo_multiplier = self.scoreboard.combo();
        self.state.mode = self.director.mode();
    }

    /// Terminal transition. Only reachable from Running/Paused, so the
    /// report goes out exactly once per session.
    fn end_run(&mut self) {
        self.state.phase = GamePhase::Ended;
        self.events.push(GameEvent::Ended);

        let report = self.build_report();
        log::info!(
            "session ended: score {} coins {} distance {:.1}",
            report.score,
            report.coins_collected,
            report.distance
        );
        self.reporter.submit(report, self.app_time);
        self.reporter.poll(self.app_time);
    }

    fn build_report(&self) -> SessionReport {
        let distance = self.player.state().distance;
        let reached_degen = self.state.mode == super::state::GameMode::Degen;

        let mut achievements = Vec::new();
        if reached_degen {
            achievements.push("degen_mode".to_string());
        }
        if self.scoreboard.combo() == MAX_COMBO {
            achievements.push("combo_maxed".to_string());
        }
        if distance >= 1000.0 {
            achievements.push("marathon".to_string());
        }

        SessionReport {
            wallet_address: self.config.wallet_address.clone(),
            game: GAME_ID.to_string(),
            score: self.state.score.round() as u64,
            level: difficulty::level(distance),
            achievements,
            play_time: self.state.elapsed_time,
            coins_collected: self.state.coins_collected,
            distance,
            reached_degen_mode: reached_degen,
        }
    }

    fn snapshot(&mut self) -> FrameSnapshot {
        let player = self.player.state();
        let entities = self
            .track
            .active_entities(player.distance - VISIBLE_BEHIND, player.distance + VISIBLE_AHEAD)
            .into_iter()
            .map(|e| EntityView {
                id: e.id,
                kind: e.kind,
                lane: e.lane,
                distance: e.distance,
                world_pos: Vec3::new(e.lane.world_x(), 0.0, e.distance - player.distance),
            })
            .collect();

        FrameSnapshot {
            phase: self.state.phase,
            mode: self.state.mode,
            score: self.state.score,
            coins_collected: self.state.coins_collected,
            combo_multiplier: self.state.combo_multiplier,
            elapsed_time: self.state.elapsed_time,
            player: PlayerView {
                lane: player.lane,
                vertical: player.vertical,
                world_pos: Vec3::new(player.lane.world_x(), player.vertical_offset, player.distance),
                speed: player.speed,
                invulnerable: player.is_invulnerable(self.state.elapsed_time),
            },
            entities,
            events: std::mem::take(&mut self.events),
            degen_cosmetic: self.config.degen_cosmetic,
        }
    }
}
