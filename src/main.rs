//! Headless demo: runs one autopiloted session and logs what the rendering
//! layer would see. Useful for eyeballing difficulty pacing and the report
//! payload without a frontend.
//!
//! Usage: lemmi-run [seed]

use std::sync::{Arc, Mutex};

use lemmi_run::records::PlayerRecords;
use lemmi_run::report::{LogSink, ReportError, ReportSink, SessionReport};
use lemmi_run::sim::{
    EntityKind, EntityView, FrameSnapshot, GameEvent, GamePhase, InputEvent, Lane, ObstacleKind,
    Session, SessionConfig, VerticalState,
};
use lemmi_run::wallet::UnlockFlags;

const FRAME: f32 = 1.0 / 60.0;
/// Give up after three simulated minutes
const MAX_FRAMES: u32 = 60 * 180;

/// How far ahead the pilot scans for trouble
const SCAN_RANGE: f32 = 14.0;
/// Gap at which a vertical evade is committed
const EVADE_GAP: f32 = 3.0;
/// Gap at which a lane dodge is committed
const DODGE_GAP: f32 = 10.0;

/// Logs the payload and keeps a copy for the records update at exit
struct CaptureSink {
    inner: LogSink,
    captured: Arc<Mutex<Option<SessionReport>>>,
}

impl ReportSink for CaptureSink {
    fn send(&mut self, report: &SessionReport) -> Result<(), ReportError> {
        self.inner.send(report)?;
        *self.captured.lock().unwrap() = Some(report.clone());
        Ok(())
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let seed = std::env::args()
        .nth(1)
        .and_then(|arg| arg.parse().ok())
        .unwrap_or(42u64);

    let captured = Arc::new(Mutex::new(None));
    let sink = CaptureSink {
        inner: LogSink,
        captured: captured.clone(),
    };

    let config = SessionConfig {
        seed,
        wallet_address: Some("0xdemo".into()),
        unlock: UnlockFlags {
            holds_qualifying_nft: true,
        },
        degen_cosmetic: false,
    };
    let mut session = Session::new(config, Box::new(sink));
    session.start();

    let mut frames = 0;
    loop {
        let snapshot = session.update(FRAME);
        log_events(&snapshot);
        if snapshot.phase == GamePhase::Ended {
            break;
        }
        if let Some(input) = pilot(&snapshot) {
            session.handle_input(input);
        }
        frames += 1;
        if frames >= MAX_FRAMES {
            log::info!("time limit reached, quitting run");
            session.handle_input(InputEvent::Quit);
            session.update(FRAME);
            break;
        }
    }

    let mut records = PlayerRecords::new();
    if let Some(report) = captured.lock().unwrap().as_ref() {
        records.absorb(report);
        log::info!("records after run: {}", records.to_json());
    }
}

fn log_events(snapshot: &FrameSnapshot) {
    for event in &snapshot.events {
        match event {
            GameEvent::Collected { kind, distance, .. } => {
                log::info!(
                    "picked up {kind:?} at {distance:.0}m (score {:.0}, combo {}x)",
                    snapshot.score,
                    snapshot.combo_multiplier
                );
            }
            GameEvent::Hit { kind } => log::info!("hit a {kind:?} obstacle"),
            GameEvent::DegenActivated => log::info!("DEGEN MODE at score {:.0}", snapshot.score),
            GameEvent::Revived => log::info!("revive token spent"),
            GameEvent::Ended => {
                log::info!(
                    "run over: score {:.0}, {} coins, {:.0}m in {:.1}s",
                    snapshot.score,
                    snapshot.coins_collected,
                    snapshot.player.world_pos.z,
                    snapshot.elapsed_time
                );
            }
            _ => {}
        }
    }
}

fn covers(entity: &EntityView, lane: Lane) -> bool {
    if entity.lane == lane {
        return true;
    }
    matches!(entity.kind, EntityKind::Obstacle(ObstacleKind::Wide))
        && entity.lane.offset() + 1 == lane.offset()
}

/// Any obstacle the pilot cannot clear vertically in `lane` within the window
fn lane_blocked(snapshot: &FrameSnapshot, lane: Lane, from: f32, to: f32) -> bool {
    snapshot.entities.iter().any(|entity| {
        entity.kind.is_unavoidable()
            && covers(entity, lane)
            && entity.distance > from
            && entity.distance <= to
    })
}

/// A reactive pilot over the public snapshot, greedy and a little fallible:
/// evade the nearest threat, otherwise drift toward collectibles.
fn pilot(snapshot: &FrameSnapshot) -> Option<InputEvent> {
    let player = &snapshot.player;
    let distance = player.world_pos.z;

    let threat = snapshot
        .entities
        .iter()
        .filter(|entity| {
            matches!(entity.kind, EntityKind::Obstacle(_))
                && covers(entity, player.lane)
                && entity.distance > distance
                && entity.distance - distance <= SCAN_RANGE
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance));

    if let Some(threat) = threat {
        let gap = threat.distance - distance;
        match threat.kind {
            EntityKind::Obstacle(ObstacleKind::Low) => {
                if gap <= EVADE_GAP && player.vertical == VerticalState::Grounded {
                    return Some(InputEvent::Jump);
                }
                return None;
            }
            EntityKind::Obstacle(ObstacleKind::High) | EntityKind::Obstacle(ObstacleKind::Wide) => {
                if gap <= DODGE_GAP {
                    if let Some(step) = dodge_step(snapshot, player.lane, distance) {
                        return Some(step);
                    }
                    // Boxed in laterally; sliding clears a high bar
                    if matches!(threat.kind, EntityKind::Obstacle(ObstacleKind::High))
                        && gap <= EVADE_GAP
                        && player.vertical == VerticalState::Grounded
                    {
                        return Some(InputEvent::Slide);
                    }
                }
                return None;
            }
            EntityKind::Collectible(_) => {}
        }
    }

    chase_collectible(snapshot, player.lane, distance)
}

/// Pick the adjacent lane with a clear window, if any
fn dodge_step(snapshot: &FrameSnapshot, lane: Lane, distance: f32) -> Option<InputEvent> {
    for delta in [-1, 1] {
        let candidate = lane.shifted(delta);
        if candidate == lane {
            continue;
        }
        if !lane_blocked(snapshot, candidate, distance, distance + DODGE_GAP) {
            return Some(if delta < 0 {
                InputEvent::LaneLeft
            } else {
                InputEvent::LaneRight
            });
        }
    }
    None
}

fn chase_collectible(snapshot: &FrameSnapshot, lane: Lane, distance: f32) -> Option<InputEvent> {
    let target = snapshot
        .entities
        .iter()
        .filter(|entity| {
            entity.kind.is_collectible()
                && entity.distance > distance
                && entity.distance - distance <= SCAN_RANGE
        })
        .min_by(|a, b| a.distance.total_cmp(&b.distance))?;

    let step = (target.lane.offset() - lane.offset()).signum();
    if step == 0 {
        return None;
    }
    let candidate = lane.shifted(step);
    if lane_blocked(snapshot, candidate, distance, distance + DODGE_GAP) {
        return None;
    }
    Some(if step < 0 {
        InputEvent::LaneLeft
    } else {
        InputEvent::LaneRight
    })
}
