//! Terminal session report and the backend notification pipeline
//!
//! The backend call itself is an external collaborator behind `ReportSink`;
//! this module owns the payload shape and the delivery policy: fire and
//! forget, bounded retries with backoff, never block or fail gameplay.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Game identifier expected by the reward backend
pub const GAME_ID: &str = "lemmi_run";

/// Retry policy: 3 total attempts, then drop with a warning
const MAX_ATTEMPTS: u32 = 3;
const BACKOFF_SECS: [f64; 2] = [0.5, 2.0];

/// Payload POSTed to the reward backend when a session ends. Field names
/// follow the backend's JSON contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionReport {
    pub wallet_address: Option<String>,
    pub game: String,
    pub score: u64,
    pub level: u32,
    pub achievements: Vec<String>,
    /// Simulated seconds the run lasted
    pub play_time: f64,
    pub coins_collected: u32,
    pub distance: f32,
    pub reached_degen_mode: bool,
}

/// Delivery failure from a sink implementation
#[derive(Debug, Clone, PartialEq)]
pub struct ReportError(pub String);

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "report delivery failed: {}", self.0)
    }
}

impl std::error::Error for ReportError {}

/// The outbound edge. Implementations must return quickly (queue the HTTP
/// call elsewhere); the simulation loop calls this inline.
pub trait ReportSink {
    fn send(&mut self, report: &SessionReport) -> Result<(), ReportError>;
}

/// Sink that logs the payload as JSON. Used by the headless demo.
pub struct LogSink;

impl ReportSink for LogSink {
    fn send(&mut self, report: &SessionReport) -> Result<(), ReportError> {
        let json = serde_json::to_string(report).map_err(|e| ReportError(e.to_string()))?;
        log::info!("session report: {json}");
        Ok(())
    }
}

struct Pending {
    report: SessionReport,
    attempts: u32,
    next_attempt_at: f64,
}

/// Frame-polled delivery with bounded backoff. `poll` is called every frame
/// with a monotonic clock; a failed attempt schedules the next one instead
/// of blocking.
pub struct Reporter {
    sink: Box<dyn ReportSink>,
    pending: Option<Pending>,
}

impl Reporter {
    pub fn new(sink: Box<dyn ReportSink>) -> Self {
        Self {
            sink,
            pending: None,
        }
    }

    /// Queue a report for delivery. Any previous undelivered report is
    /// replaced; sessions end one at a time.
    pub fn submit(&mut self, report: SessionReport, now: f64) {
        self.pending = Some(Pending {
            report,
            attempts: 0,
            next_attempt_at: now,
        });
    }

    pub fn is_idle(&self) -> bool {
        self.pending.is_none()
    }

    /// Attempt delivery if one is due. Never fatal: after the last failed
    /// attempt the report is dropped with a warning.
    pub fn poll(&mut self, now: f64) {
        let Some(pending) = self.pending.as_mut() else {
            return;
        };
        if now < pending.next_attempt_at {
            return;
        }

        match self.sink.send(&pending.report) {
            Ok(()) => {
                log::info!("session report delivered (score {})", pending.report.score);
                self.pending = None;
            }
            Err(err) => {
                pending.attempts += 1;
                if pending.attempts >= MAX_ATTEMPTS {
                    log::warn!(
                        "dropping session report after {} attempts: {err}",
                        pending.attempts
                    );
                    self.pending = None;
                } else {
                    let backoff = BACKOFF_SECS[(pending.attempts - 1) as usize];
                    pending.next_attempt_at = now + backoff;
                    log::warn!("report attempt {} failed, retrying in {backoff}s: {err}", pending.attempts);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Sink scripted to fail the first `failures` sends
    struct FlakySink {
        failures: u32,
        delivered: Arc<Mutex<Vec<SessionReport>>>,
    }

    impl ReportSink for FlakySink {
        fn send(&mut self, report: &SessionReport) -> Result<(), ReportError> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(ReportError("503".into()));
            }
            self.delivered.lock().unwrap().push(report.clone());
            Ok(())
        }
    }

    fn sample_report() -> SessionReport {
        SessionReport {
            wallet_address: Some("0xabc".into()),
            game: GAME_ID.into(),
            score: 725,
            level: 2,
            achievements: vec!["degen_mode".into()],
            play_time: 93.5,
            coins_collected: 31,
            distance: 812.0,
            reached_degen_mode: true,
        }
    }

    #[test]
    fn test_payload_uses_backend_field_names() {
        let json = serde_json::to_string(&sample_report()).unwrap();
        assert!(json.contains("\"walletAddress\""));
        assert!(json.contains("\"game\":\"lemmi_run\""));
        assert!(json.contains("\"playTime\""));
        assert!(json.contains("\"reachedDegenMode\""));
    }

    #[test]
    fn test_delivers_first_try() {
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let mut reporter = Reporter::new(Box::new(FlakySink {
            failures: 0,
            delivered: delivered.clone(),
        }));
        reporter.submit(sample_report(), 0.0);
        reporter.poll(0.0);
        assert!(reporter.is_idle());
        assert_eq!(delivered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_retries_with_backoff_then_succeeds() {
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let mut reporter = Reporter::new(Box::new(FlakySink {
            failures: 2,
            delivered: delivered.clone(),
        }));
        reporter.submit(sample_report(), 0.0);

        reporter.poll(0.0); // fails, retry at 0.5
        reporter.poll(0.3); // not due yet
        assert!(!reporter.is_idle());
        assert!(delivered.lock().unwrap().is_empty());

        reporter.poll(0.5); // fails, retry at 2.5
        reporter.poll(1.0); // not due yet
        reporter.poll(2.5); // third attempt succeeds
        assert!(reporter.is_idle());
        assert_eq!(delivered.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_drops_after_max_attempts() {
        let delivered = Arc::new(Mutex::new(Vec::new()));
        let mut reporter = Reporter::new(Box::new(FlakySink {
            failures: 10,
            delivered: delivered.clone(),
        }));
        reporter.submit(sample_report(), 0.0);

        reporter.poll(0.0);
        reporter.poll(0.5);
        reporter.poll(2.5);
        assert!(reporter.is_idle());
        assert!(delivered.lock().unwrap().is_empty());
    }
}
