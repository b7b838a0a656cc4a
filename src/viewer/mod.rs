//! Client-side playback: polls the authoritative state, keeps a virtual
//! server clock, and turns the shared round into a smoothed, drawable line.

pub mod client;
pub mod clock;
pub mod render;
pub mod trail;

use tokio::sync::watch;
use tokio::time::{interval, Duration, MissedTickBehavior};
use tracing::{info, warn};

use crate::config::ViewerConfig;
use crate::models::Phase;
use crate::trajectory::{
    prefill_trail, DisplaySmoother, TrailPoint, TrajectoryInput, TrajectoryParams, PREFILL_STEP_MS,
};

pub use client::{ClientError, ServerState, StateClient};
pub use clock::{ClockSync, MonotonicClock};
pub use render::{Countdown, Frame, LogRenderer, Renderer, Tone};
pub use trail::{Camera, Trail};

/// A state response tagged with the local time its request was sent.
#[derive(Debug, Clone)]
pub struct Polled {
    pub state: ServerState,
    pub requested_at_local: f64,
}

/// Everything one viewer holds between frames.
#[derive(Debug, Clone, Default)]
pub struct Viewer {
    clock: ClockSync,
    smoother: DisplaySmoother,
    trail: Trail,
    camera: Camera,
    params: TrajectoryParams,
    state: Option<ServerState>,
    prefilled: bool,
}

impl Viewer {
    pub fn new(camera: Camera, params: TrajectoryParams) -> Self {
        Self {
            camera,
            params,
            ..Self::default()
        }
    }

    pub fn trail(&self) -> &Trail {
        &self.trail
    }

    pub fn clock(&self) -> &ClockSync {
        &self.clock
    }

    pub fn state(&self) -> Option<&ServerState> {
        self.state.as_ref()
    }

    /// Adopt a poll result. Responses older than the one already held are
    /// dropped so a slow request cannot rewind the round.
    pub fn on_snapshot(&mut self, polled: Polled) {
        if let Some(current) = &self.state {
            if polled.state.server_now < current.server_now {
                return;
            }
        }

        self.clock.observe(polled.state.server_now, polled.requested_at_local);

        if !self.prefilled {
            self.prefilled = true;
            let points = prefill_trail(
                &self.params,
                &polled.state.rounds,
                polled.state.round.durations.revealing_duration_ms,
                PREFILL_STEP_MS,
            );
            let server_now = polled.state.server_now as f64;
            self.trail.extend(points.into_iter().filter(|p| p.t <= server_now));
            if let Some(last) = self.trail.last() {
                self.smoother.seed_value(last.v);
            }
            self.trail.prune(&self.camera, server_now);
        }

        self.state = Some(polled.state);
    }

    /// Produce the frame for local monotonic time `local_ms`, `dt_ms` after
    /// the previous one.
    pub fn frame(&mut self, local_ms: f64, dt_ms: f64) -> Frame {
        self.clock.advance(dt_ms);
        let now = self.clock.virtual_now(local_ms);

        let input = self.state.as_ref().map(|s| TrajectoryInput::from(&s.round));
        let value = self.smoother.step(now, dt_ms, input.as_ref(), &self.params);

        if self.clock.is_synced() {
            self.trail.push(TrailPoint { t: now, v: value });
            self.trail.prune(&self.camera, now);
        }

        let head_x = self.camera.x_ratio(now, now);
        let mut frame = Frame::new(now, input.map(|i| i.phase), value, head_x);
        frame.tail_x = self.trail.first().map(|p| self.camera.x_ratio(p.t, now));
        if let Some(state) = &self.state {
            frame.round_id = Some(state.round.round_id.clone());
            frame.recent = state.history.iter().map(|h| h.outcome).collect();
            if state.round.phase == Phase::Betting {
                frame.countdown = Some(Countdown::new(
                    now - state.round.phase_started_at as f64,
                    state.round.durations.betting_duration_ms,
                ));
            }
        }
        frame
    }
}

/// Poll the server and draw frames until Ctrl-C.
pub async fn run_viewer<R: Renderer>(config: ViewerConfig, mut renderer: R) -> anyhow::Result<()> {
    let client = StateClient::new(&config.server_url);
    let local = MonotonicClock::start();
    let (tx, mut rx) = watch::channel::<Option<Polled>>(None);

    info!(
        server = %config.server_url,
        poll_ms = config.poll_interval_ms,
        frame_ms = config.frame_interval_ms,
        "Viewer starting"
    );

    let poller = tokio::spawn(poll_state(client, local, tx, config.poll_interval_ms));

    let mut viewer = Viewer::new(config.camera(), TrajectoryParams::default());
    let mut frames = interval(Duration::from_millis(config.frame_interval_ms.max(1)));
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut last_frame = local.now_ms();

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received");
                break;
            }
            changed = rx.changed() => {
                if changed.is_err() {
                    warn!("State poller exited");
                    break;
                }
                let polled = rx.borrow_and_update().clone();
                if let Some(polled) = polled {
                    viewer.on_snapshot(polled);
                }
            }
            _ = frames.tick() => {
                let now = local.now_ms();
                let frame = viewer.frame(now, now - last_frame);
                last_frame = now;
                renderer.draw(&frame, viewer.trail());
            }
        }
    }

    poller.abort();
    renderer.finish();
    Ok(())
}

async fn poll_state(
    client: StateClient,
    local: MonotonicClock,
    tx: watch::Sender<Option<Polled>>,
    interval_ms: u64,
) {
    let mut ticker = interval(Duration::from_millis(interval_ms.max(50)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;

        let requested_at_local = local.now_ms();
        match client.fetch_state().await {
            Ok(state) => {
                if tx
                    .send(Some(Polled {
                        state,
                        requested_at_local,
                    }))
                    .is_err()
                {
                    return;
                }
            }
            // Keep the last good state; the next poll retries
            Err(e) => warn!(error = %e, "State poll failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HistoryEntry, PhaseDurations, Round, RoundMeta};

    const NOW: i64 = 1_700_000_000_000;

    fn state(phase: Phase, started_at: i64, server_now: i64) -> ServerState {
        let mut round = Round::new(started_at, 77, PhaseDurations::default());
        round.phase = phase;
        if phase != Phase::Betting {
            round.outcome = Some(64.0);
        }
        ServerState {
            round,
            history: vec![],
            rounds: vec![],
            server_now,
        }
    }

    #[test]
    fn test_frames_before_first_poll() {
        let mut viewer = Viewer::default();
        let frame = viewer.frame(1_000.0, 16.7);
        assert_eq!(frame.phase, None);
        assert_eq!(frame.value, 0.0);
        assert!(frame.badge.is_none());
        assert!(viewer.trail().is_empty());
    }

    #[test]
    fn test_betting_countdown_uses_server_time() {
        let mut viewer = Viewer::default();
        viewer.on_snapshot(Polled {
            state: state(Phase::Betting, NOW - 2_000, NOW),
            requested_at_local: 0.0,
        });

        let frame = viewer.frame(0.0, 16.7);
        assert_eq!(frame.now_ms, NOW as f64);
        assert_eq!(frame.phase, Some(Phase::Betting));
        assert!(frame.badge.is_none());
        assert_eq!(frame.countdown.map(|c| c.remaining_secs), Some(5));
        assert_eq!(viewer.trail().len(), 1);
    }

    #[test]
    fn test_first_snapshot_prefills_trail() {
        let mut s = state(Phase::Betting, NOW - 1_000, NOW);
        s.rounds = vec![RoundMeta {
            round_id: "old".into(),
            reveal_phase_started_at: NOW - 20_000,
            outcome: -12.0,
            seed: 3,
        }];

        let mut viewer = Viewer::default();
        viewer.on_snapshot(Polled {
            state: s,
            requested_at_local: 0.0,
        });

        let last = viewer.trail().last().unwrap();
        assert_eq!(last.t, (NOW - 5_000) as f64);
        assert_eq!(last.v, -12.0);

        // Display continues from the prefilled tail instead of snapping.
        let frame = viewer.frame(0.0, 16.7);
        assert!((frame.value - -12.0).abs() < 1.0);
    }

    #[test]
    fn test_frame_positions_follow_camera() {
        let camera = Camera {
            window_ms: 10_000.0,
            head_ratio: 0.8,
            prune_margin_ms: 1_000.0,
        };
        let mut s = state(Phase::Betting, NOW - 1_000, NOW);
        s.rounds = vec![RoundMeta {
            round_id: "old".into(),
            reveal_phase_started_at: NOW - 20_000,
            outcome: 5.0,
            seed: 3,
        }];
        s.history = vec![
            HistoryEntry {
                completed_at: NOW - 3_500,
                outcome: 5.0,
            },
            HistoryEntry {
                completed_at: NOW - 28_000,
                outcome: -40.0,
            },
        ];

        let mut viewer = Viewer::new(camera, TrajectoryParams::default());
        viewer.on_snapshot(Polled {
            state: s,
            requested_at_local: 0.0,
        });
        let frame = viewer.frame(0.0, 16.7);

        assert!((frame.head_x - 0.8).abs() < 1e-12);
        // Oldest kept point sits left of the visible window, within the margin.
        let tail_x = frame.tail_x.unwrap();
        assert!(tail_x < 0.0 && tail_x >= -0.1, "{tail_x}");
        assert_eq!(frame.recent, vec![5.0, -40.0]);
    }

    #[test]
    fn test_stale_snapshot_ignored() {
        let mut viewer = Viewer::default();
        viewer.on_snapshot(Polled {
            state: state(Phase::Revealing, NOW - 1_000, NOW),
            requested_at_local: 0.0,
        });
        viewer.on_snapshot(Polled {
            state: state(Phase::Betting, NOW - 30_000, NOW - 500),
            requested_at_local: 10.0,
        });
        assert_eq!(viewer.state().map(|s| s.round.phase), Some(Phase::Revealing));
    }

    #[test]
    fn test_settled_frame_shows_badge() {
        let mut viewer = Viewer::default();
        viewer.on_snapshot(Polled {
            state: state(Phase::Settled, NOW - 100, NOW),
            requested_at_local: 0.0,
        });
        let frame = viewer.frame(0.0, 16.7);
        assert_eq!(frame.value, 64.0);
        assert_eq!(frame.badge.as_deref(), Some("64%"));
        assert_eq!(frame.tone, Tone::Positive);
        assert!(frame.countdown.is_none());
    }
}
