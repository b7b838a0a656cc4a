use tokio::sync::broadcast;
use tokio::time::{interval, Duration, MissedTickBehavior};

use crate::api::ws_types::WsMessage;
use crate::models::Phase;
use crate::round::{RoundService, RoundSnapshot, ServerClock};

/// Reconcile on a fixed cadence so phase changes are pushed to WebSocket
/// subscribers even when nobody polls. Reads stay authoritative on their own;
/// this loop only shortens the delay before a push.
pub async fn run_round_driver(
    rounds: RoundService,
    clock: ServerClock,
    ws_tx: broadcast::Sender<WsMessage>,
    interval_ms: u64,
) {
    let mut ticker = interval(Duration::from_millis(interval_ms.max(10)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last: Option<(String, Phase)> = None;

    loop {
        ticker.tick().await;

        let snapshot = match rounds.reconcile(clock.now_ms()).await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "Round driver: reconcile failed");
                continue;
            }
        };

        if let Some(msg) = change_message(&mut last, snapshot) {
            // Err only means nobody is subscribed right now
            let _ = ws_tx.send(msg);
        }
    }
}

/// Emit an update when the round id or phase differs from the last one seen.
fn change_message(
    last: &mut Option<(String, Phase)>,
    snapshot: RoundSnapshot,
) -> Option<WsMessage> {
    let key = (snapshot.round.round_id.clone(), snapshot.round.phase);
    if last.as_ref() == Some(&key) {
        return None;
    }

    tracing::debug!(
        round_id = %key.0,
        phase = %key.1,
        "Round driver: broadcasting phase change"
    );
    *last = Some(key);
    Some(WsMessage::RoundUpdate(snapshot))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{PhaseDurations, Round};

    fn snapshot(id: &str, phase: Phase) -> RoundSnapshot {
        let mut round = Round::new(0, 1, PhaseDurations::default());
        round.round_id = id.into();
        round.phase = phase;
        RoundSnapshot {
            round,
            history: vec![],
            rounds: vec![],
            server_now: 0,
        }
    }

    #[test]
    fn test_only_changes_are_broadcast() {
        let mut last = None;
        assert!(change_message(&mut last, snapshot("a", Phase::Betting)).is_some());
        assert!(change_message(&mut last, snapshot("a", Phase::Betting)).is_none());
        assert!(change_message(&mut last, snapshot("a", Phase::Revealing)).is_some());
        assert!(change_message(&mut last, snapshot("b", Phase::Revealing)).is_some());
    }
}
