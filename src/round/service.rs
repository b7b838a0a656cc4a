use std::time::Instant;

use serde::Serialize;

use super::machine::{self, Advance, MachineConfig};
use crate::db::round_repo::{self, StoreKeys};
use crate::db::{KvStore, StoreError, WriteBatch};
use crate::models::{HistoryEntry, Round, RoundMeta};

/// Authoritative view returned to callers after a reconcile.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundSnapshot {
    #[serde(flatten)]
    pub round: Round,
    pub history: Vec<HistoryEntry>,
    pub rounds: Vec<RoundMeta>,
    pub server_now: i64,
}

/// Drives the shared round stored in a [`KvStore`].
///
/// Holds no round state of its own: every call reads the stored round,
/// advances it against the supplied clock and writes it back, so any number
/// of instances can serve the same game.
#[derive(Debug, Clone)]
pub struct RoundService {
    store: KvStore,
    keys: StoreKeys,
    config: MachineConfig,
}

impl RoundService {
    pub fn new(store: KvStore, keys: StoreKeys, config: MachineConfig) -> Self {
        Self { store, keys, config }
    }

    pub fn store(&self) -> &KvStore {
        &self.store
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Advance the round through every boundary that has passed by `now_ms`
    /// (bounded by the catch-up budget) and persist the result.
    pub async fn reconcile(&self, now_ms: i64) -> Result<RoundSnapshot, StoreError> {
        let started = Instant::now();
        metrics::counter!("reconcile_total").increment(1);

        let result = self.advance_and_persist(now_ms, self.config.max_catch_up_steps).await;

        metrics::histogram!("reconcile_latency_seconds").record(started.elapsed().as_secs_f64());
        result
    }

    /// Legacy trigger: apply at most one transition.
    pub async fn tick(&self, now_ms: i64) -> Result<RoundSnapshot, StoreError> {
        self.advance_and_persist(now_ms, 1).await
    }

    /// Forget the round and its logs; the next read starts a fresh round.
    pub async fn reset(&self) -> Result<(), StoreError> {
        round_repo::clear(&self.store, &self.keys)
            .await
            .inspect_err(|_| metrics::counter!("store_errors_total").increment(1))?;
        tracing::warn!("Round state and history cleared");
        Ok(())
    }

    async fn advance_and_persist(
        &self,
        now_ms: i64,
        max_steps: usize,
    ) -> Result<RoundSnapshot, StoreError> {
        let stored = round_repo::load_round(&self.store, &self.keys)
            .await
            .inspect_err(|_| metrics::counter!("store_errors_total").increment(1))?;

        let config = MachineConfig {
            max_catch_up_steps: max_steps,
            ..self.config
        };
        let advance = {
            let mut rng = rand::thread_rng();
            machine::advance(stored, now_ms, &config, &mut rng)
        };

        self.persist(&advance)
            .await
            .inspect_err(|_| metrics::counter!("store_errors_total").increment(1))?;
        record_advance(&advance, now_ms, max_steps);

        let limit = self.config.history_len;
        let history = round_repo::recent_history(&self.store, &self.keys, limit).await?;
        let rounds = round_repo::recent_rounds(&self.store, &self.keys, limit).await?;

        Ok(RoundSnapshot {
            round: advance.round,
            history,
            rounds,
            server_now: now_ms,
        })
    }

    /// Round blob and log appends go out as one batch: either all land or none.
    async fn persist(&self, advance: &Advance) -> Result<(), StoreError> {
        let mut batch = WriteBatch::new();
        for s in &advance.settlements {
            round_repo::stage_settlement(
                &mut batch,
                &self.keys,
                &s.entry,
                &s.meta,
                self.config.history_len,
            )?;
        }
        round_repo::stage_round(&mut batch, &self.keys, &advance.round)?;
        self.store.apply(&batch).await
    }
}

fn record_advance(advance: &Advance, now_ms: i64, max_steps: usize) {
    let round = &advance.round;

    if advance.created {
        tracing::info!(
            round_id = %round.round_id,
            started_at = round.phase_started_at,
            "New round created"
        );
    }
    if advance.clock_corrected {
        metrics::counter!("clock_corrections_total").increment(1);
        tracing::debug!(now_ms, round_id = %round.round_id, "Clamped future phase start");
    }
    for phase in &advance.entered {
        metrics::counter!("phase_transitions_total", "to" => phase.as_str()).increment(1);
    }
    if !advance.settlements.is_empty() {
        metrics::counter!("rounds_settled_total").increment(advance.settlements.len() as u64);
    }
    if !advance.entered.is_empty() {
        tracing::info!(
            round_id = %round.round_id,
            phase = %round.phase,
            phase_started_at = round.phase_started_at,
            transitions = advance.entered.len(),
            settled = advance.settlements.len(),
            "Round advanced"
        );
    }
    if advance.capped && max_steps > 1 {
        tracing::warn!(
            max_steps,
            lag_ms = now_ms - round.phase_started_at,
            "Catch-up budget exhausted, round still behind"
        );
    }
    metrics::gauge!("round_phase").set(round.phase.code());
}
