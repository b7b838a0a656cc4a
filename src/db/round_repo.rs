use std::collections::HashSet;

use serde::de::DeserializeOwned;

use super::{KvStore, StoreError, WriteBatch};
use crate::models::{HistoryEntry, Round, RoundMeta};

/// Keys under which the single game instance lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreKeys {
    pub state: String,
    pub history: String,
    pub rounds: String,
}

impl StoreKeys {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            state: format!("{prefix}:state"),
            history: format!("{prefix}:history"),
            rounds: format!("{prefix}:rounds"),
        }
    }
}

impl Default for StoreKeys {
    fn default() -> Self {
        Self::with_prefix("game")
    }
}

/// Load the current round. A blob that fails to parse, or whose phases
/// would never end, is reported as absent.
pub async fn load_round(store: &KvStore, keys: &StoreKeys) -> Result<Option<Round>, StoreError> {
    let Some(raw) = store.get(&keys.state).await? else {
        return Ok(None);
    };

    let reason = match serde_json::from_str::<Round>(&raw) {
        Ok(round) if round.durations.all_positive() => return Ok(Some(round)),
        Ok(round) => format!("non-positive phase durations {:?}", round.durations),
        Err(e) => e.to_string(),
    };

    metrics::counter!("malformed_state_total").increment(1);
    tracing::warn!(
        error = %reason,
        key = %keys.state,
        "Persisted round is malformed, starting fresh"
    );
    Ok(None)
}

/// Most recent settled outcomes, newest first. Entries written twice for the
/// same boundary collapse to one.
pub async fn recent_history(
    store: &KvStore,
    keys: &StoreKeys,
    limit: usize,
) -> Result<Vec<HistoryEntry>, StoreError> {
    let entries: Vec<HistoryEntry> = read_list(store, &keys.history, limit).await?;
    let mut seen = HashSet::new();
    Ok(entries
        .into_iter()
        .filter(|e| seen.insert(e.completed_at))
        .collect())
}

/// Most recent settled round metadata, newest first, one entry per round.
pub async fn recent_rounds(
    store: &KvStore,
    keys: &StoreKeys,
    limit: usize,
) -> Result<Vec<RoundMeta>, StoreError> {
    let metas: Vec<RoundMeta> = read_list(store, &keys.rounds, limit).await?;
    let mut seen = HashSet::new();
    Ok(metas
        .into_iter()
        .filter(|m| seen.insert(m.round_id.clone()))
        .collect())
}

async fn read_list<T: DeserializeOwned>(
    store: &KvStore,
    key: &str,
    limit: usize,
) -> Result<Vec<T>, StoreError> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let raw = store.range(key, 0, limit - 1).await?;
    Ok(raw
        .iter()
        .filter_map(|item| match serde_json::from_str::<T>(item) {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::debug!(error = %e, key, "Skipping unparseable list entry");
                None
            }
        })
        .collect())
}

/// Queue the round blob for writing.
pub fn stage_round(
    batch: &mut WriteBatch,
    keys: &StoreKeys,
    round: &Round,
) -> Result<(), StoreError> {
    batch.set(keys.state.clone(), serde_json::to_string(round)?);
    Ok(())
}

/// Queue the history and metadata appends for a settled round.
pub fn stage_settlement(
    batch: &mut WriteBatch,
    keys: &StoreKeys,
    entry: &HistoryEntry,
    meta: &RoundMeta,
    keep: usize,
) -> Result<(), StoreError> {
    batch.push(keys.history.clone(), serde_json::to_string(entry)?, keep);
    batch.push(keys.rounds.clone(), serde_json::to_string(meta)?, keep);
    Ok(())
}

/// Drop the round and both logs.
pub async fn clear(store: &KvStore, keys: &StoreKeys) -> Result<(), StoreError> {
    let mut batch = WriteBatch::new();
    batch
        .delete(keys.state.clone())
        .delete(keys.history.clone())
        .delete(keys.rounds.clone());
    store.apply(&batch).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryKv;
    use crate::models::PhaseDurations;

    fn store() -> (KvStore, MemoryKv) {
        let mem = MemoryKv::new();
        (KvStore::Memory(mem.clone()), mem)
    }

    #[tokio::test]
    async fn test_malformed_round_loads_as_absent() {
        let (store, mem) = store();
        let keys = StoreKeys::default();
        let mut batch = WriteBatch::new();
        batch.set(keys.state.clone(), "{not json");
        mem.apply(&batch).unwrap();

        let loaded = load_round(&store, &keys).await.unwrap();
        assert!(loaded.is_none());
    }

    #[tokio::test]
    async fn test_non_positive_durations_load_as_absent() {
        let (store, _) = store();
        let keys = StoreKeys::default();
        for (bet, reveal, settle) in [(0, 15_000, 2_500), (7_000, -1, 2_500), (7_000, 15_000, 0)] {
            let mut round = Round::new(0, 1, PhaseDurations::default());
            round.durations = PhaseDurations {
                betting_duration_ms: bet,
                revealing_duration_ms: reveal,
                settled_duration_ms: settle,
            };
            let mut batch = WriteBatch::new();
            stage_round(&mut batch, &keys, &round).unwrap();
            store.apply(&batch).await.unwrap();

            assert!(load_round(&store, &keys).await.unwrap().is_none());
        }
    }

    #[tokio::test]
    async fn test_round_round_trips_through_store() {
        let (store, _) = store();
        let keys = StoreKeys::with_prefix("t");
        let round = Round::new(123, 9, PhaseDurations::default());

        let mut batch = WriteBatch::new();
        stage_round(&mut batch, &keys, &round).unwrap();
        store.apply(&batch).await.unwrap();

        assert_eq!(load_round(&store, &keys).await.unwrap(), Some(round));
    }

    #[tokio::test]
    async fn test_history_dedups_same_boundary() {
        let (store, _) = store();
        let keys = StoreKeys::default();
        let meta = RoundMeta {
            round_id: "r1".into(),
            reveal_phase_started_at: 0,
            outcome: 10.0,
            seed: 1,
        };
        for outcome in [10.0, 11.0] {
            let mut batch = WriteBatch::new();
            let entry = HistoryEntry {
                completed_at: 500,
                outcome,
            };
            stage_settlement(&mut batch, &keys, &entry, &meta, 8).unwrap();
            store.apply(&batch).await.unwrap();
        }

        let history = recent_history(&store, &keys, 8).await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].outcome, 11.0);

        let rounds = recent_rounds(&store, &keys, 8).await.unwrap();
        assert_eq!(rounds.len(), 1);
    }

    #[tokio::test]
    async fn test_history_skips_garbage_entries() {
        let (store, _) = store();
        let keys = StoreKeys::default();
        let mut batch = WriteBatch::new();
        batch.push(keys.history.clone(), r#"{"t": 1, "v": 5}"#, 8);
        batch.push(keys.history.clone(), "garbage", 8);
        store.apply(&batch).await.unwrap();

        let history = recent_history(&store, &keys, 8).await.unwrap();
        assert_eq!(
            history,
            vec![HistoryEntry {
                completed_at: 1,
                outcome: 5.0,
            }]
        );
    }
}
