use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use super::{StoreError, WriteBatch, WriteOp};

#[derive(Debug, Default)]
struct Inner {
    values: HashMap<String, String>,
    lists: HashMap<String, VecDeque<String>>,
}

/// In-process store for tests and single-instance local runs.
///
/// Clones share the same data. [`MemoryKv::set_unavailable`] makes every
/// call fail, which lets tests exercise the storage-outage path.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    inner: Arc<Mutex<Inner>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::Relaxed);
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::Unavailable("memory store switched off".into()));
        }
        self.inner
            .lock()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    pub fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lock()?.values.get(key).cloned())
    }

    pub fn range(&self, key: &str, start: usize, stop: usize) -> Result<Vec<String>, StoreError> {
        let inner = self.lock()?;
        let Some(list) = inner.lists.get(key) else {
            return Ok(Vec::new());
        };
        if stop < start {
            return Ok(Vec::new());
        }
        Ok(list
            .iter()
            .skip(start)
            .take(stop - start + 1)
            .cloned()
            .collect())
    }

    pub fn apply(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        let mut inner = self.lock()?;

        for op in batch.ops() {
            match op {
                WriteOp::Set { key, value } => {
                    inner.values.insert(key.clone(), value.clone());
                }
                WriteOp::Push { key, value, keep } => {
                    let list = inner.lists.entry(key.clone()).or_default();
                    list.push_front(value.clone());
                    list.truncate(*keep);
                }
                WriteOp::Delete { key } => {
                    inner.values.remove(key);
                    inner.lists.remove(key);
                }
            }
        }

        Ok(())
    }

    pub fn ping(&self) -> Result<(), StoreError> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_trims_and_orders_newest_first() {
        let kv = MemoryKv::new();
        for i in 0..5 {
            let mut batch = WriteBatch::new();
            batch.push("log", i.to_string(), 3);
            kv.apply(&batch).unwrap();
        }

        assert_eq!(kv.range("log", 0, 10).unwrap(), vec!["4", "3", "2"]);
        assert_eq!(kv.range("log", 1, 1).unwrap(), vec!["3"]);
    }

    #[test]
    fn test_delete_clears_values_and_lists() {
        let kv = MemoryKv::new();
        let mut batch = WriteBatch::new();
        batch.set("state", "x").push("log", "a", 8);
        kv.apply(&batch).unwrap();

        let mut batch = WriteBatch::new();
        batch.delete("state").delete("log");
        kv.apply(&batch).unwrap();

        assert_eq!(kv.get("state").unwrap(), None);
        assert!(kv.range("log", 0, 7).unwrap().is_empty());
    }

    #[test]
    fn test_unavailable_store_rejects_everything() {
        let kv = MemoryKv::new();
        kv.set_unavailable(true);

        let mut batch = WriteBatch::new();
        batch.set("state", "x");
        assert!(matches!(kv.apply(&batch), Err(StoreError::Unavailable(_))));
        assert!(kv.get("state").is_err());
        assert!(kv.ping().is_err());

        kv.set_unavailable(false);
        assert_eq!(kv.get("state").unwrap(), None);
    }
}
