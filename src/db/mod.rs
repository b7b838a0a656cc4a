pub mod memory_kv;
pub mod pg_kv;
pub mod redis_kv;
pub mod round_repo;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use thiserror::Error;

use crate::config::AppConfig;

pub use memory_kv::MemoryKv;
pub use pg_kv::PgKv;
pub use redis_kv::RedisKv;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("postgres error: {0}")]
    Postgres(#[from] sqlx::Error),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Write batches
// ---------------------------------------------------------------------------

/// A single mutation against the key-value store.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Overwrite a scalar key.
    Set { key: String, value: String },
    /// Prepend to a list, then trim it to the newest `keep` items.
    Push {
        key: String,
        value: String,
        keep: usize,
    },
    /// Remove a key (scalar or list).
    Delete { key: String },
}

/// Mutations applied all-or-nothing by [`KvStore::apply`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    ops: Vec<WriteOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Set {
            key: key.into(),
            value: value.into(),
        });
        self
    }

    pub fn push(
        &mut self,
        key: impl Into<String>,
        value: impl Into<String>,
        keep: usize,
    ) -> &mut Self {
        self.ops.push(WriteOp::Push {
            key: key.into(),
            value: value.into(),
            keep,
        });
        self
    }

    pub fn delete(&mut self, key: impl Into<String>) -> &mut Self {
        self.ops.push(WriteOp::Delete { key: key.into() });
        self
    }

    pub fn ops(&self) -> &[WriteOp] {
        &self.ops
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

// ---------------------------------------------------------------------------
// KvStore
// ---------------------------------------------------------------------------

/// Shared key-value store holding the round blob and its bounded logs.
#[derive(Debug, Clone)]
pub enum KvStore {
    Postgres(PgKv),
    Redis(RedisKv),
    Memory(MemoryKv),
}

impl KvStore {
    pub fn backend_name(&self) -> &'static str {
        match self {
            KvStore::Postgres(_) => "postgres",
            KvStore::Redis(_) => "redis",
            KvStore::Memory(_) => "memory",
        }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        match self {
            KvStore::Postgres(s) => s.get(key).await,
            KvStore::Redis(s) => s.get(key).await,
            KvStore::Memory(s) => s.get(key),
        }
    }

    /// Items `start..=stop` of a list, newest first.
    pub async fn range(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<String>, StoreError> {
        match self {
            KvStore::Postgres(s) => s.range(key, start, stop).await,
            KvStore::Redis(s) => s.range(key, start, stop).await,
            KvStore::Memory(s) => s.range(key, start, stop),
        }
    }

    pub async fn apply(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        if batch.is_empty() {
            return Ok(());
        }
        match self {
            KvStore::Postgres(s) => s.apply(batch).await,
            KvStore::Redis(s) => s.apply(batch).await,
            KvStore::Memory(s) => s.apply(batch),
        }
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        match self {
            KvStore::Postgres(s) => s.ping().await,
            KvStore::Redis(s) => s.ping().await,
            KvStore::Memory(s) => s.ping(),
        }
    }
}

pub async fn init_pool(database_url: &str) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await?;

    // Verify connectivity
    sqlx::query("SELECT 1").execute(&pool).await?;

    Ok(pool)
}

/// Pick a backend from config: Redis, then Postgres, then in-memory.
pub async fn connect(config: &AppConfig) -> anyhow::Result<KvStore> {
    if let Some(url) = &config.redis_url {
        let kv = RedisKv::connect(url).await?;
        return Ok(KvStore::Redis(kv));
    }

    if let Some(url) = &config.database_url {
        let pool = init_pool(url).await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        return Ok(KvStore::Postgres(PgKv::new(pool)));
    }

    tracing::warn!("Neither REDIS_URL nor DATABASE_URL set, using in-memory store");
    Ok(KvStore::Memory(MemoryKv::new()))
}
