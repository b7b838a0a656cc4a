use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;

use super::{StoreError, WriteBatch, WriteOp};

/// Redis-backed key-value store. Lists map onto native Redis lists.
#[derive(Clone)]
pub struct RedisKv {
    conn: MultiplexedConnection,
}

impl std::fmt::Debug for RedisKv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisKv").finish_non_exhaustive()
    }
}

impl RedisKv {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_multiplexed_async_connection().await?;
        tracing::info!("Redis connected");
        Ok(Self { conn })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    pub async fn range(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn.clone();
        let values: Vec<String> = conn.lrange(key, start as isize, stop as isize).await?;
        Ok(values)
    }

    /// Apply every op inside one MULTI/EXEC block.
    pub async fn apply(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        let mut pipe = redis::pipe();
        pipe.atomic();

        for op in batch.ops() {
            match op {
                WriteOp::Set { key, value } => {
                    pipe.set(key, value).ignore();
                }
                WriteOp::Push { key, value, keep } => {
                    pipe.lpush(key, value).ignore();
                    let stop = (*keep as isize).saturating_sub(1);
                    pipe.ltrim(key, 0, stop).ignore();
                }
                WriteOp::Delete { key } => {
                    pipe.del(key).ignore();
                }
            }
        }

        let mut conn = self.conn.clone();
        let _: () = pipe.query_async(&mut conn).await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
