use sqlx::PgPool;

use super::{StoreError, WriteBatch, WriteOp};

/// Postgres-backed key-value store (`kv_entries` + `kv_list_entries`).
#[derive(Debug, Clone)]
pub struct PgKv {
    pool: PgPool,
}

impl PgKv {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM kv_entries WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    pub async fn range(
        &self,
        key: &str,
        start: usize,
        stop: usize,
    ) -> Result<Vec<String>, StoreError> {
        if stop < start {
            return Ok(Vec::new());
        }

        let values = sqlx::query_scalar::<_, String>(
            r#"
            SELECT value FROM kv_list_entries
            WHERE list_key = $1
            ORDER BY id DESC
            OFFSET $2 LIMIT $3
            "#,
        )
        .bind(key)
        .bind(start as i64)
        .bind((stop - start + 1) as i64)
        .fetch_all(&self.pool)
        .await?;

        Ok(values)
    }

    /// Apply every op inside one transaction.
    pub async fn apply(&self, batch: &WriteBatch) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        for op in batch.ops() {
            match op {
                WriteOp::Set { key, value } => {
                    sqlx::query(
                        r#"
                        INSERT INTO kv_entries (key, value, updated_at)
                        VALUES ($1, $2, NOW())
                        ON CONFLICT (key) DO UPDATE SET value = $2, updated_at = NOW()
                        "#,
                    )
                    .bind(key)
                    .bind(value)
                    .execute(&mut *tx)
                    .await?;
                }
                WriteOp::Push { key, value, keep } => {
                    sqlx::query("INSERT INTO kv_list_entries (list_key, value) VALUES ($1, $2)")
                        .bind(key)
                        .bind(value)
                        .execute(&mut *tx)
                        .await?;

                    sqlx::query(
                        r#"
                        DELETE FROM kv_list_entries
                        WHERE list_key = $1
                          AND id NOT IN (
                              SELECT id FROM kv_list_entries
                              WHERE list_key = $1
                              ORDER BY id DESC
                              LIMIT $2
                          )
                        "#,
                    )
                    .bind(key)
                    .bind(*keep as i64)
                    .execute(&mut *tx)
                    .await?;
                }
                WriteOp::Delete { key } => {
                    sqlx::query("DELETE FROM kv_entries WHERE key = $1")
                        .bind(key)
                        .execute(&mut *tx)
                        .await?;
                    sqlx::query("DELETE FROM kv_list_entries WHERE list_key = $1")
                        .bind(key)
                        .execute(&mut *tx)
                        .await?;
                }
            }
        }

        tx.commit().await?;
        Ok(())
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
