use crate::storage::KvStore;
use anyhow::Context;

/// Key-value rows in the `kv_entries` table.
#[derive(Debug, Clone)]
pub struct PgKvStore {
    pool: sqlx::PgPool,
}

impl PgKvStore {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl KvStore for PgKvStore {
    fn backend_name(&self) -> &'static str {
        "postgres"
    }

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM kv_entries WHERE key = $1")
            .persistent(false)
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .with_context(|| format!("select kv_entries failed (key={key})"))?;
        Ok(row.map(|(v,)| v))
    }

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
        sqlx::query(
            "INSERT INTO kv_entries (key, value, updated_at) VALUES ($1, $2, now()) \
             ON CONFLICT (key) DO UPDATE SET value = EXCLUDED.value, updated_at = now()",
        )
        .persistent(false)
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .with_context(|| format!("upsert kv_entries failed (key={key})"))?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM kv_entries WHERE key = $1")
            .persistent(false)
            .bind(key)
            .execute(&self.pool)
            .await
            .with_context(|| format!("delete kv_entries failed (key={key})"))?;
        Ok(())
    }
}
