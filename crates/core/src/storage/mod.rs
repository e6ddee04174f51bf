pub mod cache;
pub mod file;
pub mod memory;
pub mod pipeline;
pub mod postgres;

use crate::config::Settings;
use anyhow::Context;
use std::sync::Arc;

/// Opaque string-keyed persistence shared by the TTL cache and the pipeline store.
#[async_trait::async_trait]
pub trait KvStore: Send + Sync {
    fn backend_name(&self) -> &'static str;

    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> anyhow::Result<()>;

    async fn remove(&self, key: &str) -> anyhow::Result<()>;
}

/// Postgres when `DATABASE_URL` is set, otherwise one file per key under `STORE_DIR`.
pub async fn open_from_settings(settings: &Settings) -> anyhow::Result<Arc<dyn KvStore>> {
    if let Some(db_url) = settings.database_url.as_deref() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await
            .context("connect DATABASE_URL failed")?;
        migrate(&pool).await?;
        tracing::info!("using postgres key-value store");
        return Ok(Arc::new(postgres::PgKvStore::new(pool)));
    }

    let store = file::FileStore::open(&settings.store_dir).await?;
    tracing::info!(dir = %settings.store_dir, "using file key-value store");
    Ok(Arc::new(store))
}

pub async fn migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .context("sqlx migrations failed")?;
    Ok(())
}
