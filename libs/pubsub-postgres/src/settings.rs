//! Settings table access

use crate::db_error;
use async_trait::async_trait;
use conceptpubsub_core::{Result, SettingsStore};
use sqlx::PgPool;

/// Key/value settings stored in the `setting` table
#[derive(Debug, Clone)]
pub struct PgSettingsStore {
    pool: PgPool,
}

impl PgSettingsStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsStore for PgSettingsStore {
    async fn get(&self, key: &str, default: &str) -> Result<String> {
        let value = sqlx::query_scalar::<_, String>("SELECT value FROM setting WHERE key = $1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("reading setting"))?;

        Ok(value.unwrap_or_else(|| default.to_string()))
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO setting (key, value, updated_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (key) DO UPDATE SET
                value = EXCLUDED.value,
                updated_at = NOW()
            "#,
        )
        .bind(key)
        .bind(value)
        .execute(&self.pool)
        .await
        .map_err(db_error("writing setting"))?;

        tracing::debug!(key, "Setting updated");
        Ok(())
    }
}
