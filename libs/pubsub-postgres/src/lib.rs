//! PostgreSQL storage for concept publish/subscribe
//!
//! Implements the core's [`ConceptRepository`](conceptpubsub_core::ConceptRepository)
//! and [`SettingsStore`](conceptpubsub_core::SettingsStore) traits on top of a
//! `sqlx` connection pool.

pub mod concepts;
pub mod settings;

pub use concepts::PgConceptRepository;
pub use settings::PgSettingsStore;

use conceptpubsub_core::Error;
use sqlx::postgres::{PgPool, PgPoolOptions};
use std::time::Duration;

/// Open a connection pool
pub async fn connect(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Apply the bundled schema migrations
pub async fn migrate(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    tracing::info!("Database migrations applied");
    Ok(())
}

/// Wrap a database error with what was being attempted
pub(crate) fn db_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| anyhow::Error::new(e).context(context).into()
}
