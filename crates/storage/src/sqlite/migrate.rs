use chrono::Utc;
use sqlx::SqlitePool;

use super::SqliteInitError;

/// Schema versions, applied in order. Never edit a shipped entry; append.
const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    r"
    CREATE TABLE IF NOT EXISTS session_tokens (
        key TEXT PRIMARY KEY,
        token TEXT NOT NULL,
        stored_at TEXT NOT NULL
    );
    ",
)];

pub async fn run_migrations(pool: &SqlitePool) -> Result<(), SqliteInitError> {
    sqlx::query(
        "CREATE TABLE IF NOT EXISTS schema_migrations (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL
        )",
    )
    .execute(pool)
    .await?;

    let current: Option<i64> = sqlx::query_scalar("SELECT MAX(version) FROM schema_migrations")
        .fetch_one(pool)
        .await?;
    let current = current.unwrap_or(0);

    for &(version, sql) in MIGRATIONS.iter().filter(|(version, _)| *version > current) {
        apply(pool, version, sql)
            .await
            .map_err(|source| SqliteInitError::Migration { version, source })?;
        tracing::info!(version, "applied schema migration");
    }

    Ok(())
}

async fn apply(pool: &SqlitePool, version: i64, sql: &str) -> Result<(), sqlx::Error> {
    let mut tx = pool.begin().await?;
    sqlx::query(sql).execute(&mut *tx).await?;
    sqlx::query("INSERT INTO schema_migrations (version, applied_at) VALUES (?1, ?2)")
        .bind(version)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
    tx.commit().await
}
