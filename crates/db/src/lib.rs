//! PostgreSQL persistence for change tracking.
//!
//! - [`models`]: row structs and create DTOs for the history tables.
//! - [`repositories`]: zero-sized repos with async query methods.
//! - [`codec`]: per-entity capture/restore/delete, the only place that
//!   knows concrete entity table shapes.

use sqlx::postgres::PgPoolOptions;

pub mod codec;
pub mod models;
pub mod repositories;

pub type DbPool = sqlx::PgPool;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(20)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify the pool can reach the database.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}
