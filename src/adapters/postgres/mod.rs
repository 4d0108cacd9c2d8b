//! PostgreSQL adapters - Database implementations for the store ports.
//!
//! - `PostgresWebhookEventStore` - idempotency records (unique insert)
//! - `PostgresDlqStore` - dead-letter queue (leased claims)

mod dlq_store;
mod webhook_event_store;

pub use dlq_store::PostgresDlqStore;
pub use webhook_event_store::PostgresWebhookEventStore;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::DatabaseConfig;
use crate::domain::foundation::DomainError;

/// Opens a connection pool and optionally applies the bundled migrations.
pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DomainError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect(&config.url)
        .await
        .map_err(db_error("Failed to connect to database"))?;

    if config.run_migrations {
        tracing::info!("Applying database migrations");
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to run migrations: {}", e)))?;
    }

    Ok(pool)
}

/// Maps a sqlx error to a `DatabaseError` with context.
pub(crate) fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> DomainError {
    move |e| DomainError::database(format!("{}: {}", context, e))
}
