use std::time::Duration;

use crate::{config::DatabaseConfig, error::Result};
use sqlx::{PgPool, postgres::PgPoolOptions};

const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Connects to Postgres and brings the schema up to date before serving.
pub async fn create_pool(url: &str, config: &DatabaseConfig) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(ACQUIRE_TIMEOUT)
        .connect(url)
        .await?;

    run_migrations(&pool).await?;

    tracing::info!(
        max_connections = config.max_connections,
        "Order store connected to Postgres"
    );

    Ok(pool)
}

async fn run_migrations(pool: &PgPool) -> Result<()> {
    sqlx::migrate!().run(pool).await?;
    tracing::debug!("Catalog and order migrations applied");
    Ok(())
}

pub async fn check_health(pool: &PgPool) -> Result<()> {
    sqlx::query_scalar::<_, i32>("SELECT 1").fetch_one(pool).await?;
    Ok(())
}
