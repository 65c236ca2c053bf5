use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, warn};

use crate::data::Repositories;
use crate::infrastructure::config::AppConfig;

pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(20)
        .min_connections(5)
        .acquire_timeout(std::time::Duration::from_secs(5))
        .connect(database_url)
        .await?;
    info!("connected to PostgreSQL");
    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    info!("running database migrations");
    sqlx::migrate!().run(pool).await?;
    info!("migrations completed");
    Ok(())
}

/// Connects and migrates PostgreSQL, or hands back a fresh in-memory store.
pub async fn connect_repositories(config: &AppConfig) -> anyhow::Result<Repositories> {
    if config.uses_memory_store() {
        warn!("using in-memory storage; data is lost on shutdown");
        return Ok(Repositories::in_memory());
    }
    let pool = create_pool(&config.database_url).await?;
    run_migrations(&pool).await?;
    Ok(Repositories::postgres(pool))
}
