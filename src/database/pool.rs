// src/database/pool.rs
use deadpool_postgres::{Config, ManagerConfig, Pool, RecyclingMethod, Runtime};
use tokio_postgres::NoTls;
use tracing::info;

use crate::error::{CallControlError, Result};

pub type DbPool = Pool;

/// Builds the pool and runs one round-trip so a bad URL fails at startup.
pub async fn create_pool(database_url: &str) -> Result<Pool> {
    let mut cfg = Config::new();
    cfg.url = Some(normalize_url(database_url));
    cfg.manager = Some(ManagerConfig {
        recycling_method: RecyclingMethod::Fast,
    });

    let pool = cfg
        .create_pool(Some(Runtime::Tokio1), NoTls)
        .map_err(|e| CallControlError::Config(format!("invalid DATABASE_URL: {}", e)))?;

    let client = pool
        .get()
        .await
        .map_err(|e| CallControlError::Pool(e.to_string()))?;
    let row = client.query_one("SELECT 1 as test", &[]).await?;
    let test: i32 = row.get(0);

    if test == 1 {
        info!("Database connection test successful");
    }

    Ok(pool)
}

// Accept the `pgsql://` scheme used by the web panel's env files.
fn normalize_url(database_url: &str) -> String {
    database_url
        .trim()
        .replacen("pgsql://", "postgresql://", 1)
}
