// src/database/routing_repo.rs
use async_trait::async_trait;
use tracing::{debug, error};

use crate::database::DbPool;
use crate::error::{CallControlError, Result};
use crate::traits::RoutingSource;

/// Dialed number -> group -> operator extensions, as maintained by the
/// admin panel.
pub struct PgRoutingSource {
    db_pool: DbPool,
}

impl PgRoutingSource {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

#[async_trait]
impl RoutingSource for PgRoutingSource {
    async fn operator_extensions(&self, dialed_number: &str) -> Result<Vec<String>> {
        let client = self.db_pool.get().await.map_err(|e| {
            error!("❌ Failed to get DB connection: {}", e);
            CallControlError::Pool(e.to_string())
        })?;

        let rows = client
            .query(
                "SELECT o.extension
                 FROM sip_numbers s
                 JOIN operators o ON o.group_id = s.group_id
                 WHERE s.number = $1
                   AND o.extension IS NOT NULL
                 ORDER BY o.id ASC",
                &[&dialed_number],
            )
            .await?;

        let extensions: Vec<String> = rows.iter().map(|row| row.get(0)).collect();
        debug!("Routing {} -> {:?}", dialed_number, extensions);

        Ok(extensions)
    }
}
