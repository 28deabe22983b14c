use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use tracing::info;

use crate::config::DatabaseConfig;
use crate::database::repository::StoreError;
use crate::database::schema::TABLES;

/// Connection and migration helpers for the PostgreSQL store.
pub struct DatabaseManager;

impl DatabaseManager {
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, StoreError> {
        let url = config
            .url
            .as_deref()
            .ok_or(StoreError::ConfigMissing("DATABASE_URL"))?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Connected to database {}", Self::redact(url));
        Ok(pool)
    }

    /// Create every table and index described in `schema::TABLES`.
    pub async fn migrate(pool: &PgPool) -> Result<(), StoreError> {
        for table in TABLES {
            sqlx::query(&table.create_table_sql()).execute(pool).await?;
            for index in table.create_index_sql() {
                sqlx::query(&index).execute(pool).await?;
            }
            info!("Ensured table '{}'", table.name);
        }
        Ok(())
    }

    /// Strip credentials from a connection string before logging it.
    fn redact(url: &str) -> String {
        match url::Url::parse(url) {
            Ok(mut parsed) => {
                let _ = parsed.set_password(None);
                let _ = parsed.set_username("");
                parsed.into()
            }
            Err(_) => "<unparseable database url>".to_string(),
        }
    }
}
