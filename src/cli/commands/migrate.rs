use serde_json::json;

use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::database::schema::TABLES;
use crate::database::DatabaseManager;

pub async fn handle(output_format: OutputFormat) -> anyhow::Result<()> {
    let (_, pool) = connect().await?;
    DatabaseManager::migrate(&pool).await?;

    let tables: Vec<&str> = TABLES.iter().map(|t| t.name).collect();
    output_success(
        &output_format,
        &format!("Migrated tables: {}", tables.join(", ")),
        Some(json!({ "tables": tables })),
    )
}
