use serde_json::{json, Value};
use sqlx::PgPool;

use crate::cli::OutputFormat;
use crate::config::AppConfig;
use crate::database::DatabaseManager;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&success_json(message, data))?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

fn success_json(message: &str, data: Option<Value>) -> Value {
    let mut response = json!({
        "success": true,
        "message": message
    });

    if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
        object.extend(extra);
    }
    response
}

/// Load configuration from the environment and connect to PostgreSQL.
pub async fn connect() -> anyhow::Result<(AppConfig, PgPool)> {
    let config = AppConfig::from_env();
    if config.database.url.is_none() {
        anyhow::bail!("DATABASE_URL must be set for CLI commands");
    }
    let pool = DatabaseManager::connect(&config.database).await?;
    Ok((config, pool))
}
