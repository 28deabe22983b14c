use anyhow::Context;
use serde_json::json;

use crate::auth::{generate_jwt, Claims};
use crate::cli::utils::connect;
use crate::cli::OutputFormat;
use crate::database::{PgStore, UserRepository};

pub async fn handle(username: String, output_format: OutputFormat) -> anyhow::Result<()> {
    let (config, pool) = connect().await?;
    config.validate()?;
    let store = PgStore::new(pool);

    let user = store
        .user_by_username(&username)
        .await?
        .with_context(|| format!("user '{}' not found", username))?;

    let security = &config.security;
    let claims = Claims::new(user.id, user.username.clone(), security.jwt_expiry_hours);
    let token = generate_jwt(&claims, security)?;

    match output_format {
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "access": token,
                "token_type": "Bearer",
                "expires_in": claims.lifetime_secs(),
            }))?
        ),
        OutputFormat::Text => println!("{}", token),
    }
    Ok(())
}
