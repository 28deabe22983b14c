use clap::Subcommand;
use serde_json::json;

use crate::auth::hash_password;
use crate::cli::utils::{connect, output_success};
use crate::cli::OutputFormat;
use crate::database::{PgStore, UserRepository};

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Register a new user")]
    Add {
        #[arg(help = "Username")]
        username: String,
        #[arg(long, help = "Password")]
        password: String,
    },
}

pub async fn handle(cmd: UserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        UserCommands::Add { username, password } => {
            if username.trim().is_empty() || password.is_empty() {
                anyhow::bail!("username and password must not be empty");
            }

            let (config, pool) = connect().await?;
            config.validate()?;
            let password_hash = hash_password(&password, config.security.password_hash_cost)?;
            let store = PgStore::new(pool);
            let user = store.insert_user(&username, &password_hash).await?;

            output_success(
                &output_format,
                &format!("Created user '{}'", user.username),
                Some(json!({ "user": user })),
            )
        }
    }
}
