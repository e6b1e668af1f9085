//! Creates the administrator account from `ADMIN_EMAIL` / `ADMIN_PASSWORD`.
//! Running it again is a no-op.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use slotbook::config::AppConfig;
use slotbook::db::{self, queries};
use slotbook::models::user::normalize_email;
use slotbook::services::auth;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    let conn = db::init_db(&config.database_url)?;
    let email = normalize_email(&config.admin_email);

    if let Some(existing) = queries::get_user_by_email(&conn, &email)? {
        tracing::info!(user_id = existing.id, email = %email, "admin user already exists");
        return Ok(());
    }

    let password_hash = auth::hash_password(config.admin_password.clone(), config.bcrypt_cost).await?;
    let user_id = queries::create_user(
        &conn,
        &queries::NewUser {
            email: &email,
            password_hash: &password_hash,
            first_name: "Admin",
            last_name: "User",
            is_admin: true,
        },
    )
    .context("failed to create admin user")?;

    tracing::info!(user_id, email = %email, "admin user created");
    Ok(())
}
