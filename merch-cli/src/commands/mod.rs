//! CLI command implementations

pub mod auth;
pub mod buy;
pub mod catalog;
pub mod info;
pub mod send;
pub mod status;

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use dialoguer::Password;
use merch_core::MerchContext;
use uuid::Uuid;

const DATA_DIR_ENV: &str = "MERCH_DIR";
const PASSWORD_ENV: &str = "MERCH_PASSWORD";

/// Get the merch data directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".merch"))
        .ok_or_else(|| anyhow!("Could not find home directory; set {}", DATA_DIR_ENV))
}

/// Open the store, creating the data directory on first use
pub fn get_context() -> Result<MerchContext> {
    let data_dir = get_data_dir()?;

    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create merch directory: {:?}", data_dir))?;
    tracing::debug!(data_dir = %data_dir.display(), "opening store");

    MerchContext::new(&data_dir).context("Failed to initialize merch context")
}

/// Password from MERCH_PASSWORD, or an interactive prompt
fn read_password(user: &str) -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    Password::new()
        .with_prompt(format!("Password for {}", user))
        .interact()
        .context("Failed to read password")
}

/// Log in as `user` and return the account id
pub async fn login(ctx: &MerchContext, user: Option<String>) -> Result<(String, Uuid)> {
    let user = user.ok_or_else(|| anyhow!("No account given; pass --user or set MERCH_USER"))?;
    let password = read_password(&user)?;
    let id = ctx.auth_service.authenticate(&user, &password).await?;
    Ok((user, id))
}
