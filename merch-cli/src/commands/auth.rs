//! Auth command - log in or register

use anyhow::Result;

use super::{get_context, login};
use crate::output;

pub async fn run(user: Option<String>) -> Result<()> {
    let ctx = get_context()?;
    let existed = match user.as_deref() {
        Some(name) => ctx.auth_service.account_exists(name).await?,
        None => false,
    };

    let (name, id) = login(&ctx, user).await?;

    if existed {
        output::success(&format!("Logged in as {}", name));
    } else {
        output::success(&format!(
            "Created account {} with {}",
            name,
            output::format_coins(ctx.config.starting_balance)
        ));
    }
    output::info(&format!("Account id: {}", id));
    Ok(())
}
