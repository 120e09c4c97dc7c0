//! Send command - transfer coins to another account

use anyhow::Result;

use super::{get_context, login};
use crate::output;

pub async fn run(user: Option<String>, to: &str, amount: i64) -> Result<()> {
    let ctx = get_context()?;
    let (_, sender) = login(&ctx, user).await?;

    let transfer = ctx.ledger_service.transfer(sender, to, amount).await?;

    output::success(&format!(
        "Sent {} to {} (transfer #{})",
        output::format_coins(transfer.amount),
        to,
        transfer.seq
    ));
    Ok(())
}
