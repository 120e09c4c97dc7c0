//! Buy command - purchase a store item

use anyhow::Result;
use merch_core::ErrorKind;

use super::{get_context, login};
use crate::output;

pub async fn run(user: Option<String>, item: &str) -> Result<()> {
    let ctx = get_context()?;
    let (_, account) = login(&ctx, user).await?;

    match ctx.ledger_service.purchase(account, item).await {
        Ok(purchase) => {
            output::success(&format!(
                "Bought {} for {}",
                purchase.item,
                output::format_coins(purchase.total_price)
            ));
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::NotFound => {
            output::warning("Run `merch catalog` to see what is for sale");
            Err(e.into())
        }
        Err(e) => Err(e.into()),
    }
}
