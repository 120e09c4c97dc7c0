//! Info command - balance, inventory and coin history

use anyhow::Result;
use colored::Colorize;
use merch_core::TransferEntry;

use super::{get_context, login};
use crate::output;

pub async fn run(user: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let (_, account) = login(&ctx, user).await?;
    let info = ctx.info_service.get_info(account).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{} {}", info.name.bold(), format!("({})", info.account_id).dimmed());
    println!("Balance: {}", output::format_coins(info.balance).green());
    println!();

    println!("{}", "Inventory".bold());
    if info.inventory.is_empty() {
        println!("  (empty)");
    } else {
        let mut table = output::create_table();
        table.set_header(vec!["Item", "Quantity"]);
        for entry in &info.inventory {
            table.add_row(vec![entry.item.clone(), entry.quantity.to_string()]);
        }
        println!("{}", table);
    }
    println!();

    print_history("Received", "From", &info.received);
    print_history("Sent", "To", &info.sent);

    Ok(())
}

fn print_history(title: &str, counterparty: &str, entries: &[TransferEntry]) {
    println!("{}", title.bold());
    if entries.is_empty() {
        println!("  (none)");
        println!();
        return;
    }

    let mut table = output::create_table();
    table.set_header(vec![counterparty, "Amount", "At"]);
    for entry in entries {
        table.add_row(vec![
            entry.counterparty.clone(),
            entry.amount.to_string(),
            output::format_time(&entry.created_at),
        ]);
    }
    println!("{}", table);
    println!();
}
