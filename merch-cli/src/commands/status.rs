//! Status command - store-wide ledger totals

use anyhow::Result;
use colored::Colorize;
use comfy_table::{ContentArrangement, Table};

use super::get_context;
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let status = ctx.status_service.get_status().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!("{}", "Merch Store Status".bold());
    println!();

    // Vertical key-value pairs
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);

    table.add_row(vec!["Accounts", &status.accounts.to_string()]);
    table.add_row(vec!["Transfers", &status.transfers.to_string()]);
    table.add_row(vec!["Purchases", &status.purchases.to_string()]);
    table.add_row(vec!["Coins issued", &status.issued.to_string()]);
    table.add_row(vec!["Coins in circulation", &status.circulating.to_string()]);
    table.add_row(vec!["Coins spent", &status.spent.to_string()]);

    println!("{}", table);
    println!();

    if status.is_balanced() {
        output::success("Ledger balances");
    } else {
        output::error("Ledger does not balance: circulating + spent != issued");
    }
    Ok(())
}
