//! Catalog command - list items for sale

use anyhow::Result;

use super::get_context;
use crate::output;

pub async fn run(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let items = ctx.ledger_service.catalog().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }

    if items.is_empty() {
        output::warning("The store has no items");
        return Ok(());
    }

    let mut table = output::create_table();
    table.set_header(vec!["Item", "Price"]);
    for item in &items {
        table.add_row(vec![item.name.clone(), item.price.to_string()]);
    }
    println!("{}", table);
    Ok(())
}
