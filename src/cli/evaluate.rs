use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use kontoregel::actions::resolve;
use kontoregel::error::Result;
use kontoregel::fmt::kronor;
use kontoregel::store::RuleStore;
use kontoregel::Transaction;

use super::Context;

pub fn run(ctx: &Context, description: &str, amount: Decimal, record: bool) -> Result<()> {
    let conn = ctx.open()?;
    let store = RuleStore::new(&conn, &ctx.workspace);
    let txn = Transaction::new(description, amount);
    let evaluations = store.evaluate(&txn)?;

    println!("{} ({})", description.bold(), kronor(amount));
    if evaluations.is_empty() {
        println!("No rules matched.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Rule", "Name", "Action", "Target", "Priority", "Confidence"]);
    for e in &evaluations {
        table.add_row(vec![
            Cell::new(e.rule_id),
            Cell::new(&e.rule_name),
            Cell::new(e.action_type),
            Cell::new(&e.action_value),
            Cell::new(e.priority),
            Cell::new(format!("{}%", e.confidence)),
        ]);
    }
    println!("{table}");

    let suggestions = resolve(&evaluations);
    if !suggestions.templates.is_empty() {
        println!("Templates: {}", suggestions.templates.join(", "));
    }
    if !suggestions.accounts.is_empty() {
        let accounts: Vec<String> = suggestions.accounts.iter().map(u32::to_string).collect();
        println!("Accounts:  {}", accounts.join(", "));
    }
    if let Some(auto) = &suggestions.auto_book {
        println!(
            "{} {} (rule {}, {}% confidence)",
            "Auto-book:".green().bold(),
            auto.action_value,
            auto.rule_id,
            auto.confidence
        );
    }

    if record {
        let acted_on = suggestions
            .auto_book
            .as_ref()
            .or_else(|| evaluations.first())
            .map(|e| e.rule_id);
        if let Some(rule_id) = acted_on {
            let rule = store.record_match(rule_id)?;
            println!("Recorded match for rule {} (used {} times)", rule.id, rule.usage_count);
        }
    }
    Ok(())
}
