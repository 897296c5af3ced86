use std::path::Path;

use colored::Colorize;
use comfy_table::{Cell, Table};

use kontoregel::batch::evaluate_csv;
use kontoregel::error::{KontoregelError, Result};
use kontoregel::fmt::kronor;
use kontoregel::store::RuleStore;

use super::Context;

pub fn run(ctx: &Context, file: &Path, delimiter: char) -> Result<()> {
    if !delimiter.is_ascii() {
        return Err(KontoregelError::Other(format!(
            "delimiter must be a single ASCII character, got '{delimiter}'"
        )));
    }
    let conn = ctx.open()?;
    let rules = RuleStore::new(&conn, &ctx.workspace).list_active()?;
    let reader = std::io::BufReader::new(std::fs::File::open(file)?);
    let rows = evaluate_csv(reader, delimiter as u8, &rules)?;

    let mut table = Table::new();
    table.set_header(vec!["Line", "Description", "Amount", "Auto-book", "Accounts", "Templates"]);
    let mut matched = 0usize;
    for row in &rows {
        if row.match_count > 0 {
            matched += 1;
        }
        let amount = match (&row.error, row.amount) {
            (Some(err), _) => err.red().to_string(),
            (None, Some(amount)) => kronor(amount),
            (None, None) => String::new(),
        };
        let accounts: Vec<String> = row.suggestions.accounts.iter().map(u32::to_string).collect();
        table.add_row(vec![
            Cell::new(row.line),
            Cell::new(&row.description),
            Cell::new(amount),
            Cell::new(
                row.suggestions
                    .auto_book
                    .as_ref()
                    .map(|e| e.action_value.clone())
                    .unwrap_or_default(),
            ),
            Cell::new(accounts.join(", ")),
            Cell::new(row.suggestions.templates.join(", ")),
        ]);
    }
    println!("{table}");
    println!("{matched} of {} rows matched at least one rule", rows.len());
    Ok(())
}
