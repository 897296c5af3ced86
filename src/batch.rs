use std::io::Read;
use std::str::FromStr;

use rust_decimal::Decimal;

use crate::actions::{resolve, Suggestions};
use crate::error::{KontoregelError, Result};
use crate::matcher::find_matches;
use crate::models::{Evaluation, Rule, Transaction};

// Header names seen in Swedish and English bank exports.
const DESCRIPTION_HEADERS: &[&str] = &[
    "description",
    "text",
    "beskrivning",
    "rubrik",
    "transaktionstext",
    "specifikation",
];
const AMOUNT_HEADERS: &[&str] = &["amount", "belopp"];

pub struct BatchRow {
    /// 1-based line in the file.
    pub line: usize,
    pub description: String,
    pub amount: Option<Decimal>,
    pub suggestions: Suggestions<Evaluation>,
    pub match_count: usize,
    pub error: Option<String>,
}

/// Parse a bank-statement amount: `-1 234,50`, `1234.50`, `1,234.50`, `1.234,50`.
pub fn parse_statement_amount(raw: &str) -> Option<Decimal> {
    let s: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '"')
        .collect();
    let s = s.trim_end_matches("kr").trim_end_matches("SEK");
    // with both separators present, the last one is the decimal mark
    let normalized = match (s.rfind(','), s.rfind('.')) {
        (Some(comma), Some(dot)) if comma > dot => s.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => s.replace(',', ""),
        _ => s.replace(',', "."),
    };
    Decimal::from_str(&normalized).ok()
}

/// Evaluate every row of a statement against one rule snapshot.
///
/// Rows whose amount cannot be read carry an error instead of failing the
/// whole batch.
pub fn evaluate_csv<R: Read>(reader: R, delimiter: u8, rules: &[Rule]) -> Result<Vec<BatchRow>> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut columns: Option<(usize, usize)> = None;
    let mut rows = Vec::new();

    for result in rdr.records() {
        let record = result?;
        let line = record.position().map_or(0, |p| p.line() as usize);
        let Some((idx_desc, idx_amount)) = columns else {
            columns = find_columns(&record);
            continue;
        };
        if record.iter().all(|f| f.trim().is_empty()) {
            continue;
        }

        let description = record.get(idx_desc).unwrap_or_default().trim().to_string();
        let raw_amount = record.get(idx_amount).unwrap_or_default();
        let amount = parse_statement_amount(raw_amount);

        let (suggestions, match_count, error) = match amount {
            Some(amount) => {
                let txn = Transaction::new(description.clone(), amount);
                let evaluations: Vec<Evaluation> =
                    find_matches(rules, &txn).iter().map(Evaluation::from).collect();
                (resolve(&evaluations), evaluations.len(), None)
            }
            None => (
                resolve::<Evaluation>(&[]),
                0,
                Some(format!("unreadable amount '{}'", raw_amount.trim())),
            ),
        };

        rows.push(BatchRow {
            line,
            description,
            amount,
            suggestions,
            match_count,
            error,
        });
    }

    if columns.is_none() {
        return Err(KontoregelError::Other(
            "no header row with description and amount columns".to_string(),
        ));
    }
    tracing::debug!(rows = rows.len(), rules = rules.len(), "evaluated statement");
    Ok(rows)
}

fn find_columns(record: &csv::StringRecord) -> Option<(usize, usize)> {
    let position = |names: &[&str]| {
        record
            .iter()
            .position(|f| names.contains(&f.trim().to_lowercase().as_str()))
    };
    Some((position(DESCRIPTION_HEADERS)?, position(AMOUNT_HEADERS)?))
}
