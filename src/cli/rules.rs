use colored::Colorize;
use comfy_table::{Cell, Table};
use rust_decimal::Decimal;

use kontoregel::error::{KontoregelError, Result};
use kontoregel::evaluator::{check_condition, evaluate};
use kontoregel::store::RuleStore;
use kontoregel::{ActionType, ConditionType, NewRule, Rule, RuleUpdate, Transaction};

use super::Context;

#[allow(clippy::too_many_arguments)]
pub fn add(
    ctx: &Context,
    name: &str,
    condition: ConditionType,
    value: &str,
    action: ActionType,
    target: &str,
    priority: Option<i64>,
    description: Option<&str>,
    inactive: bool,
) -> Result<()> {
    let conn = ctx.open()?;
    let store = RuleStore::new(&conn, &ctx.workspace);

    let mut new = NewRule::new(name, condition, value, action, target);
    new.priority = priority;
    new.description = description.map(str::to_string);
    new.is_active = !inactive;

    let rule = store.create(new)?;
    println!(
        "Added rule {}: {} '{}' \u{2192} {} {} (priority {})",
        rule.id, rule.condition_type, rule.condition_value, rule.action_type, rule.action_value, rule.priority
    );
    warn_if_never_matches(&rule);
    Ok(())
}

pub fn list(ctx: &Context, all: bool) -> Result<()> {
    let conn = ctx.open()?;
    let store = RuleStore::new(&conn, &ctx.workspace);
    let rules = if all { store.list()? } else { store.list_active()? };

    if rules.is_empty() {
        println!("No rules in workspace '{}'.", ctx.workspace);
        return Ok(());
    }

    let mut table = Table::new();
    let mut header = vec!["ID", "Name", "Condition", "Value", "Action", "Target", "Priority", "Used", "Last match"];
    if all {
        header.push("Active");
    }
    table.set_header(header);
    for rule in &rules {
        let mut row = vec![
            Cell::new(rule.id),
            Cell::new(&rule.name),
            Cell::new(rule.condition_type),
            Cell::new(&rule.condition_value),
            Cell::new(rule.action_type),
            Cell::new(&rule.action_value),
            Cell::new(rule.priority),
            Cell::new(rule.usage_count),
            Cell::new(
                rule.last_matched_at
                    .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
                    .unwrap_or_default(),
            ),
        ];
        if all {
            row.push(Cell::new(if rule.is_active { "yes" } else { "no" }));
        }
        table.add_row(row);
    }
    println!("Rules ({})\n{table}", ctx.workspace);
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn update(
    ctx: &Context,
    id: i64,
    name: Option<String>,
    condition: Option<ConditionType>,
    value: Option<String>,
    action: Option<ActionType>,
    target: Option<String>,
    priority: Option<i64>,
    description: Option<String>,
) -> Result<()> {
    let conn = ctx.open()?;
    let store = RuleStore::new(&conn, &ctx.workspace);
    let update = RuleUpdate {
        name,
        // an empty --description clears it
        description: description.map(|d| (!d.is_empty()).then_some(d)),
        priority,
        is_active: None,
        condition_type: condition,
        condition_value: value,
        action_type: action,
        action_value: target,
    };
    let rule = store.update(id, update)?;
    println!("Updated rule {}: {}", rule.id, rule.name);
    warn_if_never_matches(&rule);
    Ok(())
}

pub fn set_active(ctx: &Context, id: i64, active: bool) -> Result<()> {
    let conn = ctx.open()?;
    let rule = RuleStore::new(&conn, &ctx.workspace).set_active(id, active)?;
    let state = if active { "Enabled" } else { "Disabled" };
    println!("{state} rule {}: {}", rule.id, rule.name);
    Ok(())
}

pub fn delete(ctx: &Context, id: i64) -> Result<()> {
    let conn = ctx.open()?;
    let store = RuleStore::new(&conn, &ctx.workspace);
    let rule = store.get(id)?;
    store.delete(id)?;
    println!("Deleted rule {id}: {}", rule.name);
    Ok(())
}

pub fn reorder(ctx: &Context, assignments: &[String]) -> Result<()> {
    let priorities = assignments
        .iter()
        .map(|a| parse_assignment(a))
        .collect::<Result<Vec<_>>>()?;
    let conn = ctx.open()?;
    RuleStore::new(&conn, &ctx.workspace).reprioritize(&priorities)?;
    println!("Updated {} priorities", priorities.len());
    Ok(())
}

pub fn hit(ctx: &Context, id: i64) -> Result<()> {
    let conn = ctx.open()?;
    let rule = RuleStore::new(&conn, &ctx.workspace).record_match(id)?;
    println!("Rule {} used {} times", rule.id, rule.usage_count);
    Ok(())
}

pub fn test(condition: ConditionType, value: &str, text: &str, amount: Decimal) -> Result<()> {
    if let Err(reason) = check_condition(condition, value) {
        println!("{} {reason}", "Never matches:".red());
        return Ok(());
    }
    let txn = Transaction::new(text, amount);
    if evaluate(condition, value, &txn) {
        println!("{} {condition} '{value}'", "Match:".green());
    } else {
        println!("{} {condition} '{value}'", "No match:".yellow());
    }
    Ok(())
}

fn parse_assignment(raw: &str) -> Result<(i64, i64)> {
    let invalid = || KontoregelError::Other(format!("expected ID=PRIORITY, got '{raw}'"));
    let (id, priority) = raw.split_once('=').ok_or_else(invalid)?;
    let id = id.trim().parse().map_err(|_| invalid())?;
    let priority = priority.trim().parse().map_err(|_| invalid())?;
    Ok((id, priority))
}

fn warn_if_never_matches(rule: &Rule) {
    if let Err(reason) = check_condition(rule.condition_type, &rule.condition_value) {
        eprintln!("{} rule {} will never match: {reason}", "Warning:".yellow(), rule.id);
    }
    if rule.action_type == ActionType::SuggestAccount && rule.action_value.trim().parse::<u32>().is_err() {
        eprintln!(
            "{} '{}' is not an account number; this rule will not suggest an account",
            "Warning:".yellow(),
            rule.action_value
        );
    }
}
