use std::str::FromStr;

use regex::RegexBuilder;
use rust_decimal::Decimal;

use crate::models::{ConditionType, Transaction};
use crate::regex_guard;

// Compiled program cap for user patterns; the guard's length limit keeps
// honest patterns far below this.
const REGEX_SIZE_LIMIT: usize = 1 << 20;

/// Does `condition_value` under `condition_type` match the transaction?
///
/// Never fails: values that cannot be parsed or regexes the guard refuses
/// evaluate to `false`, so one broken rule cannot block the others.
pub fn evaluate(condition_type: ConditionType, condition_value: &str, txn: &Transaction) -> bool {
    match condition_type {
        ConditionType::Contains => lower(&txn.description).contains(&lower(condition_value)),
        ConditionType::Equals => lower(&txn.description) == lower(condition_value),
        ConditionType::StartsWith => lower(&txn.description).starts_with(&lower(condition_value)),
        ConditionType::EndsWith => lower(&txn.description).ends_with(&lower(condition_value)),
        ConditionType::Regex => regex_matches(condition_value, &txn.description),
        ConditionType::AmountGt => {
            parse_amount(condition_value).is_some_and(|threshold| txn.amount > threshold)
        }
        ConditionType::AmountLt => {
            parse_amount(condition_value).is_some_and(|threshold| txn.amount < threshold)
        }
        ConditionType::AmountRange => parse_range(condition_value)
            .is_some_and(|(min, max)| min <= txn.amount && txn.amount <= max),
    }
}

/// Explain why a condition value can never match, if it cannot.
pub fn check_condition(condition_type: ConditionType, condition_value: &str) -> Result<(), String> {
    match condition_type {
        ConditionType::Regex => {
            if let Some(reason) = regex_guard::rejection_reason(condition_value) {
                return Err(format!("unsafe regex ({reason})"));
            }
            build_regex(condition_value)
                .map(|_| ())
                .map_err(|e| format!("invalid regex: {e}"))
        }
        ConditionType::AmountGt | ConditionType::AmountLt => parse_amount(condition_value)
            .map(|_| ())
            .ok_or_else(|| format!("'{condition_value}' is not a decimal amount")),
        ConditionType::AmountRange => match parse_range(condition_value) {
            None => Err(format!("'{condition_value}' is not a range of the form <min>,<max>")),
            Some((min, max)) if min > max => Err(format!("range minimum {min} exceeds maximum {max}")),
            Some(_) => Ok(()),
        },
        ConditionType::Contains
        | ConditionType::Equals
        | ConditionType::StartsWith
        | ConditionType::EndsWith => Ok(()),
    }
}

fn lower(s: &str) -> String {
    s.to_lowercase()
}

fn regex_matches(pattern: &str, description: &str) -> bool {
    if let Some(reason) = regex_guard::rejection_reason(pattern) {
        tracing::debug!(pattern, reason, "regex refused by guard; treating as non-match");
        return false;
    }
    match build_regex(pattern) {
        Ok(re) => re.is_match(description),
        Err(e) => {
            tracing::debug!(pattern, error = %e, "failed to compile regex; treating as non-match");
            false
        }
    }
}

fn build_regex(pattern: &str) -> std::result::Result<regex::Regex, regex::Error> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .size_limit(REGEX_SIZE_LIMIT)
        .build()
}

fn parse_amount(value: &str) -> Option<Decimal> {
    Decimal::from_str(value.trim()).ok()
}

fn parse_range(value: &str) -> Option<(Decimal, Decimal)> {
    let (min, max) = value.split_once(',')?;
    Some((parse_amount(min)?, parse_amount(max)?))
}
