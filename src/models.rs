use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::KontoregelError;

/// How a rule's `condition_value` is matched against a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionType {
    Contains,
    Equals,
    StartsWith,
    EndsWith,
    Regex,
    AmountGt,
    AmountLt,
    AmountRange,
}

impl ConditionType {
    pub const ALL: [ConditionType; 8] = [
        ConditionType::Contains,
        ConditionType::Equals,
        ConditionType::StartsWith,
        ConditionType::EndsWith,
        ConditionType::Regex,
        ConditionType::AmountGt,
        ConditionType::AmountLt,
        ConditionType::AmountRange,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConditionType::Contains => "contains",
            ConditionType::Equals => "equals",
            ConditionType::StartsWith => "starts_with",
            ConditionType::EndsWith => "ends_with",
            ConditionType::Regex => "regex",
            ConditionType::AmountGt => "amount_gt",
            ConditionType::AmountLt => "amount_lt",
            ConditionType::AmountRange => "amount_range",
        }
    }
}

impl FromStr for ConditionType {
    type Err = KontoregelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ConditionType::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| KontoregelError::UnknownConditionType(s.to_string()))
    }
}

impl fmt::Display for ConditionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a matching rule recommends.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    SuggestTemplate,
    SuggestAccount,
    AutoBook,
}

impl ActionType {
    pub const ALL: [ActionType; 3] = [
        ActionType::SuggestTemplate,
        ActionType::SuggestAccount,
        ActionType::AutoBook,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::SuggestTemplate => "suggest_template",
            ActionType::SuggestAccount => "suggest_account",
            ActionType::AutoBook => "auto_book",
        }
    }
}

impl FromStr for ActionType {
    type Err = KontoregelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActionType::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| KontoregelError::UnknownActionType(s.to_string()))
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    pub id: i64,
    pub workspace: String,
    pub name: String,
    pub description: Option<String>,
    pub priority: i64,
    pub is_active: bool,
    pub condition_type: ConditionType,
    pub condition_value: String,
    pub action_type: ActionType,
    pub action_value: String,
    pub usage_count: i64,
    pub last_matched_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A bank transaction as seen by the engine. Negative amounts are outflows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub description: String,
    pub amount: Decimal,
}

impl Transaction {
    pub fn new(description: impl Into<String>, amount: Decimal) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleMatch<'a> {
    pub rule: &'a Rule,
    pub confidence: u8,
}

/// A match flattened for callers that do not hold the rule snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Evaluation {
    pub rule_id: i64,
    pub rule_name: String,
    pub action_type: ActionType,
    pub action_value: String,
    pub priority: i64,
    pub confidence: u8,
}

impl From<&RuleMatch<'_>> for Evaluation {
    fn from(m: &RuleMatch<'_>) -> Self {
        Self {
            rule_id: m.rule.id,
            rule_name: m.rule.name.clone(),
            action_type: m.rule.action_type,
            action_value: m.rule.action_value.clone(),
            priority: m.rule.priority,
            confidence: m.confidence,
        }
    }
}

/// Fields for a new rule. `priority: None` lets the store pick one.
#[derive(Debug, Clone)]
pub struct NewRule {
    pub name: String,
    pub description: Option<String>,
    pub priority: Option<i64>,
    pub is_active: bool,
    pub condition_type: ConditionType,
    pub condition_value: String,
    pub action_type: ActionType,
    pub action_value: String,
}

impl NewRule {
    pub fn new(
        name: impl Into<String>,
        condition_type: ConditionType,
        condition_value: impl Into<String>,
        action_type: ActionType,
        action_value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: None,
            priority: None,
            is_active: true,
            condition_type,
            condition_value: condition_value.into(),
            action_type,
            action_value: action_value.into(),
        }
    }

    pub fn with_priority(mut self, priority: i64) -> Self {
        self.priority = Some(priority);
        self
    }
}

/// Partial update. `None` keeps the stored value; `description: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct RuleUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub priority: Option<i64>,
    pub is_active: Option<bool>,
    pub condition_type: Option<ConditionType>,
    pub condition_value: Option<String>,
    pub action_type: Option<ActionType>,
    pub action_value: Option<String>,
}

#[cfg(test)]
pub(crate) fn test_rule(
    id: i64,
    priority: i64,
    condition_type: ConditionType,
    condition_value: &str,
    action_type: ActionType,
    action_value: &str,
) -> Rule {
    let now = Utc::now();
    Rule {
        id,
        workspace: "default".to_string(),
        name: format!("rule {id}"),
        description: None,
        priority,
        is_active: true,
        condition_type,
        condition_value: condition_value.to_string(),
        action_type,
        action_value: action_value.to_string(),
        usage_count: 0,
        last_matched_at: None,
        created_at: now,
        updated_at: now,
    }
}
