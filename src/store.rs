use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::error::{KontoregelError, Result};
use crate::matcher::find_matches;
use crate::models::{Evaluation, NewRule, Rule, RuleUpdate, Transaction};

const COLUMNS: &str = "id, workspace, name, description, priority, is_active, \
     condition_type, condition_value, action_type, action_value, \
     usage_count, last_matched_at, created_at, updated_at";

pub const MAX_NAME_LEN: usize = 100;
pub const MAX_DESCRIPTION_LEN: usize = 500;

/// Rule as stored, before the kind columns are parsed.
struct StoredRule {
    id: i64,
    workspace: String,
    name: String,
    description: Option<String>,
    priority: i64,
    is_active: bool,
    condition_type: String,
    condition_value: String,
    action_type: String,
    action_value: String,
    usage_count: i64,
    last_matched_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl StoredRule {
    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            workspace: row.get(1)?,
            name: row.get(2)?,
            description: row.get(3)?,
            priority: row.get(4)?,
            is_active: row.get(5)?,
            condition_type: row.get(6)?,
            condition_value: row.get(7)?,
            action_type: row.get(8)?,
            action_value: row.get(9)?,
            usage_count: row.get(10)?,
            last_matched_at: row.get(11)?,
            created_at: row.get(12)?,
            updated_at: row.get(13)?,
        })
    }
}

impl TryFrom<StoredRule> for Rule {
    type Error = KontoregelError;

    fn try_from(s: StoredRule) -> Result<Self> {
        Ok(Rule {
            id: s.id,
            workspace: s.workspace,
            name: s.name,
            description: s.description,
            priority: s.priority,
            is_active: s.is_active,
            condition_type: s.condition_type.parse()?,
            condition_value: s.condition_value,
            action_type: s.action_type.parse()?,
            action_value: s.action_value,
            usage_count: s.usage_count,
            last_matched_at: s.last_matched_at,
            created_at: s.created_at,
            updated_at: s.updated_at,
        })
    }
}

/// Rule storage for a single workspace.
pub struct RuleStore<'c> {
    conn: &'c Connection,
    workspace: String,
}

impl<'c> RuleStore<'c> {
    pub fn new(conn: &'c Connection, workspace: impl Into<String>) -> Self {
        Self {
            conn,
            workspace: workspace.into(),
        }
    }

    /// All rules in the workspace, highest priority first.
    ///
    /// Rows whose condition or action type is no longer recognised are
    /// skipped, so they can never match.
    pub fn list(&self) -> Result<Vec<Rule>> {
        let sql = format!(
            "SELECT {COLUMNS} FROM rules WHERE workspace = ?1 ORDER BY priority DESC, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let stored = stmt
            .query_map([&self.workspace], StoredRule::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let mut rules = Vec::with_capacity(stored.len());
        for s in stored {
            let id = s.id;
            match Rule::try_from(s) {
                Ok(rule) => rules.push(rule),
                Err(e) => tracing::warn!(rule_id = id, error = %e, "skipping unreadable rule"),
            }
        }
        Ok(rules)
    }

    pub fn list_active(&self) -> Result<Vec<Rule>> {
        Ok(self.list()?.into_iter().filter(|r| r.is_active).collect())
    }

    pub fn get(&self, id: i64) -> Result<Rule> {
        let sql = format!("SELECT {COLUMNS} FROM rules WHERE id = ?1 AND workspace = ?2");
        self.conn
            .query_row(&sql, params![id, self.workspace], StoredRule::from_row)
            .optional()?
            .ok_or(KontoregelError::NotFound(id))?
            .try_into()
    }

    /// Insert a rule. Without an explicit priority it gets one above the
    /// current maximum in the workspace (1 for the first rule).
    pub fn create(&self, new: NewRule) -> Result<Rule> {
        validate_fields(
            &new.name,
            new.description.as_deref(),
            &new.condition_value,
            &new.action_value,
        )?;
        if let Some(priority) = new.priority {
            validate_priority(priority)?;
        }

        let now = Utc::now();
        self.conn.execute(
            "INSERT INTO rules (workspace, name, description, priority, is_active, \
             condition_type, condition_value, action_type, action_value, created_at, updated_at) \
             VALUES (?1, ?2, ?3, \
             COALESCE(?4, (SELECT COALESCE(MAX(priority), 0) + 1 FROM rules WHERE workspace = ?1)), \
             ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
            params![
                self.workspace,
                new.name,
                new.description,
                new.priority,
                new.is_active,
                new.condition_type.as_str(),
                new.condition_value,
                new.action_type.as_str(),
                new.action_value,
                now,
            ],
        )?;
        let rule = self.get(self.conn.last_insert_rowid())?;
        tracing::info!(
            workspace = %self.workspace,
            rule_id = rule.id,
            priority = rule.priority,
            "created rule"
        );
        Ok(rule)
    }

    /// Apply a partial update; unspecified fields keep their values.
    pub fn update(&self, id: i64, update: RuleUpdate) -> Result<Rule> {
        let current = self.get(id)?;

        let name = update.name.unwrap_or(current.name);
        let description = update.description.unwrap_or(current.description);
        let priority = update.priority.unwrap_or(current.priority);
        let is_active = update.is_active.unwrap_or(current.is_active);
        let condition_type = update.condition_type.unwrap_or(current.condition_type);
        let condition_value = update.condition_value.unwrap_or(current.condition_value);
        let action_type = update.action_type.unwrap_or(current.action_type);
        let action_value = update.action_value.unwrap_or(current.action_value);

        validate_fields(&name, description.as_deref(), &condition_value, &action_value)?;
        validate_priority(priority)?;

        let changed = self.conn.execute(
            "UPDATE rules SET name = ?1, description = ?2, priority = ?3, is_active = ?4, \
             condition_type = ?5, condition_value = ?6, action_type = ?7, action_value = ?8, \
             updated_at = ?9 WHERE id = ?10 AND workspace = ?11",
            params![
                name,
                description,
                priority,
                is_active,
                condition_type.as_str(),
                condition_value,
                action_type.as_str(),
                action_value,
                Utc::now(),
                id,
                self.workspace,
            ],
        )?;
        if changed == 0 {
            return Err(KontoregelError::NotFound(id));
        }
        tracing::info!(workspace = %self.workspace, rule_id = id, "updated rule");
        self.get(id)
    }

    pub fn set_active(&self, id: i64, active: bool) -> Result<Rule> {
        self.update(
            id,
            RuleUpdate {
                is_active: Some(active),
                ..RuleUpdate::default()
            },
        )
    }

    pub fn delete(&self, id: i64) -> Result<()> {
        let deleted = self.conn.execute(
            "DELETE FROM rules WHERE id = ?1 AND workspace = ?2",
            params![id, self.workspace],
        )?;
        if deleted == 0 {
            return Err(KontoregelError::NotFound(id));
        }
        tracing::info!(workspace = %self.workspace, rule_id = id, "deleted rule");
        Ok(())
    }

    /// Assign new priorities in one transaction: all of them or none.
    pub fn reprioritize(&self, priorities: &[(i64, i64)]) -> Result<()> {
        for &(_, priority) in priorities {
            validate_priority(priority)?;
        }

        let now = Utc::now();
        let tx = self.conn.unchecked_transaction()?;
        {
            let mut stmt = tx.prepare(
                "UPDATE rules SET priority = ?1, updated_at = ?2 WHERE id = ?3 AND workspace = ?4",
            )?;
            for &(id, priority) in priorities {
                if stmt.execute(params![priority, now, id, self.workspace])? == 0 {
                    // dropping `tx` rolls back the earlier updates
                    return Err(KontoregelError::NotFound(id));
                }
            }
        }
        tx.commit()?;
        tracing::info!(
            workspace = %self.workspace,
            count = priorities.len(),
            "reprioritized rules"
        );
        Ok(())
    }

    /// Match a transaction against the workspace's active rules.
    pub fn evaluate(&self, txn: &Transaction) -> Result<Vec<Evaluation>> {
        let rules = self.list_active()?;
        let evaluations: Vec<Evaluation> =
            find_matches(&rules, txn).iter().map(Evaluation::from).collect();
        tracing::debug!(
            workspace = %self.workspace,
            rules = rules.len(),
            matches = evaluations.len(),
            "evaluated transaction"
        );
        Ok(evaluations)
    }

    /// Count a rule as used. The increment happens inside SQLite so
    /// concurrent callers never lose updates.
    pub fn record_match(&self, id: i64) -> Result<Rule> {
        let sql = format!(
            "UPDATE rules SET usage_count = usage_count + 1, last_matched_at = ?1 \
             WHERE id = ?2 AND workspace = ?3 RETURNING {COLUMNS}"
        );
        let rule: Rule = self
            .conn
            .query_row(&sql, params![Utc::now(), id, self.workspace], StoredRule::from_row)
            .optional()?
            .ok_or(KontoregelError::NotFound(id))?
            .try_into()?;
        tracing::debug!(rule_id = id, usage_count = rule.usage_count, "recorded rule match");
        Ok(rule)
    }
}

fn validate_fields(
    name: &str,
    description: Option<&str>,
    condition_value: &str,
    action_value: &str,
) -> Result<()> {
    let name_len = name.trim().chars().count();
    if name_len == 0 || name.chars().count() > MAX_NAME_LEN {
        return Err(KontoregelError::Validation(format!(
            "name must be 1-{MAX_NAME_LEN} characters"
        )));
    }
    if description.is_some_and(|d| d.chars().count() > MAX_DESCRIPTION_LEN) {
        return Err(KontoregelError::Validation(format!(
            "description must be at most {MAX_DESCRIPTION_LEN} characters"
        )));
    }
    if condition_value.is_empty() {
        return Err(KontoregelError::Validation(
            "condition value must not be empty".to_string(),
        ));
    }
    if action_value.is_empty() {
        return Err(KontoregelError::Validation(
            "action value must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_priority(priority: i64) -> Result<()> {
    if priority < 0 {
        return Err(KontoregelError::Validation(format!(
            "priority must be non-negative, got {priority}"
        )));
    }
    Ok(())
}
