pub mod batch;
pub mod evaluate;
pub mod init;
pub mod rules;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use rust_decimal::Decimal;

use kontoregel::batch::parse_statement_amount;
use kontoregel::db::{get_connection, init_db};
use kontoregel::error::Result;
use kontoregel::settings::Settings;
use kontoregel::{ActionType, ConditionType};

/// Where to find rules for this invocation.
pub struct Context {
    pub db_path: PathBuf,
    pub workspace: String,
}

impl Context {
    pub fn resolve(db: Option<PathBuf>, workspace: Option<String>, settings: &Settings) -> Self {
        Self {
            db_path: db.unwrap_or_else(|| settings.db_path()),
            workspace: workspace.unwrap_or_else(|| settings.workspace.clone()),
        }
    }

    pub fn open(&self) -> Result<Connection> {
        if let Some(parent) = self.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = get_connection(&self.db_path)?;
        init_db(&conn)?;
        Ok(conn)
    }
}

pub(crate) fn parse_condition_type(s: &str) -> std::result::Result<ConditionType, String> {
    s.parse().map_err(|_| {
        let names: Vec<&str> = ConditionType::ALL.iter().map(|c| c.as_str()).collect();
        format!("expected one of: {}", names.join(", "))
    })
}

pub(crate) fn parse_action_type(s: &str) -> std::result::Result<ActionType, String> {
    s.parse().map_err(|_| {
        let names: Vec<&str> = ActionType::ALL.iter().map(|a| a.as_str()).collect();
        format!("expected one of: {}", names.join(", "))
    })
}

pub(crate) fn parse_amount_arg(s: &str) -> std::result::Result<Decimal, String> {
    parse_statement_amount(s).ok_or_else(|| format!("'{s}' is not an amount"))
}

#[derive(Parser)]
#[command(
    name = "kontoregel",
    about = "Categorization rules for bank transactions: suggest templates, accounts, or auto-book."
)]
pub struct Cli {
    /// SQLite database file (default: <data_dir>/kontoregel.db)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,
    /// Workspace whose rules are used (default from settings)
    #[arg(long, global = true)]
    pub workspace: Option<String>,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Choose a data directory and initialize the database.
    Init {
        /// Path for kontoregel data (default: ~/Documents/kontoregel)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage categorization rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Match one transaction against the active rules.
    Evaluate {
        /// Transaction text as it appears on the statement
        description: String,
        /// Signed amount; negative is money out (e.g. -342,50)
        #[arg(long, allow_hyphen_values = true, value_parser = parse_amount_arg)]
        amount: Decimal,
        /// Count the acted-on rule as used (the auto-book rule, else the top match)
        #[arg(long)]
        record: bool,
    },
    /// Match every row of a bank statement CSV.
    Batch {
        /// CSV file with description and amount columns
        file: PathBuf,
        /// Field delimiter
        #[arg(long, default_value = ",")]
        delimiter: char,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a rule.
    Add {
        /// Display name
        name: String,
        /// Condition type: contains, equals, starts_with, ends_with, regex, amount_gt, amount_lt, amount_range
        #[arg(long, value_parser = parse_condition_type)]
        condition: ConditionType,
        /// Condition value, e.g. 'ICA' or '100,500'
        #[arg(long, allow_hyphen_values = true)]
        value: String,
        /// Action type: suggest_template, suggest_account, auto_book
        #[arg(long, value_parser = parse_action_type)]
        action: ActionType,
        /// Action value: template id or account number
        #[arg(long)]
        target: String,
        /// Priority (higher is evaluated first; default: above current max)
        #[arg(long)]
        priority: Option<i64>,
        /// Free-text note
        #[arg(long)]
        description: Option<String>,
        /// Create the rule disabled
        #[arg(long)]
        inactive: bool,
    },
    /// List rules.
    List {
        /// Include disabled rules
        #[arg(long)]
        all: bool,
    },
    /// Change fields of a rule.
    Update {
        /// Rule ID (shown in `kontoregel rules list`)
        id: i64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, value_parser = parse_condition_type)]
        condition: Option<ConditionType>,
        #[arg(long, allow_hyphen_values = true)]
        value: Option<String>,
        #[arg(long, value_parser = parse_action_type)]
        action: Option<ActionType>,
        #[arg(long)]
        target: Option<String>,
        #[arg(long)]
        priority: Option<i64>,
        #[arg(long)]
        description: Option<String>,
    },
    /// Enable a rule.
    Enable { id: i64 },
    /// Disable a rule without deleting it.
    Disable { id: i64 },
    /// Delete a rule permanently.
    Delete { id: i64 },
    /// Set several priorities at once, all or nothing: ID=PRIORITY ...
    Reorder {
        #[arg(required = true)]
        assignments: Vec<String>,
    },
    /// Record that a rule was acted on.
    Hit { id: i64 },
    /// Try a condition against a sample transaction without saving anything.
    Test {
        #[arg(long, value_parser = parse_condition_type)]
        condition: ConditionType,
        #[arg(long, allow_hyphen_values = true)]
        value: String,
        /// Sample transaction text
        #[arg(long = "text", default_value = "")]
        text: String,
        /// Sample amount
        #[arg(long, allow_hyphen_values = true, value_parser = parse_amount_arg, default_value = "0")]
        amount: Decimal,
    },
}
