//! Priority-ordered categorization rules for bank transactions.
//!
//! The engine ([`matcher::find_matches`] and the [`actions`] projections) is
//! pure and works on a rule snapshot; [`store::RuleStore`] persists rules per
//! workspace in SQLite and records usage.

pub mod actions;
pub mod batch;
pub mod db;
pub mod error;
pub mod evaluator;
pub mod fmt;
pub mod matcher;
pub mod models;
pub mod regex_guard;
pub mod scorer;
pub mod settings;
pub mod store;

pub use error::{KontoregelError, Result};
pub use models::{ActionType, ConditionType, Evaluation, NewRule, Rule, RuleMatch, RuleUpdate, Transaction};
