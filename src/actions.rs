use serde::Serialize;

use crate::models::{ActionType, Evaluation, RuleMatch};

/// Anything carrying a rule's action, so the projections below work on
/// both engine matches and flattened store evaluations.
pub trait ActionSource {
    fn action_type(&self) -> ActionType;
    fn action_value(&self) -> &str;
}

impl ActionSource for RuleMatch<'_> {
    fn action_type(&self) -> ActionType {
        self.rule.action_type
    }

    fn action_value(&self) -> &str {
        &self.rule.action_value
    }
}

impl ActionSource for Evaluation {
    fn action_type(&self) -> ActionType {
        self.action_type
    }

    fn action_value(&self) -> &str {
        &self.action_value
    }
}

/// Template ids from `suggest_template` matches, in match order.
pub fn suggested_templates<M: ActionSource>(matches: &[M]) -> Vec<String> {
    matches
        .iter()
        .filter(|m| m.action_type() == ActionType::SuggestTemplate)
        .map(|m| m.action_value().to_string())
        .collect()
}

/// Account numbers from `suggest_account` matches. Values that are not
/// account numbers are dropped.
pub fn suggested_accounts<M: ActionSource>(matches: &[M]) -> Vec<u32> {
    matches
        .iter()
        .filter(|m| m.action_type() == ActionType::SuggestAccount)
        .filter_map(|m| m.action_value().trim().parse().ok())
        .collect()
}

/// The single auto-book decision for a transaction: the first `auto_book`
/// match, if any.
pub fn auto_book_decision<M: ActionSource>(matches: &[M]) -> Option<&M> {
    matches
        .iter()
        .find(|m| m.action_type() == ActionType::AutoBook)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestions<M> {
    pub templates: Vec<String>,
    pub accounts: Vec<u32>,
    pub auto_book: Option<M>,
}

pub fn resolve<M: ActionSource + Clone>(matches: &[M]) -> Suggestions<M> {
    Suggestions {
        templates: suggested_templates(matches),
        accounts: suggested_accounts(matches),
        auto_book: auto_book_decision(matches).cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matcher::find_matches;
    use crate::models::{test_rule, ConditionType, Rule, Transaction};
    use rust_decimal_macros::dec;

    fn rules() -> Vec<Rule> {
        vec![
            test_rule(1, 5, ConditionType::Contains, "ICA", ActionType::SuggestAccount, "4010"),
            test_rule(2, 9, ConditionType::Contains, "ica", ActionType::SuggestTemplate, "groceries"),
            test_rule(3, 7, ConditionType::StartsWith, "ica", ActionType::AutoBook, "template-1"),
            test_rule(4, 6, ConditionType::AmountLt, "0", ActionType::AutoBook, "template-2"),
            test_rule(5, 8, ConditionType::Contains, "ica", ActionType::SuggestAccount, "not-a-number"),
            test_rule(6, 4, ConditionType::Contains, "ica", ActionType::SuggestTemplate, "food"),
        ]
    }

    #[test]
    fn test_suggested_accounts_for_ica() {
        let rules = vec![test_rule(
            1,
            5,
            ConditionType::Contains,
            "ICA",
            ActionType::SuggestAccount,
            "4010",
        )];
        let matches = find_matches(&rules, &Transaction::new("ICA SUPERMARKET STHLM", dec!(-342.50)));
        assert_eq!(suggested_accounts(&matches), vec![4010]);
        assert!(suggested_templates(&matches).is_empty());
        assert!(auto_book_decision(&matches).is_none());
    }

    #[test]
    fn test_projections_keep_match_order() {
        let rules = rules();
        let matches = find_matches(&rules, &Transaction::new("ICA NÄRA", dec!(-89)));
        assert_eq!(suggested_templates(&matches), vec!["groceries", "food"]);
        assert_eq!(suggested_accounts(&matches), vec![4010]);
    }

    #[test]
    fn test_single_auto_book_is_highest_priority() {
        let rules = rules();
        let matches = find_matches(&rules, &Transaction::new("ICA NÄRA", dec!(-89)));
        let decision = auto_book_decision(&matches).unwrap();
        assert_eq!(decision.rule.id, 3);
        assert_eq!(decision.rule.action_value, "template-1");
    }

    #[test]
    fn test_resolve_on_evaluations() {
        let rules = rules();
        let matches = find_matches(&rules, &Transaction::new("Coop", dec!(-10)));
        let evaluations: Vec<Evaluation> = matches.iter().map(Evaluation::from).collect();
        let suggestions = resolve(&evaluations);
        assert!(suggestions.templates.is_empty());
        assert!(suggestions.accounts.is_empty());
        assert_eq!(suggestions.auto_book.unwrap().rule_id, 4);
    }
}
