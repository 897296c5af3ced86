use crate::evaluator::evaluate;
use crate::models::{Rule, RuleMatch, Transaction};
use crate::scorer::score;

/// Match a transaction against a rule snapshot.
///
/// Inactive rules are ignored. Results are ordered by priority, then
/// confidence, both descending; equal pairs keep their input order.
pub fn find_matches<'a>(rules: &'a [Rule], txn: &Transaction) -> Vec<RuleMatch<'a>> {
    let active: Vec<&Rule> = rules.iter().filter(|r| r.is_active).collect();
    let Some(max_priority) = active.iter().map(|r| r.priority).max() else {
        return Vec::new();
    };

    let mut matches: Vec<RuleMatch<'a>> = active
        .into_iter()
        .filter(|r| evaluate(r.condition_type, &r.condition_value, txn))
        .map(|rule| RuleMatch {
            rule,
            confidence: score(rule.condition_type, rule.priority, max_priority),
        })
        .collect();

    matches.sort_by(|a, b| {
        b.rule
            .priority
            .cmp(&a.rule.priority)
            .then(b.confidence.cmp(&a.confidence))
    });
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{test_rule, ActionType, ConditionType};
    use rust_decimal_macros::dec;

    #[test]
    fn test_ica_contains_rule_matches() {
        let rules = vec![test_rule(
            1,
            5,
            ConditionType::Contains,
            "ICA",
            ActionType::SuggestAccount,
            "4010",
        )];
        let txn = Transaction::new("ICA SUPERMARKET STHLM", dec!(-342.50));
        let matches = find_matches(&rules, &txn);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].rule.id, 1);
        assert_eq!(matches[0].confidence, 75);
    }

    #[test]
    fn test_higher_priority_first_regardless_of_confidence() {
        let rules = vec![
            test_rule(1, 8, ConditionType::Equals, "spotify", ActionType::SuggestAccount, "6540"),
            test_rule(2, 10, ConditionType::AmountLt, "0", ActionType::SuggestAccount, "6990"),
        ];
        let txn = Transaction::new("Spotify", dec!(-119));
        let matches = find_matches(&rules, &txn);
        let ids: Vec<i64> = matches.iter().map(|m| m.rule.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert!(matches[0].confidence < matches[1].confidence);
    }

    #[test]
    fn test_equal_priority_sorted_by_confidence() {
        let rules = vec![
            test_rule(1, 3, ConditionType::Contains, "tel", ActionType::SuggestAccount, "6212"),
            test_rule(2, 3, ConditionType::Equals, "telia", ActionType::SuggestAccount, "6211"),
        ];
        let matches = find_matches(&rules, &Transaction::new("TELIA", dec!(-499)));
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0].rule.id, 2);
        assert_eq!(matches[1].rule.id, 1);
        assert!(matches[0].confidence > matches[1].confidence);
    }

    #[test]
    fn test_full_ties_keep_input_order() {
        let rules = vec![
            test_rule(7, 1, ConditionType::Contains, "a", ActionType::SuggestTemplate, "t7"),
            test_rule(3, 1, ConditionType::Contains, "b", ActionType::SuggestTemplate, "t3"),
            test_rule(5, 1, ConditionType::Contains, "c", ActionType::SuggestTemplate, "t5"),
        ];
        let matches = find_matches(&rules, &Transaction::new("abc", dec!(1)));
        let ids: Vec<i64> = matches.iter().map(|m| m.rule.id).collect();
        assert_eq!(ids, vec![7, 3, 5]);
    }

    #[test]
    fn test_inactive_rule_is_excluded() {
        let mut inactive =
            test_rule(1, 10, ConditionType::Contains, "ica", ActionType::AutoBook, "template-1");
        inactive.is_active = false;
        let rules = vec![inactive];
        assert!(find_matches(&rules, &Transaction::new("ICA MAXI", dec!(-10))).is_empty());
    }

    #[test]
    fn test_inactive_rules_do_not_raise_max_priority() {
        let mut inactive =
            test_rule(1, 100, ConditionType::Contains, "x", ActionType::SuggestAccount, "1930");
        inactive.is_active = false;
        let rules = vec![
            inactive,
            test_rule(2, 10, ConditionType::Equals, "x", ActionType::SuggestAccount, "1930"),
        ];
        let matches = find_matches(&rules, &Transaction::new("x", dec!(1)));
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].confidence, 100);
    }

    #[test]
    fn test_no_rules_no_matches() {
        assert!(find_matches(&[], &Transaction::new("anything", dec!(0))).is_empty());
    }

    #[test]
    fn test_amount_range_boundaries() {
        let rules = vec![test_rule(
            1,
            10,
            ConditionType::AmountRange,
            "100,500",
            ActionType::AutoBook,
            "template-1",
        )];
        assert_eq!(find_matches(&rules, &Transaction::new("x", dec!(500))).len(), 1);
        assert!(find_matches(&rules, &Transaction::new("x", dec!(500.01))).is_empty());
    }
}
