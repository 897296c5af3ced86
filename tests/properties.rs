use chrono::Utc;
use kontoregel::actions::auto_book_decision;
use kontoregel::evaluator::evaluate;
use kontoregel::matcher::find_matches;
use kontoregel::regex_guard::{is_safe, MAX_PATTERN_LEN};
use kontoregel::scorer::score;
use kontoregel::{ActionType, ConditionType, Rule, Transaction};
use proptest::prelude::*;
use rust_decimal::Decimal;

fn condition_type() -> impl Strategy<Value = ConditionType> {
    prop::sample::select(ConditionType::ALL.to_vec())
}

fn action_type() -> impl Strategy<Value = ActionType> {
    prop::sample::select(ActionType::ALL.to_vec())
}

fn amount() -> impl Strategy<Value = Decimal> {
    (-10_000_000i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn condition_value(condition_type: ConditionType) -> BoxedStrategy<String> {
    match condition_type {
        ConditionType::AmountGt | ConditionType::AmountLt => prop_oneof![
            amount().prop_map(|a| a.to_string()),
            "[a-z]{0,4}",
        ]
        .boxed(),
        ConditionType::AmountRange => prop_oneof![
            (amount(), amount()).prop_map(|(a, b)| format!("{a},{b}")),
            "[0-9a-z,]{0,8}",
        ]
        .boxed(),
        ConditionType::Regex => prop_oneof![
            Just("^ica".to_string()),
            Just(r"\d+".to_string()),
            Just("(a+)+$".to_string()),
            Just("[unclosed".to_string()),
            "[a-z.*+()]{0,10}",
        ]
        .boxed(),
        _ => "[a-zA-Z ]{1,6}".boxed(),
    }
}

fn rule() -> impl Strategy<Value = Rule> {
    (condition_type(), action_type(), 0i64..20, any::<bool>())
        .prop_flat_map(|(ct, at, priority, is_active)| {
            (condition_value(ct), Just((ct, at, priority, is_active)))
        })
        .prop_map(|(value, (ct, at, priority, is_active))| {
            let now = Utc::now();
            Rule {
                id: 0,
                workspace: "default".to_string(),
                name: "generated".to_string(),
                description: None,
                priority,
                is_active,
                condition_type: ct,
                condition_value: value,
                action_type: at,
                action_value: "4010".to_string(),
                usage_count: 0,
                last_matched_at: None,
                created_at: now,
                updated_at: now,
            }
        })
}

fn rules() -> impl Strategy<Value = Vec<Rule>> {
    prop::collection::vec(rule(), 0..30).prop_map(|mut rules| {
        for (i, r) in rules.iter_mut().enumerate() {
            r.id = i as i64 + 1;
        }
        rules
    })
}

fn transaction() -> impl Strategy<Value = Transaction> {
    ("[a-zA-Z ]{0,20}", amount()).prop_map(|(d, a)| Transaction::new(d, a))
}

proptest! {
    #[test]
    fn test_matches_never_include_inactive_rules(rules in rules(), txn in transaction()) {
        for m in find_matches(&rules, &txn) {
            prop_assert!(m.rule.is_active);
        }
    }

    #[test]
    fn test_every_match_satisfies_its_condition(rules in rules(), txn in transaction()) {
        for m in find_matches(&rules, &txn) {
            prop_assert!(evaluate(m.rule.condition_type, &m.rule.condition_value, &txn));
        }
    }

    #[test]
    fn test_matches_sorted_by_priority_then_confidence(rules in rules(), txn in transaction()) {
        let matches = find_matches(&rules, &txn);
        for pair in matches.windows(2) {
            let a = (pair[0].rule.priority, pair[0].confidence);
            let b = (pair[1].rule.priority, pair[1].confidence);
            prop_assert!(a >= b, "{a:?} before {b:?}");
        }
    }

    #[test]
    fn test_confidence_is_bounded(ct in condition_type(), priority in -1000i64..1000, max in -1000i64..1000) {
        let s = score(ct, priority, max);
        prop_assert!(s <= 100);
    }

    #[test]
    fn test_oversized_patterns_never_match(extra in 1usize..50, txn in transaction()) {
        let pattern = ".".repeat(MAX_PATTERN_LEN + extra);
        prop_assert!(!is_safe(&pattern));
        prop_assert!(!evaluate(ConditionType::Regex, &pattern, &txn));
    }

    #[test]
    fn test_nested_quantifiers_never_match(atom in "[a-z]", outer in "[+*]", inner in "[+*]", desc in "[a-z]{0,40}") {
        let pattern = format!("({atom}{inner}){outer}");
        prop_assert!(!is_safe(&pattern));
        let txn = Transaction::new(desc, Decimal::ZERO);
        prop_assert!(!evaluate(ConditionType::Regex, &pattern, &txn));
    }

    #[test]
    fn test_quantified_non_capturing_groups_never_match(
        flags in prop::sample::select(vec!["", "i", "s", "i-s"]),
        body in "[a-z]{1,4}",
        quantifier in "[+*?]",
        desc in "[a-z]{0,40}",
    ) {
        let pattern = format!("(?{flags}:{body}){quantifier}");
        prop_assert!(!is_safe(&pattern), "{pattern}");
        let txn = Transaction::new(desc, Decimal::ZERO);
        prop_assert!(!evaluate(ConditionType::Regex, &pattern, &txn));
    }

    #[test]
    fn test_evaluation_is_repeatable(rules in rules(), txn in transaction()) {
        let first: Vec<(i64, u8)> = find_matches(&rules, &txn).iter().map(|m| (m.rule.id, m.confidence)).collect();
        let second: Vec<(i64, u8)> = find_matches(&rules, &txn).iter().map(|m| (m.rule.id, m.confidence)).collect();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn test_at_most_one_auto_book(rules in rules(), txn in transaction()) {
        let matches = find_matches(&rules, &txn);
        let decision = auto_book_decision(&matches);
        let first_auto = matches.iter().find(|m| m.rule.action_type == ActionType::AutoBook);
        prop_assert_eq!(decision.map(|m| m.rule.id), first_auto.map(|m| m.rule.id));
    }
}
