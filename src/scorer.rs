use crate::models::ConditionType;

/// How narrow a match of this kind tends to be, relative to `equals`.
pub fn specificity(condition_type: ConditionType) -> f64 {
    match condition_type {
        ConditionType::Equals => 1.00,
        ConditionType::Regex => 0.95,
        ConditionType::StartsWith | ConditionType::EndsWith => 0.85,
        ConditionType::AmountRange => 0.80,
        ConditionType::Contains => 0.75,
        ConditionType::AmountGt | ConditionType::AmountLt => 0.70,
    }
}

/// Confidence 0-100 for a match: priority relative to the highest active
/// priority maps onto 40..=100, then scaled by condition specificity.
pub fn score(condition_type: ConditionType, priority: i64, max_priority: i64) -> u8 {
    let base = if max_priority > 0 {
        40.0 + (priority as f64 / max_priority as f64) * 60.0
    } else {
        70.0
    };
    (base * specificity(condition_type)).round().clamp(0.0, 100.0) as u8
}
