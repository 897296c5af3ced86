use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount the Swedish way: `-1 234,56 kr`.
pub fn kronor(val: Decimal) -> String {
    let negative = val.is_sign_negative() && !val.is_zero();
    let abs = val
        .abs()
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let fixed = format!("{abs:.2}");
    let (int_part, dec_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::new();
    for (i, c) in int_part.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();

    if negative {
        format!("-{grouped},{dec_part} kr")
    } else {
        format!("{grouped},{dec_part} kr")
    }
}
