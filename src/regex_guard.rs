//! Heuristic screening of user-authored regular expressions.
//!
//! Patterns are rejected before they are ever compiled. The checks are
//! shape-based and conservative: some harmless patterns are refused, and a
//! pattern passing here is not proven safe.

pub const MAX_PATTERN_LEN: usize = 200;

const TOO_LONG: &str = "pattern is longer than 200 characters";
const NESTED: &str = "nested quantifier: quantified group contains a quantifier";
const DOUBLED: &str = "doubled quantifier";
const NON_CAPTURING: &str = "quantified non-capturing group";

#[derive(Clone, Copy)]
enum Prev {
    Start,
    Atom,
    Open,
    Close {
        non_capturing: bool,
        quantified_inside: bool,
    },
    Quantifier,
    Lazy,
}

struct Group {
    non_capturing: bool,
    quantified_inside: bool,
}

pub fn is_safe(pattern: &str) -> bool {
    rejection_reason(pattern).is_none()
}

/// Why `pattern` is refused, or `None` when it may be compiled.
pub fn rejection_reason(pattern: &str) -> Option<&'static str> {
    // Length is counted in chars, so non-BMP characters count once, not twice as in UTF-16.
    if pattern.chars().count() > MAX_PATTERN_LEN {
        return Some(TOO_LONG);
    }

    let chars: Vec<char> = pattern.chars().collect();
    let mut groups: Vec<Group> = Vec::new();
    let mut prev = Prev::Start;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '\\' => {
                prev = Prev::Atom;
                i += 2;
                continue;
            }
            '[' => {
                prev = Prev::Atom;
                i = class_end(&chars, i);
                continue;
            }
            '(' => {
                let non_capturing = is_non_capturing_open(&chars, i);
                groups.push(Group {
                    non_capturing,
                    quantified_inside: false,
                });
                prev = Prev::Open;
                if chars.get(i + 1) == Some(&'?') {
                    i += 1;
                }
            }
            ')' => {
                prev = match groups.pop() {
                    Some(group) => {
                        if let Some(parent) = groups.last_mut() {
                            parent.quantified_inside |= group.quantified_inside;
                        }
                        Prev::Close {
                            non_capturing: group.non_capturing,
                            quantified_inside: group.quantified_inside,
                        }
                    }
                    None => Prev::Atom,
                };
            }
            '+' | '*' => {
                if let Some(reason) = check_quantifier(prev) {
                    return Some(reason);
                }
                if let Some(group) = groups.last_mut() {
                    group.quantified_inside = true;
                }
                prev = Prev::Quantifier;
            }
            '{' => match counted_repetition_end(&chars, i) {
                Some(end) => {
                    if let Some(reason) = check_quantifier(prev) {
                        return Some(reason);
                    }
                    prev = Prev::Quantifier;
                    i = end + 1;
                    continue;
                }
                None => prev = Prev::Atom,
            },
            '?' => {
                prev = match prev {
                    Prev::Quantifier => Prev::Lazy,
                    Prev::Lazy => return Some(DOUBLED),
                    Prev::Close {
                        non_capturing: true,
                        ..
                    } => return Some(NON_CAPTURING),
                    _ => Prev::Quantifier,
                };
            }
            _ => prev = Prev::Atom,
        }
        i += 1;
    }

    None
}

fn check_quantifier(prev: Prev) -> Option<&'static str> {
    match prev {
        Prev::Quantifier | Prev::Lazy => Some(DOUBLED),
        Prev::Close {
            non_capturing: true,
            ..
        } => Some(NON_CAPTURING),
        Prev::Close {
            quantified_inside: true,
            ..
        } => Some(NESTED),
        _ => None,
    }
}

/// `(?:` or a flag group such as `(?i:` or `(?s-u:` at `start`.
fn is_non_capturing_open(chars: &[char], start: usize) -> bool {
    if chars.get(start + 1) != Some(&'?') {
        return false;
    }
    let mut j = start + 2;
    while chars.get(j).is_some_and(|c| c.is_ascii_alphabetic() || *c == '-') {
        j += 1;
    }
    chars.get(j) == Some(&':')
}

/// Index just past the character class opened at `start`.
fn class_end(chars: &[char], start: usize) -> usize {
    let mut j = start + 1;
    if chars.get(j) == Some(&'^') {
        j += 1;
    }
    // a leading ']' is a literal
    if chars.get(j) == Some(&']') {
        j += 1;
    }
    let mut depth = 1;
    while j < chars.len() {
        match chars[j] {
            '\\' => j += 1,
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return j + 1;
                }
            }
            _ => {}
        }
        j += 1;
    }
    chars.len()
}

/// `{n}`, `{n,}`, `{n,m}` or `{,m}` starting at `start`; returns the index of `}`.
fn counted_repetition_end(chars: &[char], start: usize) -> Option<usize> {
    let mut j = start + 1;
    let mut min_digits = 0;
    while chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
        min_digits += 1;
        j += 1;
    }
    let mut max_digits = 0;
    let comma = chars.get(j) == Some(&',');
    if comma {
        j += 1;
        while chars.get(j).is_some_and(|c| c.is_ascii_digit()) {
            max_digits += 1;
            j += 1;
        }
    }
    let valid = min_digits > 0 || (comma && max_digits > 0);
    (valid && chars.get(j) == Some(&'}')).then_some(j)
}
