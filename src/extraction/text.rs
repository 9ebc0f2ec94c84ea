//! Small text utilities shared across the type-specific extractors.

use chrono::NaiveDate;

/// Capitalize the first letter of every word, lowercase the rest, keeping
/// the original separators in place.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                out.extend(c.to_uppercase());
            } else {
                out.extend(c.to_lowercase());
            }
            at_word_start = false;
        } else {
            out.push(c);
            at_word_start = true;
        }
    }
    out
}

/// Drop Arabic-block codepoints. Mixed-script cards interleave Arabic with
/// the Latin field values we keep.
pub fn strip_arabic(s: &str) -> String {
    s.chars()
        .filter(|c| !('\u{0600}'..='\u{06FF}').contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

pub fn has_digit(s: &str) -> bool {
    s.chars().any(|c| c.is_ascii_digit())
}

/// The value part of a `Label : value` line, if the line has a colon.
pub fn colon_value(line: &str) -> Option<String> {
    let (_, value) = line.split_once(':')?;
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

/// The next non-empty line after index `i`, provided it carries no digits
/// (used when a label's value wraps onto the following line and the field is
/// textual).
pub fn next_textual_line(lines: &[&str], i: usize) -> Option<String> {
    let next = lines.get(i + 1)?.trim();
    if next.is_empty() || has_digit(next) {
        None
    } else {
        Some(next.to_string())
    }
}

/// Normalize a date string in one of the common scanned-document layouts to
/// `DD-Mon-YY`. Returns the input unchanged when no layout matches, since a
/// raw date is still more useful than nothing.
pub fn normalize_date(date_str: &str) -> String {
    for fmt in ["%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%Y-%m-%d", "%d %b %Y"] {
        if let Ok(date) = NaiveDate::parse_from_str(date_str, fmt) {
            return date.format("%d-%b-%y").to_string();
        }
    }
    date_str.to_string()
}

/// True when every cased word starts uppercase and continues lowercase.
pub fn is_title_cased(s: &str) -> bool {
    let mut saw_cased = false;
    let mut at_word_start = true;
    for c in s.chars() {
        if c.is_alphabetic() {
            if at_word_start {
                if !c.is_uppercase() {
                    return false;
                }
            } else if !c.is_lowercase() {
                return false;
            }
            saw_cased = true;
            at_word_start = false;
        } else {
            at_word_start = true;
        }
    }
    saw_cased
}

/// True when the string contains letters and none of them are lowercase.
pub fn is_upper_cased(s: &str) -> bool {
    s.chars().any(|c| c.is_alphabetic()) && !s.chars().any(|c| c.is_lowercase())
}
