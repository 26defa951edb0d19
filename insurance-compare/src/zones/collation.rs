//! Accent- and case-insensitive ordering for display labels.

use std::cmp::Ordering;
use unicode_normalization::{UnicodeNormalization, char::is_combining_mark};

/// Letters with no canonical decomposition that still sort with a base letter.
fn fold_undecomposed(c: char, out: &mut String) {
    match c {
        'æ' => out.push_str("ae"),
        'œ' => out.push_str("oe"),
        'ß' => out.push_str("ss"),
        'ø' => out.push('o'),
        'ł' => out.push('l'),
        'đ' => out.push('d'),
        'ħ' => out.push('h'),
        'ı' => out.push('i'),
        other => out.push(other),
    }
}

/// Primary collation key: lowercase, NFKD, combining marks dropped.
pub fn collation_key(text: &str) -> String {
    let mut key = String::with_capacity(text.len());
    for c in text
        .to_lowercase()
        .nfkd()
        .filter(|c| !is_combining_mark(*c))
    {
        fold_undecomposed(c, &mut key);
    }
    key
}

/// Compares on the folded key first, then on the raw text so the order is total.
pub fn locale_cmp(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}
