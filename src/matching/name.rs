// src/matching/name.rs
use once_cell::sync::Lazy;
use regex::Regex;

/// Terms stripped from bank names before comparison. Longer terms come
/// before the shorter terms they contain: "conservation bank" before "bank",
/// "umbrella" before "mb".
pub const REMOVE_TERMS: [&str; 12] = [
    "mitigation bank",
    "conservation bank",
    "in-lieu fee program",
    "conservation area",
    "umbrella",
    "bank",
    "mb",
    "cb",
    "ilf",
    "program",
    "preserve",
    "restoration",
];

static NON_ALPHANUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9\s]").expect("valid character filter pattern"));
static WHITESPACE_RUNS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("valid whitespace pattern"));

/// Maps a raw bank or impact-site name to the key used for fuzzy comparison.
///
/// Missing names become the empty string. The result only ever contains
/// lowercase ASCII letters, digits and single spaces, and normalizing it again
/// returns it unchanged.
pub fn normalize_bank_name(name: Option<&str>) -> String {
    let Some(name) = name else {
        return String::new();
    };

    let mut normalized = normalize_pass(name);
    // Removing a term can splice a new one together ("bbankank" -> "bank").
    loop {
        let next = normalize_pass(&normalized);
        if next == normalized {
            return normalized;
        }
        normalized = next;
    }
}

fn normalize_pass(name: &str) -> String {
    let mut normalized = name.to_lowercase();
    for term in &REMOVE_TERMS {
        normalized = normalized.replace(term, "");
    }
    let normalized = NON_ALPHANUMERIC.replace_all(&normalized, "");
    WHITESPACE_RUNS
        .replace_all(&normalized, " ")
        .trim()
        .to_string()
}
