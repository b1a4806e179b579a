// src/matching/fuzzy.rs
//
// Token-sort similarity used to score a normalized withdrawal name against
// normalized bank names. Scores are integers in 0..=100.

/// Similarity of two strings after sorting their whitespace-separated tokens,
/// so word order does not affect the score.
pub fn token_sort_ratio(s1: &str, s2: &str) -> u8 {
    ratio(&sort_tokens(s1), &sort_tokens(s2))
}

/// Indel-normalized similarity: `100 * 2 * LCS / (len1 + len2)`, rounded to
/// the nearest integer. Two empty strings are identical (100).
pub fn ratio(s1: &str, s2: &str) -> u8 {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 100;
    }
    let lcs = longest_common_subsequence(&a, &b);
    let score = 200.0 * lcs as f64 / total as f64;
    score.round().clamp(0.0, 100.0) as u8
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn longest_common_subsequence(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for &ca in a {
        for (j, &cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}
