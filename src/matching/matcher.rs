// src/matching/matcher.rs
//
// Best-candidate selection of normalized withdrawal names against the
// normalized bank names, memoized per distinct query key for one run.
use log::debug;
use serde::Serialize;
use std::collections::HashMap;

use crate::matching::fuzzy::token_sort_ratio;
use crate::matching::name::normalize_bank_name;

/// Bank row that a normalized key resolves back to.
#[derive(Debug, Clone, PartialEq)]
pub struct BankCandidate {
    pub original_name: String,
    pub row_index: usize,
}

/// De-duplicated normalized bank keys plus the key -> bank mapping.
///
/// Keys iterate in first-seen order, which is the tie-break order used by
/// [`match_one`]. When several bank rows normalize to the same key the *last*
/// row wins the mapping.
#[derive(Debug, Clone, Default)]
pub struct CandidateIndex {
    keys: Vec<String>,
    representatives: HashMap<String, BankCandidate>,
}

impl CandidateIndex {
    /// Normalizes every bank name and builds the candidate set. Names that
    /// normalize to an empty key cannot be matched and are left out.
    pub fn build<I, S>(bank_names: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: AsRef<str>,
    {
        let mut index = Self::default();
        for (row_index, name) in bank_names.into_iter().enumerate() {
            let Some(name) = name else { continue };
            let key = normalize_bank_name(Some(name.as_ref()));
            if key.is_empty() {
                continue;
            }
            let candidate = BankCandidate {
                original_name: name.as_ref().to_string(),
                row_index,
            };
            if let Some(previous) = index.representatives.insert(key.clone(), candidate) {
                debug!(
                    "Bank key '{}' shared by rows {} and {}; keeping row {}",
                    key, previous.row_index, row_index, row_index
                );
            } else {
                index.keys.push(key);
            }
        }
        index
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Bank row for a matched key; `None` stays `None`.
    pub fn resolve(&self, matched_key: Option<&str>) -> Option<&BankCandidate> {
        matched_key.and_then(|key| self.representatives.get(key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchResult {
    pub matched_key: Option<String>,
    pub score: u8,
}

impl MatchResult {
    pub fn no_match() -> Self {
        Self {
            matched_key: None,
            score: 0,
        }
    }

    pub fn is_match(&self) -> bool {
        self.matched_key.is_some()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: usize,
    pub misses: usize,
    pub comparisons: usize,
}

/// Query key -> result memo for a single candidate set. Both accepted and
/// rejected outcomes are stored; a rejection only ever answers the same key.
#[derive(Debug, Default)]
pub struct MatchCache {
    entries: HashMap<String, MatchResult>,
    hits: usize,
    misses: usize,
    comparisons: usize,
}

impl MatchCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits,
            misses: self.misses,
            comparisons: self.comparisons,
        }
    }
}

/// Scores `query` against every candidate and returns the best one at or
/// above `threshold`. The first candidate (in index order) with the highest
/// score wins ties.
pub fn match_one(
    query: &str,
    index: &CandidateIndex,
    threshold: u8,
    cache: &mut MatchCache,
) -> MatchResult {
    if query.is_empty() {
        return MatchResult::no_match();
    }
    if let Some(cached) = cache.entries.get(query) {
        cache.hits += 1;
        return cached.clone();
    }
    cache.misses += 1;

    let mut best: Option<(&str, u8)> = None;
    for key in index.keys() {
        cache.comparisons += 1;
        let score = token_sort_ratio(query, key);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((key.as_str(), score));
            if score == 100 {
                break;
            }
        }
    }

    let result = match best {
        Some((key, score)) if score >= threshold => MatchResult {
            matched_key: Some(key.to_string()),
            score,
        },
        _ => MatchResult::no_match(),
    };
    cache.entries.insert(query.to_string(), result.clone());
    result
}

/// One matching run: a candidate set, a threshold and the cache that belongs
/// to exactly that pair. Dropping the run discards the cache.
pub struct MatchRun<'a> {
    index: &'a CandidateIndex,
    threshold: u8,
    cache: MatchCache,
}

impl<'a> MatchRun<'a> {
    pub fn new(index: &'a CandidateIndex, threshold: u8) -> Self {
        Self {
            index,
            threshold,
            cache: MatchCache::new(),
        }
    }

    pub fn match_one(&mut self, query: &str) -> MatchResult {
        match_one(query, self.index, self.threshold, &mut self.cache)
    }

    /// One result per query, in input order.
    pub fn match_all<I>(&mut self, queries: I) -> Vec<MatchResult>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        queries
            .into_iter()
            .map(|query| self.match_one(query.as_ref()))
            .collect()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

/// Matches every query against `index` with one cache shared across the call.
pub fn match_all<I>(queries: I, index: &CandidateIndex, threshold: u8) -> Vec<MatchResult>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    MatchRun::new(index, threshold).match_all(queries)
}
