//! Fuzzy linkage of report file names to master file names.
//!
//! Scoring is the token-sort ratio: both names are split on whitespace,
//! tokens are sorted and re-joined, and the Indel-normalized similarity of
//! the two strings is scaled to 0–100.

use std::collections::{BTreeSet, HashMap};

use rapidfuzz::distance::indel;
use serde::Serialize;

/// Best master candidate for one report name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinkMatch {
    /// `""` when no candidate reached the threshold.
    pub matched: String,
    /// Similarity of the match, 0–100. Zero when nothing reached the threshold.
    pub score: f64,
}

impl LinkMatch {
    pub fn none() -> Self {
        Self { matched: String::new(), score: 0.0 }
    }
}

/// Token-sort similarity of two strings on a 0–100 scale.
pub fn token_sort_ratio(a: &str, b: &str) -> f64 {
    score_sorted(&sort_tokens(a), &sort_tokens(b))
}

fn sort_tokens(s: &str) -> String {
    let mut tokens: Vec<&str> = s.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}

fn score_sorted(a: &str, b: &str) -> f64 {
    indel::normalized_similarity(a.chars(), b.chars()) * 100.0
}

/// Deduplicated master names, in the order ties are resolved.
///
/// Candidates are kept lexicographically sorted so that the first maximal
/// candidate is deterministic regardless of input order. Empty names are
/// never candidates.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    names: Vec<String>,
    sorted_tokens: Vec<String>,
}

impl Candidates {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let unique: BTreeSet<String> = names
            .into_iter()
            .map(|n| n.as_ref().to_string())
            .filter(|n| !n.is_empty())
            .collect();
        let names: Vec<String> = unique.into_iter().collect();
        let sorted_tokens = names.iter().map(|n| sort_tokens(n)).collect();
        Self { names, sorted_tokens }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.binary_search_by(|n| n.as_str().cmp(name)).is_ok()
    }

    /// Best candidate for `name` (unfiltered by threshold).
    pub fn best(&self, name: &str) -> Option<(&str, f64)> {
        if name.is_empty() {
            return None;
        }
        let query = sort_tokens(name);
        let mut best: Option<(usize, f64)> = None;
        for (i, cand) in self.sorted_tokens.iter().enumerate() {
            let score = score_sorted(&query, cand);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        best.map(|(i, score)| (self.names[i].as_str(), score))
    }

    /// Link one name: the best candidate if it scores at least `threshold`,
    /// otherwise [`LinkMatch::none`].
    pub fn link_one(&self, name: &str, threshold: f64) -> LinkMatch {
        match self.best(name) {
            Some((cand, score)) if score >= threshold => LinkMatch {
                matched: cand.to_string(),
                score,
            },
            _ => LinkMatch::none(),
        }
    }
}

/// Link every report name against the master candidate set.
///
/// O(R·M) comparisons; repeated report names are scored once.
pub fn link<S: AsRef<str>>(report_names: &[S], candidates: &Candidates, threshold: f64) -> Vec<LinkMatch> {
    let mut memo: HashMap<&str, LinkMatch> = HashMap::new();
    let mut out = Vec::with_capacity(report_names.len());
    let mut linked = 0usize;

    for name in report_names {
        let name = name.as_ref();
        let m = memo
            .entry(name)
            .or_insert_with(|| candidates.link_one(name, threshold))
            .clone();
        if !m.matched.is_empty() {
            linked += 1;
        }
        out.push(m);
    }

    log::debug!(
        "linked {linked}/{} report rows ({} distinct names) against {} master files at threshold {threshold}",
        report_names.len(),
        memo.len(),
        candidates.len(),
    );

    out
}
