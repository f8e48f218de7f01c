//! Pairwise scoring of normalized names.

use serde::Serialize;
use std::collections::HashSet;

/// Minimum number of shared tokens for a reordered-name match.
const MIN_SHARED_TOKENS: usize = 2;

/// All signals computed for one pair of normalized names.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Similarity {
    pub exact: bool,
    pub token_overlap_strong: bool,
    pub ratio: f64,
}

/// Score two normalized names. Symmetric in its arguments.
pub fn score(a: &str, b: &str) -> Similarity {
    Similarity {
        exact: a == b,
        token_overlap_strong: token_overlap_strong(a, b),
        ratio: sequence_ratio(a, b),
    }
}

/// True when both names carry the same token set with at least two tokens
/// in common, i.e. one is a reordering of the other.
pub fn token_overlap_strong(a: &str, b: &str) -> bool {
    let a_tokens: HashSet<_> = a.split_whitespace().collect();
    let b_tokens: HashSet<_> = b.split_whitespace().collect();
    let common = a_tokens.intersection(&b_tokens).count();
    common >= MIN_SHARED_TOKENS && a_tokens.symmetric_difference(&b_tokens).next().is_none()
}

/// Ratcliff/Obershelp similarity: `2 * M / (len(a) + len(b))` where `M` is
/// the number of characters covered by the matching blocks.
pub fn sequence_ratio(a: &str, b: &str) -> f64 {
    // The block search breaks ties by position, so fix the argument order to
    // keep the score symmetric.
    let (a, b) = if (a.chars().count(), a) <= (b.chars().count(), b) {
        (a, b)
    } else {
        (b, a)
    };
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    (2.0 * matching_chars(&a, &b) as f64) / total as f64
}

fn matching_chars(a: &[char], b: &[char]) -> usize {
    let mut matched = 0;
    let mut pending = vec![(0, a.len(), 0, b.len())];
    while let Some((a_lo, a_hi, b_lo, b_hi)) = pending.pop() {
        let (i, j, size) = longest_match(a, b, a_lo, a_hi, b_lo, b_hi);
        if size == 0 {
            continue;
        }
        matched += size;
        if a_lo < i && b_lo < j {
            pending.push((a_lo, i, b_lo, j));
        }
        if i + size < a_hi && j + size < b_hi {
            pending.push((i + size, a_hi, j + size, b_hi));
        }
    }
    matched
}

/// Longest common block of `a[a_lo..a_hi]` and `b[b_lo..b_hi]`.
///
/// Among equally long blocks the one starting earliest in `a`, then earliest
/// in `b`, wins.
fn longest_match(
    a: &[char],
    b: &[char],
    a_lo: usize,
    a_hi: usize,
    b_lo: usize,
    b_hi: usize,
) -> (usize, usize, usize) {
    let width = b_hi - b_lo;
    let mut best = (a_lo, b_lo, 0);
    let mut prev = vec![0usize; width + 1];
    let mut curr = vec![0usize; width + 1];
    for i in a_lo..a_hi {
        for j in b_lo..b_hi {
            let col = j - b_lo;
            curr[col + 1] = if a[i] == b[j] {
                let size = prev[col] + 1;
                if size > best.2 {
                    best = (i + 1 - size, j + 1 - size, size);
                }
                size
            } else {
                0
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    best
}
