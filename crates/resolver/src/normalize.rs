use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Filler words that carry no category meaning in upstream cluster names.
pub const STOP_WORDS: &[&str] = &["kontaktowych", "kontaktowe", "przewodnik", "inne"];

/// Default acceptance ratio for general reference resolution.
pub const DEFAULT_FUZZY_ACCEPT: f64 = 0.80;

/// Default ratio above which two labels are considered the same category.
pub const DEFAULT_STRICT_EQUIVALENCE: f64 = 0.90;

static SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\s\-_/]+").expect("separator pattern is valid"));

/// Normalize a label for comparison: lowercase, split on whitespace, dashes,
/// underscores and slashes, drop stop-words, rejoin with single spaces.
///
/// Every matching path goes through this function.
pub fn normalize_label(raw: &str) -> String {
    let lowered = raw.trim().to_lowercase();
    SEPARATORS
        .split(&lowered)
        .filter(|part| !part.is_empty() && !STOP_WORDS.contains(part))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Similarity ratio in `[0, 1]` between two labels after normalization.
///
/// Ratcliff/Obershelp: `2 * M / T`, where `M` counts characters in matching blocks
/// and `T` is the combined length. Two labels that normalize to nothing are not similar.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = normalize_label(a).chars().collect();
    let b: Vec<char> = normalize_label(b).chars().collect();
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let total = (a.len() + b.len()) as f64;
    2.0 * matching_chars(&a, &b) as f64 / total
}

/// Characters covered by the longest common block plus, recursively, the blocks
/// found on either side of it.
fn matching_chars(a: &[char], b: &[char]) -> usize {
    let (i, j, len) = longest_block(a, b);
    if len == 0 {
        return 0;
    }
    len + matching_chars(&a[..i], &b[..j]) + matching_chars(&a[i + len..], &b[j + len..])
}

/// Longest common run as `(start_a, start_b, len)`. Ties keep the block that ends
/// first in `a`, then first in `b`.
fn longest_block(a: &[char], b: &[char]) -> (usize, usize, usize) {
    let mut best = (0, 0, 0);
    let mut prev = vec![0usize; b.len() + 1];
    for (i, ca) in a.iter().enumerate() {
        let mut row = vec![0usize; b.len() + 1];
        for (j, cb) in b.iter().enumerate() {
            if ca == cb {
                let len = prev[j] + 1;
                row[j + 1] = len;
                if len > best.2 {
                    best = (i + 1 - len, j + 1 - len, len);
                }
            }
        }
        prev = row;
    }
    best
}

/// Case-folded, trimmed form used by the exact label rule.
pub(crate) fn fold_label(raw: &str) -> String {
    raw.trim().to_lowercase()
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchThresholds {
    /// Minimum ratio for the fuzzy resolution rule.
    pub fuzzy_accept: f64,
    /// Minimum ratio for [`MatchThresholds::equivalent`].
    pub strict_equivalence: f64,
}

impl MatchThresholds {
    /// Strict equivalence check between two labels.
    pub fn equivalent(&self, a: &str, b: &str) -> bool {
        similarity(a, b) >= self.strict_equivalence
    }
}

impl Default for MatchThresholds {
    fn default() -> Self {
        Self {
            fuzzy_accept: DEFAULT_FUZZY_ACCEPT,
            strict_equivalence: DEFAULT_STRICT_EQUIVALENCE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalization_collapses_separators() {
        assert_eq!(normalize_label("  Laptopy   Gaming "), "laptopy gaming");
        assert_eq!(normalize_label("laptopy-gaming"), "laptopy gaming");
        assert_eq!(normalize_label("laptopy_gaming/2024"), "laptopy gaming 2024");
    }

    #[test]
    fn normalization_strips_stop_words() {
        assert_eq!(normalize_label("Dane kontaktowe"), "dane");
        assert_eq!(normalize_label("Przewodnik - Laptopy"), "laptopy");
        assert_eq!(normalize_label("inne"), "");
    }

    #[test]
    fn separator_variants_are_identical() {
        assert_eq!(similarity("Laptopy Gaming", "laptopy-gaming"), 1.0);
        assert_eq!(similarity("LAPTOPY_GAMING", "laptopy gaming"), 1.0);
    }

    #[test]
    fn unrelated_labels_score_low() {
        assert!(similarity("laptopy gaming", "ekspresy do kawy") < 0.5);
    }

    #[test]
    fn ratio_counts_every_matching_block() {
        // "ekspresy " and "kaw" match: 2 * 12 / 29.
        let ratio = similarity("Ekspresy kawa", "ekspresy do kawy");
        assert!((ratio - 24.0 / 29.0).abs() < 1e-9, "{ratio}");
        assert!(ratio >= DEFAULT_FUZZY_ACCEPT);

        assert!((similarity("abcd", "bcde") - 0.75).abs() < 1e-9);
        assert_eq!(similarity("abc", "xyz"), 0.0);
    }

    #[test]
    fn ratio_is_symmetric_for_distinct_labels() {
        let a = "laptopy do gier";
        let b = "laptopy gaming";
        assert!((similarity(a, b) - similarity(b, a)).abs() < 1e-9);
    }

    #[test]
    fn empty_labels_never_match() {
        assert_eq!(similarity("", ""), 0.0);
        assert_eq!(similarity("inne", "inne"), 0.0);
    }

    #[test]
    fn strict_equivalence_is_tighter_than_acceptance() {
        let thresholds = MatchThresholds::default();
        // One differing letter in twenty: 2 * 19 / 40.
        assert!(thresholds.equivalent("laptopy gaming abcde", "laptopy gaming abcdf"));
        // Three differing letters: 2 * 17 / 40, accepted by resolution, not equivalent.
        let ratio = similarity("laptopy gaming abcde", "laptopy gaming abxyz");
        assert!(ratio >= thresholds.fuzzy_accept);
        assert!(!thresholds.equivalent("laptopy gaming abcde", "laptopy gaming abxyz"));
    }
}
