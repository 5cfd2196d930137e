//! Corporate suffix vocabulary.
//!
//! Legal-form tokens carry no identity ("Acme Inc" and "Acme LLC" are keyed
//! the same). The set is compared against already-normalized tokens, so
//! entries are lowercase ASCII without punctuation ("l.l.c." normalizes to
//! "llc" before lookup).

use std::collections::HashSet;
use std::sync::LazyLock;

const SUFFIXES: &[&str] = &[
    "ag",
    "bv",
    "co",
    "company",
    "corp",
    "corporation",
    "gmbh",
    "inc",
    "incorporated",
    "limited",
    "llc",
    "llp",
    "lp",
    "ltd",
    "nv",
    "pc",
    "plc",
    "pty",
    "sa",
];

static SUFFIX_SET: LazyLock<HashSet<&'static str>> =
    LazyLock::new(|| SUFFIXES.iter().copied().collect());

/// Returns `true` if `token` is a corporate suffix dropped from name keys.
pub fn is_corporate_suffix(token: &str) -> bool {
    SUFFIX_SET.contains(token)
}

/// The full suffix vocabulary, sorted.
pub fn corporate_suffixes() -> &'static [&'static str] {
    SUFFIXES
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vocabulary_is_sorted_and_normalized() {
        let mut sorted = SUFFIXES.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, SUFFIXES);

        for suffix in corporate_suffixes() {
            assert!(suffix
                .chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
        }
    }

    #[test]
    fn membership() {
        assert!(is_corporate_suffix("inc"));
        assert!(is_corporate_suffix("llc"));
        assert!(!is_corporate_suffix("Inc"));
        assert!(!is_corporate_suffix("acme"));
        assert!(!is_corporate_suffix(""));
    }
}
