//! Trigram similarity over normalized company keys.
//!
//! Each word is padded with two leading blanks and one trailing blank, and the
//! distinct 3-character windows of all words form the trigram set. Similarity
//! is the Jaccard index of two sets: shared trigrams over distinct trigrams.
//! These are the semantics of PostgreSQL's `pg_trgm` `similarity()`.

use std::collections::HashSet;

type Trigram = [char; 3];

/// Distinct padded trigrams of every whitespace-separated word in `text`.
pub fn trigrams(text: &str) -> HashSet<Trigram> {
    let mut set = HashSet::new();
    for word in text.split_whitespace() {
        let padded: Vec<char> = [' ', ' ']
            .into_iter()
            .chain(word.chars())
            .chain(std::iter::once(' '))
            .collect();
        for window in padded.windows(3) {
            set.insert([window[0], window[1], window[2]]);
        }
    }
    set
}

/// Symmetric trigram similarity in `[0, 1]`. Two texts without trigrams score 0.
pub fn trigram_similarity(a: &str, b: &str) -> f64 {
    let left = trigrams(a);
    let right = trigrams(b);
    let shared = left.intersection(&right).count();
    let total = left.len() + right.len() - shared;
    if total == 0 {
        return 0.0;
    }
    shared as f64 / total as f64
}
