use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;

use crate::config::NormalizerConfig;
use crate::suffix::is_corporate_suffix;
use crate::whitespace::collapse_whitespace;

/// Builds the normalized key for a company name.
///
/// Steps, in order:
/// 1. optional NFKD decomposition ([`NormalizerConfig::fold_diacritics`])
/// 2. lowercase
/// 3. drop every character that is not `a-z`, `0-9` or whitespace
/// 4. collapse whitespace runs to a single space and trim
/// 5. drop tokens that are corporate suffixes
///
/// Whitespace survives step 3 so that `"Acme\tInc"` still splits into two
/// tokens, while punctuation is removed without splitting (`"A.C.M.E."` keys
/// as `"acme"`). Empty or all-suffix input yields an empty key.
///
/// ```rust
/// use canonical::{normalize_name, NormalizerConfig};
///
/// let cfg = NormalizerConfig::default();
/// assert_eq!(normalize_name("Acme Inc.", &cfg), "acme");
/// assert_eq!(normalize_name("A.C.M.E.   Widgets,  LLC", &cfg), "acme widgets");
/// assert_eq!(normalize_name("Inc.", &cfg), "");
/// ```
pub fn normalize_name(raw: &str, cfg: &NormalizerConfig) -> String {
    let decomposed: Cow<str> = if cfg.fold_diacritics {
        Cow::Owned(raw.nfkd().collect())
    } else {
        Cow::Borrowed(raw)
    };

    let mut filtered = String::with_capacity(decomposed.len());
    for ch in decomposed.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch.is_whitespace() {
            filtered.push(ch);
        }
    }

    let collapsed = collapse_whitespace(&filtered);
    let mut key = String::with_capacity(collapsed.len());
    for token in collapsed.split(' ').filter(|t| !t.is_empty()) {
        if is_corporate_suffix(token) {
            continue;
        }
        if !key.is_empty() {
            key.push(' ');
        }
        key.push_str(token);
    }
    key
}
