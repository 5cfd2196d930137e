//! Whitespace normalization.
//!
//! ```rust
//! use canonical::collapse_whitespace;
//!
//! assert_eq!(collapse_whitespace("  acme \t widgets\n"), "acme widgets");
//! ```

/// Collapses every run of Unicode whitespace into one ASCII space and trims
/// both ends.
///
/// Returns an empty string for empty or whitespace-only input. The output
/// never contains two consecutive spaces, which is what lets name keys be
/// split on `' '` afterwards.
pub fn collapse_whitespace(text: &str) -> String {
    let mut normalized = String::with_capacity(text.len());
    for segment in text.split_whitespace() {
        if !normalized.is_empty() {
            normalized.push(' ');
        }
        normalized.push_str(segment);
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_mixed_whitespace() {
        assert_eq!(collapse_whitespace("a  b\t\tc\r\nd"), "a b c d");
        assert_eq!(collapse_whitespace("a\u{00A0}b"), "a b");
    }

    #[test]
    fn blank_input_is_empty() {
        assert_eq!(collapse_whitespace(""), "");
        assert_eq!(collapse_whitespace(" \n\t "), "");
    }

    #[test]
    fn already_collapsed_is_unchanged() {
        assert_eq!(collapse_whitespace("acme widgets"), "acme widgets");
    }
}
