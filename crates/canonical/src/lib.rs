//! Canonical keys for company records.
//!
//! This crate turns the two free-text inputs of a company record into values
//! that can be compared across records:
//!
//! - a company name becomes a normalized key ([`normalize_name`]): lowercase
//!   ASCII alphanumerics separated by single spaces, corporate suffixes such
//!   as "inc" or "llc" removed;
//! - a URL becomes a [`DomainPath`] ([`decompose_url`]): the lowercase host
//!   with one leading `www.` stripped, plus the raw path.
//!
//! ## Pure function guarantee
//!
//! No I/O, no clock calls, no locale dependence. The suffix set is fixed
//! data initialised once per process and never mutated.
//!
//! ## Invariants worth knowing
//!
//! - `normalize_name(normalize_name(s)) == normalize_name(s)` for every `s`
//! - an unparsable URL is an explicit [`CanonicalError`], never a silent
//!   empty domain; callers decide whether that is fatal
//!
//! ```rust
//! use canonical::{decompose_url, normalize_name, NormalizerConfig};
//!
//! let cfg = NormalizerConfig::default();
//! assert_eq!(normalize_name("Acme, Inc.", &cfg), "acme");
//!
//! let parts = decompose_url("www.Example.com/path").unwrap();
//! assert_eq!(parts.domain, "example.com");
//! assert_eq!(parts.path, "/path");
//! ```

mod config;
mod domain;
mod error;
mod name;
mod suffix;
mod whitespace;

pub use crate::config::NormalizerConfig;
pub use crate::domain::{complete_scheme, decompose_url, DomainPath};
pub use crate::error::CanonicalError;
pub use crate::name::normalize_name;
pub use crate::suffix::{corporate_suffixes, is_corporate_suffix};
pub use crate::whitespace::collapse_whitespace;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_and_url_of_one_record() {
        let cfg = NormalizerConfig::default();
        let key = normalize_name("  The ACME Corporation ", &cfg);
        let parts = decompose_url("https://WWW.acme.example/about?x=1").expect("decomposes");

        assert_eq!(key, "the acme");
        assert_eq!(parts.domain, "acme.example");
        assert_eq!(parts.path, "/about");
    }

    #[test]
    fn unparsable_url_is_reported_not_swallowed() {
        let err = decompose_url("http://exa mple.com").expect_err("space in host");
        assert!(matches!(err, CanonicalError::UnparsableUrl { .. }));
        assert!(err.to_string().contains("exa mple.com"));
    }
}
