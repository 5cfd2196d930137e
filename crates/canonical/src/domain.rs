//! URL decomposition into a comparable domain and a raw path.

use std::borrow::Cow;

use ::url::Url;
use serde::{Deserialize, Serialize};

use crate::error::CanonicalError;

/// Domain and path extracted from a company URL.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DomainPath {
    /// Lowercase host with a single leading `www.` removed. Never empty.
    pub domain: String,
    /// Path exactly as written in the input, up to the first `?` or `#`.
    /// Empty when the URL has no path.
    pub path: String,
}

/// Prepends `http://` unless `raw` already starts with `http://` or
/// `https://`. Empty input is returned unchanged.
///
/// The check is case-sensitive and does not validate anything; it only lets
/// bare domains such as `acme.com` reach the parser.
pub fn complete_scheme(raw: &str) -> Cow<'_, str> {
    if raw.is_empty() || raw.starts_with("http://") || raw.starts_with("https://") {
        Cow::Borrowed(raw)
    } else {
        Cow::Owned(format!("http://{raw}"))
    }
}

/// Splits a raw URL into its normalized domain and its path.
///
/// Only one literal `www.` prefix is removed: `wwww.example.com` stays as is
/// and `www.www.example.com` becomes `www.example.com`.
///
/// ```rust
/// use canonical::decompose_url;
///
/// let parts = decompose_url("www.Example.com/path").unwrap();
/// assert_eq!(parts.domain, "example.com");
/// assert_eq!(parts.path, "/path");
///
/// assert!(decompose_url("").is_err());
/// ```
pub fn decompose_url(raw: &str) -> Result<DomainPath, CanonicalError> {
    if raw.is_empty() {
        return Err(CanonicalError::EmptyUrl);
    }

    let completed = complete_scheme(raw);
    let parsed = Url::parse(&completed).map_err(|err| CanonicalError::UnparsableUrl {
        input: raw.to_string(),
        reason: err.to_string(),
    })?;

    let host = parsed
        .host_str()
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    let domain = host.strip_prefix("www.").unwrap_or(&host);
    if domain.is_empty() {
        return Err(CanonicalError::MissingHost {
            input: raw.to_string(),
        });
    }

    Ok(DomainPath {
        domain: domain.to_string(),
        path: raw_path(&completed).to_string(),
    })
}

/// Returns the slice between the authority and the query/fragment.
fn raw_path(completed: &str) -> &str {
    let after_scheme = match completed.find("://") {
        Some(idx) => &completed[idx + 3..],
        None => return "",
    };
    let rest = match after_scheme.find(['/', '?', '#']) {
        Some(idx) => &after_scheme[idx..],
        None => return "",
    };
    if !rest.starts_with('/') {
        return "";
    }
    match rest.find(['?', '#']) {
        Some(idx) => &rest[..idx],
        None => rest,
    }
}
