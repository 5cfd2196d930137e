//! Configuration for company name normalization.
//!
//! The defaults reproduce the registry's long-standing key format exactly:
//! anything outside `[a-z0-9 ]` after lowercasing is dropped, so accented
//! letters vanish (`"Café"` keys as `"caf"`).
//!
//! Turning on [`NormalizerConfig::fold_diacritics`] applies Unicode NFKD
//! decomposition first, which leaves the base letter behind once the
//! combining mark is filtered out (`"Café"` keys as `"cafe"`). Keys built with
//! different settings are not comparable, so registries must be ingested and
//! queried with the same configuration.
//!
//! ```rust
//! use canonical::{normalize_name, NormalizerConfig};
//!
//! let folded = NormalizerConfig { fold_diacritics: true };
//! assert_eq!(normalize_name("Café Noir SARL", &folded), "cafe noir sarl");
//! assert_eq!(normalize_name("Café Noir SARL", &NormalizerConfig::default()), "caf noir sarl");
//! ```

use serde::{Deserialize, Serialize};

/// Knobs for [`normalize_name`](crate::normalize_name).
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct NormalizerConfig {
    /// Decompose (NFKD) before filtering so accented letters keep their base
    /// letter instead of being removed. Off by default.
    #[serde(default)]
    pub fold_diacritics: bool,
}
