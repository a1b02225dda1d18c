//! Trust tiers that segregate synthesized implementations.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One of the two isolated generation destinations.
///
/// Implementations synthesized into one tier never reference, share, or
/// alias implementations from the other.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Ordinary trust. Always available.
    Standard,
    /// Elevated trust. Requires signing material when first materialized.
    Elevated,
}

impl Tier {
    /// Both tiers, standard first.
    pub const ALL: [Tier; 2] = [Tier::Standard, Tier::Elevated];

    /// Returns the lowercase tier name.
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Standard => "standard",
            Tier::Elevated => "elevated",
        }
    }

    /// Dense index of this tier, for per-tier slot arrays.
    pub fn index(self) -> usize {
        match self {
            Tier::Standard => 0,
            Tier::Elevated => 1,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_lowercase() {
        assert_eq!(Tier::Standard.to_string(), "standard");
        assert_eq!(Tier::Elevated.to_string(), "elevated");
    }

    #[test]
    fn indices_are_dense() {
        for (i, tier) in Tier::ALL.iter().enumerate() {
            assert_eq!(tier.index(), i);
        }
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&Tier::Elevated).unwrap();
        assert_eq!(json, "\"elevated\"");
        let back: Tier = serde_json::from_str("\"standard\"").unwrap();
        assert_eq!(back, Tier::Standard);
    }
}
