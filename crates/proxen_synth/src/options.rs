//! Generation options that are part of a signature's identity.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::descriptor::MemberDescriptor;

/// Options that change the shape of a synthesized implementation.
///
/// Options participate in [`SignatureKey`](crate::SignatureKey) equality, so
/// two requests differing only in options never share a cache slot.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Which members are routed through interceptors.
    #[serde(default)]
    pub interception: InterceptionStrategy,
    /// How the implementation is named inside its container.
    #[serde(default)]
    pub naming: NamingStrategy,
}

impl GenerationOptions {
    /// Returns options with the given interception strategy.
    pub fn intercepting(interception: InterceptionStrategy) -> Self {
        Self {
            interception,
            ..Self::default()
        }
    }

    /// Sets the naming strategy.
    pub fn named_by(mut self, naming: NamingStrategy) -> Self {
        self.naming = naming;
        self
    }

    /// Canonical textual parts, stable across processes, for fingerprinting.
    pub(crate) fn canonical_parts(&self) -> Vec<String> {
        let mut parts = vec![self.interception.tag().to_string()];
        if let InterceptionStrategy::Named(members) = &self.interception {
            parts.extend(members.iter().cloned());
        }
        parts.push(self.naming.tag().to_string());
        parts
    }
}

/// Selects the members whose calls pass through the interceptor chain.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterceptionStrategy {
    /// Every overridable base member and every contract member.
    #[default]
    AllOverridable,
    /// Only members declared by contracts.
    ContractsOnly,
    /// Only the named members (still subject to overridability).
    Named(BTreeSet<String>),
}

impl InterceptionStrategy {
    /// Builds a `Named` strategy.
    pub fn named<I, S>(members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Named(members.into_iter().map(Into::into).collect())
    }

    /// Returns `true` if calls to `member`, declared by a contract when
    /// `from_contract` is set, should be intercepted.
    pub fn intercepts(&self, from_contract: bool, member: &MemberDescriptor) -> bool {
        let overridable = from_contract || member.overridable;
        match self {
            Self::AllOverridable => overridable,
            Self::ContractsOnly => from_contract,
            Self::Named(names) => overridable && names.contains(&member.name),
        }
    }

    fn tag(&self) -> &'static str {
        match self {
            Self::AllOverridable => "all_overridable",
            Self::ContractsOnly => "contracts_only",
            Self::Named(_) => "named",
        }
    }
}

/// How an implementation's name is chosen.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NamingStrategy {
    /// `<Base>Proxy`, disambiguated by the container's naming scope.
    #[default]
    TypeSuffix,
    /// `Proxy_<fingerprint>`, derived from the signature key.
    Fingerprint,
}

impl NamingStrategy {
    fn tag(self) -> &'static str {
        match self {
            Self::TypeSuffix => "type_suffix",
            Self::Fingerprint => "fingerprint",
        }
    }
}
