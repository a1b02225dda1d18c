//! Signature keys: the structural identity of a requested implementation.

use proxen_common::ContentHash;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::descriptor::{TypeDescriptor, TypeName};
use crate::options::GenerationOptions;

/// The structural shape of an implementation request.
///
/// Two keys are equal iff the base type, the *ordered* capability list, and
/// the options are all equal. Capability order is significant because slot
/// layout follows declaration order. Keys are immutable once built.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SignatureKey {
    base: TypeName,
    capabilities: Vec<TypeName>,
    options: GenerationOptions,
}

impl SignatureKey {
    /// Builds a key from its three components.
    pub fn new(
        base: impl Into<TypeName>,
        capabilities: impl IntoIterator<Item = TypeName>,
        options: GenerationOptions,
    ) -> Self {
        Self {
            base: base.into(),
            capabilities: capabilities.into_iter().collect(),
            options,
        }
    }

    /// The base type.
    pub fn base(&self) -> &TypeName {
        &self.base
    }

    /// The capability contracts, in request order.
    pub fn capabilities(&self) -> &[TypeName] {
        &self.capabilities
    }

    /// The generation options.
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// A process-independent hash of all three components.
    ///
    /// Unlike the `Hash` impl, this is stable across runs and builds.
    pub fn fingerprint(&self) -> ContentHash {
        let options = self.options.canonical_parts();
        let count = self.capabilities.len().to_string();
        let parts = std::iter::once(self.base.as_str())
            .chain(std::iter::once(count.as_str()))
            .chain(self.capabilities.iter().map(TypeName::as_str))
            .chain(options.iter().map(String::as_str));
        ContentHash::from_parts(parts)
    }
}

impl fmt::Display for SignatureKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}+[", self.base)?;
        for (i, cap) in self.capabilities.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{cap}")?;
        }
        f.write_str("]")
    }
}

/// Everything the synthesizer needs to build an implementation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetDescription {
    /// The type whose members are intercepted.
    pub base: TypeDescriptor,
    /// Additional contracts the implementation must honor, in order.
    #[serde(default)]
    pub capabilities: Vec<TypeDescriptor>,
    /// Generation options.
    #[serde(default)]
    pub options: GenerationOptions,
}

impl TargetDescription {
    /// Describes a proxy of `base` with no extra capabilities.
    pub fn new(base: TypeDescriptor) -> Self {
        Self {
            base,
            capabilities: Vec::new(),
            options: GenerationOptions::default(),
        }
    }

    /// Appends a capability contract.
    pub fn with_capability(mut self, capability: TypeDescriptor) -> Self {
        self.capabilities.push(capability);
        self
    }

    /// Sets the generation options.
    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    /// Derives the signature key from type identities and options.
    pub fn key(&self) -> SignatureKey {
        SignatureKey::new(
            self.base.name.clone(),
            self.capabilities.iter().map(|c| c.name.clone()),
            self.options.clone(),
        )
    }

    /// Iterates the base followed by every capability.
    pub fn types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        std::iter::once(&self.base).chain(self.capabilities.iter())
    }

    /// Returns `true` if every participating type comes from a signed origin.
    pub fn is_trusted(&self) -> bool {
        self.types().all(|t| t.trusted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::{InterceptionStrategy, NamingStrategy};
    use proptest::prelude::*;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    fn hash_of(key: &SignatureKey) -> u64 {
        let mut h = DefaultHasher::new();
        key.hash(&mut h);
        h.finish()
    }

    fn names(list: &[&str]) -> Vec<TypeName> {
        list.iter().map(|s| TypeName::new(*s)).collect()
    }

    #[test]
    fn independently_built_descriptions_match() {
        let a = TargetDescription::new(TypeDescriptor::class("Repo"))
            .with_capability(TypeDescriptor::contract("Disposable"));
        let b = TargetDescription::new(TypeDescriptor::class("Repo").trusted())
            .with_capability(
                TypeDescriptor::contract("Disposable")
                    .member(crate::MemberDescriptor::method("dispose")),
            );
        assert_eq!(a.key(), b.key());
        assert_eq!(hash_of(&a.key()), hash_of(&b.key()));
        assert_eq!(a.key().fingerprint(), b.key().fingerprint());
    }

    #[test]
    fn capability_order_is_significant() {
        let ab = SignatureKey::new("Repo", names(&["A", "B"]), GenerationOptions::default());
        let ba = SignatureKey::new("Repo", names(&["B", "A"]), GenerationOptions::default());
        assert_ne!(ab, ba);
        assert_ne!(ab.fingerprint(), ba.fingerprint());
    }

    #[test]
    fn options_are_significant() {
        let plain = SignatureKey::new("Repo", names(&["A"]), GenerationOptions::default());
        let named = SignatureKey::new(
            "Repo",
            names(&["A"]),
            GenerationOptions::default().named_by(NamingStrategy::Fingerprint),
        );
        assert_ne!(plain, named);
        assert_ne!(plain.fingerprint(), named.fingerprint());
    }

    #[test]
    fn capability_boundary_is_unambiguous() {
        // Base "A" with capability "B" vs base "A" with no capabilities but a
        // Named option member "B" must not collide.
        let with_cap = SignatureKey::new("A", names(&["B"]), GenerationOptions::default());
        let with_opt = SignatureKey::new(
            "A",
            Vec::new(),
            GenerationOptions::intercepting(InterceptionStrategy::named(["B"])),
        );
        assert_ne!(with_cap.fingerprint(), with_opt.fingerprint());
    }

    #[test]
    fn display_lists_capabilities() {
        let key = SignatureKey::new("Repo", names(&["A", "B"]), GenerationOptions::default());
        assert_eq!(key.to_string(), "Repo+[A, B]");
    }

    #[test]
    fn trusted_requires_every_type() {
        let desc = TargetDescription::new(TypeDescriptor::class("Repo").trusted())
            .with_capability(TypeDescriptor::contract("A"));
        assert!(!desc.is_trusted());
        let desc = TargetDescription::new(TypeDescriptor::class("Repo").trusted())
            .with_capability(TypeDescriptor::contract("A").trusted());
        assert!(desc.is_trusted());
    }

    proptest! {
        #[test]
        fn equal_components_give_equal_keys(
            base in "[A-Z][a-z]{0,8}",
            caps in proptest::collection::vec("[A-Z][a-z]{0,8}", 0..5),
            by_fingerprint in any::<bool>(),
        ) {
            let naming = if by_fingerprint { NamingStrategy::Fingerprint } else { NamingStrategy::TypeSuffix };
            let options = GenerationOptions::default().named_by(naming);
            let a = SignatureKey::new(base.as_str(), caps.iter().map(|c| TypeName::new(c.clone())), options.clone());
            let b = SignatureKey::new(TypeName::new(base.clone()), caps.iter().map(|c| TypeName::new(c.clone())), options);
            prop_assert_eq!(&a, &b);
            prop_assert_eq!(hash_of(&a), hash_of(&b));
            prop_assert_eq!(a.fingerprint(), b.fingerprint());
        }

        #[test]
        fn reordered_capabilities_differ(
            base in "[A-Z][a-z]{0,8}",
            first in "[A-Z][a-z]{0,8}",
            second in "[A-Z][a-z]{0,8}",
        ) {
            prop_assume!(first != second);
            let fwd = SignatureKey::new(base.as_str(), names(&[first.as_str(), second.as_str()]), GenerationOptions::default());
            let rev = SignatureKey::new(base.as_str(), names(&[second.as_str(), first.as_str()]), GenerationOptions::default());
            prop_assert_ne!(fwd, rev);
        }
    }
}
