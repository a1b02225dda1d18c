//! Structural descriptions of the types a proxy is synthesized for.
//!
//! These are plain data supplied by the caller. The engine does not discover
//! or validate contracts beyond what the synthesizer needs to lay out slots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The identity of a type, by its fully qualified name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeName(String);

impl TypeName {
    /// Creates a type name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The unit type, used as the return type of members that return nothing.
    pub fn unit() -> Self {
        Self("()".to_string())
    }

    /// Returns the full name.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns the last path segment (`billing::Ledger` -> `Ledger`).
    pub fn simple_name(&self) -> &str {
        self.0
            .rsplit(|c: char| c == ':' || c == '.')
            .next()
            .unwrap_or(&self.0)
    }
}

impl From<&str> for TypeName {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeName({})", self.0)
    }
}

/// What kind of type a descriptor describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    /// A class that may be subclassed.
    Class,
    /// A class that forbids subclassing. Cannot be a proxy base.
    SealedClass,
    /// A capability contract: members only, no state.
    Contract,
}

/// A type participating in a target description.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDescriptor {
    /// Type identity.
    pub name: TypeName,
    /// Class, sealed class, or contract.
    pub kind: TypeKind,
    /// Whether the type comes from a signed origin and may participate in
    /// elevated-tier implementations.
    #[serde(default)]
    pub trusted: bool,
    /// Declared members, in declaration order.
    #[serde(default)]
    pub members: Vec<MemberDescriptor>,
}

impl TypeDescriptor {
    /// Describes a subclassable class with no members.
    pub fn class(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Class)
    }

    /// Describes a capability contract with no members.
    pub fn contract(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Contract)
    }

    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: TypeName::new(name),
            kind,
            trusted: false,
            members: Vec::new(),
        }
    }

    /// Marks a class as sealed.
    pub fn sealed(mut self) -> Self {
        if self.kind == TypeKind::Class {
            self.kind = TypeKind::SealedClass;
        }
        self
    }

    /// Marks the type as coming from a signed origin.
    pub fn trusted(mut self) -> Self {
        self.trusted = true;
        self
    }

    /// Appends a member.
    pub fn member(mut self, member: MemberDescriptor) -> Self {
        self.members.push(member);
        self
    }

    /// Returns `true` for contracts.
    pub fn is_contract(&self) -> bool {
        self.kind == TypeKind::Contract
    }
}

/// How a member is called.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    /// An ordinary method.
    Method,
    /// A property read: no parameters.
    Getter,
    /// A property write: one parameter, returns unit.
    Setter,
}

/// A member declared by a type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberDescriptor {
    /// Member name, unique per declaring type.
    pub name: String,
    /// Method, getter, or setter.
    pub kind: MemberKind,
    /// Parameter types, in order.
    #[serde(default)]
    pub params: Vec<TypeName>,
    /// Return type.
    #[serde(default = "TypeName::unit")]
    pub returns: TypeName,
    /// Whether a subclass may override the member. Ignored for contracts,
    /// whose members are always overridable.
    #[serde(default = "default_overridable")]
    pub overridable: bool,
}

fn default_overridable() -> bool {
    true
}

impl MemberDescriptor {
    /// A method with no parameters returning unit.
    pub fn method(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: MemberKind::Method,
            params: Vec::new(),
            returns: TypeName::unit(),
            overridable: true,
        }
    }

    /// A property getter returning `ty`.
    pub fn getter(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Getter,
            returns: TypeName::new(ty),
            ..Self::method(name)
        }
    }

    /// A property setter taking `ty`.
    pub fn setter(name: impl Into<String>, ty: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Setter,
            params: vec![TypeName::new(ty)],
            ..Self::method(name)
        }
    }

    /// Appends a parameter.
    pub fn param(mut self, ty: impl Into<String>) -> Self {
        self.params.push(TypeName::new(ty));
        self
    }

    /// Sets the return type.
    pub fn returns(mut self, ty: impl Into<String>) -> Self {
        self.returns = TypeName::new(ty);
        self
    }

    /// Marks the member as not overridable.
    pub fn non_overridable(mut self) -> Self {
        self.overridable = false;
        self
    }

    /// Number of declared parameters.
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simple_name_strips_path() {
        assert_eq!(TypeName::new("billing::Ledger").simple_name(), "Ledger");
        assert_eq!(TypeName::new("Billing.Ledger").simple_name(), "Ledger");
        assert_eq!(TypeName::new("Ledger").simple_name(), "Ledger");
    }

    #[test]
    fn sealed_only_applies_to_classes() {
        assert_eq!(TypeDescriptor::class("A").sealed().kind, TypeKind::SealedClass);
        assert_eq!(TypeDescriptor::contract("B").sealed().kind, TypeKind::Contract);
    }

    #[test]
    fn getter_and_setter_shapes() {
        let get = MemberDescriptor::getter("balance", "i64");
        assert_eq!(get.arity(), 0);
        assert_eq!(get.returns, TypeName::new("i64"));

        let set = MemberDescriptor::setter("balance", "i64");
        assert_eq!(set.arity(), 1);
        assert_eq!(set.returns, TypeName::unit());
    }

    #[test]
    fn json_defaults() {
        let json = r#"{
            "name": "Disposable",
            "kind": "contract",
            "members": [{ "name": "dispose", "kind": "method" }]
        }"#;
        let ty: TypeDescriptor = serde_json::from_str(json).unwrap();
        assert!(ty.is_contract());
        assert!(!ty.trusted);
        assert_eq!(ty.members[0].returns, TypeName::unit());
        assert!(ty.members[0].overridable);
    }
}
