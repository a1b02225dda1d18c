//! Synthesized implementations and the handles that refer to them.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use proxen_common::Tier;

use crate::container::GenerationContainer;
use crate::descriptor::{MemberDescriptor, TypeName};
use crate::dispatch::{Interceptor, ProxyInstance, Target};

/// The wrapper template bound to a dispatch slot.
///
/// The set is closed: every member maps to exactly one template, with
/// [`Template::Reflective`] as the catch-all for shapes the typed templates
/// do not cover.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Template {
    /// Calls the target directly. No interception.
    Forward,
    /// Intercepted method with a fixed, checked argument count.
    InterceptMethod,
    /// Intercepted property read.
    InterceptGetter,
    /// Intercepted property write.
    InterceptSetter,
    /// Intercepted member handled by the generic wrapper. Argument count is
    /// checked only when the call reaches the target, so interceptors may
    /// reshape arguments.
    Reflective,
}

impl Template {
    /// Returns `true` unless this is [`Template::Forward`].
    pub fn is_intercepted(self) -> bool {
        self != Template::Forward
    }
}

/// One entry of an implementation's dispatch table.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slot {
    /// The type that declares the member.
    pub owner: TypeName,
    /// The member itself.
    pub member: MemberDescriptor,
    /// The wrapper bound to it.
    pub template: Template,
}

impl Slot {
    /// `Owner.member`, used to address a slot unambiguously.
    pub fn qualified_name(&self) -> String {
        format!("{}.{}", self.owner, self.member.name)
    }

    fn matches(&self, member: &str) -> bool {
        match member.rsplit_once('.') {
            Some((owner, name)) => owner == self.owner.as_str() && name == self.member.name,
            None => member == self.member.name,
        }
    }
}

/// A synthesized implementation: a named dispatch table.
///
/// Implementations are immutable once defined in a container.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Implementation {
    /// Name, unique within the owning container.
    pub name: String,
    /// The intercepted base type.
    pub base: TypeName,
    /// Contracts honored, in layout order.
    pub contracts: Vec<TypeName>,
    /// Dispatch table, in layout order.
    pub slots: Vec<Slot>,
}

impl Implementation {
    /// Resolves a member name to its slot.
    ///
    /// `Owner.member` selects that owner's slot. A plain name selects the
    /// first matching slot in layout order.
    pub fn resolve(&self, member: &str) -> Option<&Slot> {
        self.slots.iter().find(|s| s.matches(member))
    }

    /// Returns `true` if the implementation is, or honors, `ty`.
    pub fn implements(&self, ty: &str) -> bool {
        self.base.as_str() == ty || self.contracts.iter().any(|c| c.as_str() == ty)
    }

    /// Number of intercepted slots.
    pub fn intercepted_count(&self) -> usize {
        self.slots
            .iter()
            .filter(|s| s.template.is_intercepted())
            .count()
    }
}

/// An opaque reference to an implementation defined in a container.
///
/// Cloning is cheap. Two handles are equal iff they refer to the very same
/// synthesized implementation, not merely one with the same layout.
#[derive(Clone)]
pub struct ImplHandle {
    implementation: Arc<Implementation>,
    container: Arc<GenerationContainer>,
}

impl ImplHandle {
    pub(crate) fn new(
        implementation: Arc<Implementation>,
        container: Arc<GenerationContainer>,
    ) -> Self {
        Self {
            implementation,
            container,
        }
    }

    /// The implementation's name within its container.
    pub fn name(&self) -> &str {
        &self.implementation.name
    }

    /// The implementation.
    pub fn implementation(&self) -> &Implementation {
        &self.implementation
    }

    /// The container the implementation was defined in.
    pub fn container(&self) -> &Arc<GenerationContainer> {
        &self.container
    }

    /// The tier of the owning container.
    pub fn tier(&self) -> Tier {
        self.container.tier()
    }

    /// Returns `true` if the implementation lives in `container`.
    pub fn belongs_to(&self, container: &Arc<GenerationContainer>) -> bool {
        Arc::ptr_eq(&self.container, container)
    }

    /// Creates a proxy instance that routes calls through `interceptors`
    /// before reaching `target`.
    pub fn instantiate(
        &self,
        target: Arc<dyn Target>,
        interceptors: Vec<Arc<dyn Interceptor>>,
    ) -> ProxyInstance {
        ProxyInstance::new(self.clone(), target, interceptors)
    }
}

impl PartialEq for ImplHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.implementation, &other.implementation)
    }
}

impl Eq for ImplHandle {}

impl fmt::Debug for ImplHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImplHandle")
            .field("name", &self.implementation.name)
            .field("container", &self.container.name())
            .field("tier", &self.container.tier())
            .finish()
    }
}
