//! The synthesis pipeline: validate, lay out, bind templates, define.

use std::collections::HashSet;
use std::sync::Arc;

use crate::container::GenerationContainer;
use crate::descriptor::{MemberDescriptor, MemberKind, TypeDescriptor, TypeKind};
use crate::error::SynthesisError;
use crate::implementation::{ImplHandle, Implementation, Slot, Template};
use crate::key::TargetDescription;
use crate::options::{InterceptionStrategy, NamingStrategy};

/// Largest parameter count the typed templates handle. Intercepted members
/// with more parameters are bound to [`Template::Reflective`].
pub const MAX_TEMPLATE_ARITY: usize = 4;

/// Produces implementations for target descriptions.
///
/// A synthesizer writes only into the container it is given: exactly one new
/// implementation on success, nothing on failure. It never consults or
/// updates any cache.
pub trait Synthesizer: Send + Sync {
    /// Builds and defines an implementation for `description` in `container`.
    fn synthesize(
        &self,
        container: &Arc<GenerationContainer>,
        description: &TargetDescription,
    ) -> Result<ImplHandle, SynthesisError>;
}

/// The default synthesizer: binds each member to one of a closed set of
/// [`Template`]s.
///
/// Layout is deterministic: base members in declaration order, then each
/// capability's members in capability order. Equal descriptions always
/// produce equal slot tables.
#[derive(Clone, Copy, Debug, Default)]
pub struct TemplateSynthesizer;

impl TemplateSynthesizer {
    /// Creates a template synthesizer.
    pub fn new() -> Self {
        Self
    }

    /// Runs validation and layout without defining anything.
    ///
    /// The returned implementation carries the suggested name; the container
    /// may rename it on definition.
    pub fn plan(&self, description: &TargetDescription) -> Result<Implementation, SynthesisError> {
        validate(description)?;
        let strategy = &description.options.interception;

        let mut slots = Vec::new();
        for ty in description.types() {
            let from_contract = ty.is_contract();
            for member in &ty.members {
                slots.push(Slot {
                    owner: ty.name.clone(),
                    member: member.clone(),
                    template: bind_template(strategy, from_contract, member),
                });
            }
        }

        Ok(Implementation {
            name: suggested_name(description),
            base: description.base.name.clone(),
            contracts: description
                .capabilities
                .iter()
                .map(|c| c.name.clone())
                .collect(),
            slots,
        })
    }
}

impl Synthesizer for TemplateSynthesizer {
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(container = container.name(), base = %description.base.name)
    )]
    fn synthesize(
        &self,
        container: &Arc<GenerationContainer>,
        description: &TargetDescription,
    ) -> Result<ImplHandle, SynthesisError> {
        let implementation = self.plan(description)?;
        let slots = implementation.slots.len();
        let intercepted = implementation.intercepted_count();
        let handle = container.define(implementation);
        tracing::debug!(
            name = handle.name(),
            slots,
            intercepted,
            "implementation defined"
        );
        Ok(handle)
    }
}

fn validate(description: &TargetDescription) -> Result<(), SynthesisError> {
    let base = &description.base;
    match base.kind {
        TypeKind::SealedClass => {
            return Err(SynthesisError::SealedBase {
                base: base.name.to_string(),
            })
        }
        TypeKind::Class | TypeKind::Contract => {}
    }

    let mut seen = HashSet::new();
    seen.insert(base.name.as_str());
    for capability in &description.capabilities {
        if !capability.is_contract() {
            return Err(SynthesisError::NotAContract {
                name: capability.name.to_string(),
            });
        }
        if !seen.insert(capability.name.as_str()) {
            return Err(SynthesisError::DuplicateCapability {
                name: capability.name.to_string(),
            });
        }
    }

    for ty in description.types() {
        check_members(ty)?;
    }

    if let InterceptionStrategy::Named(names) = &description.options.interception {
        for name in names {
            let declared = description
                .types()
                .any(|ty| ty.members.iter().any(|m| &m.name == name));
            if !declared {
                return Err(SynthesisError::UnknownInterceptedMember {
                    member: name.clone(),
                });
            }
        }
    }

    Ok(())
}

fn check_members(ty: &TypeDescriptor) -> Result<(), SynthesisError> {
    if ty.members.iter().any(|m| m.name.trim().is_empty()) {
        return Err(SynthesisError::EmptyMemberName {
            owner: ty.name.to_string(),
        });
    }
    Ok(())
}

fn bind_template(
    strategy: &InterceptionStrategy,
    from_contract: bool,
    member: &MemberDescriptor,
) -> Template {
    if !strategy.intercepts(from_contract, member) {
        return Template::Forward;
    }
    if member.arity() > MAX_TEMPLATE_ARITY {
        return Template::Reflective;
    }
    match (member.kind, member.arity()) {
        (MemberKind::Method, _) => Template::InterceptMethod,
        (MemberKind::Getter, 0) => Template::InterceptGetter,
        (MemberKind::Setter, 1) => Template::InterceptSetter,
        // Accessors with an unusual shape go through the generic wrapper.
        (MemberKind::Getter | MemberKind::Setter, _) => Template::Reflective,
    }
}

fn suggested_name(description: &TargetDescription) -> String {
    match description.options.naming {
        NamingStrategy::TypeSuffix => format!("{}Proxy", description.base.name.simple_name()),
        NamingStrategy::Fingerprint => format!("Proxy_{}", description.key().fingerprint().short()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::GenerationOptions;
    use proxen_common::Tier;

    fn repository() -> TypeDescriptor {
        TypeDescriptor::class("data::Repository")
            .member(MemberDescriptor::method("save").param("Record"))
            .member(MemberDescriptor::getter("count", "i64"))
            .member(MemberDescriptor::method("id").returns("i64").non_overridable())
    }

    fn disposable() -> TypeDescriptor {
        TypeDescriptor::contract("Disposable").member(MemberDescriptor::method("dispose"))
    }

    fn container() -> Arc<GenerationContainer> {
        Arc::new(GenerationContainer::new("proxies", Tier::Standard, None))
    }

    #[test]
    fn layout_follows_declaration_order() {
        let desc = TargetDescription::new(repository()).with_capability(disposable());
        let plan = TemplateSynthesizer::new().plan(&desc).unwrap();
        let names: Vec<String> = plan.slots.iter().map(Slot::qualified_name).collect();
        assert_eq!(
            names,
            vec![
                "data::Repository.save",
                "data::Repository.count",
                "data::Repository.id",
                "Disposable.dispose",
            ]
        );
        assert_eq!(plan.name, "RepositoryProxy");
        assert_eq!(plan.contracts.len(), 1);
    }

    #[test]
    fn templates_follow_member_shape() {
        let desc = TargetDescription::new(
            repository()
                .member(MemberDescriptor::setter("label", "String"))
                .member(
                    MemberDescriptor::method("bulk")
                        .param("a")
                        .param("b")
                        .param("c")
                        .param("d")
                        .param("e"),
                ),
        );
        let plan = TemplateSynthesizer::new().plan(&desc).unwrap();
        let template = |name: &str| plan.resolve(name).unwrap().template;
        assert_eq!(template("save"), Template::InterceptMethod);
        assert_eq!(template("count"), Template::InterceptGetter);
        assert_eq!(template("id"), Template::Forward);
        assert_eq!(template("label"), Template::InterceptSetter);
        assert_eq!(template("bulk"), Template::Reflective);
    }

    #[test]
    fn contracts_only_forwards_base_members() {
        let desc = TargetDescription::new(repository())
            .with_capability(disposable())
            .with_options(GenerationOptions::intercepting(
                InterceptionStrategy::ContractsOnly,
            ));
        let plan = TemplateSynthesizer::new().plan(&desc).unwrap();
        assert_eq!(plan.intercepted_count(), 1);
        assert_eq!(plan.resolve("dispose").unwrap().template, Template::InterceptMethod);
    }

    #[test]
    fn fingerprint_naming_uses_key() {
        let desc = TargetDescription::new(repository())
            .with_options(GenerationOptions::default().named_by(NamingStrategy::Fingerprint));
        let plan = TemplateSynthesizer::new().plan(&desc).unwrap();
        assert_eq!(plan.name, format!("Proxy_{}", desc.key().fingerprint().short()));
    }

    #[test]
    fn equal_descriptions_give_equal_layouts() {
        let a = TargetDescription::new(repository()).with_capability(disposable());
        let b = TargetDescription::new(repository()).with_capability(disposable());
        let s = TemplateSynthesizer::new();
        assert_eq!(s.plan(&a).unwrap(), s.plan(&b).unwrap());
    }

    #[test]
    fn synthesize_defines_one_entry() {
        let c = container();
        let desc = TargetDescription::new(repository()).with_capability(disposable());
        let handle = TemplateSynthesizer::new().synthesize(&c, &desc).unwrap();
        assert_eq!(c.len(), 1);
        assert!(handle.belongs_to(&c));
        assert!(handle.implementation().implements("Disposable"));
    }

    #[test]
    fn repeated_synthesis_is_renamed_not_replaced() {
        let c = container();
        let desc = TargetDescription::new(repository());
        let s = TemplateSynthesizer::new();
        let first = s.synthesize(&c, &desc).unwrap();
        let second = s.synthesize(&c, &desc).unwrap();
        assert_eq!(first.name(), "RepositoryProxy");
        assert_eq!(second.name(), "RepositoryProxy_1");
        assert_eq!(c.len(), 2);
    }

    #[test]
    fn sealed_base_is_rejected() {
        let c = container();
        let desc = TargetDescription::new(TypeDescriptor::class("Account").sealed());
        let err = TemplateSynthesizer::new().synthesize(&c, &desc).unwrap_err();
        assert_eq!(
            err,
            SynthesisError::SealedBase {
                base: "Account".to_string()
            }
        );
        assert!(c.is_empty());
    }

    #[test]
    fn class_capability_is_rejected() {
        let desc = TargetDescription::new(repository()).with_capability(TypeDescriptor::class("Ledger"));
        assert!(matches!(
            TemplateSynthesizer::new().plan(&desc),
            Err(SynthesisError::NotAContract { .. })
        ));
    }

    #[test]
    fn duplicate_capabilities_are_rejected() {
        let desc = TargetDescription::new(repository())
            .with_capability(disposable())
            .with_capability(disposable());
        assert!(matches!(
            TemplateSynthesizer::new().plan(&desc),
            Err(SynthesisError::DuplicateCapability { .. })
        ));
    }

    #[test]
    fn capability_repeating_base_is_rejected() {
        let desc = TargetDescription::new(disposable()).with_capability(disposable());
        assert!(matches!(
            TemplateSynthesizer::new().plan(&desc),
            Err(SynthesisError::DuplicateCapability { .. })
        ));
    }

    #[test]
    fn empty_member_name_is_rejected() {
        let desc = TargetDescription::new(TypeDescriptor::class("Repo").member(MemberDescriptor::method(" ")));
        assert_eq!(
            TemplateSynthesizer::new().plan(&desc).unwrap_err(),
            SynthesisError::EmptyMemberName {
                owner: "Repo".to_string()
            }
        );
    }

    #[test]
    fn named_strategy_requires_declared_members() {
        let desc = TargetDescription::new(repository()).with_options(GenerationOptions::intercepting(
            InterceptionStrategy::named(["save", "flush"]),
        ));
        assert_eq!(
            TemplateSynthesizer::new().plan(&desc).unwrap_err(),
            SynthesisError::UnknownInterceptedMember {
                member: "flush".to_string()
            }
        );
    }
}
