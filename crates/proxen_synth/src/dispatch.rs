//! Runtime dispatch through a synthesized implementation.
//!
//! A [`ProxyInstance`] pairs an implementation with a [`Target`] and an
//! interceptor chain. Each call resolves a slot, then either forwards
//! straight to the target or builds an [`Invocation`] that walks the chain.

use std::fmt;
use std::sync::Arc;

use crate::descriptor::TypeName;
use crate::error::InvocationError;
use crate::implementation::{ImplHandle, Slot, Template};

/// A dynamically typed argument or return value.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    /// No value.
    #[default]
    Unit,
    /// A boolean.
    Bool(bool),
    /// A signed integer.
    Int(i64),
    /// A float.
    Float(f64),
    /// A string.
    Str(String),
    /// A list of values.
    List(Vec<Value>),
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

/// The object a proxy wraps. Receives calls that reach the end of the chain.
pub trait Target: Send + Sync {
    /// Executes `member` with `args`.
    fn invoke(&self, member: &str, args: &[Value]) -> Result<Value, InvocationError>;
}

impl<F> Target for F
where
    F: Fn(&str, &[Value]) -> Result<Value, InvocationError> + Send + Sync,
{
    fn invoke(&self, member: &str, args: &[Value]) -> Result<Value, InvocationError> {
        self(member, args)
    }
}

/// A link in the interception chain.
///
/// Implementations call [`Invocation::proceed`] to pass control onward, or
/// skip it to short-circuit the call and supply their own return value.
pub trait Interceptor: Send + Sync {
    /// Handles one intercepted call.
    fn intercept(&self, invocation: &mut Invocation<'_>) -> Result<(), InvocationError>;
}

impl<F> Interceptor for F
where
    F: Fn(&mut Invocation<'_>) -> Result<(), InvocationError> + Send + Sync,
{
    fn intercept(&self, invocation: &mut Invocation<'_>) -> Result<(), InvocationError> {
        self(invocation)
    }
}

/// One in-flight intercepted call.
pub struct Invocation<'a> {
    slot: &'a Slot,
    args: Vec<Value>,
    return_value: Value,
    target: &'a dyn Target,
    interceptors: &'a [Arc<dyn Interceptor>],
    position: usize,
}

impl<'a> Invocation<'a> {
    fn new(
        slot: &'a Slot,
        args: Vec<Value>,
        target: &'a dyn Target,
        interceptors: &'a [Arc<dyn Interceptor>],
    ) -> Self {
        Self {
            slot,
            args,
            return_value: Value::Unit,
            target,
            interceptors,
            position: 0,
        }
    }

    /// The member being called.
    pub fn member(&self) -> &str {
        &self.slot.member.name
    }

    /// The type declaring the member.
    pub fn owner(&self) -> &TypeName {
        &self.slot.owner
    }

    /// The template the slot is bound to.
    pub fn template(&self) -> Template {
        self.slot.template
    }

    /// The call's arguments.
    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Mutable access to the arguments, for interceptors that rewrite them.
    pub fn args_mut(&mut self) -> &mut Vec<Value> {
        &mut self.args
    }

    /// The current return value. [`Value::Unit`] until set.
    pub fn return_value(&self) -> &Value {
        &self.return_value
    }

    /// Overrides the return value.
    pub fn set_return_value(&mut self, value: Value) {
        self.return_value = value;
    }

    /// Passes control to the next interceptor, or to the target once the
    /// chain is exhausted.
    pub fn proceed(&mut self) -> Result<(), InvocationError> {
        let interceptors = self.interceptors;
        if let Some(next) = interceptors.get(self.position) {
            self.position += 1;
            let result = next.intercept(self);
            self.position -= 1;
            return result;
        }

        if self.slot.template == Template::Reflective {
            check_arity(self.slot, self.args.len())?;
        }
        self.return_value = self.target.invoke(&self.slot.member.name, &self.args)?;
        Ok(())
    }

    fn into_return_value(self) -> Value {
        self.return_value
    }
}

fn check_arity(slot: &Slot, actual: usize) -> Result<(), InvocationError> {
    let expected = slot.member.arity();
    if expected != actual {
        return Err(InvocationError::ArityMismatch {
            member: slot.member.name.clone(),
            expected,
            actual,
        });
    }
    Ok(())
}

/// An instantiated proxy: implementation + target + interceptor chain.
pub struct ProxyInstance {
    handle: ImplHandle,
    target: Arc<dyn Target>,
    interceptors: Vec<Arc<dyn Interceptor>>,
}

impl ProxyInstance {
    pub(crate) fn new(
        handle: ImplHandle,
        target: Arc<dyn Target>,
        interceptors: Vec<Arc<dyn Interceptor>>,
    ) -> Self {
        Self {
            handle,
            target,
            interceptors,
        }
    }

    /// The implementation this instance was created from.
    pub fn handle(&self) -> &ImplHandle {
        &self.handle
    }

    /// Returns `true` if the instance is, or honors, `ty`.
    pub fn implements(&self, ty: &str) -> bool {
        self.handle.implementation().implements(ty)
    }

    /// Calls `member` with `args`.
    ///
    /// `member` may be a plain name or `Owner.member`; see
    /// [`Implementation::resolve`](crate::Implementation::resolve).
    pub fn invoke(&self, member: &str, args: Vec<Value>) -> Result<Value, InvocationError> {
        let implementation = self.handle.implementation();
        let slot =
            implementation
                .resolve(member)
                .ok_or_else(|| InvocationError::UnknownMember {
                    implementation: implementation.name.clone(),
                    member: member.to_string(),
                })?;

        match slot.template {
            Template::Forward => {
                check_arity(slot, args.len())?;
                self.target.invoke(&slot.member.name, &args)
            }
            Template::Reflective => self.run_chain(slot, args),
            Template::InterceptMethod | Template::InterceptGetter | Template::InterceptSetter => {
                check_arity(slot, args.len())?;
                self.run_chain(slot, args)
            }
        }
    }

    fn run_chain(&self, slot: &Slot, args: Vec<Value>) -> Result<Value, InvocationError> {
        let mut invocation = Invocation::new(slot, args, &*self.target, &self.interceptors);
        invocation.proceed()?;
        Ok(invocation.into_return_value())
    }
}

impl fmt::Debug for ProxyInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyInstance")
            .field("handle", &self.handle)
            .field("interceptors", &self.interceptors.len())
            .finish()
    }
}
