//! Implementation synthesis for the Proxen engine.
//!
//! This crate turns a [`TargetDescription`] (a base type, an ordered list of
//! capability contracts, and [`GenerationOptions`]) into an [`Implementation`]:
//! a dispatch table whose slots are bound to a small closed set of
//! [`Template`]s. Implementations live in a [`GenerationContainer`], one per
//! trust [`Tier`](proxen_common::Tier), and are handed out as opaque
//! [`ImplHandle`]s that can be instantiated around a [`Target`].
//!
//! The synthesis pipeline has three phases:
//! 1. **Validation**: reject sealed bases, non-contract capabilities, duplicates
//! 2. **Layout**: base members, then each capability's members, in order
//! 3. **Template binding**: pick a template per slot from the interception strategy
//!
//! # Usage
//!
//! ```ignore
//! use proxen_synth::{GenerationContainer, Synthesizer, TemplateSynthesizer};
//! let container = Arc::new(GenerationContainer::new("proxies", Tier::Standard, None));
//! let handle = TemplateSynthesizer::new().synthesize(&container, &description)?;
//! let proxy = handle.instantiate(target, vec![logging_interceptor]);
//! ```

#![warn(missing_docs)]

pub mod container;
pub mod descriptor;
pub mod dispatch;
pub mod error;
pub mod implementation;
pub mod key;
pub mod options;
pub mod synthesizer;

pub use container::GenerationContainer;
pub use descriptor::{MemberDescriptor, MemberKind, TypeDescriptor, TypeKind, TypeName};
pub use dispatch::{Interceptor, Invocation, ProxyInstance, Target, Value};
pub use error::{InvocationError, SynthesisError};
pub use implementation::{ImplHandle, Implementation, Slot, Template};
pub use key::{SignatureKey, TargetDescription};
pub use options::{GenerationOptions, InterceptionStrategy, NamingStrategy};
pub use synthesizer::{Synthesizer, TemplateSynthesizer, MAX_TEMPLATE_ARITY};
