//! Error types for synthesis and proxy dispatch.

/// Errors raised when a target description cannot be synthesized.
///
/// A failed synthesis never adds anything to the container it was given.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SynthesisError {
    /// The base type is a sealed class and cannot be intercepted.
    #[error("base type '{base}' is sealed")]
    SealedBase {
        /// The sealed base type.
        base: String,
    },

    /// A capability is not a contract.
    #[error("capability '{name}' is not a contract")]
    NotAContract {
        /// The offending capability type.
        name: String,
    },

    /// A capability appears twice, or repeats the base type.
    #[error("capability '{name}' is listed more than once")]
    DuplicateCapability {
        /// The repeated capability type.
        name: String,
    },

    /// A member declared on a type has an empty name.
    #[error("type '{owner}' declares a member with an empty name")]
    EmptyMemberName {
        /// The declaring type.
        owner: String,
    },

    /// A named interception strategy refers to a member no type declares.
    #[error("intercepted member '{member}' is not declared by any type")]
    UnknownInterceptedMember {
        /// The member name from the strategy.
        member: String,
    },
}

/// Errors raised while dispatching a call through a proxy instance.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum InvocationError {
    /// No slot matches the requested member name.
    #[error("'{implementation}' has no member '{member}'")]
    UnknownMember {
        /// The implementation name.
        implementation: String,
        /// The requested member.
        member: String,
    },

    /// The call passed the wrong number of arguments.
    #[error("member '{member}' takes {expected} argument(s), got {actual}")]
    ArityMismatch {
        /// The member being called.
        member: String,
        /// Declared parameter count.
        expected: usize,
        /// Supplied argument count.
        actual: usize,
    },

    /// The wrapped target or an interceptor failed.
    #[error("invocation failed: {0}")]
    Target(String),
}
