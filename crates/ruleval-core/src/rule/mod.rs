//! Rule descriptors, argument shapes, the rule registry, and the dispatcher.
//!
//! A descriptor such as `each_length:[5,12]` is parsed into a name and a raw
//! argument, resolved against the immutable [`Registry`], turned into typed
//! [`RuleArgs`] according to the rule's [`ArgShape`], and handed to the
//! rule's predicate by the [`Dispatcher`].

pub mod args;
pub mod descriptor;
pub mod dispatch;
pub mod registry;

pub use args::{ArgShape, RuleArgs, SchemaMode};
pub use descriptor::{Descriptor, RawArg};
pub use dispatch::Dispatcher;
pub use registry::{PredicateFn, Registry, RegistryBuilder, Resolved, RuleSpec};

use thiserror::Error;

/// Errors in the descriptor grammar or a rule's arguments.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DescriptorError {
    #[error("empty rule descriptor")]
    Empty,

    #[error("invalid integer '{0}'")]
    InvalidInteger(String),

    #[error("negative integer '{0}' not allowed")]
    NegativeInteger(String),

    #[error("invalid range: {0}")]
    InvalidRange(String),

    #[error("missing argument: {0}")]
    MissingArgument(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid pattern: {0}")]
    InvalidPattern(String),

    #[error("unknown language '{0}'")]
    UnknownLanguage(String),
}

/// Errors a predicate reports instead of a verdict.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredicateError {
    #[error("{0}")]
    BadArguments(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("{0}")]
    Schema(String),

    #[error("{0}")]
    Internal(String),
}

impl PredicateError {
    /// Error class shown in `<rule>: <class>: <message>` explanations.
    pub fn kind(&self) -> &'static str {
        match self {
            PredicateError::BadArguments(_) => "ArgumentError",
            PredicateError::InvalidInput(_) => "InputError",
            PredicateError::Schema(_) => "SchemaError",
            PredicateError::Internal(_) => "InternalError",
        }
    }
}
