//! Declarative, rule-based verification of requests before they reach a
//! handler.
//!
//! Rules are declared on handler classes, methods and properties and reach
//! the [`Verifier`] through a [`RuleProvider`]. Each rule names a
//! [`RuleHandler`] that decides whether the request may proceed; handlers are
//! resolved through a [`HandlerResolver`] once per handler id and shared.
//!
//! The verifier offers three ways of asking:
//! - hard checks ([`Verifier::check_reflection`]) that fail on the first denial,
//! - boolean probes ([`Verifier::is_link_verified`] and friends) that turn a
//!   denial into `false`,
//! - property flagging ([`Verifier::verify_properties`]) that records one
//!   outcome per persistent property.

mod address;
mod catalog;
mod error;
mod handler;
pub mod parse;
mod provider;
#[cfg(feature = "binary-cache")]
pub mod serial;
mod types;
mod verifier;

pub use catalog::{
    Catalog, CatalogBuilder, ClassBuilder, ClassDecl, MemberDecl, MemberKind, RulesBuilder,
};
pub use error::GatehouseError;
pub use handler::{HandlerRegistry, HandlerResolver, RuleHandler};
pub use provider::{ClassLocator, RuleProvider};
#[cfg(feature = "binary-cache")]
pub use serial::{DeserializeError, SerializeError};
pub use types::{
    BuildError, CatalogError, ClassDescriptor, Component, ComponentNode, Conventions,
    InvalidArgument, PropertyDescriptor, Request, Rule, Target, Value, VerificationError,
    VerifyError,
};
pub use verifier::{Verifier, VerifierBuilder};
