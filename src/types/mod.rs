mod class;
mod component;
mod conventions;
mod error;
mod request;
mod rule;
mod value;

pub use class::{ClassDescriptor, PropertyDescriptor};
pub use component::{Component, ComponentNode};
pub use conventions::Conventions;
pub use error::{BuildError, CatalogError, InvalidArgument, VerificationError, VerifyError};
pub use request::Request;
pub use rule::{Rule, Target};
pub use value::Value;
