use std::collections::BTreeMap;
use std::fmt;

use super::value::Value;

/// A declared access rule: names the handler type that evaluates it and
/// carries parameters only that handler interprets.
///
/// Rules are created by a [`RuleProvider`](crate::RuleProvider), either from a
/// [`Catalog`](crate::Catalog) or any other registration mechanism. Their order
/// within a target is declaration order and is preserved end to end.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rule {
    pub handler: String,
    pub params: BTreeMap<String, Value>,
}

impl Rule {
    #[must_use]
    pub fn new(handler: impl Into<String>) -> Self {
        Self {
            handler: handler.into(),
            params: BTreeMap::new(),
        }
    }

    /// Attach a named parameter.
    #[must_use]
    pub fn param(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.params.insert(name.to_owned(), value.into());
        self
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.params.get(name)
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.handler)?;
        if !self.params.is_empty() {
            let params: Vec<String> = self
                .params
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect();
            write!(f, "({})", params.join(", "))?;
        }
        Ok(())
    }
}

/// Identifies the class, method, or property whose rules are queried.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Target {
    Class { class: String },
    Method { class: String, method: String },
    Property { class: String, property: String },
}

impl Target {
    #[must_use]
    pub fn class(class: impl Into<String>) -> Self {
        Target::Class {
            class: class.into(),
        }
    }

    #[must_use]
    pub fn method(class: impl Into<String>, method: impl Into<String>) -> Self {
        Target::Method {
            class: class.into(),
            method: method.into(),
        }
    }

    #[must_use]
    pub fn property(class: impl Into<String>, property: impl Into<String>) -> Self {
        Target::Property {
            class: class.into(),
            property: property.into(),
        }
    }

    /// The declaring class of this target.
    #[must_use]
    pub fn class_name(&self) -> &str {
        match self {
            Target::Class { class }
            | Target::Method { class, .. }
            | Target::Property { class, .. } => class,
        }
    }

    /// The method name, if this is a method target.
    #[must_use]
    pub fn method_name(&self) -> Option<&str> {
        match self {
            Target::Method { method, .. } => Some(method),
            _ => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Class { class } => write!(f, "{class}"),
            Target::Method { class, method } => write!(f, "{class}::{method}"),
            Target::Property { class, property } => write!(f, "{class}::${property}"),
        }
    }
}
