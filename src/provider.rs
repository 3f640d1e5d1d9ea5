use std::sync::Arc;

use crate::{ClassDescriptor, Rule, Target};

/// Source of declared rules.
///
/// Must be a pure function of the target for the provider's lifetime: equal
/// targets yield equal sequences, in declaration order. Targets without
/// declarations yield an empty sequence.
pub trait RuleProvider: Send + Sync {
    fn rules(&self, target: &Target) -> Vec<Rule>;
}

/// Maps a request's target handler name to the class that implements it.
pub trait ClassLocator: Send + Sync {
    fn class_of(&self, handler: &str) -> Option<Arc<ClassDescriptor>>;
}

impl<T: RuleProvider + ?Sized> RuleProvider for Arc<T> {
    fn rules(&self, target: &Target) -> Vec<Rule> {
        (**self).rules(target)
    }
}

impl<T: ClassLocator + ?Sized> ClassLocator for Arc<T> {
    fn class_of(&self, handler: &str) -> Option<Arc<ClassDescriptor>> {
        (**self).class_of(handler)
    }
}
