use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::{debug, trace};

use crate::address::{action_method, ensure_receiver, probe, signal_method, string_param};
use crate::handler::HandlerCache;
use crate::{
    BuildError, Catalog, ClassLocator, Component, Conventions, HandlerResolver, InvalidArgument,
    Request, Rule, RuleHandler, RuleProvider, Target, VerifyError,
};

/// Builder for a [`Verifier`].
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use gatehouse::{Catalog, HandlerRegistry, Verifier};
///
/// let catalog = Arc::new(Catalog::from_manifest("class HomePresenter (handler \"Home\"):\n").unwrap());
/// let verifier = Verifier::builder()
///     .catalog(catalog)
///     .handler_resolver(HandlerRegistry::new())
///     .build()
///     .unwrap();
/// assert_eq!(verifier.cached_handlers(), 0);
/// ```
#[derive(Default)]
pub struct VerifierBuilder {
    rules: Option<Arc<dyn RuleProvider>>,
    resolver: Option<Arc<dyn HandlerResolver>>,
    classes: Option<Arc<dyn ClassLocator>>,
    conventions: Conventions,
}

impl VerifierBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn rule_provider(mut self, provider: impl RuleProvider + 'static) -> Self {
        self.rules = Some(Arc::new(provider));
        self
    }

    #[must_use]
    pub fn handler_resolver(mut self, resolver: impl HandlerResolver + 'static) -> Self {
        self.resolver = Some(Arc::new(resolver));
        self
    }

    #[must_use]
    pub fn class_locator(mut self, locator: impl ClassLocator + 'static) -> Self {
        self.classes = Some(Arc::new(locator));
        self
    }

    /// Use one catalog as both rule provider and class locator.
    #[must_use]
    pub fn catalog(mut self, catalog: Arc<Catalog>) -> Self {
        self.rules = Some(Arc::clone(&catalog) as Arc<dyn RuleProvider>);
        self.classes = Some(catalog);
        self
    }

    #[must_use]
    pub fn conventions(mut self, conventions: Conventions) -> Self {
        self.conventions = conventions;
        self
    }

    /// # Errors
    ///
    /// Returns [`BuildError::MissingCollaborator`] if the rule provider,
    /// handler resolver or class locator was not supplied.
    pub fn build(self) -> Result<Verifier, BuildError> {
        Ok(Verifier {
            rules: self
                .rules
                .ok_or(BuildError::MissingCollaborator("rule provider"))?,
            resolver: self
                .resolver
                .ok_or(BuildError::MissingCollaborator("handler resolver"))?,
            classes: self
                .classes
                .ok_or(BuildError::MissingCollaborator("class locator"))?,
            conventions: self.conventions,
            handlers: HandlerCache::default(),
            rule_cache: RwLock::new(HashMap::new()),
        })
    }
}

/// Decides whether requests may be dispatched, by running the rules declared
/// on the addressed class, methods and properties through their handlers.
///
/// One verifier is meant to be shared (e.g. behind `Arc`) by every request
/// worker. Rule lists and handler instances are cached for its lifetime.
pub struct Verifier {
    rules: Arc<dyn RuleProvider>,
    resolver: Arc<dyn HandlerResolver>,
    classes: Arc<dyn ClassLocator>,
    conventions: Conventions,
    handlers: HandlerCache,
    rule_cache: RwLock<HashMap<Target, Arc<[Rule]>>>,
}

impl Verifier {
    #[must_use]
    pub fn builder() -> VerifierBuilder {
        VerifierBuilder::new()
    }

    #[must_use]
    pub fn conventions(&self) -> &Conventions {
        &self.conventions
    }

    /// Rules declared on `target`, in declaration order. Fetched from the
    /// provider once per target.
    pub fn rules(&self, target: &Target) -> Arc<[Rule]> {
        if let Some(rules) = self.rule_cache.read().get(target) {
            return Arc::clone(rules);
        }

        let fetched: Arc<[Rule]> = self.rules.rules(target).into();
        trace!(%target, rules = fetched.len(), "caching rule list");
        let mut cache = self.rule_cache.write();
        Arc::clone(cache.entry(target.clone()).or_insert(fetched))
    }

    /// The shared handler for `id`, resolving it on first use.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::UnexpectedType`] if the resolver has no rule
    /// handler for `id`.
    pub fn handler(&self, id: &str) -> Result<Arc<dyn RuleHandler>, VerifyError> {
        self.handlers.get_or_resolve(id, self.resolver.as_ref())
    }

    /// Number of handler instances resolved so far.
    #[must_use]
    pub fn cached_handlers(&self) -> usize {
        self.handlers.len()
    }

    /// Run `rules` in order, stopping at the first denial.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::Denied`] from the first denying handler, or
    /// [`VerifyError::UnexpectedType`] if a handler cannot be resolved.
    pub fn check_rules(
        &self,
        rules: &[Rule],
        request: &Request,
        component: Option<&str>,
    ) -> Result<(), VerifyError> {
        for rule in rules {
            let handler = self.handler(&rule.handler)?;
            trace!(handler = %rule.handler, ?component, "checking rule");
            if let Err(denial) = handler.check_rule(rule, request, component) {
                debug!(
                    handler = %rule.handler,
                    ?component,
                    reason = %denial.reason,
                    "rule denied request"
                );
                return Err(denial.into());
            }
        }
        Ok(())
    }

    /// Hard check of every rule declared on `target` for the root handler.
    ///
    /// # Errors
    ///
    /// Returns [`VerifyError::NotSupported`] when `target` is a render method
    /// with rules, otherwise see [`check_rules`](Self::check_rules).
    pub fn check_reflection(&self, target: &Target, request: &Request) -> Result<(), VerifyError> {
        self.check_reflection_for(target, request, None)
    }

    /// Hard check of `target` on behalf of the component at `component`.
    ///
    /// # Errors
    ///
    /// See [`check_reflection`](Self::check_reflection).
    pub fn check_reflection_for(
        &self,
        target: &Target,
        request: &Request,
        component: Option<&str>,
    ) -> Result<(), VerifyError> {
        let rules = self.rules(target);
        self.ensure_supported(target, &rules)?;
        self.check_rules(&rules, request, component)
    }

    /// Whether a link to `request` would pass verification.
    ///
    /// A signal qualified by a non-empty component path is verified against
    /// `component` alone (see
    /// [`is_component_signal_verified`](Self::is_component_signal_verified)).
    /// Otherwise the target handler's class rules, its action (or render)
    /// method rules and its `handle<Signal>` rules are checked in that order.
    ///
    /// # Errors
    ///
    /// Denials yield `Ok(false)`; any other failure is returned as is.
    pub fn is_link_verified(
        &self,
        request: &Request,
        component: &dyn Component,
    ) -> Result<bool, VerifyError> {
        let signal = string_param(request, &self.conventions.signal_key)?;
        if let Some(signal) = signal {
            if self.conventions.split_signal(signal).is_some() {
                return self.is_component_signal_verified(request, component);
            }
        }
        probe(self.check_request(request, signal))
    }

    /// Whether the component `name` may be created below `parent`, judged by
    /// the rules on the parent's `createComponent<Name>` factory method.
    ///
    /// # Errors
    ///
    /// Denials yield `Ok(false)`; any other failure is returned as is.
    pub fn is_component_verified(
        &self,
        name: &str,
        request: &Request,
        parent: &dyn Component,
    ) -> Result<bool, VerifyError> {
        let class = parent.class();
        let Some(factory) = class.find_method(&self.conventions.factory_method(name)) else {
            return Ok(true);
        };
        let target = Target::method(class.name(), factory);
        probe(self.check_reflection_for(&target, request, parent.component_path()))
    }

    /// Whether the request's signal may be handled by `component`.
    ///
    /// The receiver part of the signal must equal the component's unique id;
    /// then the rules on `handle<Signal>` of the component's class are checked
    /// with the component's path.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidArgument::WrongSignalReceiver`] on a receiver
    /// mismatch. Denials yield `Ok(false)`.
    pub fn is_component_signal_verified(
        &self,
        request: &Request,
        component: &dyn Component,
    ) -> Result<bool, VerifyError> {
        let Some(signal) = string_param(request, &self.conventions.signal_key)? else {
            return Ok(true);
        };
        let (receiver, name) = self.conventions.split_signal(signal).unwrap_or(("", signal));
        ensure_receiver(receiver, component.unique_id())?;

        let class = component.class();
        let Some(method) = signal_method(class, &self.conventions, name) else {
            return Ok(true);
        };
        let target = Target::method(class.name(), method);
        probe(self.check_reflection_for(&target, request, component.component_path()))
    }

    /// Flag every persistent, rule-carrying property of `component` with the
    /// outcome of its rules: `true` when no handler denied it.
    ///
    /// Each property is checked exactly once, in declaration order; a denial
    /// on one property does not stop the others.
    ///
    /// # Errors
    ///
    /// Any failure other than a denial is returned and leaves the remaining
    /// properties unflagged.
    pub fn verify_properties(
        &self,
        request: &Request,
        component: &mut dyn Component,
    ) -> Result<(), VerifyError> {
        let class = component.class();
        let targets: Vec<(String, Target)> = class
            .persistent_properties()
            .map(|p| (p.name.clone(), Target::property(class.name(), &p.name)))
            .filter(|(_, target)| !self.rules(target).is_empty())
            .collect();
        let path = component.component_path().map(str::to_owned);

        for (property, target) in targets {
            let verified = probe(self.check_reflection_for(&target, request, path.as_deref()))?;
            component.set_flag(&property, verified);
        }
        Ok(())
    }

    fn check_request(&self, request: &Request, signal: Option<&str>) -> Result<(), VerifyError> {
        let class = self.classes.class_of(request.handler()).ok_or_else(|| {
            InvalidArgument::UnknownHandler {
                name: request.handler().to_owned(),
            }
        })?;

        self.check_reflection(&Target::class(class.name()), request)?;

        let action = string_param(request, &self.conventions.action_key)?
            .unwrap_or(&self.conventions.default_action);
        if let Some(method) = action_method(&class, &self.conventions, action) {
            self.check_reflection(&Target::method(class.name(), method), request)?;
        }

        if let Some(signal) = signal {
            if let Some(method) = signal_method(&class, &self.conventions, signal) {
                self.check_reflection(&Target::method(class.name(), method), request)?;
            }
        }
        Ok(())
    }

    fn ensure_supported(&self, target: &Target, rules: &[Rule]) -> Result<(), VerifyError> {
        match target.method_name() {
            Some(method) if !rules.is_empty() && self.conventions.is_render_method(method) => {
                Err(VerifyError::NotSupported {
                    target: target.clone(),
                })
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Debug for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Verifier")
            .field("conventions", &self.conventions)
            .field("handlers", &self.handlers)
            .field("cached_targets", &self.rule_cache.read().len())
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Verifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Verifier({} handlers, {} targets cached)",
            self.handlers.len(),
            self.rule_cache.read().len(),
        )
    }
}
