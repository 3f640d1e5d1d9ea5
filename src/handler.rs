use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::{Request, Rule, VerificationError, VerifyError};

/// Evaluates one kind of [`Rule`].
///
/// A single instance is shared by every rule naming its handler id, across
/// all requests and threads, so implementations must be stateless or
/// internally synchronized.
pub trait RuleHandler: Send + Sync {
    /// Check `rule` against `request`. `component` is the unique path of the
    /// component being verified, or `None` for the root handler.
    ///
    /// # Errors
    ///
    /// Returns [`VerificationError`] when the rule denies the request.
    fn check_rule(
        &self,
        rule: &Rule,
        request: &Request,
        component: Option<&str>,
    ) -> Result<(), VerificationError>;
}

impl<F> RuleHandler for F
where
    F: Fn(&Rule, &Request, Option<&str>) -> Result<(), VerificationError> + Send + Sync,
{
    fn check_rule(
        &self,
        rule: &Rule,
        request: &Request,
        component: Option<&str>,
    ) -> Result<(), VerificationError> {
        self(rule, request, component)
    }
}

/// Turns a rule's handler id into a live handler.
///
/// Returning `None` means the id does not name a rule handler; the verifier
/// reports that as [`VerifyError::UnexpectedType`].
///
/// The verifier holds no shared lock while calling [`resolve`](Self::resolve),
/// so a resolver may itself look up other handlers through the same
/// verifier. Looking up the id currently being resolved deadlocks.
pub trait HandlerResolver: Send + Sync {
    fn resolve(&self, handler: &str) -> Option<Arc<dyn RuleHandler>>;
}

impl<T: HandlerResolver + ?Sized> HandlerResolver for Arc<T> {
    fn resolve(&self, handler: &str) -> Option<Arc<dyn RuleHandler>> {
        (**self).resolve(handler)
    }
}

type Factory = Box<dyn Fn() -> Arc<dyn RuleHandler> + Send + Sync>;

/// A [`HandlerResolver`] backed by registered factories.
///
/// Every call to [`resolve`](HandlerResolver::resolve) constructs a new
/// instance; the verifier's cache keeps that to once per id.
#[derive(Default)]
pub struct HandlerRegistry {
    factories: HashMap<String, Factory>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a factory for `handler`, replacing any previous one.
    #[must_use]
    pub fn register<H, F>(mut self, handler: &str, factory: F) -> Self
    where
        H: RuleHandler + 'static,
        F: Fn() -> H + Send + Sync + 'static,
    {
        self.factories.insert(
            handler.to_owned(),
            Box::new(move || Arc::new(factory()) as Arc<dyn RuleHandler>),
        );
        self
    }

    /// Register an already constructed, shared instance.
    #[must_use]
    pub fn instance(mut self, handler: &str, instance: Arc<dyn RuleHandler>) -> Self {
        self.factories
            .insert(handler.to_owned(), Box::new(move || Arc::clone(&instance)));
        self
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

impl HandlerResolver for HandlerRegistry {
    fn resolve(&self, handler: &str) -> Option<Arc<dyn RuleHandler>> {
        self.factories.get(handler).map(|factory| factory())
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("HandlerRegistry").field("handlers", &ids).finish()
    }
}

/// Append-only map from handler id to resolved instance.
///
/// Hits take only a shared read lock. A miss serializes on a gate for its id
/// alone and checks again before resolving, so concurrent first uses of an id
/// resolve it once while other ids and cache hits proceed. No lock on the map
/// is held while the resolver runs.
#[derive(Default)]
pub(crate) struct HandlerCache {
    handlers: RwLock<HashMap<String, Arc<dyn RuleHandler>>>,
    pending: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl HandlerCache {
    pub(crate) fn get_or_resolve(
        &self,
        id: &str,
        resolver: &dyn HandlerResolver,
    ) -> Result<Arc<dyn RuleHandler>, VerifyError> {
        if let Some(handler) = self.cached(id) {
            return Ok(handler);
        }

        let gate = Arc::clone(self.pending.lock().entry(id.to_owned()).or_default());
        let _resolving = gate.lock();
        if let Some(handler) = self.cached(id) {
            return Ok(handler);
        }

        debug!(handler = id, "resolving rule handler");
        let resolved = resolver.resolve(id).map(|handler| {
            let mut handlers = self.handlers.write();
            Arc::clone(handlers.entry(id.to_owned()).or_insert(handler))
        });
        self.pending.lock().remove(id);

        resolved.ok_or_else(|| {
            warn!(handler = id, "resolver produced no rule handler");
            VerifyError::UnexpectedType {
                handler: id.to_owned(),
            }
        })
    }

    fn cached(&self, id: &str) -> Option<Arc<dyn RuleHandler>> {
        self.handlers.read().get(id).map(Arc::clone)
    }

    pub(crate) fn len(&self) -> usize {
        self.handlers.read().len()
    }
}

impl fmt::Debug for HandlerCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let handlers = self.handlers.read();
        let mut ids: Vec<&str> = handlers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        f.debug_struct("HandlerCache").field("handlers", &ids).finish()
    }
}
