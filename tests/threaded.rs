use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier, OnceLock, Weak};
use std::thread;

use gatehouse::{
    Catalog, CatalogBuilder, ClassDescriptor, ComponentNode, HandlerRegistry, HandlerResolver,
    Request, Rule, RuleHandler, VerificationError, Verifier,
};

fn role_is(rule: &Rule, request: &Request, _: Option<&str>) -> Result<(), VerificationError> {
    if rule.get("value") == request.get("role") {
        Ok(())
    } else {
        Err(VerificationError::new("Role", "role mismatch"))
    }
}

fn logged_in_user(_: &Rule, request: &Request, _: Option<&str>) -> Result<(), VerificationError> {
    if request.get("user").is_some() {
        Ok(())
    } else {
        Err(VerificationError::new("LoggedIn", "anonymous"))
    }
}

fn catalog() -> Arc<Catalog> {
    Arc::new(
        CatalogBuilder::new()
            .class("ArticlePresenter", |c| {
                c.handler("Article")
                    .rule(Rule::new("LoggedIn"))
                    .method("actionEdit", |m| m.rule(Rule::new("Role").param("value", "editor")))
                    .method("actionDelete", |m| m.rule(Rule::new("Role").param("value", "admin")))
            })
            .build()
            .unwrap(),
    )
}

fn verifier(constructed: &Arc<AtomicUsize>) -> Arc<Verifier> {
    let logged_in = Arc::clone(constructed);
    let role = Arc::clone(constructed);
    Arc::new(
        Verifier::builder()
            .catalog(catalog())
            .handler_resolver(
                HandlerRegistry::new()
                    .register("LoggedIn", move || {
                        logged_in.fetch_add(1, Ordering::SeqCst);
                        logged_in_user
                    })
                    .register("Role", move || {
                        role.fetch_add(1, Ordering::SeqCst);
                        role_is
                    }),
            )
            .build()
            .unwrap(),
    )
}

#[test]
fn verify_across_threads() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let verifier = verifier(&constructed);

    let requests = vec![
        (Request::new("Article").action("edit").param("user", "ann").param("role", "editor"), true),
        (Request::new("Article").action("delete").param("user", "ann").param("role", "editor"), false),
        (Request::new("Article").action("edit").param("role", "editor"), false),
        (Request::new("Article").action("delete").param("user", "bob").param("role", "admin"), true),
    ];

    let mut handles = vec![];
    for (request, expected) in requests {
        let v = Arc::clone(&verifier);
        handles.push(thread::spawn(move || {
            let root = ComponentNode::root(Arc::new(ClassDescriptor::new("ArticlePresenter")));
            (v.is_link_verified(&request, &root).unwrap(), expected)
        }));
    }

    for handle in handles {
        let (actual, expected) = handle.join().unwrap();
        assert_eq!(actual, expected);
    }
}

#[test]
fn concurrent_first_use_resolves_each_handler_once() {
    let constructed = Arc::new(AtomicUsize::new(0));
    let verifier = verifier(&constructed);
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|i| {
            let v = Arc::clone(&verifier);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let action = if i % 2 == 0 { "edit" } else { "delete" };
                let request = Request::new("Article")
                    .action(action)
                    .param("user", "ann")
                    .param("role", "editor");
                let root = ComponentNode::root(Arc::new(ClassDescriptor::new("ArticlePresenter")));
                barrier.wait();
                for _ in 0..100 {
                    v.is_link_verified(&request, &root).unwrap();
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(constructed.load(Ordering::SeqCst), 2);
    assert_eq!(verifier.cached_handlers(), 2);
}

/// Builds `Editor` on top of the verifier's own `LoggedIn` instance.
struct Composing {
    verifier: OnceLock<Weak<Verifier>>,
    base: HandlerRegistry,
}

impl HandlerResolver for Composing {
    fn resolve(&self, handler: &str) -> Option<Arc<dyn RuleHandler>> {
        if handler != "Editor" {
            return self.base.resolve(handler);
        }
        let verifier = self.verifier.get()?.upgrade()?;
        let logged_in = verifier.handler("LoggedIn").ok()?;
        let editor = move |rule: &Rule,
                           request: &Request,
                           component: Option<&str>|
              -> Result<(), VerificationError> {
            logged_in.check_rule(rule, request, component)?;
            role_is(&Rule::new("Role").param("value", "editor"), request, component)
        };
        Some(Arc::new(editor) as Arc<dyn RuleHandler>)
    }
}

#[test]
fn resolver_can_reuse_verifier_handlers() {
    let resolver = Arc::new(Composing {
        verifier: OnceLock::new(),
        base: HandlerRegistry::new().register("LoggedIn", || logged_in_user),
    });
    let catalog = Arc::new(
        CatalogBuilder::new()
            .class("ArticlePresenter", |c| c.handler("Article").rule(Rule::new("Editor")))
            .build()
            .unwrap(),
    );
    let verifier = Arc::new(
        Verifier::builder()
            .catalog(catalog)
            .handler_resolver(Arc::clone(&resolver))
            .build()
            .unwrap(),
    );
    resolver.verifier.set(Arc::downgrade(&verifier)).unwrap();

    let root = ComponentNode::root(Arc::new(ClassDescriptor::new("ArticlePresenter")));
    let editor = Request::new("Article").param("user", "ann").param("role", "editor");
    let anonymous = Request::new("Article").param("role", "editor");
    assert!(verifier.is_link_verified(&editor, &root).unwrap());
    assert!(!verifier.is_link_verified(&anonymous, &root).unwrap());
    assert_eq!(verifier.cached_handlers(), 2);
}

#[test]
fn verifier_is_send_and_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Verifier>();
    assert_send_sync::<Catalog>();
    assert_send_sync::<HandlerRegistry>();
}
