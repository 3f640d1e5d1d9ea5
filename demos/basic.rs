use std::sync::Arc;

use gatehouse::{
    CatalogBuilder, ComponentNode, HandlerRegistry, Request, Rule, VerificationError, Verifier,
};
use tracing_subscriber::EnvFilter;

fn logged_in(_: &Rule, request: &Request, _: Option<&str>) -> Result<(), VerificationError> {
    match request.get("user") {
        Some(_) => Ok(()),
        None => Err(VerificationError::new("LoggedIn", "user is not logged in")),
    }
}

fn role(rule: &Rule, request: &Request, _: Option<&str>) -> Result<(), VerificationError> {
    if rule.get("value") == request.get("role") {
        Ok(())
    } else {
        Err(VerificationError::new("Role", "insufficient role"))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // Declare rules
    let catalog = Arc::new(
        CatalogBuilder::new()
            .class("ArticlePresenter", |c| {
                c.handler("Article")
                    .rule(Rule::new("LoggedIn"))
                    .method("actionEdit", |m| m.rule(Rule::new("Role").param("value", "editor")))
                    .method("renderDefault", |m| m)
            })
            .build()
            .expect("failed to build catalog"),
    );
    println!("{catalog}");

    let verifier = Verifier::builder()
        .catalog(Arc::clone(&catalog))
        .handler_resolver(
            HandlerRegistry::new()
                .register("LoggedIn", || logged_in)
                .register("Role", || role),
        )
        .build()
        .expect("failed to build verifier");

    let presenter = ComponentNode::root(Arc::clone(
        catalog.class("ArticlePresenter").expect("class declared above"),
    ));

    let requests = [
        Request::new("Article"),
        Request::new("Article").param("user", "ann"),
        Request::new("Article").action("edit").param("user", "ann"),
        Request::new("Article").action("edit").param("user", "ann").param("role", "editor"),
    ];
    for request in &requests {
        match verifier.is_link_verified(request, &presenter) {
            Ok(verified) => println!("{:?} -> {verified}", request.params()),
            Err(err) => println!("{:?} -> error: {err}", request.params()),
        }
    }

    println!("{verifier}");
}
