use std::sync::Arc;

use gatehouse::{
    Catalog, ComponentNode, HandlerRegistry, Request, Rule, Value, VerificationError, Verifier,
};
use tracing_subscriber::EnvFilter;

const MANIFEST: &str = r#"
class ArticlePresenter (handler "Article"):
    rule LoggedIn
    method actionEdit:
        rule Allowed(resource: "article", privilege: "edit")
    method createComponentPoll:
        rule Allowed(resource: "poll", privilege: "view")

class PollControl:
    method handleVote:
        rule Allowed(resource: "poll", privilege: "vote")
    persistent property results:
        rule Allowed(resource: "poll", privilege: "results")
"#;

fn logged_in(_: &Rule, request: &Request, _: Option<&str>) -> Result<(), VerificationError> {
    request
        .get("user")
        .map(|_| ())
        .ok_or_else(|| VerificationError::new("LoggedIn", "user is not logged in"))
}

/// Grants come from the request as `resource:privilege` pairs.
fn allowed(
    rule: &Rule,
    request: &Request,
    component: Option<&str>,
) -> Result<(), VerificationError> {
    let resource = rule.get("resource").and_then(Value::as_str).unwrap_or_default();
    let privilege = rule.get("privilege").and_then(Value::as_str).unwrap_or_default();
    let wanted = format!("{resource}:{privilege}");
    let grants = request.get("grants").and_then(Value::as_str).unwrap_or_default();
    if grants.split(',').any(|g| g == wanted) {
        Ok(())
    } else {
        Err(VerificationError::new(
            "Allowed",
            format!("'{wanted}' not granted (component {component:?})"),
        ))
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let catalog = match Catalog::from_manifest(MANIFEST) {
        Ok(catalog) => Arc::new(catalog),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };
    println!("{catalog}");

    let verifier = Verifier::builder()
        .catalog(Arc::clone(&catalog))
        .handler_resolver(
            HandlerRegistry::new()
                .register("LoggedIn", || logged_in)
                .register("Allowed", || allowed),
        )
        .build()
        .expect("failed to build verifier");

    let presenter = ComponentNode::root(Arc::clone(
        catalog.class("ArticlePresenter").expect("declared in manifest"),
    ));
    let mut poll = presenter.child(
        "poll",
        Arc::clone(catalog.class("PollControl").expect("declared in manifest")),
    );

    let request = Request::new("Article")
        .signal("poll-vote")
        .param("user", "ann")
        .param("grants", "poll:view,poll:vote");

    println!(
        "create poll: {:?}",
        verifier.is_component_verified("poll", &request, &presenter)
    );
    println!("link: {:?}", verifier.is_link_verified(&request, &poll));

    match verifier.verify_properties(&request, &mut poll) {
        Ok(()) => println!("property flags: {:?}", poll.flags()),
        Err(err) => println!("property check failed: {err}"),
    }

    let misdirected = request.clone().signal("menu-vote");
    match verifier.is_component_signal_verified(&misdirected, &poll) {
        Ok(verified) => println!("misdirected signal: {verified}"),
        Err(err) => println!("misdirected signal: {err}"),
    }
}
