use std::sync::Arc;
use std::thread;

use gatehouse::{
    Catalog, ClassDescriptor, ComponentNode, HandlerRegistry, Request, Rule, VerificationError,
    Verifier,
};
use tracing_subscriber::EnvFilter;

fn adult(_: &Rule, request: &Request, _: Option<&str>) -> Result<(), VerificationError> {
    match request.get("age") {
        Some(gatehouse::Value::Int(age)) if *age >= 18 => Ok(()),
        _ => Err(VerificationError::new("Adult", "must be 18 or older")),
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let catalog = Arc::new(
        Catalog::from_manifest(
            "class ShopPresenter (handler \"Shop\"):\n    method actionCheckout:\n        rule Adult\n",
        )
        .expect("failed to parse manifest"),
    );
    let verifier = Arc::new(
        Verifier::builder()
            .catalog(catalog)
            .handler_resolver(HandlerRegistry::new().register("Adult", || adult))
            .build()
            .expect("failed to build verifier"),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let v = Arc::clone(&verifier);
            thread::spawn(move || {
                let root = ComponentNode::root(Arc::new(ClassDescriptor::new("ShopPresenter")));
                let request = Request::new("Shop")
                    .action("checkout")
                    .param("age", 16_i64 + i64::from(i));
                let result = v.is_link_verified(&request, &root);
                println!("Thread {i}: {result:?}");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }

    println!("{verifier}");
}
