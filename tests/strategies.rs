use std::sync::Arc;

use gatehouse::{
    ClassDecl, MemberDecl, MemberKind, Request, Rule, RuleHandler, Value, VerificationError,
};
use parking_lot::Mutex;
use proptest::prelude::*;

const HANDLERS: &[&str] = &["LoggedIn", "Allowed", "Enabled", "Fresh", "Owner"];
const SEGMENTS: &[&str] = &["poll", "sidebar", "grid", "menu", "form", "list2"];
const SIGNALS: &[&str] = &["vote", "reset", "delete", "sort", "page"];

/// A rule handler that passes or denies according to the rule's `pass`
/// parameter and records the `seq` of every rule it sees.
#[derive(Default)]
pub struct Scripted {
    seen: Mutex<Vec<i64>>,
}

impl Scripted {
    pub fn seen(&self) -> Vec<i64> {
        self.seen.lock().clone()
    }
}

impl RuleHandler for Scripted {
    fn check_rule(
        &self,
        rule: &Rule,
        _: &Request,
        _: Option<&str>,
    ) -> Result<(), VerificationError> {
        if let Some(Value::Int(seq)) = rule.get("seq") {
            self.seen.lock().push(*seq);
        }
        match rule.get("pass") {
            Some(Value::Bool(false)) => {
                Err(VerificationError::new(rule.handler.clone(), "scripted"))
            }
            _ => Ok(()),
        }
    }
}

/// Shared instance as a trait object.
pub fn scripted() -> (Arc<Scripted>, Arc<dyn RuleHandler>) {
    let handler = Arc::new(Scripted::default());
    let shared = Arc::clone(&handler) as Arc<dyn RuleHandler>;
    (handler, shared)
}

/// Pass/deny outcomes of a rule list, 0..=12 long.
pub fn arb_outcomes() -> impl Strategy<Value = Vec<bool>> {
    prop::collection::vec(prop::bool::weighted(0.8), 0..=12)
}

/// Rules numbered by position with the given outcomes, all for `handler`.
#[allow(clippy::cast_possible_wrap)]
pub fn scripted_rules(handler: &str, outcomes: &[bool]) -> Vec<Rule> {
    outcomes
        .iter()
        .enumerate()
        .map(|(i, &pass)| Rule::new(handler).param("seq", i as i64).param("pass", pass))
        .collect()
}

/// Handler ids drawn from a small pool, so repeats are common.
pub fn arb_handler_ids() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(
        prop::sample::select(HANDLERS).prop_map(str::to_owned),
        1..=20,
    )
}

/// Component path segments, 1..=4 deep.
pub fn arb_path() -> impl Strategy<Value = Vec<&'static str>> {
    prop::collection::vec(prop::sample::select(SEGMENTS), 1..=4)
}

pub fn arb_signal() -> impl Strategy<Value = &'static str> {
    prop::sample::select(SIGNALS)
}

fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        (-1000_i64..1000).prop_map(Value::Int),
        any::<bool>().prop_map(Value::Bool),
        "[a-z$ ]{0,12}".prop_map(Value::String),
    ]
}

fn arb_rule() -> impl Strategy<Value = Rule> {
    (
        prop::sample::select(HANDLERS),
        prop::collection::btree_map("[a-z]{1,8}", arb_value(), 0..=3),
    )
        .prop_map(|(handler, params)| Rule {
            handler: handler.to_owned(),
            params,
        })
}

fn arb_member(index: usize) -> impl Strategy<Value = MemberDecl> {
    (
        prop_oneof![
            Just(MemberKind::Method),
            any::<bool>().prop_map(|persistent| MemberKind::Property { persistent }),
        ],
        prop::collection::vec(arb_rule(), 0..=3),
    )
        .prop_map(move |(kind, rules)| MemberDecl {
            kind,
            name: format!("member{index}"),
            rules,
        })
}

/// A class declaration with unique member names.
pub fn arb_class(index: usize) -> impl Strategy<Value = ClassDecl> {
    (
        any::<bool>(),
        prop::collection::vec(arb_rule(), 0..=3),
        (0_usize..=4).prop_flat_map(|n| {
            (0..n).map(arb_member).collect::<Vec<_>>()
        }),
    )
        .prop_map(move |(has_handler, rules, members)| ClassDecl {
            name: format!("Class{index}"),
            handler: has_handler.then(|| format!("Handler{index}")),
            rules,
            members,
        })
}

/// 1..=4 class declarations with unique names.
pub fn arb_declarations() -> impl Strategy<Value = Vec<ClassDecl>> {
    (1_usize..=4).prop_flat_map(|n| (0..n).map(arb_class).collect::<Vec<_>>())
}

fn render_value(value: &Value) -> String {
    match value {
        Value::String(s) => format!("{s:?}"),
        other => other.to_string(),
    }
}

fn render_rule(rule: &Rule, indent: &str, out: &mut String) {
    out.push_str(indent);
    out.push_str("rule ");
    out.push_str(&rule.handler);
    if !rule.params.is_empty() {
        let args: Vec<String> = rule
            .params
            .iter()
            .map(|(k, v)| format!("{k}: {}", render_value(v)))
            .collect();
        out.push('(');
        out.push_str(&args.join(", "));
        out.push(')');
    }
    out.push('\n');
}

/// Write declarations in manifest syntax.
pub fn render_manifest(classes: &[ClassDecl]) -> String {
    let mut out = String::new();
    for class in classes {
        out.push_str("class ");
        out.push_str(&class.name);
        if let Some(handler) = &class.handler {
            out.push_str(&format!(" (handler {handler:?})"));
        }
        out.push_str(":\n");
        for rule in &class.rules {
            render_rule(rule, "    ", &mut out);
        }
        for member in &class.members {
            let kind = match member.kind {
                MemberKind::Method => "method",
                MemberKind::Property { persistent: true } => "persistent property",
                MemberKind::Property { persistent: false } => "property",
            };
            out.push_str(&format!("    {kind} {}", member.name));
            if member.rules.is_empty() {
                out.push('\n');
            } else {
                out.push_str(":\n");
                for rule in &member.rules {
                    render_rule(rule, "        ", &mut out);
                }
            }
        }
    }
    out
}
