use std::collections::BTreeMap;

use winnow::ascii::{multispace1, till_line_ending};
use winnow::combinator::{alt, cut_err, delimited, opt, repeat, separated};
use winnow::error::{ErrMode, ModalResult, StrContext, StrContextValue};
use winnow::prelude::*;
use winnow::token::{any, take_while};

use crate::{ClassDecl, MemberDecl, MemberKind, Rule, Value};

use super::parser::ParsedManifest;

// -- Whitespace & comments --------------------------------------------------

fn ws(input: &mut &str) -> ModalResult<()> {
    let _: () = repeat(
        0..,
        alt((
            take_while(1.., |c: char| c.is_ascii_whitespace()).void(),
            ('#', till_line_ending).void(),
        )),
    )
    .parse_next(input)?;
    Ok(())
}

/// A keyword followed by at least one whitespace character.
fn keyword<'i>(word: &'static str) -> impl FnMut(&mut &'i str) -> ModalResult<()> {
    move |input: &mut &'i str| (word, multispace1).void().parse_next(input)
}

fn expected(what: &'static str) -> StrContext {
    StrContext::Expected(StrContextValue::Description(what))
}

// -- Identifiers ------------------------------------------------------------

/// Class, member and handler names. Namespace separators `.` and `\` are
/// allowed after the first character.
fn ident<'i>(input: &mut &'i str) -> ModalResult<&'i str> {
    (
        take_while(1.., |c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || matches!(c, '_' | '.' | '\\')
        }),
    )
        .take()
        .parse_next(input)
}

// -- Values -----------------------------------------------------------------

fn string_literal(input: &mut &str) -> ModalResult<String> {
    '"'.parse_next(input)?;
    let mut s = String::new();
    loop {
        match any.parse_next(input)? {
            '"' => return Ok(s),
            '\\' => match any.parse_next(input)? {
                '"' => s.push('"'),
                '\\' => s.push('\\'),
                'n' => s.push('\n'),
                't' => s.push('\t'),
                other => {
                    s.push('\\');
                    s.push(other);
                }
            },
            c => s.push(c),
        }
    }
}

fn number(input: &mut &str) -> ModalResult<Value> {
    let text = (
        opt('-'),
        take_while(1.., |c: char| c.is_ascii_digit()),
        opt(('.', take_while(1.., |c: char| c.is_ascii_digit()))),
    )
        .take()
        .parse_next(input)?;
    if text.contains('.') {
        text.parse::<f64>()
            .map(Value::Float)
            .map_err(|_| ErrMode::from_input(input).cut())
    } else {
        text.parse::<i64>()
            .map(Value::Int)
            .map_err(|_| ErrMode::from_input(input).cut())
    }
}

fn value(input: &mut &str) -> ModalResult<Value> {
    ws.parse_next(input)?;
    alt((
        string_literal.map(Value::String),
        "true".value(Value::Bool(true)),
        "false".value(Value::Bool(false)),
        number,
    ))
    .context(expected("value"))
    .parse_next(input)
}

// -- Rules ------------------------------------------------------------------

/// `name: value`, or a bare value stored under `value`.
fn argument(input: &mut &str) -> ModalResult<(String, Value)> {
    ws.parse_next(input)?;
    alt((
        (ident, ws, ':', cut_err(value)).map(|(name, _, _, v)| (name.to_owned(), v)),
        value.map(|v| ("value".to_owned(), v)),
    ))
    .parse_next(input)
}

fn arguments(input: &mut &str) -> ModalResult<BTreeMap<String, Value>> {
    let pairs: Vec<(String, Value)> = delimited(
        (ws, '('),
        separated(0.., argument, (ws, ',')),
        (ws, cut_err(')').context(expected("`)`"))),
    )
    .parse_next(input)?;
    Ok(pairs.into_iter().collect())
}

fn rule_line(input: &mut &str) -> ModalResult<Rule> {
    ws.parse_next(input)?;
    keyword("rule").parse_next(input)?;
    let handler = cut_err(ident)
        .context(expected("rule handler name"))
        .parse_next(input)?;
    let params = opt(arguments).parse_next(input)?.unwrap_or_default();
    Ok(Rule {
        handler: handler.to_owned(),
        params,
    })
}

// -- Members ----------------------------------------------------------------

fn member_kind(input: &mut &str) -> ModalResult<MemberKind> {
    alt((
        keyword("method").value(MemberKind::Method),
        (keyword("persistent"), keyword("property"))
            .value(MemberKind::Property { persistent: true }),
        keyword("property").value(MemberKind::Property { persistent: false }),
    ))
    .parse_next(input)
}

fn member_def(input: &mut &str) -> ModalResult<MemberDecl> {
    ws.parse_next(input)?;
    let kind = member_kind.parse_next(input)?;
    let name = cut_err(ident)
        .context(expected("member name"))
        .parse_next(input)?;

    let rules = if opt((ws, ':')).parse_next(input)?.is_some() {
        repeat(0.., rule_line).parse_next(input)?
    } else {
        Vec::new()
    };

    Ok(MemberDecl {
        kind,
        name: name.to_owned(),
        rules,
    })
}

// -- Classes ----------------------------------------------------------------

fn handler_annotation(input: &mut &str) -> ModalResult<String> {
    delimited(
        (ws, '(', ws, "handler", ws),
        cut_err(string_literal).context(expected("handler name string")),
        (ws, cut_err(')')),
    )
    .parse_next(input)
}

fn class_def(input: &mut &str) -> ModalResult<ClassDecl> {
    ws.parse_next(input)?;
    keyword("class").parse_next(input)?;
    let name = cut_err(ident)
        .context(expected("class name"))
        .parse_next(input)?;
    let handler = opt(handler_annotation).parse_next(input)?;

    ws.parse_next(input)?;
    cut_err(':').context(expected("`:`")).parse_next(input)?;

    let rules: Vec<Rule> = repeat(0.., rule_line).parse_next(input)?;
    let members: Vec<MemberDecl> = repeat(0.., member_def).parse_next(input)?;

    Ok(ClassDecl {
        name: name.to_owned(),
        handler,
        rules,
        members,
    })
}

// -- Top-level parser -------------------------------------------------------

pub fn parse_manifest(input: &mut &str) -> ModalResult<ParsedManifest> {
    let classes: Vec<ClassDecl> = repeat(0.., class_def).parse_next(input)?;
    ws.parse_next(input)?;
    Ok(ParsedManifest { classes })
}
