//! Expansion of the URI template subset used by generated request builders.
//!
//! Supported expressions are `{var}` (simple), `{+var}` (reserved),
//! `{?a,b}` (form query) and `{&a,b}` (query continuation). A trailing `*`
//! on a variable explodes lists into repeated `name=value` pairs.

use kiota_core::{KiotaError, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Everything but the unreserved characters is encoded.
const UNRESERVED: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Reserved expansion additionally passes the RFC 3986 gen-delims and sub-delims.
const RESERVED: &AsciiSet = &UNRESERVED
    .remove(b':')
    .remove(b'/')
    .remove(b'?')
    .remove(b'#')
    .remove(b'[')
    .remove(b']')
    .remove(b'@')
    .remove(b'!')
    .remove(b'$')
    .remove(b'&')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')')
    .remove(b'*')
    .remove(b'+')
    .remove(b',')
    .remove(b';')
    .remove(b'=');

/// Percent-encodes `value`; `allow_reserved` keeps reserved characters and
/// existing `%XX` triplets intact.
pub(crate) fn encode(value: &str, allow_reserved: bool) -> String {
    if !allow_reserved {
        return utf8_percent_encode(value, UNRESERVED).to_string();
    }
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(idx) = rest.find('%') {
        out.extend(utf8_percent_encode(&rest[..idx], RESERVED));
        let tail = rest[idx..].as_bytes();
        if tail.len() >= 3 && tail[1].is_ascii_hexdigit() && tail[2].is_ascii_hexdigit() {
            out.push_str(&rest[idx..idx + 3]);
            rest = &rest[idx + 3..];
        } else {
            out.push_str("%25");
            rest = &rest[idx + 1..];
        }
    }
    out.extend(utf8_percent_encode(rest, RESERVED));
    out
}

/// A variable's values, already rendered to text.
pub(crate) enum Binding<'a> {
    Single(&'a str),
    List(&'a [String]),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Operator {
    Simple,
    Reserved,
    Query,
    Continuation,
}

impl Operator {
    fn parse(expr: &str) -> (Self, &str) {
        match expr.as_bytes().first() {
            Some(b'+') => (Operator::Reserved, &expr[1..]),
            Some(b'?') => (Operator::Query, &expr[1..]),
            Some(b'&') => (Operator::Continuation, &expr[1..]),
            _ => (Operator::Simple, expr),
        }
    }

    fn allow_reserved(self) -> bool {
        self == Operator::Reserved
    }

    fn is_form(self) -> bool {
        matches!(self, Operator::Query | Operator::Continuation)
    }
}

/// Expands `template`, resolving variable names through `lookup`.
///
/// Undefined variables expand to nothing; form expressions omit them.
pub(crate) fn expand<'a, F>(template: &str, lookup: F) -> Result<String>
where
    F: Fn(&str) -> Option<Binding<'a>>,
{
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after.find('}').ok_or_else(|| {
            KiotaError::InvalidUrl(format!("unterminated expression in template {template}"))
        })?;
        expand_expression(&after[..end], &lookup, &mut out);
        rest = &after[end + 1..];
    }
    out.push_str(rest);
    Ok(out)
}

fn expand_expression<'a, F>(expr: &str, lookup: &F, out: &mut String)
where
    F: Fn(&str) -> Option<Binding<'a>>,
{
    let (op, vars) = Operator::parse(expr);
    let mut first = true;
    for spec in vars.split(',') {
        let (name, explode) = match spec.strip_suffix('*') {
            Some(name) => (name, true),
            None => (spec, false),
        };
        let Some(binding) = lookup(name) else {
            continue;
        };
        if op.is_form() {
            let values: Vec<&str> = match &binding {
                Binding::Single(v) => vec![*v],
                Binding::List(vs) => vs.iter().map(String::as_str).collect(),
            };
            let pairs: Vec<String> = if explode {
                values
                    .iter()
                    .map(|v| format!("{}={}", encode(name, false), encode(v, false)))
                    .collect()
            } else {
                let joined: Vec<String> = values.iter().map(|v| encode(v, false)).collect();
                vec![format!("{}={}", encode(name, false), joined.join(","))]
            };
            for pair in pairs {
                let sep = if first && op == Operator::Query { '?' } else { '&' };
                out.push(sep);
                out.push_str(&pair);
                first = false;
            }
        } else {
            if !first {
                out.push(',');
            }
            match binding {
                Binding::Single(v) => out.push_str(&encode(v, op.allow_reserved())),
                Binding::List(vs) => {
                    let parts: Vec<String> =
                        vs.iter().map(|v| encode(v, op.allow_reserved())).collect();
                    out.push_str(&parts.join(","));
                }
            }
            first = false;
        }
    }
}
