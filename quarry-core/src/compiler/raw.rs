//! Raw fragment splicing and placeholder repositioning.
//!
//! Raw fragments use `?` for positional bindings and `\?` to escape a
//! literal question mark; `:name` marks a named binding. Both are rewritten
//! into the active dialect's placeholder style with a running counter. If
//! positional bindings run out, the marker is left in place.

use super::Compiler;
use crate::ast::{Raw, RawBindings, Value};

pub(crate) fn splice(c: &mut Compiler, raw: &Raw) -> String {
    let (mut positional, named): (std::vec::IntoIter<Value>, &[(String, Value)]) =
        match &raw.bindings {
            RawBindings::None => (Vec::new().into_iter(), &[]),
            RawBindings::Positional(values) => (values.clone().into_iter(), &[]),
            RawBindings::Named(pairs) => (Vec::new().into_iter(), pairs.as_slice()),
        };

    let mut out = String::with_capacity(raw.sql.len());
    let mut chars = raw.sql.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' if chars.peek() == Some(&'?') => {
                chars.next();
                out.push('?');
            }
            '?' => match positional.next() {
                Some(value) => out.push_str(&c.push_binding(value)),
                None => out.push('?'),
            },
            ':' => {
                if chars.peek() == Some(&':') {
                    // A `::` cast, not a named binding.
                    chars.next();
                    out.push_str("::");
                    continue;
                }
                let mut name = String::new();
                while let Some(&next) = chars.peek() {
                    if next.is_alphanumeric() || next == '_' {
                        name.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                if name.is_empty() {
                    out.push(':');
                    continue;
                }
                match named.iter().find(|(k, _)| *k == name) {
                    Some((_, value)) => out.push_str(&c.push_binding(value.clone())),
                    None => {
                        out.push(':');
                        out.push_str(&name);
                    }
                }
            }
            other => out.push(other),
        }
    }
    out
}
