//! Selector subset for the in-memory tree
//!
//! Supported:
//! - type (`div`, case-insensitive) and universal (`*`)
//! - `#id`, `.class`, `[attr]`, `[attr=value]`, `[attr="value"]`
//! - descendant (whitespace) and child (`>`) combinators
//! - selector groups separated by `,`
//!
//! Everything else is rejected with [`BehaviourError::InvalidSelector`].
//! A selector that is blank matches nothing.

use super::Element;
use crate::error::{BehaviourError, Result};
use std::iter::Peekable;
use std::str::Chars;

/// How a compound relates to the compound before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrCondition {
    name: String,
    value: Option<String>,
}

/// A sequence of simple selectors without combinators, e.g. `tr.row[data-id]`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    universal: bool,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrCondition>,
}

impl Compound {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
    }

    fn matches(&self, el: &Element) -> bool {
        if el.is_document() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if el.tag() != tag.as_str() {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if el.id().as_deref() != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.iter().all(|c| el.has_class(c)) {
            return false;
        }
        self.attrs.iter().all(|cond| match &cond.value {
            None => el.has_attr(&cond.name),
            Some(value) => el.attr(&cond.name).as_deref() == Some(value.as_str()),
        })
    }
}

/// Compounds joined by combinators. The first combinator is unused.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    parts: Vec<(Combinator, Compound)>,
}

impl Complex {
    fn matches(&self, el: &Element) -> bool {
        matches_parts(&self.parts, el)
    }
}

fn matches_parts(parts: &[(Combinator, Compound)], el: &Element) -> bool {
    let Some(((combinator, last), rest)) = parts.split_last() else {
        return false;
    };
    if !last.matches(el) {
        return false;
    }
    if rest.is_empty() {
        return true;
    }
    match combinator {
        Combinator::Child => el.parent().is_some_and(|p| matches_parts(rest, &p)),
        Combinator::Descendant => {
            let mut ancestor = el.parent();
            while let Some(p) = ancestor {
                if matches_parts(rest, &p) {
                    return true;
                }
                ancestor = p.parent();
            }
            false
        }
    }
}

/// A parsed selector group list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    groups: Vec<Complex>,
}

impl Selector {
    /// Parse a selector. Blank input parses to a selector matching nothing.
    pub fn parse(input: &str) -> Result<Self> {
        if input.trim().is_empty() {
            return Ok(Self { groups: Vec::new() });
        }
        let mut chars = input.chars().peekable();
        let mut groups = Vec::new();
        loop {
            groups.push(parse_complex(&mut chars, input)?);
            // parse_complex only stops at a group separator or the end
            if chars.next().is_none() {
                break;
            }
        }
        Ok(Self { groups })
    }

    /// Whether the selector matches nothing by construction.
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn matches(&self, el: &Element) -> bool {
        self.groups.iter().any(|g| g.matches(el))
    }
}

fn invalid(selector: &str, reason: impl Into<String>) -> BehaviourError {
    BehaviourError::invalid_selector(selector, reason)
}

/// Parse one group, stopping before the `,` that ends it. Commas inside
/// attribute values are consumed by [`parse_attr`].
fn parse_complex(chars: &mut Peekable<Chars<'_>>, full: &str) -> Result<Complex> {
    let mut parts: Vec<(Combinator, Compound)> = Vec::new();
    let mut pending: Option<Combinator> = None;

    loop {
        let mut saw_space = false;
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
            saw_space = true;
        }
        if saw_space && !parts.is_empty() && pending.is_none() {
            pending = Some(Combinator::Descendant);
        }

        match chars.peek() {
            None | Some(',') => break,
            Some('>') => {
                if parts.is_empty() || pending == Some(Combinator::Child) {
                    return Err(invalid(full, "unexpected '>'"));
                }
                chars.next();
                pending = Some(Combinator::Child);
            }
            Some(&c) => {
                let compound = parse_compound(chars, full)?;
                if compound.is_empty() {
                    return Err(invalid(full, format!("unexpected character '{}'", c)));
                }
                let combinator = if parts.is_empty() {
                    Combinator::Descendant
                } else {
                    pending
                        .take()
                        .ok_or_else(|| invalid(full, "missing combinator"))?
                };
                parts.push((combinator, compound));
            }
        }
    }

    if parts.is_empty() {
        return Err(invalid(full, "empty selector group"));
    }
    if pending == Some(Combinator::Child) {
        return Err(invalid(full, "dangling combinator"));
    }
    Ok(Complex { parts })
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn parse_ident(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if !is_ident_char(c) {
            break;
        }
        ident.push(c);
        chars.next();
    }
    ident
}

fn parse_compound(chars: &mut Peekable<Chars<'_>>, full: &str) -> Result<Compound> {
    let mut compound = Compound::default();
    let mut first = true;

    while let Some(&c) = chars.peek() {
        match c {
            '*' if first => {
                chars.next();
                compound.universal = true;
            }
            c if first && is_ident_char(c) => {
                compound.tag = Some(parse_ident(chars).to_ascii_lowercase());
            }
            '#' => {
                chars.next();
                let id = parse_ident(chars);
                if id.is_empty() {
                    return Err(invalid(full, "empty id"));
                }
                compound.id = Some(id);
            }
            '.' => {
                chars.next();
                let class = parse_ident(chars);
                if class.is_empty() {
                    return Err(invalid(full, "empty class"));
                }
                compound.classes.push(class);
            }
            '[' => {
                chars.next();
                compound.attrs.push(parse_attr(chars, full)?);
            }
            _ => break,
        }
        first = false;
    }
    Ok(compound)
}

fn parse_attr(chars: &mut Peekable<Chars<'_>>, full: &str) -> Result<AttrCondition> {
    let name = parse_ident(chars);
    if name.is_empty() {
        return Err(invalid(full, "empty attribute name"));
    }
    match chars.next() {
        Some(']') => Ok(AttrCondition { name, value: None }),
        Some('=') => {
            let value = match chars.peek() {
                Some(&quote) if quote == '"' || quote == '\'' => {
                    chars.next();
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some(c) if c == quote => break,
                            Some(c) => value.push(c),
                            None => return Err(invalid(full, "unterminated string")),
                        }
                    }
                    value
                }
                _ => parse_ident(chars),
            };
            match chars.next() {
                Some(']') => Ok(AttrCondition {
                    name,
                    value: Some(value),
                }),
                _ => Err(invalid(full, "expected ']'")),
            }
        }
        _ => Err(invalid(full, "unsupported attribute operator")),
    }
}
