//! Selector grammar and structural matching.
//!
//! Supported forms: `tag`, `*`, `#id`, `.class`, `[attr]`, `[attr=value]` (value optionally
//! quoted), compounds of those (`rect#a.b[x="1"]`), descendant (`a b`) and child (`a > b`)
//! combinators, and comma-separated alternatives.

use crate::foundation::core::NodeIdx;
use crate::foundation::error::{MarionetteError, MarionetteResult};
use crate::scene::element::{CLASS_ATTRIBUTE, Element, ElementArena, attribute_as_string};
use smallvec::SmallVec;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Id(String),
    Class(String),
    AttrExists(String),
    AttrEq(String, String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    conditions: SmallVec<[Condition; 2]>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Complex {
    // `steps[0].0` is unused; `steps[k].0` relates step k to step k-1.
    steps: SmallVec<[(Combinator, Compound); 4]>,
}

/// Parsed selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    alternatives: SmallVec<[Complex; 1]>,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(src: &str) -> MarionetteResult<Self> {
        let mut alternatives = SmallVec::new();
        for part in split_top_level(src) {
            let part = part.trim();
            if part.is_empty() {
                return Err(MarionetteError::selector(format!(
                    "empty alternative in \"{src}\""
                )));
            }
            alternatives.push(Parser::new(part).complex()?);
        }
        if alternatives.is_empty() {
            return Err(MarionetteError::selector("empty selector"));
        }
        Ok(Self { alternatives })
    }

    /// Return `true` if the element at `idx` matches.
    pub fn matches(&self, arena: &ElementArena, idx: NodeIdx) -> bool {
        self.alternatives.iter().any(|c| {
            c.steps
                .len()
                .checked_sub(1)
                .is_some_and(|last| c.match_step(arena, last, idx))
        })
    }

    /// Matching elements of `flat`, in flat-tree order.
    pub fn query(&self, arena: &ElementArena, flat: &[NodeIdx]) -> Vec<NodeIdx> {
        flat.iter()
            .copied()
            .filter(|&i| self.matches(arena, i))
            .collect()
    }
}

impl Complex {
    fn match_step(&self, arena: &ElementArena, k: usize, idx: NodeIdx) -> bool {
        let Some(e) = arena.get(idx) else {
            return false;
        };
        if !e.is_matchable() || !self.steps[k].1.matches(e) {
            return false;
        }
        if k == 0 {
            return true;
        }
        match self.steps[k].0 {
            Combinator::Child => e.parent.is_some_and(|p| self.match_step(arena, k - 1, p)),
            Combinator::Descendant => {
                let mut cur = e.parent;
                while let Some(p) = cur {
                    if self.match_step(arena, k - 1, p) {
                        return true;
                    }
                    cur = arena.get(p).and_then(|a| a.parent);
                }
                false
            }
        }
    }
}

impl Compound {
    fn matches(&self, e: &Element) -> bool {
        if let Some(tag) = &self.tag {
            if e.tag() != Some(tag.as_str()) {
                return false;
            }
        }
        self.conditions.iter().all(|c| match c {
            Condition::Id(id) => e.identity().as_deref() == Some(id.as_str()),
            Condition::Class(class) => e
                .attributes
                .get(CLASS_ATTRIBUTE)
                .and_then(|v| v.as_str())
                .is_some_and(|s| s.split_whitespace().any(|c| c == class)),
            Condition::AttrExists(name) => e.attributes.contains_key(name),
            Condition::AttrEq(name, want) => e
                .attributes
                .get(name)
                .and_then(attribute_as_string)
                .is_some_and(|have| have == *want),
        })
    }
}

fn split_top_level(src: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (i, ch) in src.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(ch),
            (None, '[') => depth += 1,
            (None, ']') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&src[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&src[start..]);
    parts
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '-' | '_' | ':')
}

struct Parser<'a> {
    src: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Parser<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            src,
            chars: src.char_indices().peekable(),
        }
    }

    fn err(&self, msg: &str) -> MarionetteError {
        MarionetteError::selector(format!("{msg} in \"{}\"", self.src))
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_ws(&mut self) -> bool {
        let mut skipped = false;
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
            skipped = true;
        }
        skipped
    }

    fn ident(&mut self) -> MarionetteResult<String> {
        let mut out = String::new();
        while let Some(c) = self.peek().filter(|&c| is_ident_char(c)) {
            out.push(c);
            self.chars.next();
        }
        if out.is_empty() {
            return Err(self.err("expected identifier"));
        }
        Ok(out)
    }

    fn complex(&mut self) -> MarionetteResult<Complex> {
        let mut steps = SmallVec::new();
        self.skip_ws();
        steps.push((Combinator::Descendant, self.compound()?));
        loop {
            let had_ws = self.skip_ws();
            let comb = match self.peek() {
                None => break,
                Some('>') => {
                    self.chars.next();
                    self.skip_ws();
                    Combinator::Child
                }
                Some(_) if had_ws => Combinator::Descendant,
                Some(c) => return Err(self.err(&format!("unexpected '{c}'"))),
            };
            steps.push((comb, self.compound()?));
        }
        Ok(Complex { steps })
    }

    fn compound(&mut self) -> MarionetteResult<Compound> {
        let mut out = Compound::default();
        let mut any = false;
        match self.peek() {
            Some('*') => {
                self.chars.next();
                any = true;
            }
            Some(c) if is_ident_char(c) => {
                out.tag = Some(self.ident()?);
                any = true;
            }
            _ => {}
        }
        loop {
            match self.peek() {
                Some('#') => {
                    self.chars.next();
                    out.conditions.push(Condition::Id(self.ident()?));
                }
                Some('.') => {
                    self.chars.next();
                    out.conditions.push(Condition::Class(self.ident()?));
                }
                Some('[') => {
                    self.chars.next();
                    out.conditions.push(self.attribute()?);
                }
                _ => break,
            }
            any = true;
        }
        if !any {
            return Err(self.err("expected a compound selector"));
        }
        Ok(out)
    }

    fn attribute(&mut self) -> MarionetteResult<Condition> {
        self.skip_ws();
        let name = self.ident()?;
        self.skip_ws();
        match self.chars.next().map(|(_, c)| c) {
            Some(']') => Ok(Condition::AttrExists(name)),
            Some('=') => {
                self.skip_ws();
                let value = match self.peek() {
                    Some(q @ ('"' | '\'')) => {
                        self.chars.next();
                        let mut v = String::new();
                        loop {
                            match self.chars.next().map(|(_, c)| c) {
                                Some(c) if c == q => break,
                                Some(c) => v.push(c),
                                None => return Err(self.err("unterminated string")),
                            }
                        }
                        v
                    }
                    _ => {
                        let mut v = String::new();
                        while let Some(c) = self.peek().filter(|&c| c != ']' && !c.is_whitespace())
                        {
                            v.push(c);
                            self.chars.next();
                        }
                        v
                    }
                };
                self.skip_ws();
                match self.chars.next().map(|(_, c)| c) {
                    Some(']') => Ok(Condition::AttrEq(name, value)),
                    _ => Err(self.err("expected ']'")),
                }
            }
            _ => Err(self.err("expected ']' or '='")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/selector.rs"]
mod tests;
