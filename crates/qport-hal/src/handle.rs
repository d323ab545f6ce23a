//! Persistent result handles.
//!
//! A handle is an ordered tuple of strings and integers. Its text form looks
//! like `('abc', 10, '[0, 1]', 'null')` and parses back with [`str::parse`],
//! so a handle printed by one process can be resumed by another.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::HalError;

/// One element of a [`ResultHandle`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum HandleItem {
    /// A string item.
    Str(String),
    /// An integer item.
    Int(i64),
}

impl HandleItem {
    /// Kind of this item.
    pub fn kind(&self) -> HandleKind {
        match self {
            HandleItem::Str(_) => HandleKind::Str,
            HandleItem::Int(_) => HandleKind::Int,
        }
    }
}

impl From<&str> for HandleItem {
    fn from(s: &str) -> Self {
        HandleItem::Str(s.to_string())
    }
}

impl From<String> for HandleItem {
    fn from(s: String) -> Self {
        HandleItem::Str(s)
    }
}

impl From<i64> for HandleItem {
    fn from(v: i64) -> Self {
        HandleItem::Int(v)
    }
}

/// Type of a handle item, used to declare a backend's handle shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// String.
    Str,
    /// Integer.
    Int,
}

/// Identifier for a submitted circuit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResultHandle(Vec<HandleItem>);

impl ResultHandle {
    /// Create a handle from its items.
    pub fn new(items: impl IntoIterator<Item = HandleItem>) -> Self {
        Self(items.into_iter().collect())
    }

    /// All items.
    pub fn items(&self) -> &[HandleItem] {
        &self.0
    }

    /// Number of items.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check whether the handle has no items.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// String at `index`, if that item is a string.
    pub fn str_at(&self, index: usize) -> Option<&str> {
        match self.0.get(index) {
            Some(HandleItem::Str(s)) => Some(s),
            _ => None,
        }
    }

    /// Integer at `index`, if that item is an integer.
    pub fn int_at(&self, index: usize) -> Option<i64> {
        match self.0.get(index) {
            Some(HandleItem::Int(v)) => Some(*v),
            _ => None,
        }
    }

    /// Check whether the items have exactly the given kinds.
    pub fn matches(&self, shape: &[HandleKind]) -> bool {
        self.0.len() == shape.len() && self.0.iter().zip(shape).all(|(i, k)| i.kind() == *k)
    }
}

fn write_quoted(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("'")?;
    for ch in s.chars() {
        match ch {
            '\'' => f.write_str("\\'")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("'")
}

impl fmt::Display for ResultHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, item) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            match item {
                HandleItem::Str(s) => write_quoted(f, s)?,
                HandleItem::Int(v) => write!(f, "{v}")?,
            }
        }
        if self.0.len() == 1 {
            f.write_str(",")?;
        }
        f.write_str(")")
    }
}

struct HandleParser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    source: &'a str,
}

impl HandleParser<'_> {
    fn fail(&self, what: &str) -> HalError {
        HalError::InvalidHandle(format!("{what} in {:?}", self.source))
    }

    fn skip_ws(&mut self) {
        while self.chars.next_if(|c| c.is_whitespace()).is_some() {}
    }

    fn expect(&mut self, ch: char) -> Result<(), HalError> {
        self.skip_ws();
        match self.chars.next() {
            Some(c) if c == ch => Ok(()),
            _ => Err(self.fail(&format!("expected '{ch}'"))),
        }
    }

    fn string(&mut self, quote: char) -> Result<String, HalError> {
        let mut out = String::new();
        loop {
            match self.chars.next() {
                Some('\\') => match self.chars.next() {
                    Some('n') => out.push('\n'),
                    Some(c) => out.push(c),
                    None => return Err(self.fail("unterminated escape")),
                },
                Some(c) if c == quote => return Ok(out),
                Some(c) => out.push(c),
                None => return Err(self.fail("unterminated string")),
            }
        }
    }

    fn integer(&mut self, first: char) -> Result<i64, HalError> {
        let mut digits = String::from(first);
        while let Some(c) = self.chars.next_if(char::is_ascii_digit) {
            digits.push(c);
        }
        digits
            .parse()
            .map_err(|_| self.fail(&format!("bad integer '{digits}'")))
    }

    fn item(&mut self) -> Result<HandleItem, HalError> {
        self.skip_ws();
        match self.chars.next() {
            Some(q @ ('\'' | '"')) => self.string(q).map(HandleItem::Str),
            Some(c) if c == '-' || c.is_ascii_digit() => self.integer(c).map(HandleItem::Int),
            _ => Err(self.fail("expected a string or integer")),
        }
    }

    fn parse(mut self) -> Result<ResultHandle, HalError> {
        self.expect('(')?;
        let mut items = vec![];
        loop {
            self.skip_ws();
            if self.chars.next_if_eq(&')').is_some() {
                break;
            }
            items.push(self.item()?);
            self.skip_ws();
            match self.chars.next() {
                Some(',') => {}
                Some(')') => break,
                _ => return Err(self.fail("expected ',' or ')'")),
            }
        }
        self.skip_ws();
        if self.chars.next().is_some() {
            return Err(self.fail("trailing characters"));
        }
        Ok(ResultHandle(items))
    }
}

impl FromStr for ResultHandle {
    type Err = HalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HandleParser {
            chars: s.chars().peekable(),
            source: s,
        }
        .parse()
    }
}
