//! Generic syntax tree for clip files.
//!
//! The parser knows nothing about clips, bones or tracks. It only produces
//! ordered key/value assignments, nested objects and arrays of untyped
//! values. Repeated keys are kept as-is; deciding what a repeat means is up
//! to whoever interprets the tree.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Span covering both `self` and `other`
    pub fn to(self, other: Span) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }

    pub fn range(&self) -> Range<usize> {
        self.start..self.end
    }
}

impl From<Range<usize>> for Span {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// A node together with the source range it was parsed from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Spanned<T> {
    pub node: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(node: T, span: Span) -> Self {
        Self { node, span }
    }
}

/// An untyped value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SyntaxValue {
    String(String),
    Number(f64),
    Bool(bool),
    Array(Vec<Spanned<SyntaxValue>>),
    Object(Object),
}

impl SyntaxValue {
    /// Short name of the value's shape, used in diagnostics
    pub fn kind_name(&self) -> &'static str {
        match self {
            SyntaxValue::String(_) => "string",
            SyntaxValue::Number(_) => "number",
            SyntaxValue::Bool(_) => "boolean",
            SyntaxValue::Array(_) => "array",
            SyntaxValue::Object(_) => "object",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            SyntaxValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            SyntaxValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            SyntaxValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Spanned<SyntaxValue>]> {
        match self {
            SyntaxValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            SyntaxValue::Object(object) => Some(object),
            _ => None,
        }
    }
}

/// `key = value`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assignment {
    pub key: Spanned<String>,
    pub value: Spanned<SyntaxValue>,
}

impl Assignment {
    pub fn new(key: Spanned<String>, value: Spanned<SyntaxValue>) -> Self {
        Self { key, value }
    }

    pub fn span(&self) -> Span {
        self.key.span.to(self.value.span)
    }
}

/// Ordered list of assignments. Keys may repeat.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Object {
    pub assignments: Vec<Assignment>,
}

impl Object {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: SyntaxValue) {
        self.assignments.push(Assignment::new(
            Spanned::new(key.into(), Span::default()),
            Spanned::new(value, Span::default()),
        ));
    }

    /// Builder form of [`Object::push`]
    pub fn with(mut self, key: impl Into<String>, value: SyntaxValue) -> Self {
        self.push(key, value);
        self
    }

    /// First assignment with the given key
    pub fn get(&self, key: &str) -> Option<&Assignment> {
        self.assignments.iter().find(|a| a.key.node == key)
    }

    /// Every assignment with the given key, in source order
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a Assignment> + 'a {
        self.assignments.iter().filter(move |a| a.key.node == key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.assignments.iter().map(|a| a.key.node.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Assignment> {
        self.assignments.iter()
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = &'a Assignment;
    type IntoIter = std::slice::Iter<'a, Assignment>;

    fn into_iter(self) -> Self::IntoIter {
        self.assignments.iter()
    }
}
