//! Tokenizer and syntax parser for `.acl.js` animation clip files.
//!
//! Parsing produces a generic, order-preserving [`Object`] tree. Giving that
//! tree a meaning (clip header, bones, tracks) happens in a later stage.

pub mod ast;
pub mod error;
pub mod parser;
pub mod position;
pub mod serializer;
pub mod tokenizer;

#[cfg(test)]
mod tests_comprehensive;

#[cfg(test)]
mod tests_serializer;

pub use ast::{Assignment, Object, Span, Spanned, SyntaxValue};
pub use error::{ParseError, ParseResult};
#[cfg(feature = "pretty-errors")]
pub use error::{format_error, render_report};
pub use parser::{parse, Parser, DEFAULT_MAX_DEPTH};
pub use position::{LineIndex, Position};
pub use serializer::{is_representable, serialize, Serializer};
pub use tokenizer::{tokenize, Token, Tokenizer};
