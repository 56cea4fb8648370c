//! Recursive-descent parser for clip files
//!
//! ```text
//! file       := assignment*
//! assignment := IDENT '=' value
//! value      := object | array | STRING | NUMBER | 'true' | 'false'
//! object     := '{' assignment* '}'
//! array      := '[' value* ']'
//! ```
//!
//! Array elements have no separators. One token of lookahead decides
//! between object, array and scalar.

use crate::ast::{Assignment, Object, Span, Spanned, SyntaxValue};
use crate::error::{ParseError, ParseResult};
use crate::tokenizer::{SpannedToken, Token, Tokenizer};

/// Default limit on nested objects and arrays
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Parser for clip files
pub struct Parser<'src> {
    tokens: Tokenizer<'src>,
    /// `Some(None)` once end of input has been peeked
    peeked: Option<Option<SpannedToken<'src>>>,
    depth: usize,
    max_depth: usize,
}

impl<'src> Parser<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            tokens: Tokenizer::new(source),
            peeked: None,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parse the whole file into its top-level object
    pub fn parse_document(&mut self) -> ParseResult<Object> {
        let mut object = Object::new();

        while self.peek()?.is_some() {
            object.assignments.push(self.parse_assignment()?);
        }

        Ok(object)
    }

    /// Parse `IDENT '=' value`
    fn parse_assignment(&mut self) -> ParseResult<Assignment> {
        let key = self.expect_ident()?;
        self.expect(Token::Equals)?;
        let value = self.parse_value()?;
        Ok(Assignment::new(key, value))
    }

    fn parse_value(&mut self) -> ParseResult<Spanned<SyntaxValue>> {
        match self.advance()? {
            Some((Token::LBrace, span)) => self.parse_object(span),
            Some((Token::LBracket, span)) => self.parse_array(span),
            Some((Token::String(s), span)) => Ok(Spanned::new(SyntaxValue::String(s.to_string()), span)),
            Some((Token::Bool(b), span)) => Ok(Spanned::new(SyntaxValue::Bool(b), span)),
            Some((Token::Number(n), span)) => {
                let value = self.parse_number(n, span)?;
                Ok(Spanned::new(SyntaxValue::Number(value), span))
            }
            other => Err(self.unexpected(other, "a value")),
        }
    }

    /// Parse the rest of an object after its opening brace
    fn parse_object(&mut self, open: Span) -> ParseResult<Spanned<SyntaxValue>> {
        self.enter(open)?;
        let mut object = Object::new();

        loop {
            match self.peek()? {
                Some((Token::RBrace, close)) => {
                    self.advance()?;
                    self.depth -= 1;
                    return Ok(Spanned::new(SyntaxValue::Object(object), open.to(close)));
                }
                Some((Token::Ident(_), _)) => object.assignments.push(self.parse_assignment()?),
                other => return Err(self.unexpected(other, "identifier or '}'")),
            }
        }
    }

    /// Parse the rest of an array after its opening bracket
    fn parse_array(&mut self, open: Span) -> ParseResult<Spanned<SyntaxValue>> {
        self.enter(open)?;
        let mut items = Vec::new();

        loop {
            match self.peek()? {
                Some((Token::RBracket, close)) => {
                    self.advance()?;
                    self.depth -= 1;
                    return Ok(Spanned::new(SyntaxValue::Array(items), open.to(close)));
                }
                None => return Err(self.unexpected(None, "a value or ']'")),
                Some(_) => items.push(self.parse_value()?),
            }
        }
    }

    fn enter(&mut self, open: Span) -> ParseResult<()> {
        if self.depth >= self.max_depth {
            return Err(ParseError::syntax(
                self.tokens.position(open.start),
                format!("at most {} levels of nesting", self.max_depth),
                "deeper nesting",
            ));
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_number(&self, text: &str, span: Span) -> ParseResult<f64> {
        match text.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(ParseError::syntax(
                self.tokens.position(span.start),
                "a finite number",
                format!("number {}", text),
            )),
        }
    }

    fn peek(&mut self) -> ParseResult<Option<SpannedToken<'src>>> {
        if let Some(peeked) = self.peeked {
            return Ok(peeked);
        }
        let next = self.tokens.next().transpose()?;
        self.peeked = Some(next);
        Ok(next)
    }

    fn advance(&mut self) -> ParseResult<Option<SpannedToken<'src>>> {
        let token = self.peek()?;
        self.peeked = None;
        Ok(token)
    }

    fn expect(&mut self, expected: Token<'static>) -> ParseResult<Span> {
        match self.advance()? {
            Some((token, span)) if token == expected => Ok(span),
            other => Err(self.unexpected(other, &expected.to_string())),
        }
    }

    fn expect_ident(&mut self) -> ParseResult<Spanned<String>> {
        match self.advance()? {
            Some((Token::Ident(name), span)) => Ok(Spanned::new(name.to_string(), span)),
            other => Err(self.unexpected(other, "identifier")),
        }
    }

    fn unexpected(&self, found: Option<SpannedToken<'src>>, expected: &str) -> ParseError {
        let position = match found {
            Some((_, span)) => self.tokens.position(span.start),
            None => self.tokens.end_position(),
        };
        ParseError::syntax(position, expected, Self::format_token(found))
    }

    /// Format a token for display in error messages
    fn format_token(token: Option<SpannedToken<'src>>) -> String {
        match token {
            None => "end of input".to_string(),
            Some((token, _)) => token.to_string(),
        }
    }
}

/// Parse a clip file into its top-level object
pub fn parse(source: &str) -> ParseResult<Object> {
    Parser::new(source).parse_document()
}
