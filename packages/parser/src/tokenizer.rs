use crate::ast::Span;
use crate::error::{ParseError, ParseResult};
use crate::position::{LineIndex, Position};
use logos::Logos;
use std::fmt;

/// Token types for clip files
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
#[logos(skip r"//[^\n]*")]
#[logos(skip r"/\*([^*]|\*+[^*/])*\*+/")]
pub enum Token<'src> {
    #[token("true", |_| true)]
    #[token("false", |_| false)]
    Bool(bool),

    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'src str),

    // No escape sequences: everything between the quotes is taken verbatim
    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        &s[1..s.len() - 1]
    })]
    String(&'src str),

    #[regex(r"[+-]?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    Number(&'src str),

    #[token("{")]
    LBrace,

    #[token("}")]
    RBrace,

    #[token("[")]
    LBracket,

    #[token("]")]
    RBracket,

    #[token("=")]
    Equals,
}

impl<'src> fmt::Display for Token<'src> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Bool(b) => write!(f, "{}", b),
            Token::Ident(s) => write!(f, "identifier '{}'", s),
            Token::String(s) => write!(f, "string \"{}\"", s),
            Token::Number(n) => write!(f, "number {}", n),
            Token::LBrace => write!(f, "'{{'"),
            Token::RBrace => write!(f, "'}}'"),
            Token::LBracket => write!(f, "'['"),
            Token::RBracket => write!(f, "']'"),
            Token::Equals => write!(f, "'='"),
        }
    }
}

/// A token and where it came from
pub type SpannedToken<'src> = (Token<'src>, Span);

/// Lazy token stream over a source string.
///
/// Yields `Err` once on the first unrecognized character and then stops;
/// end of input is the end of the iterator.
pub struct Tokenizer<'src> {
    lexer: logos::Lexer<'src, Token<'src>>,
    index: LineIndex<'src>,
    failed: bool,
}

impl<'src> Tokenizer<'src> {
    pub fn new(source: &'src str) -> Self {
        Self {
            lexer: Token::lexer(source),
            index: LineIndex::new(source),
            failed: false,
        }
    }

    pub fn source(&self) -> &'src str {
        self.index.source()
    }

    pub fn position(&self, offset: usize) -> Position {
        self.index.position(offset)
    }

    /// Position just past the last byte of input
    pub fn end_position(&self) -> Position {
        self.index.position(self.source().len())
    }

    fn lex_error(&self, offset: usize) -> ParseError {
        let found = self.source()[offset..].chars().next().unwrap_or('\0');
        ParseError::lex(self.position(offset), found)
    }
}

impl<'src> Iterator for Tokenizer<'src> {
    type Item = ParseResult<SpannedToken<'src>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        let result = self.lexer.next()?;
        let span = Span::from(self.lexer.span());

        match result {
            Ok(token) => Some(Ok((token, span))),
            Err(()) => {
                self.failed = true;
                Some(Err(self.lex_error(span.start)))
            }
        }
    }
}

/// Tokenize a whole source string, stopping at the first lexical error
pub fn tokenize(source: &str) -> ParseResult<Vec<SpannedToken<'_>>> {
    Tokenizer::new(source).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token<'_>> {
        tokenize(source)
            .expect("should tokenize")
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn test_punctuation() {
        assert_eq!(
            kinds("{ } [ ] ="),
            vec![
                Token::LBrace,
                Token::RBrace,
                Token::LBracket,
                Token::RBracket,
                Token::Equals
            ]
        );
    }

    #[test]
    fn test_identifiers() {
        assert_eq!(
            kinds("clip num_samples _private bone1"),
            vec![
                Token::Ident("clip"),
                Token::Ident("num_samples"),
                Token::Ident("_private"),
                Token::Ident("bone1"),
            ]
        );
    }

    #[test]
    fn test_boolean_keywords() {
        assert_eq!(
            kinds("true false true_bone falsey"),
            vec![
                Token::Bool(true),
                Token::Bool(false),
                Token::Ident("true_bone"),
                Token::Ident("falsey"),
            ]
        );
    }

    #[test]
    fn test_strings_are_unquoted_verbatim() {
        assert_eq!(
            kinds(r#""A clip" "" "back\slash""#),
            vec![
                Token::String("A clip"),
                Token::String(""),
                Token::String("back\\slash"),
            ]
        );
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            kinds("42 3.14 -10 +2 1e-5 -2.5E+3 0.0"),
            vec![
                Token::Number("42"),
                Token::Number("3.14"),
                Token::Number("-10"),
                Token::Number("+2"),
                Token::Number("1e-5"),
                Token::Number("-2.5E+3"),
                Token::Number("0.0"),
            ]
        );
    }

    #[test]
    fn test_comments_ignored() {
        let source = r#"
            // line comment
            clip = { /* block
               comment */ name = "x" } // trailing
        "#;
        assert_eq!(
            kinds(source),
            vec![
                Token::Ident("clip"),
                Token::Equals,
                Token::LBrace,
                Token::Ident("name"),
                Token::Equals,
                Token::String("x"),
                Token::RBrace,
            ]
        );
    }

    #[test]
    fn test_comment_at_end_without_newline() {
        assert_eq!(kinds("a // no newline"), vec![Token::Ident("a")]);
    }

    #[test]
    fn test_spans() {
        let tokens = tokenize("ab = 12").unwrap();
        assert_eq!(tokens[0].1, Span::new(0, 2));
        assert_eq!(tokens[1].1, Span::new(3, 4));
        assert_eq!(tokens[2].1, Span::new(5, 7));
    }

    #[test]
    fn test_comma_is_a_lex_error() {
        let error = tokenize("[ 1, 2 ]").unwrap_err();
        assert_eq!(
            error,
            ParseError::lex(Position::new(3, 1, 4), ',')
        );
    }

    #[test]
    fn test_lex_error_position_on_later_line() {
        let error = tokenize("a = 1\nb = @").unwrap_err();
        match error {
            ParseError::Lex { position, found } => {
                assert_eq!(found, '@');
                assert_eq!(position.line, 2);
                assert_eq!(position.column, 5);
            }
            other => panic!("Expected lex error, got {:?}", other),
        }
    }

    #[test]
    fn test_unterminated_string() {
        let error = tokenize("name = \"open").unwrap_err();
        assert!(matches!(error, ParseError::Lex { found: '"', .. }));
    }

    #[test]
    fn test_unterminated_block_comment() {
        let error = tokenize("a /* never closed").unwrap_err();
        assert!(matches!(error, ParseError::Lex { found: '/', .. }));
    }

    #[test]
    fn test_stream_stops_after_error() {
        let mut tokenizer = Tokenizer::new("a ; b");
        assert!(matches!(tokenizer.next(), Some(Ok((Token::Ident("a"), _)))));
        assert!(matches!(tokenizer.next(), Some(Err(_))));
        assert!(tokenizer.next().is_none());
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
        assert!(tokenize("   // only a comment").unwrap().is_empty());
    }
}
