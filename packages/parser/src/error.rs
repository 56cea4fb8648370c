//! Error types for the clip file parser

use crate::position::Position;
use thiserror::Error;

/// Result type for parsing operations
pub type ParseResult<T> = Result<T, ParseError>;

/// Lexical and syntax errors. Both stop parsing at the first occurrence.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseError {
    #[error("Unexpected character {found:?} at {position}")]
    Lex { position: Position, found: char },

    #[error("Unexpected {found} at {position}: expected {expected}")]
    Syntax {
        position: Position,
        expected: String,
        found: String,
    },
}

impl ParseError {
    pub fn lex(position: Position, found: char) -> Self {
        Self::Lex { position, found }
    }

    pub fn syntax(position: Position, expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::Syntax {
            position,
            expected: expected.into(),
            found: found.into(),
        }
    }

    pub fn position(&self) -> Position {
        match self {
            ParseError::Lex { position, .. } => *position,
            ParseError::Syntax { position, .. } => *position,
        }
    }

    /// Short label for the offending location
    pub fn label(&self) -> String {
        match self {
            ParseError::Lex { .. } => "not valid here".to_string(),
            ParseError::Syntax { expected, .. } => format!("expected {}", expected),
        }
    }
}

/// Render one diagnostic with a source excerpt using ariadne.
///
/// Without a position the report is anchored at the start of the file and
/// carries no label.
#[cfg(feature = "pretty-errors")]
pub fn render_report(
    source: &str,
    filename: &str,
    message: &str,
    position: Option<Position>,
    label: &str,
    output: &mut Vec<u8>,
) {
    use ariadne::{Color, Label, Report, ReportKind, Source};

    let offset = position.map(|p| p.offset).unwrap_or(0);
    let mut report = Report::build(ReportKind::Error, filename, offset).with_message(message);

    if position.is_some() {
        let end = source[offset.min(source.len())..]
            .chars()
            .next()
            .map(|c| offset + c.len_utf8())
            .unwrap_or(offset);
        report = report.with_label(
            Label::new((filename, offset..end))
                .with_color(Color::Red)
                .with_message(label),
        );
    }

    // Writing into a Vec cannot fail
    let _ = report
        .finish()
        .write((filename, Source::from(source)), &mut *output);
}

/// Pretty-print a parse error with source context
#[cfg(feature = "pretty-errors")]
pub fn format_error(source: &str, filename: &str, error: &ParseError) -> String {
    let mut output = Vec::new();
    render_report(
        source,
        filename,
        &error.to_string(),
        Some(error.position()),
        &error.label(),
        &mut output,
    );
    String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
}
