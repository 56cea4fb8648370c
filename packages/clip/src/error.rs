//! Diagnostics produced while reading a clip

use crate::model::SequenceKind;
use animclip_parser::{ParseError, Position};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Fieldless tag for every diagnostic kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Lex,
    Syntax,
    Order,
    DuplicateSection,
    UnknownSection,
    MissingField,
    DuplicateField,
    InvalidEnum,
    Type,
    MalformedVector,
    UnrepresentableName,
    DuplicateBone,
    NoRoot,
    MultipleRoots,
    DanglingParent,
    CyclicHierarchy,
    UnknownTrackBone,
    DuplicateTrack,
    SampleCountMismatch,
    Range,
    Encoding,
    Decompress,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Lex => "lex",
            ErrorKind::Syntax => "syntax",
            ErrorKind::Order => "order",
            ErrorKind::DuplicateSection => "duplicate_section",
            ErrorKind::UnknownSection => "unknown_section",
            ErrorKind::MissingField => "missing_field",
            ErrorKind::DuplicateField => "duplicate_field",
            ErrorKind::InvalidEnum => "invalid_enum",
            ErrorKind::Type => "type",
            ErrorKind::MalformedVector => "malformed_vector",
            ErrorKind::UnrepresentableName => "unrepresentable_name",
            ErrorKind::DuplicateBone => "duplicate_bone",
            ErrorKind::NoRoot => "no_root",
            ErrorKind::MultipleRoots => "multiple_roots",
            ErrorKind::DanglingParent => "dangling_parent",
            ErrorKind::CyclicHierarchy => "cyclic_hierarchy",
            ErrorKind::UnknownTrackBone => "unknown_track_bone",
            ErrorKind::DuplicateTrack => "duplicate_track",
            ErrorKind::SampleCountMismatch => "sample_count_mismatch",
            ErrorKind::Range => "range",
            ErrorKind::Encoding => "encoding",
            ErrorKind::Decompress => "decompress",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of the external decompressor for `.acl.zip` containers
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecompressError {
    #[error("archive contains no entries")]
    EmptyArchive,

    #[error("invalid archive: {0}")]
    InvalidArchive(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// A single problem found while reading a clip
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ClipError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("Section '{early}' at {position} must come after '{expected_first}'")]
    Order {
        early: String,
        expected_first: String,
        position: Position,
    },

    #[error("Section '{section}' at {position} is defined more than once")]
    DuplicateSection { section: String, position: Position },

    #[error("Unknown section '{section}' at {position}")]
    UnknownSection { section: String, position: Position },

    // Binding errors name their block in `context` (`bone 'hips'`,
    // `tracks[3]`, `clip`) and carry the bone or track name when known.
    #[error("{} is missing required field '{field}'{}", .context, at(.position))]
    MissingField {
        context: String,
        entity: Option<String>,
        field: String,
        position: Option<Position>,
    },

    #[error("Field '{field}' of {context} at {position} is defined more than once")]
    DuplicateField {
        context: String,
        entity: Option<String>,
        field: String,
        position: Position,
    },

    #[error("Invalid {field} \"{value}\" in {context} at {position}: expected one of {expected}")]
    InvalidEnum {
        context: String,
        entity: Option<String>,
        field: String,
        value: String,
        expected: String,
        position: Position,
    },

    #[error("Field '{field}' of {context} at {position}: expected {expected}, found {found}")]
    Type {
        context: String,
        entity: Option<String>,
        field: String,
        expected: String,
        found: String,
        position: Position,
    },

    #[error("Field '{field}' of {context} at {position}: expected {expected} numbers, found {found}")]
    MalformedVector {
        context: String,
        entity: Option<String>,
        field: String,
        expected: usize,
        found: usize,
        position: Position,
    },

    #[error("Clip name {name:?} for the clip at {position} contains '\"' and could not be written back")]
    UnrepresentableName { name: String, position: Position },

    #[error("Bone '{name}' is defined more than once")]
    DuplicateBone { name: String },

    #[error("Skeleton has no root bone (a bone whose parent is \"\")")]
    NoRoot,

    #[error("Skeleton has more than one root bone: {}", .roots.join(", "))]
    MultipleRoots { roots: Vec<String> },

    #[error("Bone '{bone}' has parent '{parent}', but no bone has that name")]
    DanglingParent { bone: String, parent: String },

    #[error("Bone '{bone}' is part of a parent cycle: {}", .cycle.join(" -> "))]
    CyclicHierarchy { bone: String, cycle: Vec<String> },

    #[error("Track references bone '{bone}', but the skeleton has no bone with that name")]
    UnknownTrackBone { bone: String },

    #[error("Bone '{bone}' has more than one track")]
    DuplicateTrack { bone: String },

    #[error("Track '{bone}' has {actual} {kind}, expected {expected} (num_samples)")]
    SampleCountMismatch {
        bone: String,
        kind: SequenceKind,
        expected: u32,
        actual: usize,
    },

    #[error("{}", range_message(.bone, .field, .value, .requirement))]
    Range {
        /// `None` for clip header fields
        bone: Option<String>,
        field: String,
        value: f64,
        requirement: String,
    },

    #[error("Clip payload is not valid UTF-8: {message}")]
    Encoding { message: String },

    #[error("Could not decompress clip: {0}")]
    Decompress(#[from] DecompressError),
}

fn at(position: &Option<Position>) -> String {
    match position {
        Some(position) => format!(" at {}", position),
        None => String::new(),
    }
}

fn range_message(bone: &Option<String>, field: &str, value: &f64, requirement: &str) -> String {
    match bone {
        Some(bone) => format!("Bone '{}' has {} = {}, which must be {}", bone, field, value, requirement),
        None => format!("Clip has {} = {}, which must be {}", field, value, requirement),
    }
}

impl ClipError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClipError::Parse(ParseError::Lex { .. }) => ErrorKind::Lex,
            ClipError::Parse(ParseError::Syntax { .. }) => ErrorKind::Syntax,
            ClipError::Order { .. } => ErrorKind::Order,
            ClipError::DuplicateSection { .. } => ErrorKind::DuplicateSection,
            ClipError::UnknownSection { .. } => ErrorKind::UnknownSection,
            ClipError::MissingField { .. } => ErrorKind::MissingField,
            ClipError::DuplicateField { .. } => ErrorKind::DuplicateField,
            ClipError::InvalidEnum { .. } => ErrorKind::InvalidEnum,
            ClipError::Type { .. } => ErrorKind::Type,
            ClipError::MalformedVector { .. } => ErrorKind::MalformedVector,
            ClipError::UnrepresentableName { .. } => ErrorKind::UnrepresentableName,
            ClipError::DuplicateBone { .. } => ErrorKind::DuplicateBone,
            ClipError::NoRoot => ErrorKind::NoRoot,
            ClipError::MultipleRoots { .. } => ErrorKind::MultipleRoots,
            ClipError::DanglingParent { .. } => ErrorKind::DanglingParent,
            ClipError::CyclicHierarchy { .. } => ErrorKind::CyclicHierarchy,
            ClipError::UnknownTrackBone { .. } => ErrorKind::UnknownTrackBone,
            ClipError::DuplicateTrack { .. } => ErrorKind::DuplicateTrack,
            ClipError::SampleCountMismatch { .. } => ErrorKind::SampleCountMismatch,
            ClipError::Range { .. } => ErrorKind::Range,
            ClipError::Encoding { .. } => ErrorKind::Encoding,
            ClipError::Decompress(_) => ErrorKind::Decompress,
        }
    }

    /// Source location, for errors raised before validation
    pub fn position(&self) -> Option<Position> {
        match self {
            ClipError::Parse(error) => Some(error.position()),
            ClipError::Order { position, .. }
            | ClipError::DuplicateSection { position, .. }
            | ClipError::UnknownSection { position, .. }
            | ClipError::DuplicateField { position, .. }
            | ClipError::InvalidEnum { position, .. }
            | ClipError::Type { position, .. }
            | ClipError::MalformedVector { position, .. }
            | ClipError::UnrepresentableName { position, .. } => Some(*position),
            ClipError::MissingField { position, .. } => *position,
            _ => None,
        }
    }

    /// Name of the bone or track the error is about, if any
    pub fn entity(&self) -> Option<&str> {
        match self {
            ClipError::MissingField { entity, .. }
            | ClipError::DuplicateField { entity, .. }
            | ClipError::InvalidEnum { entity, .. }
            | ClipError::Type { entity, .. }
            | ClipError::MalformedVector { entity, .. } => entity.as_deref(),
            ClipError::DuplicateBone { name } => Some(name),
            ClipError::DanglingParent { bone, .. }
            | ClipError::CyclicHierarchy { bone, .. }
            | ClipError::UnknownTrackBone { bone }
            | ClipError::DuplicateTrack { bone }
            | ClipError::SampleCountMismatch { bone, .. } => Some(bone),
            ClipError::Range { bone, .. } => bone.as_deref(),
            _ => None,
        }
    }

    /// Short label for the offending location
    pub fn label(&self) -> String {
        match self {
            ClipError::Parse(error) => error.label(),
            ClipError::Order { expected_first, .. } => format!("move this after '{}'", expected_first),
            ClipError::DuplicateSection { .. } | ClipError::DuplicateField { .. } => {
                "repeated here".to_string()
            }
            ClipError::UnknownSection { .. } => "not a clip section".to_string(),
            ClipError::InvalidEnum { expected, .. } => format!("expected one of {}", expected),
            ClipError::Type { expected, .. } => format!("expected {}", expected),
            ClipError::MalformedVector { expected, .. } => format!("expected {} numbers", expected),
            ClipError::MissingField { field, .. } => format!("'{}' is required here", field),
            ClipError::UnrepresentableName { .. } => "add a name without quotes".to_string(),
            _ => self.kind().to_string(),
        }
    }
}

/// Ordered, complete list of problems from one read
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ClipErrors {
    errors: Vec<ClipError>,
}

impl ClipErrors {
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    pub fn push(&mut self, error: ClipError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ClipError> {
        self.errors.iter()
    }

    pub fn first(&self) -> Option<&ClipError> {
        self.errors.first()
    }

    /// Kinds in report order
    pub fn kinds(&self) -> Vec<ErrorKind> {
        self.errors.iter().map(ClipError::kind).collect()
    }

    pub fn count(&self, kind: ErrorKind) -> usize {
        self.errors.iter().filter(|e| e.kind() == kind).count()
    }

    pub fn into_vec(self) -> Vec<ClipError> {
        self.errors
    }
}

impl fmt::Display for ClipErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.errors.len() {
            1 => write!(f, "1 error reading clip")?,
            n => write!(f, "{} errors reading clip", n)?,
        }
        for error in &self.errors {
            write!(f, "\n  [{}] {}", error.kind(), error)?;
        }
        Ok(())
    }
}

impl std::error::Error for ClipErrors {}

impl From<Vec<ClipError>> for ClipErrors {
    fn from(errors: Vec<ClipError>) -> Self {
        Self { errors }
    }
}

impl From<ClipError> for ClipErrors {
    fn from(error: ClipError) -> Self {
        Self {
            errors: vec![error],
        }
    }
}

impl From<ParseError> for ClipErrors {
    fn from(error: ParseError) -> Self {
        ClipError::from(error).into()
    }
}

impl IntoIterator for ClipErrors {
    type Item = ClipError;
    type IntoIter = std::vec::IntoIter<ClipError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

impl<'a> IntoIterator for &'a ClipErrors {
    type Item = &'a ClipError;
    type IntoIter = std::slice::Iter<'a, ClipError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.iter()
    }
}

/// Pretty-print every diagnostic with source context using ariadne
#[cfg(feature = "pretty-errors")]
pub fn format_errors(source: &str, filename: &str, errors: &ClipErrors) -> String {
    let mut output = Vec::new();

    for error in errors {
        animclip_parser::render_report(
            source,
            filename,
            &format!("[{}] {}", error.kind(), error),
            error.position(),
            &error.label(),
            &mut output,
        );
    }

    String::from_utf8(output).unwrap_or_else(|_| "Error formatting failed".to_string())
}
