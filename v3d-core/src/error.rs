/// Error types for model construction, parsing and scene building
use std::fmt;
use thiserror::Error;

/// Model fields that may be assigned at most once
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Title,
    Control,
    Format,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Title => write!(f, "title"),
            Field::Control => write!(f, "control block"),
            Field::Format => write!(f, "geometry format"),
        }
    }
}

/// The two key spaces of an input model
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexKind {
    Vertex,
    Surface,
}

impl fmt::Display for IndexKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexKind::Vertex => write!(f, "vertex"),
            IndexKind::Surface => write!(f, "surface"),
        }
    }
}

/// Violations of the input model invariants
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    #[error("{0} already set")]
    AlreadySet(Field),

    #[error("{kind} index {index} listed twice")]
    DuplicateIndex { kind: IndexKind, index: u32 },

    #[error("surface {surface} references missing vertex {vertex}")]
    UnresolvedVertex { surface: u32, vertex: u32 },
}

/// Failures while reading View3D input text
#[derive(Debug, Error)]
pub enum ParseError {
    /// A record broke a model invariant (repeated header, reused key)
    #[error("line {line}: {source}")]
    Model {
        line: usize,
        #[source]
        source: ModelError,
    },

    /// A recognized record with the wrong shape or an unreadable field
    #[error("line {line}: malformed {record} record: {reason}")]
    MalformedRecord {
        line: usize,
        record: &'static str,
        reason: String,
    },

    #[error("failed to read input: {0}")]
    Io(#[from] std::io::Error),
}

impl ParseError {
    /// The model invariant behind this error, if there is one
    pub fn model_error(&self) -> Option<&ModelError> {
        match self {
            ParseError::Model { source, .. } => Some(source),
            _ => None,
        }
    }

    /// 1-based line number the error was raised on
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::Model { line, .. } | ParseError::MalformedRecord { line, .. } => Some(*line),
            ParseError::Io(_) => None,
        }
    }
}

/// Failures while interpreting a control block
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    #[error("bad {expected} value for control word '{key}': '{value}'")]
    BadValue {
        key: String,
        value: String,
        expected: &'static str,
    },

    #[error("invalid output file format {0}, expected 0, 1 or 2")]
    InvalidOutFormat(i64),

    #[error("must set row before setting column")]
    ColumnWithoutRow,
}
