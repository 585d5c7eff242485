//! Error types for the assembly core.

use thiserror::Error;

use crate::domain::Stage;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("input error: {0}")]
    Parse(#[from] stap_inp::ParseError),

    /// A record references a node, element, material set or freedom that does not exist.
    #[error("malformed {record}: {message}")]
    MalformedInput { record: String, message: String },

    /// An assembly write fell outside the computed skyline envelope.
    #[error(
        "entry ({row}, {col}) lies outside the skyline envelope (column {col} has height {height})"
    )]
    LayoutViolation {
        row: usize,
        col: usize,
        height: usize,
    },

    #[error("equation index ({row}, {col}) is outside 1..={neq}")]
    EquationOutOfRange { row: usize, col: usize, neq: usize },

    #[error("no active equations: every freedom is constrained")]
    NoActiveEquations,

    #[error("singular system: {0}")]
    SingularSystem(String),

    #[error("degenerate element {element}: {message}")]
    DegenerateElement { element: usize, message: String },

    #[error("cannot {operation} in stage {found:?} (requires {required:?})")]
    Stage {
        operation: &'static str,
        found: Stage,
        required: Stage,
    },

    #[error("{0}")]
    ForceVector(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn malformed(record: impl Into<String>, message: impl Into<String>) -> Self {
        Error::MalformedInput {
            record: record.into(),
            message: message.into(),
        }
    }
}
