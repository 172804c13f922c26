//! Execution-tier errors.
//!
//! Validation failures are [`SemanticError`]s and are detected before any
//! data is loaded; everything here aborts an execution already underway.

use std::path::PathBuf;

use thiserror::Error;

use crate::validator::SemanticError;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Semantic(#[from] SemanticError),

    #[error("unknown column \"{0}\" while loading data")]
    UnknownColumn(String),

    #[error("undeclared relation \"{0}\"")]
    UndeclaredRelation(String),

    #[error("invocation of \"{name}\" supplies {supplied} arguments but the relation has {actual} columns")]
    InvocationWidth {
        name: String,
        supplied: usize,
        actual: usize,
    },

    #[error("cannot reorder on missing column \"{0}\"")]
    MissingColumn(String),

    #[error("rule \"{0}\" has no positive invocation to seed evaluation")]
    NoPositiveInvocation(String),

    #[error("program contains no rules")]
    EmptyProgram,

    #[error("can't operate on a string and non-string")]
    MixedStringOperands,

    #[error("operator \"{0}\" is not defined for string operands")]
    InvalidStringOperator(&'static str),

    #[error("\"!\" requires a boolean operand")]
    NonBooleanNot,

    #[error("invalid unary operand")]
    InvalidUnaryOperand,

    #[error("filter expression did not produce a boolean")]
    NonBooleanFilter,

    #[error("empty column name in header of {0:?}")]
    EmptyColumnName(PathBuf),

    #[error("duplicate column name \"{name}\" in header of {path:?}")]
    DuplicateColumnName { path: PathBuf, name: String },

    #[error("failed to read fact data from {path:?}")]
    DataRead {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}
