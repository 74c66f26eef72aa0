//! Error types for phyloreg

use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Main error type for phyloreg operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("Unknown spatial unit: {0}")]
    UnknownUnit(String),

    #[error("Dimension mismatch: expected {expected}x{expected} values, got {rows}x{cols}")]
    DimensionMismatch {
        expected: usize,
        rows: usize,
        cols: usize,
    },

    #[error("Matrix is not symmetric: d({a}, {b}) = {ab} but d({b}, {a}) = {ba}")]
    AsymmetryError {
        a: String,
        b: String,
        ab: f64,
        ba: f64,
    },

    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    #[error("No geometry for spatial unit: {0}")]
    MissingGeometry(String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Parse error at line {line}: {reason}")]
    Parse { line: usize, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`Error`], used when reporting batch failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    UnknownUnit,
    DimensionMismatch,
    AsymmetryError,
    InsufficientData,
    MissingGeometry,
    InvalidParameter,
    Parse,
    Io,
    Other,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::UnknownUnit(_) => ErrorKind::UnknownUnit,
            Error::DimensionMismatch { .. } => ErrorKind::DimensionMismatch,
            Error::AsymmetryError { .. } => ErrorKind::AsymmetryError,
            Error::InsufficientData(_) => ErrorKind::InsufficientData,
            Error::MissingGeometry(_) => ErrorKind::MissingGeometry,
            Error::InvalidParameter { .. } => ErrorKind::InvalidParameter,
            Error::Parse { .. } | Error::Json(_) => ErrorKind::Parse,
            Error::Io(_) => ErrorKind::Io,
            Error::Other(_) => ErrorKind::Other,
        }
    }

    pub(crate) fn invalid(name: &'static str, value: impl fmt::Display, reason: impl Into<String>) -> Self {
        Error::InvalidParameter {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

impl ErrorKind {
    pub fn name(&self) -> &'static str {
        match self {
            ErrorKind::UnknownUnit => "UnknownUnit",
            ErrorKind::DimensionMismatch => "DimensionMismatch",
            ErrorKind::AsymmetryError => "AsymmetryError",
            ErrorKind::InsufficientData => "InsufficientData",
            ErrorKind::MissingGeometry => "MissingGeometry",
            ErrorKind::InvalidParameter => "InvalidParameter",
            ErrorKind::Parse => "Parse",
            ErrorKind::Io => "Io",
            ErrorKind::Other => "Other",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Result type alias for phyloreg operations
pub type Result<T> = std::result::Result<T, Error>;
