use std::fmt::{self, Display};
use std::io;

use crate::graph::Location;

/// Provides `DragonflyError` and maps other errors to
/// convert to a `DragonflyError`
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum DragonflyError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CSVError(csv::Error),
    InvalidParameter {
        name: &'static str,
        reason: String,
    },
    CannotMakeEdgeToSelf,
    InvalidWeight,
    UnknownLocation(Location),
    MalformedEdgeRecord {
        line: usize,
        reason: String,
    },
    DegenerateDistribution(String),
    ThreadPool(String),
    ReportError(String),
    DragonflyError(String),
}

impl DragonflyError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        DragonflyError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

impl From<io::Error> for DragonflyError {
    fn from(error: io::Error) -> Self {
        DragonflyError::IoError(error)
    }
}

impl From<serde_json::Error> for DragonflyError {
    fn from(error: serde_json::Error) -> Self {
        DragonflyError::JsonError(error)
    }
}

impl From<csv::Error> for DragonflyError {
    fn from(error: csv::Error) -> Self {
        DragonflyError::CSVError(error)
    }
}

impl From<rayon::ThreadPoolBuildError> for DragonflyError {
    fn from(error: rayon::ThreadPoolBuildError) -> Self {
        DragonflyError::ThreadPool(error.to_string())
    }
}

impl From<String> for DragonflyError {
    fn from(error: String) -> Self {
        DragonflyError::DragonflyError(error)
    }
}

impl From<&str> for DragonflyError {
    fn from(error: &str) -> Self {
        DragonflyError::DragonflyError(error.to_string())
    }
}

impl std::error::Error for DragonflyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DragonflyError::IoError(error) => Some(error),
            DragonflyError::JsonError(error) => Some(error),
            DragonflyError::CSVError(error) => Some(error),
            _ => None,
        }
    }
}

impl Display for DragonflyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DragonflyError::IoError(error) => write!(f, "I/O error: {error}"),
            DragonflyError::JsonError(error) => write!(f, "JSON error: {error}"),
            DragonflyError::CSVError(error) => write!(f, "CSV error: {error}"),
            DragonflyError::InvalidParameter { name, reason } => {
                write!(f, "invalid parameter `{name}`: {reason}")
            }
            DragonflyError::CannotMakeEdgeToSelf => {
                write!(f, "an edge cannot connect a location to itself")
            }
            DragonflyError::InvalidWeight => {
                write!(f, "edge weights must be finite and positive")
            }
            DragonflyError::UnknownLocation(location) => {
                write!(f, "location {location} is not part of the graph")
            }
            DragonflyError::MalformedEdgeRecord { line, reason } => {
                write!(f, "malformed edge record on line {line}: {reason}")
            }
            DragonflyError::DegenerateDistribution(reason) => {
                write!(f, "degenerate movement distribution: {reason}")
            }
            DragonflyError::ThreadPool(reason) => {
                write!(f, "failed to build worker pool: {reason}")
            }
            DragonflyError::ReportError(reason) => write!(f, "report error: {reason}"),
            DragonflyError::DragonflyError(reason) => write!(f, "{reason}"),
        }
    }
}
