//! Application-level errors (wraps domain errors)

use std::path::PathBuf;
use thiserror::Error;

use crate::domain::{DiameterMethod, DomainError};

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("cannot load reconstruction {label}")]
    Load {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot export longest path of {label}")]
    Export {
        label: String,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "{label}: diameter by {first} ({first_value}) and {second} ({second_value}) disagree beyond tolerance {tolerance}"
    )]
    MethodsDisagree {
        label: String,
        first: DiameterMethod,
        first_value: f64,
        second: DiameterMethod,
        second_value: f64,
        tolerance: f64,
    },

    #[error("no reconstruction files matched in {0}")]
    NoFilesMatched(PathBuf),

    #[error("config error: {message}")]
    Config { message: String },

    #[error("operation failed: {context}")]
    OperationFailed {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl ApplicationError {
    /// The underlying I/O error kind of a failed load, if any.
    pub fn io_kind(&self) -> Option<std::io::ErrorKind> {
        match self {
            ApplicationError::Load { source, .. } | ApplicationError::Export { source, .. } => {
                Some(source.kind())
            }
            ApplicationError::OperationFailed { source, .. } => source
                .downcast_ref::<std::io::Error>()
                .map(|e| e.kind()),
            _ => None,
        }
    }
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
