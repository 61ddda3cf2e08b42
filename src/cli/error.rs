//! CLI-level errors (wraps infrastructure errors)

use std::io::ErrorKind;

use thiserror::Error;

use crate::application::ApplicationError;
use crate::infrastructure::InfraError;

/// CLI errors are the top-level error type.
/// These are what get displayed to the user.
#[derive(Error, Debug)]
pub enum CliError {
    #[error("{0}")]
    Infra(#[from] InfraError),

    #[error("{0}")]
    Usage(String),
}

impl From<ApplicationError> for CliError {
    fn from(e: ApplicationError) -> Self {
        CliError::Infra(InfraError::Application(e))
    }
}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

impl CliError {
    /// Get the appropriate exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Usage(_) => crate::exitcode::USAGE,
            CliError::Infra(e) => match e {
                InfraError::Io { .. } => crate::exitcode::IOERR,
                InfraError::Application(app) => application_exit_code(app),
            },
        }
    }
}

fn application_exit_code(e: &ApplicationError) -> i32 {
    use crate::exitcode;

    match e {
        ApplicationError::Domain(_) => exitcode::DATAERR,
        ApplicationError::MethodsDisagree { .. } => exitcode::SOFTWARE,
        ApplicationError::Config { .. } => exitcode::CONFIG,
        ApplicationError::NoFilesMatched(_) => exitcode::NOINPUT,
        ApplicationError::Export { .. } => exitcode::CANTCREAT,
        ApplicationError::Load { .. } | ApplicationError::OperationFailed { .. } => {
            match e.io_kind() {
                Some(ErrorKind::NotFound) => exitcode::NOINPUT,
                Some(ErrorKind::InvalidData) => exitcode::DATAERR,
                Some(_) => exitcode::IOERR,
                None => exitcode::SOFTWARE,
            }
        }
    }
}
