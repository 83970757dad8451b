//! Error types and result aliases for cbfmt.
//!
//! This module defines the error handling infrastructure:
//! - [`Result<T>`]: Type alias for `anyhow::Result<T>` used by the application layer
//! - [`FormatError`]: Classified failure of a single format call
//! - [`ErrorKind`]: Flat classification of a [`FormatError`], for callers that branch on it

use std::fmt;
use std::io;
use std::path::PathBuf;

use anyhow::Result as AnyhowResult;
use thiserror::Error;

use crate::process::FormatOutcome;

pub type Result<T> = AnyhowResult<T>;

/// Classification of a failed format call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    TempFileCreateFailed,
    TempFileDeleteFailed,
    TempFileReadFailed,
    ExecutableNotFound,
    EmptyFixResult,
    GeneralExecutionError,
    ApplicationConfigError,
    FixerConfigError,
    ApplicationException,
    UndefinedExitCode,
    ExecutionError,
}

impl ErrorKind {
    /// Stable identifier, suitable for logs and machine-readable output
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::TempFileCreateFailed => "temp_file_create_failed",
            Self::TempFileDeleteFailed => "temp_file_delete_failed",
            Self::TempFileReadFailed => "temp_file_read_failed",
            Self::ExecutableNotFound => "executable_not_found",
            Self::EmptyFixResult => "empty_fix_result",
            Self::GeneralExecutionError => "general_execution_error",
            Self::ApplicationConfigError => "application_config_error",
            Self::FixerConfigError => "fixer_config_error",
            Self::ApplicationException => "application_exception",
            Self::UndefinedExitCode => "undefined_exit_code",
            Self::ExecutionError => "execution_error",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one format call.
///
/// Every variant maps onto exactly one [`ErrorKind`]. The display strings are
/// meant to be shown to the user as-is.
#[derive(Debug, Error)]
pub enum FormatError {
    #[error("PHPCBF: An error occurred while creating the temp file {}", .path.display())]
    TempFileCreate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The staged file could not be removed.
    ///
    /// When the format itself had already succeeded, `outcome` carries its
    /// result so the caller can still decide what to do with the text.
    #[error("PHPCBF: An error occurred while deleting the temp file {}", .path.display())]
    TempFileDelete {
        path: PathBuf,
        #[source]
        source: io::Error,
        outcome: Option<FormatOutcome>,
    },

    #[error("PHPCBF: An error occurred while reading back the temp file {}", .path.display())]
    TempFileRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("PHPCBF: Executable path not found ({})", .executable.display())]
    ExecutableNotFound { executable: PathBuf },

    #[error("PHPCBF: Content is empty")]
    EmptyFixResult,

    #[error("PHPCBF: General script execution error")]
    GeneralExecution,

    #[error("PHPCBF: Configuration error of the application")]
    ApplicationConfig,

    #[error("PHPCBF: Configuration error of a fixer")]
    FixerConfig,

    #[error("PHPCBF: Exception raised within the application")]
    ApplicationException,

    #[error("PHPCBF: An unhandled error occurred ({})", describe_exit_code(.code))]
    UndefinedExitCode { code: Option<i32> },

    #[error("PHPCBF: Failed to execute {}: {}", .executable.display(), .source)]
    Execution {
        executable: PathBuf,
        #[source]
        source: io::Error,
    },
}

fn describe_exit_code(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}

impl FormatError {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::TempFileCreate { .. } => ErrorKind::TempFileCreateFailed,
            Self::TempFileDelete { .. } => ErrorKind::TempFileDeleteFailed,
            Self::TempFileRead { .. } => ErrorKind::TempFileReadFailed,
            Self::ExecutableNotFound { .. } => ErrorKind::ExecutableNotFound,
            Self::EmptyFixResult => ErrorKind::EmptyFixResult,
            Self::GeneralExecution => ErrorKind::GeneralExecutionError,
            Self::ApplicationConfig => ErrorKind::ApplicationConfigError,
            Self::FixerConfig => ErrorKind::FixerConfigError,
            Self::ApplicationException => ErrorKind::ApplicationException,
            Self::UndefinedExitCode { .. } => ErrorKind::UndefinedExitCode,
            Self::Execution { .. } => ErrorKind::ExecutionError,
        }
    }

    /// Outcome that was already determined before cleanup failed, if any
    #[must_use]
    pub fn recovered_outcome(&self) -> Option<&FormatOutcome> {
        match self {
            Self::TempFileDelete { outcome, .. } => outcome.as_ref(),
            _ => None,
        }
    }
}
