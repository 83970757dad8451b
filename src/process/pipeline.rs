//! Stage → run → collect → clean up
//!
//! Implements a single format call end to end. The staged file is removed
//! on every path, including classified failures; a removal failure is only
//! surfaced as the call's error when everything before it succeeded.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::FormatOptions;
use crate::error::FormatError;
use crate::process::command::{self, build_arguments, classify_exit_code, FixStatus};
use crate::process::staging::StagedFile;
use crate::process::FormatOutcome;
use crate::sink::MessageSink;

/// Runs phpcbf over text buffers.
///
/// Holds a read-only [`FormatOptions`] snapshot and the two sinks. A
/// `Formatter` can be shared between threads; concurrent calls each get
/// their own staged file and child process.
#[derive(Clone)]
pub struct Formatter {
    options: Arc<FormatOptions>,
    temp_dir: PathBuf,
    error_sink: Arc<dyn MessageSink>,
    debug_sink: Arc<dyn MessageSink>,
}

impl std::fmt::Debug for Formatter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Formatter")
            .field("options", &self.options)
            .field("temp_dir", &self.temp_dir)
            .finish_non_exhaustive()
    }
}

impl Formatter {
    /// Create a formatter staging its files in the system temp directory
    pub fn new(
        options: impl Into<Arc<FormatOptions>>,
        error_sink: Arc<dyn MessageSink>,
        debug_sink: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            options: options.into(),
            temp_dir: std::env::temp_dir(),
            error_sink,
            debug_sink,
        }
    }

    /// Stage files in `dir` instead of the system temp directory
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = dir.into();
        self
    }

    #[must_use]
    pub fn options(&self) -> &FormatOptions {
        &self.options
    }

    #[must_use]
    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    /// Format `text` with the configured standard
    pub fn format(&self, text: &str) -> Result<FormatOutcome, FormatError> {
        self.format_with_standard(text, self.options.standard.as_deref())
    }

    /// Format `text`, passing `standard` instead of the configured one
    pub fn format_with_standard(
        &self,
        text: &str,
        standard: Option<&str>,
    ) -> Result<FormatOutcome, FormatError> {
        let staged = StagedFile::create(&self.temp_dir, text)?;
        let args = build_arguments(staged.path(), standard, self.options.debug);
        let result = self.execute(&staged, &args);
        self.clean_up(staged, result)
    }

    fn execute(
        &self,
        staged: &StagedFile,
        args: &[std::ffi::OsString],
    ) -> Result<FormatOutcome, FormatError> {
        let executable = &self.options.executable_path;
        if self.options.debug {
            self.debug_sink
                .emit(&command::command_line(executable, args));
        }

        let code = command::run(
            executable,
            args,
            self.options.debug,
            &self.error_sink,
            &self.debug_sink,
        )?;

        match classify_exit_code(code)? {
            FixStatus::NothingToFix => Ok(FormatOutcome::NoFixesFound),
            FixStatus::Fixed => read_fixed(staged).map(FormatOutcome::Fixed),
            FixStatus::PartiallyFixed => read_fixed(staged).map(FormatOutcome::PartiallyFixed),
        }
    }

    fn clean_up(
        &self,
        staged: StagedFile,
        result: Result<FormatOutcome, FormatError>,
    ) -> Result<FormatOutcome, FormatError> {
        let path = staged.path().to_path_buf();
        let Err(source) = staged.remove() else {
            return result;
        };

        match result {
            Ok(outcome) => Err(FormatError::TempFileDelete {
                path,
                source,
                outcome: Some(outcome),
            }),
            Err(e) => {
                // The primary failure wins; the cleanup failure is only reported
                let cleanup = FormatError::TempFileDelete {
                    path,
                    source,
                    outcome: None,
                };
                self.error_sink.emit(&cleanup.to_string());
                Err(e)
            }
        }
    }
}

/// Read back a fixed file; an empty result is never a valid fix
fn read_fixed(staged: &StagedFile) -> Result<String, FormatError> {
    let content = staged.read_back()?;
    if content.is_empty() {
        return Err(FormatError::EmptyFixResult);
    }
    Ok(content)
}
