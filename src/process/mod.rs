//! Running phpcbf against a buffer of source text.
//!
//! phpcbf only works on files, so one format call goes through three steps:
//!
//! **Stage:** write the text to a uniquely named file in the temp directory
//! ([`staging`]).
//!
//! **Run:** spawn phpcbf on that file and wait for it; the exit code says
//! whether anything was fixed ([`command`]).
//!
//! **Collect and clean up:** read the rewritten file back when fixes were
//! applied, then delete it on every path ([`pipeline`]).
//!
//! The entry point is [`Formatter::format`].

pub mod command;
pub mod pipeline;
pub mod staging;

pub use command::{build_arguments, classify_exit_code, FixStatus};
pub use pipeline::Formatter;
pub use staging::StagedFile;

/// Successful result of one format call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatOutcome {
    /// phpcbf found nothing to fix; the staged file was not read back
    NoFixesFound,
    /// All fixable problems were fixed
    Fixed(String),
    /// phpcbf fixed some problems but failed on others
    PartiallyFixed(String),
}

impl FormatOutcome {
    /// Rewritten text, if phpcbf produced any
    #[must_use]
    pub fn content(&self) -> Option<&str> {
        match self {
            Self::NoFixesFound => None,
            Self::Fixed(text) | Self::PartiallyFixed(text) => Some(text),
        }
    }

    /// Text to apply back to the document, or `None` when nothing changed.
    ///
    /// Content identical to `original` is treated the same as
    /// [`FormatOutcome::NoFixesFound`].
    #[must_use]
    pub fn into_edit(self, original: &str) -> Option<String> {
        match self {
            Self::NoFixesFound => None,
            Self::Fixed(text) | Self::PartiallyFixed(text) => (text != original).then_some(text),
        }
    }
}
