//! cbfmt - Format PHP code with phpcbf
//!
//! Runs PHP_CodeSniffer's beautifier over in-memory text: the text is staged
//! to a temp file, phpcbf rewrites it in place, and the result is read back.
//! The nearest phpcs ruleset file can be picked up automatically.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::module_name_repetitions)]

pub mod cli;
pub mod config;
pub mod error;
pub mod process;
pub mod ruleset;
pub mod session;
pub mod sink;

// Re-export commonly used types
pub use cli::{build_cli, parse_args, parse_args_from, CliArgs};
pub use config::{Config, FormatOptions};
pub use error::{ErrorKind, FormatError, Result};
pub use process::{FormatOutcome, Formatter};
pub use ruleset::{resolve_ruleset, DEFAULT_RULESET_FILENAMES};
pub use session::FormatSession;
