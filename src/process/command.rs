//! Invoking the phpcbf executable.
//!
//! phpcbf exit codes:
//! - 0: no fixable errors were found, so nothing was fixed
//! - 1: all fixable errors were fixed
//! - 2: some fixable errors could not be fixed
//! - 3: general script execution error
//! - 16: configuration error of the application
//! - 32: configuration error of a fixer
//! - 64: exception raised within the application

use std::ffi::OsString;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use crate::error::FormatError;
use crate::sink::MessageSink;

const EXIT_NO_FIXES: i32 = 0;
const EXIT_FIXED: i32 = 1;
const EXIT_PARTIALLY_FIXED: i32 = 2;
const EXIT_GENERAL_ERROR: i32 = 3;
const EXIT_APPLICATION_CONFIG_ERROR: i32 = 16;
const EXIT_FIXER_CONFIG_ERROR: i32 = 32;
const EXIT_APPLICATION_EXCEPTION: i32 = 64;

/// What a successful phpcbf run did to the staged file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FixStatus {
    NothingToFix,
    Fixed,
    PartiallyFixed,
}

/// Map a phpcbf exit code onto a fix status or a classified error.
///
/// `None` means the process was terminated without an exit code (by a
/// signal) and is treated like any other unknown code.
pub fn classify_exit_code(code: Option<i32>) -> Result<FixStatus, FormatError> {
    match code {
        Some(EXIT_NO_FIXES) => Ok(FixStatus::NothingToFix),
        Some(EXIT_FIXED) => Ok(FixStatus::Fixed),
        Some(EXIT_PARTIALLY_FIXED) => Ok(FixStatus::PartiallyFixed),
        Some(EXIT_GENERAL_ERROR) => Err(FormatError::GeneralExecution),
        Some(EXIT_APPLICATION_CONFIG_ERROR) => Err(FormatError::ApplicationConfig),
        Some(EXIT_FIXER_CONFIG_ERROR) => Err(FormatError::FixerConfig),
        Some(EXIT_APPLICATION_EXCEPTION) => Err(FormatError::ApplicationException),
        code => Err(FormatError::UndefinedExitCode { code }),
    }
}

/// Build the phpcbf argument list.
///
/// Order is fixed: verbosity flag, staged file, then `--standard=<name>`
/// only when a standard is set.
#[must_use]
pub fn build_arguments(staged: &Path, standard: Option<&str>, debug: bool) -> Vec<OsString> {
    let mut args = vec![
        OsString::from(if debug { "-l" } else { "-lq" }),
        staged.as_os_str().to_os_string(),
    ];
    if let Some(standard) = standard.filter(|s| !s.is_empty()) {
        args.push(OsString::from(format!("--standard={standard}")));
    }
    args
}

/// Render a command line for debug output
#[must_use]
pub fn command_line(executable: &Path, args: &[OsString]) -> String {
    let mut line = executable.display().to_string();
    for arg in args {
        line.push(' ');
        line.push_str(&arg.to_string_lossy());
    }
    line
}

/// How long a finished run waits for its debug output to drain.
///
/// The pipes stay open as long as anything the child started holds them.
const STREAM_DRAIN_GRACE: Duration = Duration::from_millis(250);

/// Spawn `executable` and wait for it to exit, returning its exit code.
///
/// With `debug` set, the child's stdout is forwarded line by line to
/// `debug_sink` and its stderr to `error_sink` while the child runs.
/// Otherwise both streams are discarded. Completion depends only on the
/// child exiting; streams still open after a short grace period keep being
/// forwarded in the background.
pub fn run(
    executable: &Path,
    args: &[OsString],
    debug: bool,
    error_sink: &Arc<dyn MessageSink>,
    debug_sink: &Arc<dyn MessageSink>,
) -> Result<Option<i32>, FormatError> {
    let mut command = Command::new(executable);
    command.args(args).stdin(Stdio::null());
    if debug {
        command.stdout(Stdio::piped()).stderr(Stdio::piped());
    } else {
        command.stdout(Stdio::null()).stderr(Stdio::null());
    }

    let mut child = command
        .spawn()
        .map_err(|source| spawn_error(executable, source))?;

    // Each forwarder holds a sender; the channel disconnects once all are done
    let (drained_tx, drained_rx) = mpsc::channel::<()>();
    if let Some(stdout) = child.stdout.take() {
        spawn_forwarder(stdout, "[stdout]", Arc::clone(debug_sink), drained_tx.clone());
    }
    if let Some(stderr) = child.stderr.take() {
        spawn_forwarder(stderr, "[stderr]", Arc::clone(error_sink), drained_tx.clone());
    }
    drop(drained_tx);

    let status = child.wait().map_err(|source| FormatError::Execution {
        executable: executable.to_path_buf(),
        source,
    })?;

    if debug {
        let _ = drained_rx.recv_timeout(STREAM_DRAIN_GRACE);
    }
    Ok(status.code())
}

fn spawn_forwarder<R: Read + Send + 'static>(
    stream: R,
    prefix: &'static str,
    sink: Arc<dyn MessageSink>,
    drained: mpsc::Sender<()>,
) {
    thread::spawn(move || {
        forward_lines(stream, prefix, sink.as_ref());
        drop(drained);
    });
}

fn spawn_error(executable: &Path, source: io::Error) -> FormatError {
    if source.kind() == io::ErrorKind::NotFound {
        FormatError::ExecutableNotFound {
            executable: executable.to_path_buf(),
        }
    } else {
        FormatError::Execution {
            executable: executable.to_path_buf(),
            source,
        }
    }
}

/// Forward each line read from `stream` to `sink` as `"<prefix> <line>"`
fn forward_lines<R: Read>(stream: R, prefix: &str, sink: &dyn MessageSink) {
    let mut reader = BufReader::new(stream);
    let mut buf = Vec::new();
    loop {
        buf.clear();
        match reader.read_until(b'\n', &mut buf) {
            Ok(0) | Err(_) => break,
            Ok(_) => {
                let line = String::from_utf8_lossy(&buf);
                sink.emit(&format!("{prefix} {}", line.trim_end_matches(['\r', '\n'])));
            }
        }
    }
}
