//! Formatting documents with reloadable settings.
//!
//! A [`FormatSession`] is what an editor integration (or the CLI) talks to.
//! It keeps the active [`FormatOptions`] snapshot, picks the standard for
//! each document (running ruleset discovery when enabled) and only hands
//! back text that actually differs from the input.

use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use crate::config::FormatOptions;
use crate::error::FormatError;
use crate::process::Formatter;
use crate::ruleset::resolve_ruleset;
use crate::sink::MessageSink;

pub struct FormatSession {
    options: RwLock<Arc<FormatOptions>>,
    temp_dir: Option<PathBuf>,
    error_sink: Arc<dyn MessageSink>,
    debug_sink: Arc<dyn MessageSink>,
}

impl FormatSession {
    pub fn new(
        options: FormatOptions,
        error_sink: Arc<dyn MessageSink>,
        debug_sink: Arc<dyn MessageSink>,
    ) -> Self {
        Self {
            options: RwLock::new(Arc::new(options)),
            temp_dir: None,
            error_sink,
            debug_sink,
        }
    }

    /// Stage files in `dir` instead of the system temp directory
    #[must_use]
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Current options snapshot
    #[must_use]
    pub fn options(&self) -> Arc<FormatOptions> {
        Arc::clone(&self.options.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Replace the options wholesale.
    ///
    /// Calls already in flight finish with the snapshot they started with.
    pub fn reload(&self, options: FormatOptions) {
        *self.options.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(options);
    }

    /// Standard to use for `document` under the given options.
    ///
    /// A ruleset file found by config search takes precedence over the
    /// configured standard for this document only.
    #[must_use]
    pub fn resolve_standard(&self, options: &FormatOptions, document: &Path) -> Option<String> {
        if options.config_search {
            if let Some(ruleset) =
                resolve_ruleset(document, &options.config_filenames, self.error_sink.as_ref())
            {
                if options.debug {
                    self.debug_sink
                        .emit(&format!("Using ruleset {}", ruleset.display()));
                }
                return Some(ruleset.to_string_lossy().into_owned());
            }
        }
        options.standard.clone()
    }

    /// Format the text of `document`.
    ///
    /// Returns `Ok(None)` when there is nothing to apply: phpcbf found no
    /// fixes, or its output equals `text`.
    pub fn format_document(
        &self,
        document: &Path,
        text: &str,
    ) -> Result<Option<String>, FormatError> {
        let options = self.options();
        let standard = self.resolve_standard(&options, document);

        let mut formatter = Formatter::new(
            options,
            Arc::clone(&self.error_sink),
            Arc::clone(&self.debug_sink),
        );
        if let Some(dir) = &self.temp_dir {
            formatter = formatter.with_temp_dir(dir);
        }

        let outcome = formatter.format_with_standard(text, standard.as_deref())?;
        Ok(outcome.into_edit(text))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;
    use crate::error::ErrorKind;
    use crate::sink::NullSink;

    fn session(options: FormatOptions) -> FormatSession {
        FormatSession::new(options, Arc::new(NullSink), Arc::new(NullSink))
    }

    #[test]
    fn test_reload_replaces_snapshot() {
        let session = session(FormatOptions::default());
        let before = session.options();

        session.reload(FormatOptions {
            standard: Some("PSR12".to_string()),
            ..Default::default()
        });

        // The old snapshot is untouched
        assert_eq!(before.standard, None);
        assert_eq!(session.options().standard.as_deref(), Some("PSR12"));
    }

    #[test]
    fn test_resolve_standard_prefers_ruleset_file() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("project");
        fs::create_dir_all(&dir).unwrap();
        let ruleset = dir.join("phpcs.xml");
        fs::write(&ruleset, "<ruleset/>").unwrap();

        let options = FormatOptions {
            standard: Some("PSR2".to_string()),
            config_search: true,
            ..Default::default()
        };
        let session = session(options.clone());

        let standard = session.resolve_standard(&options, &dir.join("index.php"));
        assert_eq!(standard, Some(ruleset.to_string_lossy().into_owned()));
        // The configured standard is not overwritten
        assert_eq!(session.options().standard.as_deref(), Some("PSR2"));
    }

    #[test]
    fn test_resolve_standard_falls_back_to_configured() {
        let tmp = TempDir::new().unwrap();
        let options = FormatOptions {
            standard: Some("PSR2".to_string()),
            config_search: true,
            config_filenames: vec!["cbfmt-test-no-such-ruleset.xml".to_string()],
            ..Default::default()
        };
        let session = session(options.clone());

        let standard = session.resolve_standard(&options, &tmp.path().join("index.php"));
        assert_eq!(standard.as_deref(), Some("PSR2"));
    }

    #[test]
    fn test_resolve_standard_without_search_ignores_ruleset_files() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("phpcs.xml"), "<ruleset/>").unwrap();

        let options = FormatOptions::default();
        let session = session(options.clone());
        assert_eq!(
            session.resolve_standard(&options, &tmp.path().join("index.php")),
            None
        );
    }

    #[test]
    fn test_format_document_surfaces_errors() {
        let tmp = TempDir::new().unwrap();
        let options = FormatOptions {
            executable_path: PathBuf::from("/cbfmt-nonexistent/phpcbf"),
            ..Default::default()
        };
        let session = session(options).with_temp_dir(tmp.path());

        let err = session
            .format_document(&tmp.path().join("index.php"), "<?php\n")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ExecutableNotFound);
    }
}
