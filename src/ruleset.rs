//! Ruleset discovery.
//!
//! phpcbf picks its rules from a `--standard` argument, which may be a
//! standard name (`PSR12`) or the path of a ruleset XML file. When config
//! search is enabled, the ruleset file nearest to the document being
//! formatted is used: directories are scanned from the document's parent
//! up to the filesystem root and the first directory containing any
//! recognized filename wins.

use std::fs;
use std::path::{Path, PathBuf};

use crate::sink::MessageSink;

/// Ruleset filenames recognized by default, in priority order
pub const DEFAULT_RULESET_FILENAMES: &[&str] = &[
    ".phpcs.xml",
    ".phpcs.xml.dist",
    "phpcs.xml",
    "phpcs.xml.dist",
    "phpcs.ruleset.xml",
    "ruleset.xml",
];

/// The default filename list as owned strings
#[must_use]
pub fn default_ruleset_filenames() -> Vec<String> {
    DEFAULT_RULESET_FILENAMES
        .iter()
        .map(ToString::to_string)
        .collect()
}

/// Find the ruleset file that applies to `document`.
///
/// `document` is the path of the file being formatted; it does not need to
/// exist. Directories that cannot be listed are reported to `error_sink` as
/// `"<dir> - <reason>"` and skipped. Within a directory the first entry (in
/// listing order) whose name is in `filenames` is returned.
pub fn resolve_ruleset(
    document: &Path,
    filenames: &[String],
    error_sink: &dyn MessageSink,
) -> Option<PathBuf> {
    let start = document.parent()?;

    for dir in start.ancestors() {
        if dir.as_os_str().is_empty() {
            continue;
        }

        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                error_sink.emit(&format!("{} - {e}", dir.display()));
                continue;
            }
        };

        for entry in entries {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    error_sink.emit(&format!("{} - {e}", dir.display()));
                    continue;
                }
            };
            let name = entry.file_name();
            if filenames.iter().any(|f| name.as_os_str() == f.as_str()) {
                return Some(dir.join(name));
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use tempfile::TempDir;

    use super::*;
    use crate::sink::NullSink;

    /// Build `<tmp>/a/b/c` and return the temp dir plus the path of `file.php` inside `c`
    fn nested_tree() -> (TempDir, PathBuf) {
        let tmp = TempDir::new().unwrap();
        let deepest = tmp.path().join("a").join("b").join("c");
        fs::create_dir_all(&deepest).unwrap();
        let file = deepest.join("file.php");
        fs::write(&file, "<?php\n").unwrap();
        (tmp, file)
    }

    #[test]
    fn test_default_filenames_order() {
        let names = default_ruleset_filenames();
        assert_eq!(names.len(), 6);
        assert_eq!(names[0], ".phpcs.xml");
        assert_eq!(names[5], "ruleset.xml");
    }

    #[test]
    fn test_finds_ruleset_in_ancestor() {
        let (tmp, file) = nested_tree();
        let ruleset = tmp.path().join("a").join("b").join("ruleset.xml");
        fs::write(&ruleset, "<ruleset/>").unwrap();

        let found = resolve_ruleset(&file, &default_ruleset_filenames(), &NullSink);
        assert_eq!(found, Some(ruleset));
    }

    #[test]
    fn test_nearest_directory_wins() {
        let (tmp, file) = nested_tree();
        fs::write(tmp.path().join("a/b/ruleset.xml"), "<ruleset/>").unwrap();
        let nearer = tmp.path().join("a/b/c/phpcs.xml");
        fs::write(&nearer, "<ruleset/>").unwrap();

        let found = resolve_ruleset(&file, &default_ruleset_filenames(), &NullSink);
        assert_eq!(found, Some(nearer));
    }

    #[test]
    fn test_no_match_returns_none() {
        let (_tmp, file) = nested_tree();
        let filenames = vec!["cbfmt-test-no-such-ruleset.xml".to_string()];

        assert_eq!(resolve_ruleset(&file, &filenames, &NullSink), None);
    }

    #[test]
    fn test_custom_filename_list_replaces_defaults() {
        let (tmp, file) = nested_tree();
        fs::write(tmp.path().join("a/b/c/ruleset.xml"), "<ruleset/>").unwrap();
        let custom = tmp.path().join("a/my-rules.xml");
        fs::write(&custom, "<ruleset/>").unwrap();

        let filenames = vec!["my-rules.xml".to_string()];
        assert_eq!(resolve_ruleset(&file, &filenames, &NullSink), Some(custom));
    }

    #[test]
    fn test_unlistable_directories_are_reported_and_skipped() {
        let errors = Mutex::new(Vec::new());
        let sink = |message: &str| errors.lock().unwrap().push(message.to_string());

        let file = PathBuf::from("/cbfmt-nonexistent/x/y/file.php");
        let filenames = vec!["cbfmt-test-no-such-ruleset.xml".to_string()];
        assert_eq!(resolve_ruleset(&file, &filenames, &sink), None);

        let errors = errors.into_inner().unwrap();
        assert_eq!(errors.len(), 3);
        assert!(errors[0].starts_with("/cbfmt-nonexistent/x/y - "));
        assert!(errors[2].starts_with("/cbfmt-nonexistent - "));
    }

    #[test]
    fn test_relative_path_without_parent_directory() {
        // "file.php" has an empty parent, which is skipped entirely
        let filenames = default_ruleset_filenames();
        assert_eq!(
            resolve_ruleset(Path::new("file.php"), &filenames, &NullSink),
            None
        );
    }
}
