//! Staged copies of the text being formatted.
//!
//! Each format call owns exactly one staged file, named
//! `temp-<10 lowercase letters>.php`. Names are created with create-new
//! semantics so two concurrent calls can never end up sharing a file.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rand::Rng;

use crate::error::FormatError;

/// Extension given to staged files; phpcbf picks its tokenizer from it
pub const STAGED_EXTENSION: &str = "php";

/// Length of the random part of a staged file name
const TOKEN_LEN: usize = 10;

/// Attempts at finding an unused name before giving up
const MAX_CREATE_ATTEMPTS: usize = 16;

/// Random lowercase token used in staged file names
#[must_use]
pub fn random_token() -> String {
    let mut rng = rand::thread_rng();
    (0..TOKEN_LEN)
        .map(|_| char::from(rng.gen_range(b'a'..=b'z')))
        .collect()
}

/// File name for a staged copy with the given token
#[must_use]
pub fn staged_file_name(token: &str) -> String {
    format!("temp-{token}.{STAGED_EXTENSION}")
}

/// A temporary on-disk copy of the text being formatted.
///
/// Deletion is attempted exactly once: either explicitly through
/// [`StagedFile::remove`], or on drop if `remove` was never reached.
#[derive(Debug)]
pub struct StagedFile {
    path: PathBuf,
    removal_attempted: bool,
}

impl StagedFile {
    /// Write `content` to a fresh file in `dir`
    pub fn create(dir: &Path, content: &str) -> Result<Self, FormatError> {
        let mut last_collision = None;

        for _ in 0..MAX_CREATE_ATTEMPTS {
            let path = dir.join(staged_file_name(&random_token()));
            let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => file,
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    last_collision = Some(path);
                    continue;
                }
                Err(source) => return Err(FormatError::TempFileCreate { path, source }),
            };

            if let Err(source) = file.write_all(content.as_bytes()).and_then(|()| file.flush()) {
                drop(file);
                let source = discard_partial(&path, source);
                return Err(FormatError::TempFileCreate { path, source });
            }

            return Ok(Self {
                path,
                removal_attempted: false,
            });
        }

        Err(FormatError::TempFileCreate {
            path: last_collision.unwrap_or_else(|| dir.to_path_buf()),
            source: io::Error::new(
                io::ErrorKind::AlreadyExists,
                "no unused temp file name found",
            ),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the (possibly rewritten) content back as UTF-8 text
    pub fn read_back(&self) -> Result<String, FormatError> {
        fs::read_to_string(&self.path).map_err(|source| FormatError::TempFileRead {
            path: self.path.clone(),
            source,
        })
    }

    /// Delete the staged file
    pub fn remove(mut self) -> io::Result<()> {
        self.removal_attempted = true;
        fs::remove_file(&self.path)
    }
}

/// Remove a partially written file, folding a removal failure into `source`
fn discard_partial(path: &Path, source: io::Error) -> io::Error {
    match fs::remove_file(path) {
        Ok(()) => source,
        Err(e) if e.kind() == io::ErrorKind::NotFound => source,
        Err(e) => io::Error::new(
            source.kind(),
            format!("{source} (partial file could not be removed: {e})"),
        ),
    }
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        if !self.removal_attempted {
            let _ = fs::remove_file(&self.path);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rayon::prelude::*;
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_random_token_shape() {
        let token = random_token();
        assert_eq!(token.len(), TOKEN_LEN);
        assert!(token.chars().all(|c| c.is_ascii_lowercase()));
    }

    #[test]
    fn test_staged_file_name() {
        assert_eq!(staged_file_name("abcdefghij"), "temp-abcdefghij.php");
    }

    #[test]
    fn test_create_writes_content() {
        let tmp = TempDir::new().unwrap();
        let staged = StagedFile::create(tmp.path(), "<?php\necho 1;\n").unwrap();

        let name = staged.path().file_name().unwrap().to_str().unwrap();
        assert!(name.starts_with("temp-"));
        assert!(name.ends_with(".php"));
        assert_eq!(staged.path().parent(), Some(tmp.path()));

        // Byte-identical round trip when nothing rewrote the file
        assert_eq!(staged.read_back().unwrap(), "<?php\necho 1;\n");
        staged.remove().unwrap();
    }

    #[test]
    fn test_remove_deletes_file() {
        let tmp = TempDir::new().unwrap();
        let staged = StagedFile::create(tmp.path(), "x").unwrap();
        let path = staged.path().to_path_buf();

        staged.remove().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_remove_reports_missing_file() {
        let tmp = TempDir::new().unwrap();
        let staged = StagedFile::create(tmp.path(), "x").unwrap();
        fs::remove_file(staged.path()).unwrap();

        let err = staged.remove().unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_drop_cleans_up_when_remove_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = {
            let staged = StagedFile::create(tmp.path(), "x").unwrap();
            staged.path().to_path_buf()
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_create_in_missing_directory_fails() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("does-not-exist");

        let err = StagedFile::create(&missing, "x").unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::TempFileCreateFailed);
    }

    #[test]
    fn test_discard_partial_removes_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("temp-partialxxx.php");
        fs::write(&path, "<?ph").unwrap();

        let err = discard_partial(&path, io::Error::new(io::ErrorKind::WriteZero, "disk full"));
        assert_eq!(err.to_string(), "disk full");
        assert!(!path.exists());
    }

    #[test]
    fn test_discard_partial_reports_removal_failure() {
        let tmp = TempDir::new().unwrap();
        // A directory cannot be removed with remove_file
        let path = tmp.path().join("temp-stuckxxxxx.php");
        fs::create_dir(&path).unwrap();

        let err = discard_partial(&path, io::Error::new(io::ErrorKind::WriteZero, "disk full"));
        assert_eq!(err.kind(), io::ErrorKind::WriteZero);
        let message = err.to_string();
        assert!(message.starts_with("disk full"), "{message}");
        assert!(message.contains("partial file could not be removed"), "{message}");
    }

    #[test]
    fn test_concurrent_creates_use_distinct_names() {
        let tmp = TempDir::new().unwrap();

        let staged: Vec<StagedFile> = (0..1000)
            .into_par_iter()
            .map(|i| StagedFile::create(tmp.path(), &format!("<?php // {i}\n")).unwrap())
            .collect();

        let names: HashSet<PathBuf> = staged.iter().map(|s| s.path().to_path_buf()).collect();
        assert_eq!(names.len(), 1000);
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 1000);

        for file in staged {
            file.remove().unwrap();
        }
        assert_eq!(fs::read_dir(tmp.path()).unwrap().count(), 0);
    }
}
