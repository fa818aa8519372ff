//! Corpus enumeration and reflection seams.
//!
//! The index consumes a [`CorpusProvider`] to list source files and a
//! [`Reflector`] to turn each file into class descriptors.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::{error::Error, fmt, fs};

use refdoc_store::models::ClassDescriptor;

use crate::parsers::{ParseError, ReflectionJsonParser};

/// Handle to one file of the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
}

impl SourceFile {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn display_path(&self) -> String {
        self.path.display().to_string()
    }
}

#[derive(Debug)]
pub enum CorpusError {
    NotADirectory(PathBuf),
    Io { path: PathBuf, source: std::io::Error },
}

impl fmt::Display for CorpusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotADirectory(path) => {
                write!(f, "corpus root is not a directory: {}", path.display())
            }
            Self::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
        }
    }
}

impl Error for CorpusError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::NotADirectory(_) => None,
            Self::Io { source, .. } => Some(source),
        }
    }
}

/// Lists the files that make up a corpus.
pub trait CorpusProvider: Send + Sync {
    /// Enumerates parseable files below `root`.
    ///
    /// # Errors
    /// Returns `CorpusError` if the tree cannot be walked.
    fn enumerate(&self, root: &Path) -> Result<Vec<SourceFile>, CorpusError>;
}

/// Turns one source file into the classes it declares.
pub trait Reflector: Send + Sync {
    /// Reflects a single file.
    ///
    /// # Errors
    /// Returns `ParseError` if the file cannot be read or understood.
    fn reflect(&self, file: &SourceFile) -> Result<Vec<ClassDescriptor>, ParseError>;
}

impl Reflector for ReflectionJsonParser {
    fn reflect(&self, file: &SourceFile) -> Result<Vec<ClassDescriptor>, ParseError> {
        Self::parse_file(&file.path)
    }
}

/// Filesystem corpus walked recursively.
#[derive(Debug, Clone)]
pub struct FsCorpus {
    extensions: BTreeSet<String>,
}

impl Default for FsCorpus {
    fn default() -> Self {
        Self::new(["json"])
    }
}

impl FsCorpus {
    pub fn new<I, S>(extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_ascii_lowercase())
                .filter(|ext| !ext.is_empty())
                .collect(),
        }
    }

    fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| self.extensions.contains(&ext.to_ascii_lowercase()))
    }

    fn walk(&self, dir: &Path, files: &mut Vec<SourceFile>) -> Result<(), CorpusError> {
        let io_err = |source| CorpusError::Io {
            path: dir.to_path_buf(),
            source,
        };
        let mut entries = fs::read_dir(dir)
            .map_err(io_err)?
            .collect::<Result<Vec<_>, _>>()
            .map_err(io_err)?;
        entries.sort_by_key(fs::DirEntry::file_name);

        for entry in entries {
            if entry.file_name().to_string_lossy().starts_with('.') {
                continue;
            }
            let path = entry.path();
            let file_type = entry.file_type().map_err(|source| CorpusError::Io {
                path: path.clone(),
                source,
            })?;
            if file_type.is_dir() {
                self.walk(&path, files)?;
            } else if self.accepts(&path) {
                files.push(SourceFile::new(path));
            }
        }
        Ok(())
    }
}

impl CorpusProvider for FsCorpus {
    fn enumerate(&self, root: &Path) -> Result<Vec<SourceFile>, CorpusError> {
        if !root.is_dir() {
            return Err(CorpusError::NotADirectory(root.to_path_buf()));
        }
        let mut files = Vec::new();
        self.walk(root, &mut files)?;
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT_DIR: AtomicUsize = AtomicUsize::new(0);

    fn scratch_dir() -> PathBuf {
        let id = NEXT_DIR.fetch_add(1, Ordering::SeqCst);
        let dir = std::env::temp_dir().join(format!(
            "refdoc-corpus-{}-{id}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create scratch dir");
        dir
    }

    #[test]
    fn walks_recursively_in_sorted_order() {
        let root = scratch_dir();
        fs::create_dir_all(root.join("b/nested")).expect("create nested");
        fs::create_dir_all(root.join(".hidden")).expect("create hidden");
        fs::write(root.join("z.json"), "{}").expect("write z");
        fs::write(root.join("a.JSON"), "{}").expect("write a");
        fs::write(root.join("b/nested/c.json"), "{}").expect("write c");
        fs::write(root.join("b/readme.md"), "").expect("write md");
        fs::write(root.join(".hidden/d.json"), "{}").expect("write hidden");

        let files = FsCorpus::default().enumerate(&root).expect("walk corpus");
        let names: Vec<String> = files
            .iter()
            .map(|file| {
                file.path
                    .strip_prefix(&root)
                    .expect("inside root")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect();
        assert_eq!(names, ["a.JSON", "b/nested/c.json", "z.json"]);

        let _ = fs::remove_dir_all(&root);
    }

    #[test]
    fn missing_root_is_an_error() {
        let root = scratch_dir().join("missing");
        let err = FsCorpus::new([".json"])
            .enumerate(&root)
            .expect_err("missing root should fail");
        assert!(matches!(err, CorpusError::NotADirectory(_)));
    }
}
