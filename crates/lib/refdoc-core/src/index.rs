//! In-memory symbol index.
//!
//! Built once from a reflected corpus and read-only afterwards. Classes keep
//! the order in which the corpus declared them; lookups go through FQN maps.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::{error::Error, fmt};

use futures::{StreamExt, TryStreamExt, stream};
use refdoc_store::models::{ClassDescriptor, MethodDescriptor};
use tracing::{debug, info};

use crate::corpus::{CorpusError, CorpusProvider, Reflector, SourceFile};
use crate::parsers::ParseError;

const DEFAULT_PARSE_CONCURRENCY: usize = 8;

#[derive(Debug)]
pub enum IndexBuildError {
    Corpus(CorpusError),
    Parse(ParseError),
    DuplicateSymbol(String),
    Join(String),
}

impl fmt::Display for IndexBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corpus(err) => write!(f, "{err}"),
            Self::Parse(err) => write!(f, "{err}"),
            Self::DuplicateSymbol(fqn) => write!(f, "duplicate symbol in corpus: {fqn}"),
            Self::Join(message) => write!(f, "index build task failed: {message}"),
        }
    }
}

impl Error for IndexBuildError {}

impl From<CorpusError> for IndexBuildError {
    fn from(err: CorpusError) -> Self {
        Self::Corpus(err)
    }
}

impl From<ParseError> for IndexBuildError {
    fn from(err: ParseError) -> Self {
        Self::Parse(err)
    }
}

impl From<tokio::task::JoinError> for IndexBuildError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Join(err.to_string())
    }
}

/// Options for building an index from a corpus.
#[derive(Debug, Clone)]
pub struct IndexBuildOptions {
    pub parse_concurrency: usize,
}

impl Default for IndexBuildOptions {
    fn default() -> Self {
        Self {
            parse_concurrency: DEFAULT_PARSE_CONCURRENCY,
        }
    }
}

impl IndexBuildOptions {
    #[must_use]
    pub fn with_parse_concurrency(mut self, parse_concurrency: usize) -> Self {
        self.parse_concurrency = parse_concurrency.max(1);
        self
    }
}

/// Location of a method inside the index.
#[derive(Debug, Clone, Copy)]
struct MethodSlot {
    class: usize,
    method: usize,
}

/// Immutable collection of reflected classes.
#[derive(Debug, Default)]
pub struct SymbolIndex {
    classes: Vec<Arc<ClassDescriptor>>,
    classes_by_fqn: HashMap<String, usize>,
    methods_by_fqn: HashMap<String, MethodSlot>,
}

impl SymbolIndex {
    /// Builds the index by enumerating and reflecting every corpus file.
    ///
    /// Files are reflected on blocking tasks with bounded concurrency; results
    /// are assembled in enumeration order.
    ///
    /// # Errors
    /// Returns `IndexBuildError` if the corpus cannot be enumerated, a file
    /// cannot be reflected, or two symbols share a fully-qualified name.
    pub async fn build<P, R>(
        root: impl AsRef<Path>,
        provider: Arc<P>,
        reflector: Arc<R>,
        options: IndexBuildOptions,
    ) -> Result<Self, IndexBuildError>
    where
        P: CorpusProvider + 'static,
        R: Reflector + 'static,
    {
        let root = root.as_ref().to_path_buf();
        let files: Vec<SourceFile> = {
            let root = root.clone();
            tokio::task::spawn_blocking(move || provider.enumerate(&root)).await??
        };
        debug!(root = %root.display(), files = files.len(), "corpus enumerated");

        let per_file: Vec<Vec<ClassDescriptor>> = stream::iter(files)
            .map(|file| {
                let reflector = reflector.clone();
                async move {
                    let classes =
                        tokio::task::spawn_blocking(move || reflector.reflect(&file)).await??;
                    Ok::<_, IndexBuildError>(classes)
                }
            })
            .buffered(options.parse_concurrency.max(1))
            .try_collect()
            .await?;

        let index = Self::from_classes(per_file.into_iter().flatten())?;
        info!(
            root = %root.display(),
            classes = index.class_count(),
            methods = index.method_count(),
            "symbol index built"
        );
        Ok(index)
    }

    /// Assembles an index from already reflected classes. Property lists are
    /// rebuilt from each class's `property` doc tags.
    ///
    /// # Errors
    /// Returns `IndexBuildError::DuplicateSymbol` if two classes, or two methods
    /// of one class, share a fully-qualified name.
    pub fn from_classes(
        classes: impl IntoIterator<Item = ClassDescriptor>,
    ) -> Result<Self, IndexBuildError> {
        let mut index = Self::default();
        for mut class in classes {
            class.derive_properties();
            let class_slot = index.classes.len();
            if index.classes_by_fqn.contains_key(&class.fqn) {
                return Err(IndexBuildError::DuplicateSymbol(class.fqn));
            }
            index.classes_by_fqn.insert(class.fqn.clone(), class_slot);

            for (method_slot, method) in class.methods.iter().enumerate() {
                if index.methods_by_fqn.contains_key(&method.fqn) {
                    return Err(IndexBuildError::DuplicateSymbol(method.fqn.clone()));
                }
                index.methods_by_fqn.insert(
                    method.fqn.clone(),
                    MethodSlot {
                        class: class_slot,
                        method: method_slot,
                    },
                );
            }
            index.classes.push(Arc::new(class));
        }
        Ok(index)
    }

    /// Iterates classes in definition order.
    pub fn all_classes(&self) -> impl Iterator<Item = &Arc<ClassDescriptor>> + '_ {
        self.classes.iter()
    }

    #[must_use]
    pub fn class(&self, fqn: &str) -> Option<&Arc<ClassDescriptor>> {
        self.classes_by_fqn.get(fqn).map(|slot| &self.classes[*slot])
    }

    #[must_use]
    pub fn method(&self, fqn: &str) -> Option<&MethodDescriptor> {
        let slot = self.methods_by_fqn.get(fqn)?;
        self.classes[slot.class].methods.get(slot.method)
    }

    /// Returns the class that owns the method with the given FQN.
    #[must_use]
    pub fn owner_of(&self, method_fqn: &str) -> Option<&Arc<ClassDescriptor>> {
        self.methods_by_fqn
            .get(method_fqn)
            .map(|slot| &self.classes[slot.class])
    }

    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    #[must_use]
    pub fn method_count(&self) -> usize {
        self.methods_by_fqn.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
