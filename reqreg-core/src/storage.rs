//! Document store abstraction
//!
//! A collection is a flat namespace of text documents addressed by key. The
//! renumbering engine and the other passes only talk to [`DocumentStore`], so
//! they can run against a directory on disk ([`DirStore`]) or against the
//! in-memory fake ([`MemoryStore`]) in tests.

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::ident::IdScheme;

/// Errors raised by document store operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// The collection directory does not exist
    #[error("Directory not found: {0}")]
    MissingDirectory(PathBuf),

    /// No document is stored under this key
    #[error("Document not found: {0}")]
    NotFound(String),

    /// A rename target is already taken
    #[error("Cannot rename {from} to {to}: target already exists")]
    AlreadyExists { from: String, to: String },

    /// Underlying IO failure on a document
    #[error("IO error on {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: io::Error,
    },
}

impl StoreError {
    fn io(key: &str, source: io::Error) -> Self {
        StoreError::Io {
            key: key.to_string(),
            source,
        }
    }
}

/// Operations the passes need from a collection of documents
pub trait DocumentStore {
    /// Human-readable location of the collection, used in messages
    fn location(&self) -> String;

    /// All document keys in the collection, sorted
    fn list_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Keys that are identifiers of `scheme`, sorted lexicographically
    fn list_matching(&self, scheme: &IdScheme) -> Result<Vec<String>, StoreError> {
        Ok(self
            .list_keys()?
            .into_iter()
            .filter(|key| scheme.is_identifier(key))
            .collect())
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError>;

    fn read(&self, key: &str) -> Result<String, StoreError>;

    fn write(&mut self, key: &str, text: &str) -> Result<(), StoreError>;

    /// Moves a document to a new key.
    ///
    /// Fails with [`StoreError::AlreadyExists`] rather than overwriting when
    /// `to` is taken.
    fn rename(&mut self, from: &str, to: &str) -> Result<(), StoreError>;
}

/// Directory of `<key>.<extension>` files
#[derive(Debug, Clone)]
pub struct DirStore {
    root: PathBuf,
    extension: String,
}

impl DirStore {
    /// Opens an existing directory as a document store
    pub fn open<P: AsRef<Path>>(root: P, extension: &str) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StoreError::MissingDirectory(root));
        }
        Ok(Self {
            root,
            extension: extension.trim_start_matches('.').to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the file backing `key`
    pub fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{}", key, self.extension))
    }
}

impl DocumentStore for DirStore {
    fn location(&self) -> String {
        self.root.display().to_string()
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let entries = fs::read_dir(&self.root).map_err(|e| StoreError::io(&self.location(), e))?;

        let mut keys = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StoreError::io(&self.location(), e))?.path();
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                keys.push(stem.to_string());
            }
        }
        keys.sort();
        Ok(keys)
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.path_for(key).is_file())
    }

    fn read(&self, key: &str) -> Result<String, StoreError> {
        let path = self.path_for(key);
        if !path.is_file() {
            return Err(StoreError::NotFound(key.to_string()));
        }
        fs::read_to_string(&path).map_err(|e| StoreError::io(key, e))
    }

    fn write(&mut self, key: &str, text: &str) -> Result<(), StoreError> {
        fs::write(self.path_for(key), text).map_err(|e| StoreError::io(key, e))
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        let source = self.path_for(from);
        let target = self.path_for(to);

        if !source.is_file() {
            return Err(StoreError::NotFound(from.to_string()));
        }
        // fs::rename silently replaces the target on Unix
        if target.exists() {
            return Err(StoreError::AlreadyExists {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        fs::rename(&source, &target).map_err(|e| StoreError::io(from, e))
    }
}

/// Sub-directories of `root` holding at least one identifier document,
/// sorted by path
pub fn discover_projects<P: AsRef<Path>>(
    root: P,
    extension: &str,
    scheme: &IdScheme,
) -> Result<Vec<PathBuf>, StoreError> {
    let root = root.as_ref();
    if !root.is_dir() {
        return Err(StoreError::MissingDirectory(root.to_path_buf()));
    }

    let location = root.display().to_string();
    let mut projects = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| StoreError::io(&location, e))? {
        let path = entry.map_err(|e| StoreError::io(&location, e))?.path();
        if !path.is_dir() {
            continue;
        }
        let store = DirStore::open(&path, extension)?;
        if !store.list_matching(scheme)?.is_empty() {
            projects.push(path);
        }
    }
    projects.sort();
    Ok(projects)
}

/// Operation kinds that a [`MemoryStore`] can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreOp {
    Read,
    Write,
    Rename,
}

/// In-memory document store used to exercise the passes without touching
/// the filesystem
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    documents: BTreeMap<String, String>,
    failures: HashSet<(StoreOp, String)>,
    writes: Vec<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a store from `(key, text)` pairs
    pub fn with_documents<I, K, V>(documents: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            documents: documents
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            ..Self::default()
        }
    }

    /// Makes every future `op` on `key` fail with an IO error
    pub fn fail_on(&mut self, op: StoreOp, key: &str) {
        self.failures.insert((op, key.to_string()));
    }

    /// Keys written so far, in order
    pub fn writes(&self) -> &[String] {
        &self.writes
    }

    pub fn documents(&self) -> &BTreeMap<String, String> {
        &self.documents
    }

    fn check(&self, op: StoreOp, key: &str) -> Result<(), StoreError> {
        if self.failures.contains(&(op, key.to_string())) {
            return Err(StoreError::io(
                key,
                io::Error::new(io::ErrorKind::Other, format!("injected {:?} failure", op)),
            ));
        }
        Ok(())
    }
}

impl DocumentStore for MemoryStore {
    fn location(&self) -> String {
        "<memory>".to_string()
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        Ok(self.documents.keys().cloned().collect())
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.documents.contains_key(key))
    }

    fn read(&self, key: &str) -> Result<String, StoreError> {
        self.check(StoreOp::Read, key)?;
        self.documents
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(key.to_string()))
    }

    fn write(&mut self, key: &str, text: &str) -> Result<(), StoreError> {
        self.check(StoreOp::Write, key)?;
        self.documents.insert(key.to_string(), text.to_string());
        self.writes.push(key.to_string());
        Ok(())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), StoreError> {
        self.check(StoreOp::Rename, from)?;
        if self.documents.contains_key(to) {
            return Err(StoreError::AlreadyExists {
                from: from.to_string(),
                to: to.to_string(),
            });
        }
        let text = self
            .documents
            .remove(from)
            .ok_or_else(|| StoreError::NotFound(from.to_string()))?;
        self.documents.insert(to.to_string(), text);
        Ok(())
    }
}
