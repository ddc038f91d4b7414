//! Function descriptor lookup by canonical identifier
//!
//! Services reference their functions by `(vendor, name, version)`. A
//! [`FunctionLoader`] maps such a reference to a descriptor file, which the
//! storage then loads. When no descriptor matches exactly but a single one
//! shares vendor and name, that one is returned so the integrity layer can
//! report the version mismatch instead of a missing function.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use sonata_core::{classify, read_descriptor, DescriptorId, DescriptorKind};
use tracing::debug;
use walkdir::WalkDir;

use crate::error::{Error, Result};
use crate::storage::Package;

/// Locates function descriptor files
pub trait FunctionLoader: Send + Sync {
    fn locate(&self, reference: &DescriptorId) -> Option<PathBuf>;
}

/// Loader that never finds anything
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFunctions;

impl FunctionLoader for NoFunctions {
    fn locate(&self, _reference: &DescriptorId) -> Option<PathBuf> {
        None
    }
}

/// Function descriptor files indexed by canonical id
#[derive(Debug, Clone, Default)]
pub struct DescriptorIndex {
    entries: BTreeMap<DescriptorId, PathBuf>,
}

impl DescriptorIndex {
    /// Index `path` if it holds an identifiable function descriptor.
    /// Returns whether it was added.
    pub fn insert_file(&mut self, path: &Path) -> bool {
        let raw = match read_descriptor(path) {
            Ok(raw) => raw,
            Err(e) => {
                debug!("Skipping {:?}: {}", path, e);
                return false;
            }
        };

        if classify(&raw.content) != Some(DescriptorKind::Function) {
            return false;
        }

        match raw.id {
            Some(id) => {
                debug!("Indexed function {} at {:?}", id, path);
                self.entries.entry(id).or_insert_with(|| path.to_path_buf());
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Exact match, or the single descriptor sharing vendor and name
    pub fn lookup(&self, reference: &DescriptorId) -> Option<PathBuf> {
        if let Some(path) = self.entries.get(reference) {
            return Some(path.clone());
        }

        let mut family = self
            .entries
            .iter()
            .filter(|(id, _)| id.same_family(reference));
        match (family.next(), family.next()) {
            (Some((id, path)), None) => {
                debug!("No exact match for {}, using {}", reference, id);
                Some(path.clone())
            }
            _ => None,
        }
    }
}

/// Function descriptors found under a directory (`--dpath`)
#[derive(Debug, Clone)]
pub struct DirectoryLoader {
    root: PathBuf,
    index: DescriptorIndex,
}

impl DirectoryLoader {
    /// Index every `*.yml` / `*.yaml` file under `root`
    pub fn scan(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let mut index = DescriptorIndex::default();

        for entry in WalkDir::new(&root)
            .follow_links(true)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let is_yaml = entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| ext == "yml" || ext == "yaml");
            if is_yaml {
                index.insert_file(entry.path());
            }
        }

        debug!("Indexed {} function(s) under {:?}", index.len(), root);
        Self { root, index }
    }

    /// [`scan`](Self::scan) on the blocking thread pool
    pub async fn scan_async(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        tokio::task::spawn_blocking(move || Self::scan(root))
            .await
            .map_err(|e| Error::internal(format!("function scan task failed: {}", e)))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn index(&self) -> &DescriptorIndex {
        &self.index
    }
}

impl FunctionLoader for DirectoryLoader {
    fn locate(&self, reference: &DescriptorId) -> Option<PathBuf> {
        self.index.lookup(reference)
    }
}

/// Function descriptors listed in a package manifest
#[derive(Debug, Clone)]
pub struct PackageLoader {
    index: DescriptorIndex,
}

impl PackageLoader {
    pub fn from_package(package: &Package) -> Self {
        Self::from_paths(package.function_paths())
    }

    /// Index the package's function descriptors on the blocking thread pool
    pub async fn from_package_async(package: &Package) -> Result<Self> {
        let paths = package.function_paths();
        tokio::task::spawn_blocking(move || Self::from_paths(paths))
            .await
            .map_err(|e| Error::internal(format!("package index task failed: {}", e)))
    }

    fn from_paths(paths: Vec<PathBuf>) -> Self {
        let mut index = DescriptorIndex::default();
        for path in &paths {
            index.insert_file(path);
        }
        Self { index }
    }
}

impl FunctionLoader for PackageLoader {
    fn locate(&self, reference: &DescriptorId) -> Option<PathBuf> {
        self.index.lookup(reference)
    }
}

/// Tries each loader in order
#[derive(Default)]
pub struct ChainLoader {
    loaders: Vec<Box<dyn FunctionLoader>>,
}

impl ChainLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, loader: impl FunctionLoader + 'static) -> Self {
        self.loaders.push(Box::new(loader));
        self
    }
}

impl FunctionLoader for ChainLoader {
    fn locate(&self, reference: &DescriptorId) -> Option<PathBuf> {
        self.loaders.iter().find_map(|l| l.locate(reference))
    }
}
