//! Package archives and content hashes
//!
//! A package is either a zip archive (`.son`) or a directory with the same
//! layout. Archives are extracted into a temporary directory that lives as
//! long as the [`PackageSource`]; dropping it removes the extracted files.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use md5::Md5;
use sha2::{Digest, Sha256};
use tempfile::TempDir;
use tracing::debug;

use crate::error::{Error, Result};

/// Location of the package descriptor inside a package
pub const MANIFEST_PATH: &str = "META-INF/MANIFEST.YAML";

/// An opened package: either a directory on disk or an extracted archive
#[derive(Debug)]
pub struct PackageSource {
    origin: PathBuf,
    root: PathBuf,
    scratch: Option<TempDir>,
}

impl PackageSource {
    /// Open a package directory or extract a package archive
    pub async fn open(path: &Path) -> Result<Self> {
        let metadata = tokio::fs::metadata(path).await?;
        if metadata.is_dir() {
            return Ok(Self {
                origin: path.to_path_buf(),
                root: path.to_path_buf(),
                scratch: None,
            });
        }

        let archive = path.to_path_buf();
        let scratch = tokio::task::spawn_blocking(move || -> Result<TempDir> {
            let dir = tempfile::Builder::new().prefix("son-package-").tempdir()?;
            extract_archive(&archive, dir.path())?;
            Ok(dir)
        })
        .await
        .map_err(|e| Error::internal(format!("package extraction task failed: {}", e)))??;

        Ok(Self {
            origin: path.to_path_buf(),
            root: scratch.path().to_path_buf(),
            scratch: Some(scratch),
        })
    }

    /// Path the package was opened from
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    /// Directory holding the package files
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join(MANIFEST_PATH)
    }

    pub fn is_extracted(&self) -> bool {
        self.scratch.is_some()
    }
}

/// Extract a zip archive into `target_dir`. Entries whose names would
/// escape the target directory are skipped. Returns the number of files
/// written.
pub fn extract_archive(archive_path: &Path, target_dir: &Path) -> Result<usize> {
    let file = File::open(archive_path)?;
    let mut archive = zip::ZipArchive::new(file)?;
    let mut written = 0;

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;

        let outpath = match entry.enclosed_name() {
            Some(path) => target_dir.join(path),
            None => {
                debug!("Skipping archive entry outside package root: {}", entry.name());
                continue;
            }
        };

        if entry.is_dir() {
            fs::create_dir_all(&outpath)?;
        } else {
            if let Some(parent) = outpath.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut outfile = File::create(&outpath)?;
            io::copy(&mut entry, &mut outfile)?;
            written += 1;
        }
    }

    debug!("Extracted {} file(s) from {:?}", written, archive_path);
    Ok(written)
}

/// MD5 of a file as lowercase hex
pub fn file_md5(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}

/// SHA256 of a file as lowercase hex
pub fn file_sha256(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha256::new();
    io::copy(&mut file, &mut hasher)?;
    Ok(format!("{:x}", hasher.finalize()))
}
