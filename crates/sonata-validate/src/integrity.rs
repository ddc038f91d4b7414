//! Integrity validation
//!
//! Cross-reference checks over loaded storage objects: package contents
//! and hashes, function references of a service, and virtual-link
//! endpoint resolution. Each check returns `true` when it recorded no
//! error events.

use std::collections::BTreeSet;
use std::io;
use std::path::{Path, PathBuf};

use sonata_core::types::PackageContent;
use sonata_core::{codes, DescriptorKind, EventLog};
use tracing::debug;

use crate::archive::{file_md5, file_sha256};
use crate::error::{Error, Result};
use crate::storage::{Endpoint, Function, Node, Package, Service, Storage};

pub struct IntegrityValidator<'a> {
    storage: &'a Storage,
}

impl<'a> IntegrityValidator<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Every `package_content` entry exists inside the package, can be read,
    /// and matches its recorded hashes. Files are hashed on the blocking
    /// thread pool.
    pub async fn validate_package(&self, package: &Package, log: &mut EventLog) -> Result<bool> {
        let checkpoint = log.checkpoint();
        let object_id = package.id().to_string();

        let checks = hash_contents(package).await?;
        for (content, check) in package.contents().iter().zip(checks) {
            record_content_check(&object_id, content, check, log)?;
        }

        debug!(
            "Package {} checked {} content entr(ies)",
            object_id,
            package.contents().len()
        );
        Ok(log.errors_since(checkpoint) == 0)
    }

    /// Resolve the package entry service. Logs `evt_pkg_entry_service` and
    /// returns `None` when it is not declared or not present.
    pub fn entry_service(&self, package: &Package, log: &mut EventLog) -> Result<Option<PathBuf>> {
        let object_id = package.id().to_string();
        let scope = DescriptorKind::Package;

        let Some(name) = package.manifest().entry_service_template.as_deref() else {
            log.log(
                &object_id,
                codes::EVT_PKG_ENTRY_SERVICE,
                scope,
                "no entry_service_template declared",
            )?;
            return Ok(None);
        };

        match package.resolve(name) {
            Some(path) if path.is_file() => Ok(Some(path)),
            Some(_) => {
                log.log(
                    &object_id,
                    codes::EVT_PKG_ENTRY_SERVICE,
                    scope,
                    format!("entry service '{}' not present in package", name),
                )?;
                Ok(None)
            }
            None => {
                log.log(
                    &object_id,
                    codes::EVT_PKG_ENTRY_SERVICE,
                    scope,
                    format!("entry service '{}' points outside the package", name),
                )?;
                Ok(None)
            }
        }
    }

    /// vnf ids are unique, every referenced function is loaded with the
    /// requested id, link endpoints and forwarding graph members resolve
    pub fn validate_service(&self, service: &Service, log: &mut EventLog) -> Result<bool> {
        let checkpoint = log.checkpoint();
        let object_id = service.id().to_string();
        let scope = DescriptorKind::Service;

        let mut seen = BTreeSet::new();
        for function_ref in service.functions() {
            if !seen.insert(function_ref.vnf_id.as_str()) {
                log.log(
                    &object_id,
                    codes::EVT_VNF_ID_DUPLICATE,
                    scope,
                    format!("vnf_id '{}' declared more than once", function_ref.vnf_id),
                )?;
                continue;
            }

            match &function_ref.resolved {
                None => {
                    log.log(
                        &object_id,
                        codes::EVT_VNF_UNAVAILABLE,
                        scope,
                        format!(
                            "function {} ({}) could not be loaded",
                            function_ref.reference, function_ref.vnf_id
                        ),
                    )?;
                }
                Some(id) if *id != function_ref.reference => {
                    log.log(
                        &object_id,
                        codes::EVT_VNF_REF_MISMATCH,
                        scope,
                        format!(
                            "'{}' references {} but the loaded descriptor is {}",
                            function_ref.vnf_id, function_ref.reference, id
                        ),
                    )?;
                }
                Some(_) => {}
            }
        }

        for (link_id, reference) in service.links().references() {
            match self.storage.resolve_endpoint(service, reference) {
                Endpoint::Service | Endpoint::Function { .. } => {}
                // Already reported as an unavailable function
                Endpoint::Unloaded { .. } => {}
                Endpoint::Undeclared => {
                    log.log(
                        &object_id,
                        codes::EVT_LINK_ENDPOINT_UNDEFINED,
                        scope,
                        format!("link '{}' endpoint '{}' is not declared", link_id, reference),
                    )?;
                }
            }
        }

        for graph in service.forwarding_graphs() {
            for vnf_id in &graph.constituent_vnfs {
                if service.function_ref(vnf_id).is_none() {
                    log.log(
                        &object_id,
                        codes::EVT_FG_REFERENCE_UNDEFINED,
                        scope,
                        format!(
                            "forwarding graph '{}' names unknown vnf '{}'",
                            graph.id, vnf_id
                        ),
                    )?;
                }
            }
            for link_id in &graph.constituent_links {
                if !service.links().contains(link_id) {
                    log.log(
                        &object_id,
                        codes::EVT_FG_REFERENCE_UNDEFINED,
                        scope,
                        format!(
                            "forwarding graph '{}' names unknown virtual link '{}'",
                            graph.id, link_id
                        ),
                    )?;
                }
            }
        }

        Ok(log.errors_since(checkpoint) == 0)
    }

    /// Every internal link endpoint resolves to a function connection
    /// point or a `<unit>:<port>` unit connection point
    pub fn validate_function(&self, function: &Function, log: &mut EventLog) -> Result<bool> {
        let checkpoint = log.checkpoint();
        let object_id = function.id().to_string();

        for (link_id, reference) in function.links().references() {
            if !function.resolves(reference) {
                log.log(
                    &object_id,
                    codes::EVT_LINK_ENDPOINT_UNDEFINED,
                    DescriptorKind::Function,
                    format!("link '{}' endpoint '{}' is not declared", link_id, reference),
                )?;
            }
        }

        Ok(log.errors_since(checkpoint) == 0)
    }
}

/// Digests computed for one `package_content` entry
#[derive(Debug)]
struct ContentHashes {
    md5: Option<String>,
    sha256: Option<String>,
}

#[derive(Debug)]
enum ContentCheck {
    OutsideRoot,
    Missing,
    Unreadable(io::Error),
    Hashed(ContentHashes),
}

/// Hash every listed file, in manifest order
async fn hash_contents(package: &Package) -> Result<Vec<ContentCheck>> {
    let jobs: Vec<(Option<PathBuf>, bool, bool)> = package
        .contents()
        .iter()
        .map(|c| (package.resolve(&c.name), c.md5.is_some(), c.sha256.is_some()))
        .collect();

    tokio::task::spawn_blocking(move || {
        jobs.into_iter()
            .map(|(path, md5, sha256)| match path {
                Some(path) => hash_content(&path, md5, sha256),
                None => ContentCheck::OutsideRoot,
            })
            .collect()
    })
    .await
    .map_err(|e| Error::internal(format!("content hashing task failed: {}", e)))
}

fn hash_content(path: &Path, md5: bool, sha256: bool) -> ContentCheck {
    if !path.is_file() {
        return ContentCheck::Missing;
    }

    let digest = |wanted: bool, hash: fn(&Path) -> io::Result<String>| {
        if wanted {
            hash(path).map(Some)
        } else {
            Ok(None)
        }
    };

    let hashes = digest(md5, file_md5).and_then(|md5| {
        let sha256 = digest(sha256, file_sha256)?;
        Ok(ContentHashes { md5, sha256 })
    });
    match hashes {
        Ok(hashes) => ContentCheck::Hashed(hashes),
        Err(e) => ContentCheck::Unreadable(e),
    }
}

/// Log the events for one hashed `package_content` entry
fn record_content_check(
    object_id: &str,
    content: &PackageContent,
    check: ContentCheck,
    log: &mut EventLog,
) -> Result<()> {
    let scope = DescriptorKind::Package;

    let hashes = match check {
        ContentCheck::OutsideRoot => {
            log.log(
                object_id,
                codes::EVT_PKG_FILE_MISSING,
                scope,
                format!("'{}' points outside the package", content.name),
            )?;
            return Ok(());
        }
        ContentCheck::Missing => {
            log.log(
                object_id,
                codes::EVT_PKG_FILE_MISSING,
                scope,
                format!("'{}' is listed in package_content but not present", content.name),
            )?;
            return Ok(());
        }
        ContentCheck::Unreadable(e) => {
            log.log(
                object_id,
                codes::EVT_PKG_FILE_UNREADABLE,
                scope,
                format!("'{}' cannot be read: {}", content.name, e),
            )?;
            return Ok(());
        }
        ContentCheck::Hashed(hashes) => hashes,
    };

    if let (Some(expected), Some(actual)) = (&content.md5, &hashes.md5) {
        if !actual.eq_ignore_ascii_case(expected) {
            log.log(
                object_id,
                codes::EVT_PKG_HASH_MISMATCH,
                scope,
                format!(
                    "'{}': recorded md5 {} but content hashes to {}",
                    content.name, expected, actual
                ),
            )?;
            return Ok(());
        }
    }

    if let (Some(expected), Some(actual)) = (&content.sha256, &hashes.sha256) {
        if !actual.eq_ignore_ascii_case(expected) {
            log.log(
                object_id,
                codes::EVT_PKG_HASH_MISMATCH,
                scope,
                format!(
                    "'{}': recorded sha256 {} but content hashes to {}",
                    content.name, expected, actual
                ),
            )?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use sonata_core::EventCatalog;
    use tempfile::TempDir;

    fn content(name: &str, md5: Option<&str>) -> PackageContent {
        PackageContent {
            name: name.to_string(),
            content_type: "application/sonata.function_descriptor".to_string(),
            md5: md5.map(str::to_string),
            sha256: None,
        }
    }

    fn log() -> EventLog {
        EventLog::new(Arc::new(EventCatalog::embedded().unwrap()))
    }

    #[test]
    fn test_hash_content_missing_file() {
        let temp = TempDir::new().unwrap();
        let check = hash_content(&temp.path().join("absent.yml"), true, false);
        assert!(matches!(check, ContentCheck::Missing));
    }

    #[test]
    fn test_hash_content_only_requested_digests() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("vnf.yml");
        std::fs::write(&path, "hello").unwrap();

        match hash_content(&path, true, false) {
            ContentCheck::Hashed(hashes) => {
                assert_eq!(hashes.md5.as_deref(), Some("5d41402abc4b2a76b9719d911017c592"));
                assert!(hashes.sha256.is_none());
            }
            other => panic!("unexpected check: {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_content_logged_not_raised() {
        let mut log = log();
        let check = ContentCheck::Unreadable(io::Error::new(
            io::ErrorKind::PermissionDenied,
            "permission denied",
        ));

        let listed = content("/vnfs/a.yml", Some("00"));
        record_content_check("eu.sonata.pkg.0.1", &listed, check, &mut log).unwrap();

        let events = log.with_code(codes::EVT_PKG_FILE_UNREADABLE);
        assert_eq!(events.len(), 1);
        assert!(events[0].messages[0].contains("'/vnfs/a.yml' cannot be read"));
        assert!(log.with_code(codes::EVT_PKG_HASH_MISMATCH).is_empty());
        assert_eq!(log.error_count(), 1);
    }

    #[test]
    fn test_md5_mismatch_ignores_case() {
        let mut log = log();
        let hashes = |md5: &str| {
            ContentCheck::Hashed(ContentHashes {
                md5: Some(md5.to_string()),
                sha256: None,
            })
        };

        let listed = content("/vnfs/a.yml", Some("ABCDEF"));
        record_content_check("pkg", &listed, hashes("abcdef"), &mut log).unwrap();
        assert!(log.with_code(codes::EVT_PKG_HASH_MISMATCH).is_empty());

        record_content_check("pkg", &listed, hashes("123456"), &mut log).unwrap();
        assert_eq!(log.with_code(codes::EVT_PKG_HASH_MISMATCH).len(), 1);
    }
}
