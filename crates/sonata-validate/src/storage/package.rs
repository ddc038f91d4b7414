//! Package objects

use std::path::{Component, Path, PathBuf};

use sonata_core::types::{normalize_package_path, PackageContent, PackageDescriptor};
use sonata_core::{DescriptorId, RawDescriptor};

use super::node::{Node, NodeData};

/// A loaded package manifest together with the directory it describes
#[derive(Debug, Clone)]
pub struct Package {
    node: NodeData,
    descriptor_id: DescriptorId,
    source: RawDescriptor,
    root: PathBuf,
    manifest: PackageDescriptor,
}

impl Package {
    pub(crate) fn new(
        descriptor_id: DescriptorId,
        source: RawDescriptor,
        root: PathBuf,
        manifest: PackageDescriptor,
    ) -> Self {
        Self {
            node: NodeData::new(descriptor_id.to_string()),
            descriptor_id,
            source,
            root,
            manifest,
        }
    }

    pub fn descriptor_id(&self) -> &DescriptorId {
        &self.descriptor_id
    }

    pub fn source(&self) -> &RawDescriptor {
        &self.source
    }

    /// Package root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &PackageDescriptor {
        &self.manifest
    }

    pub fn contents(&self) -> &[PackageContent] {
        &self.manifest.package_content
    }

    /// Location of a package-relative path on disk. `None` when the path
    /// climbs out of the package root.
    pub fn resolve(&self, name: &str) -> Option<PathBuf> {
        let relative = Path::new(normalize_package_path(name));
        let inside = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_) | Component::CurDir));
        inside.then(|| self.root.join(relative))
    }

    /// Location of the entry service descriptor, if one is declared inside
    /// the package
    pub fn entry_service_path(&self) -> Option<PathBuf> {
        self.manifest
            .entry_service_template
            .as_deref()
            .and_then(|name| self.resolve(name))
    }

    /// Function descriptor files listed in the manifest
    pub fn function_paths(&self) -> Vec<PathBuf> {
        self.contents()
            .iter()
            .filter(|c| c.is_function_descriptor())
            .filter_map(|c| self.resolve(&c.name))
            .collect()
    }
}

impl Node for Package {
    fn data(&self) -> &NodeData {
        &self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_strips_leading_separator() {
        let manifest: PackageDescriptor = serde_yaml_ng::from_str(
            r#"
entry_service_template: /service_descriptors/nsd.yml
package_content:
  - name: /service_descriptors/nsd.yml
    content-type: application/sonata.service_descriptor
  - name: function_descriptors/fw.yml
    content-type: application/sonata.function_descriptor
"#,
        )
        .unwrap();
        let id = DescriptorId::new("eu.sonata", "pkg", "0.1");
        let raw = RawDescriptor::from_value("/pkg/META-INF/MANIFEST.YAML", serde_json::json!({}));
        let package = Package::new(id, raw, PathBuf::from("/pkg"), manifest);

        assert_eq!(
            package.entry_service_path(),
            Some(PathBuf::from("/pkg/service_descriptors/nsd.yml"))
        );
        assert_eq!(
            package.function_paths(),
            vec![PathBuf::from("/pkg/function_descriptors/fw.yml")]
        );
        assert_eq!(package.id(), "eu.sonata.pkg.0.1");
    }

    #[test]
    fn test_resolve_rejects_paths_leaving_the_root() {
        let manifest: PackageDescriptor = serde_yaml_ng::from_str(
            r#"
entry_service_template: ../nsd.yml
package_content:
  - name: ../../etc/fw.yml
    content-type: application/sonata.function_descriptor
  - name: ./function_descriptors/../fw.yml
    content-type: application/sonata.function_descriptor
"#,
        )
        .unwrap();
        let id = DescriptorId::new("eu.sonata", "pkg", "0.1");
        let raw = RawDescriptor::from_value("/pkg/META-INF/MANIFEST.YAML", serde_json::json!({}));
        let package = Package::new(id, raw, PathBuf::from("/pkg"), manifest);

        assert_eq!(package.resolve("../../etc/fw.yml"), None);
        assert_eq!(package.resolve("/../x"), None);
        assert_eq!(
            package.resolve("./a/b.yml"),
            Some(PathBuf::from("/pkg/./a/b.yml"))
        );
        assert_eq!(package.entry_service_path(), None);
        assert!(package.function_paths().is_empty());
    }
}
