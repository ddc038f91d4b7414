//! Package descriptor types (META-INF/MANIFEST.YAML)

use serde::{Deserialize, Serialize};

/// Content type tag for service descriptors inside a package
pub const SERVICE_DESCRIPTOR_CONTENT_TYPE: &str = "application/sonata.service_descriptor";

/// Content type tag for function descriptors inside a package
pub const FUNCTION_DESCRIPTOR_CONTENT_TYPE: &str = "application/sonata.function_descriptor";

/// Package manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Descriptor schema version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub descriptor_version: Option<String>,

    /// Package maintainer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maintainer: Option<String>,

    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Path of the service descriptor that is the package entry point
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entry_service_template: Option<String>,

    /// Files shipped in the package
    #[serde(default)]
    pub package_content: Vec<PackageContent>,
}

/// Single entry in `package_content`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageContent {
    /// Path of the file, relative to the package root
    pub name: String,

    /// Content type tag
    #[serde(rename = "content-type")]
    pub content_type: String,

    /// Expected MD5 digest (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub md5: Option<String>,

    /// Expected SHA-256 digest (hex)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
}

impl PackageContent {
    /// Entry path with leading separators stripped
    pub fn relative_name(&self) -> &str {
        normalize_package_path(&self.name)
    }

    /// Whether this entry is a service descriptor
    pub fn is_service_descriptor(&self) -> bool {
        self.content_type == SERVICE_DESCRIPTOR_CONTENT_TYPE
    }

    /// Whether this entry is a function descriptor
    pub fn is_function_descriptor(&self) -> bool {
        self.content_type == FUNCTION_DESCRIPTOR_CONTENT_TYPE
    }
}

/// Strip leading `/` and `\` so package paths always resolve against the package root
pub fn normalize_package_path(path: &str) -> &str {
    path.trim_start_matches(['/', '\\'])
}
