//! Descriptor reading and identification
//!
//! A descriptor file is read into a raw JSON value together with its
//! canonical identifier `vendor.name.version`. Classification into a
//! package, service, or function happens in [`crate::schema`].

use crate::error::{Error, Result};
use crate::types::scalar_to_string;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Canonical descriptor identifier
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DescriptorId {
    pub vendor: String,
    pub name: String,
    pub version: String,
}

impl DescriptorId {
    pub fn new(vendor: impl Into<String>, name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            vendor: vendor.into(),
            name: name.into(),
            version: version.into(),
        }
    }

    /// Derive the identifier from the top-level `vendor`, `name` and
    /// `version` fields. Returns `None` when any of them is missing or
    /// is not a scalar.
    pub fn from_value(value: &Value) -> Option<Self> {
        let field = |key: &str| value.get(key).and_then(scalar_to_string);
        Some(Self::new(field("vendor")?, field("name")?, field("version")?))
    }

    /// Whether vendor and name match, ignoring version
    pub fn same_family(&self, other: &DescriptorId) -> bool {
        self.vendor == other.vendor && self.name == other.name
    }
}

impl fmt::Display for DescriptorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.vendor, self.name, self.version)
    }
}

/// Descriptor kinds understood by the validator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DescriptorKind {
    Package,
    Service,
    Function,
}

impl fmt::Display for DescriptorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Package => write!(f, "package"),
            Self::Service => write!(f, "service"),
            Self::Function => write!(f, "function"),
        }
    }
}

/// Descriptor as read from disk, before classification
#[derive(Debug, Clone)]
pub struct RawDescriptor {
    /// File the descriptor was read from
    pub path: PathBuf,

    /// Parsed document
    pub content: Value,

    /// Canonical identifier, if derivable
    pub id: Option<DescriptorId>,
}

impl RawDescriptor {
    /// Build a raw descriptor from an already-parsed document
    pub fn from_value(path: impl Into<PathBuf>, content: Value) -> Self {
        let id = DescriptorId::from_value(&content);
        Self {
            path: path.into(),
            content,
            id,
        }
    }

    /// Identifier used when reporting events: the canonical id when
    /// available, the file path otherwise
    pub fn object_id(&self) -> String {
        match &self.id {
            Some(id) => id.to_string(),
            None => self.path.display().to_string(),
        }
    }
}

/// Descriptor tagged with its kind
#[derive(Debug, Clone)]
pub enum Descriptor {
    Package(RawDescriptor),
    Service(RawDescriptor),
    Function(RawDescriptor),
}

impl Descriptor {
    /// Tag a raw descriptor with a kind
    pub fn new(kind: DescriptorKind, raw: RawDescriptor) -> Self {
        match kind {
            DescriptorKind::Package => Self::Package(raw),
            DescriptorKind::Service => Self::Service(raw),
            DescriptorKind::Function => Self::Function(raw),
        }
    }

    pub fn kind(&self) -> DescriptorKind {
        match self {
            Self::Package(_) => DescriptorKind::Package,
            Self::Service(_) => DescriptorKind::Service,
            Self::Function(_) => DescriptorKind::Function,
        }
    }

    pub fn raw(&self) -> &RawDescriptor {
        match self {
            Self::Package(raw) | Self::Service(raw) | Self::Function(raw) => raw,
        }
    }

    pub fn into_raw(self) -> RawDescriptor {
        match self {
            Self::Package(raw) | Self::Service(raw) | Self::Function(raw) => raw,
        }
    }

    pub fn object_id(&self) -> String {
        self.raw().object_id()
    }
}

/// Read and parse a descriptor file
pub fn read_descriptor(path: &Path) -> Result<RawDescriptor> {
    let content =
        std::fs::read_to_string(path).map_err(|e| Error::read(path.display().to_string(), e))?;
    parse_descriptor(path, &content)
}

/// Read and parse a descriptor file without blocking the runtime
pub async fn read_descriptor_async(path: &Path) -> Result<RawDescriptor> {
    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| Error::read(path.display().to_string(), e))?;
    parse_descriptor(path, &content)
}

/// Parse descriptor content read from `path`
pub fn parse_descriptor(path: &Path, content: &str) -> Result<RawDescriptor> {
    let value: Value = serde_yaml_ng::from_str(content)
        .map_err(|e| Error::parse(path.display().to_string(), e))?;

    let raw = RawDescriptor::from_value(path, value);
    debug!(
        "Read descriptor {:?} (id: {})",
        path,
        raw.id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "<missing>".to_string())
    );

    Ok(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_descriptor_id_display() {
        let id = DescriptorId::new("eu.sonata-nfv", "firewall", "0.2");
        assert_eq!(id.to_string(), "eu.sonata-nfv.firewall.0.2");
    }

    #[test]
    fn test_id_from_value_with_numeric_version() {
        let value: Value =
            serde_yaml_ng::from_str("vendor: eu.sonata\nname: fw\nversion: 0.2\n").unwrap();
        let id = DescriptorId::from_value(&value).unwrap();
        assert_eq!(id.version, "0.2");
    }

    #[test]
    fn test_id_missing_field() {
        let value: Value = serde_yaml_ng::from_str("vendor: eu.sonata\nname: fw\n").unwrap();
        assert!(DescriptorId::from_value(&value).is_none());
    }

    #[test]
    fn test_read_missing_file() {
        let temp = TempDir::new().unwrap();
        let result = read_descriptor(&temp.path().join("absent.yml"));
        assert!(matches!(result, Err(Error::Read { .. })));
    }

    #[test]
    fn test_read_invalid_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("bad.yml");
        std::fs::write(&path, ":::\n  invalid: [[[yaml").unwrap();
        let result = read_descriptor(&path);
        assert!(matches!(result, Err(Error::Parse { .. })));
    }

    #[test]
    fn test_object_id_falls_back_to_path() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("anon.yml");
        std::fs::write(&path, "name: anon\n").unwrap();
        let raw = read_descriptor(&path).unwrap();
        assert!(raw.id.is_none());
        assert!(raw.object_id().ends_with("anon.yml"));
    }

    #[tokio::test]
    async fn test_read_async_matches_sync() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("fn.yml");
        std::fs::write(&path, "vendor: v\nname: n\nversion: '1.0'\n").unwrap();
        let sync = read_descriptor(&path).unwrap();
        let asynced = read_descriptor_async(&path).await.unwrap();
        assert_eq!(sync.id, asynced.id);
        assert_eq!(sync.content, asynced.content);
    }
}
