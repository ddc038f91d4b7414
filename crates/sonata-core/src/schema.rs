//! Schema resolution for SONATA descriptors
//!
//! Schema documents are looked up, in order, in the configured local
//! master directory, in the schemas bundled with the crate, and finally at
//! the remote master URL. Compiled schemas are cached for the lifetime of
//! the resolver, which is shared across validation runs.

use crate::config::WorkspaceConfig;
use crate::descriptor::{Descriptor, DescriptorKind, RawDescriptor};
use crate::error::{Error, Result};
use jsonschema::Validator;
use rust_embed::RustEmbed;
use serde_json::Value;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Embedded schema files
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/schemas/"]
#[prefix = ""]
struct BundledSchemas;

/// Default timeout for a remote schema fetch
pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

impl DescriptorKind {
    /// Schema document path, relative to a schema master
    pub fn schema_path(&self) -> &'static str {
        match self {
            Self::Package => "package-descriptor/pd-schema.yml",
            Self::Service => "service-descriptor/nsd-schema.yml",
            Self::Function => "function-descriptor/vnfd-schema.yml",
        }
    }
}

/// Classify a descriptor by its discriminator keys
pub fn classify(value: &Value) -> Option<DescriptorKind> {
    let has = |key: &str| value.get(key).is_some();

    if has("package_content") {
        Some(DescriptorKind::Package)
    } else if has("network_functions") && has("forwarding_graphs") {
        Some(DescriptorKind::Service)
    } else if has("virtual_deployment_units") {
        Some(DescriptorKind::Function)
    } else {
        None
    }
}

/// Where schema documents are looked up
#[derive(Debug, Clone)]
pub struct SchemaSources {
    pub local_master: Option<PathBuf>,
    pub remote_master: Option<Url>,
    pub bundled: bool,
    pub timeout: Duration,
}

impl SchemaSources {
    /// Only the schemas compiled into the crate
    pub fn bundled_only() -> Self {
        Self {
            local_master: None,
            remote_master: None,
            bundled: true,
            timeout: DEFAULT_FETCH_TIMEOUT,
        }
    }

    /// Sources described by a workspace configuration
    pub fn from_config(config: &WorkspaceConfig) -> Result<Self> {
        let remote_master = match &config.schemas_remote_master {
            Some(raw) => {
                // Url::join drops the last path segment unless the base ends in '/'
                let base = if raw.ends_with('/') {
                    raw.clone()
                } else {
                    format!("{}/", raw)
                };
                Some(Url::parse(&base).map_err(|e| {
                    Error::invalid_config(format!("Invalid schema remote master {}: {}", raw, e))
                })?)
            }
            None => None,
        };

        Ok(Self {
            local_master: config.schemas_local_master.clone(),
            remote_master,
            bundled: config.bundled_schemas,
            timeout: config.schema_fetch_timeout(),
        })
    }
}

/// Resolves and caches compiled descriptor schemas
#[derive(Debug)]
pub struct SchemaResolver {
    sources: SchemaSources,
    cache: RwLock<HashMap<String, Arc<Validator>>>,
}

impl SchemaResolver {
    pub fn new(sources: SchemaSources) -> Self {
        Self {
            sources,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// Resolver backed only by the bundled schemas
    pub fn bundled() -> Self {
        Self::new(SchemaSources::bundled_only())
    }

    pub fn from_config(config: &WorkspaceConfig) -> Result<Self> {
        Ok(Self::new(SchemaSources::from_config(config)?))
    }

    pub fn sources(&self) -> &SchemaSources {
        &self.sources
    }

    /// Tag a raw descriptor with its kind. Returns the descriptor unchanged
    /// when no discriminator key is present.
    pub fn classify(&self, raw: RawDescriptor) -> std::result::Result<Descriptor, RawDescriptor> {
        match classify(&raw.content) {
            Some(kind) => Ok(Descriptor::new(kind, raw)),
            None => Err(raw),
        }
    }

    /// Compiled schema for a descriptor kind
    pub async fn resolve(&self, kind: DescriptorKind) -> Result<Arc<Validator>> {
        let name = kind.schema_path();

        if let Some(cached) = self.cached(name) {
            debug!("Schema cache hit: {}", name);
            return Ok(cached);
        }

        debug!("Schema cache miss: {}", name);
        let document = self.load_document(name).await?;
        let compiled = jsonschema::validator_for(&document)
            .map_err(|e| Error::schema_compile(name, e.to_string()))?;

        let mut cache = self
            .cache
            .write()
            .map_err(|_| Error::invalid_config("Schema cache lock poisoned"))?;
        let entry = cache
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(compiled));

        Ok(Arc::clone(entry))
    }

    /// Names of the schemas compiled so far
    pub fn cached_schemas(&self) -> Vec<String> {
        self.cache
            .read()
            .map(|cache| cache.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn cached(&self, name: &str) -> Option<Arc<Validator>> {
        self.cache.read().ok()?.get(name).cloned()
    }

    async fn load_document(&self, name: &str) -> Result<Value> {
        let mut misses = Vec::new();

        if let Some(dir) = &self.sources.local_master {
            let path = dir.join(name);
            if path.is_file() {
                debug!("Loading schema from local master: {:?}", path);
                let content = tokio::fs::read_to_string(&path).await?;
                return serde_yaml_ng::from_str(&content).map_err(|e| {
                    Error::schema_compile(name, format!("invalid document {:?}: {}", path, e))
                });
            }
            misses.push(format!("not found in {:?}", dir));
        }

        if self.sources.bundled {
            if let Some(document) = Self::load_bundled(name)? {
                debug!("Loading bundled schema: {}", name);
                return Ok(document);
            }
            misses.push("not bundled".to_string());
        }

        if let Some(base) = &self.sources.remote_master {
            match self.fetch_remote(base, name).await {
                Ok(document) => return Ok(document),
                Err(reason) => {
                    warn!("Failed to fetch schema {} from {}: {}", name, base, reason);
                    misses.push(reason);
                }
            }
        }

        if misses.is_empty() {
            misses.push("no schema source configured".to_string());
        }

        Err(Error::schema_fetch(name, misses.join("; ")))
    }

    fn load_bundled(name: &str) -> Result<Option<Value>> {
        let Some(file) = BundledSchemas::get(name) else {
            return Ok(None);
        };

        let content = std::str::from_utf8(&file.data)
            .map_err(|_| Error::schema_compile(name, "invalid UTF-8 in bundled schema"))?;
        let document = serde_yaml_ng::from_str(content)?;
        Ok(Some(document))
    }

    async fn fetch_remote(&self, base: &Url, name: &str) -> std::result::Result<Value, String> {
        let url = base.join(name).map_err(|e| e.to_string())?;
        debug!("Fetching schema from: {}", url);

        let client = reqwest::Client::builder()
            .timeout(self.sources.timeout)
            .build()
            .map_err(|e| e.to_string())?;

        let response = client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| format!("request to {} failed: {}", url, e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP {} from {}", response.status(), url));
        }

        let body = response.text().await.map_err(|e| e.to_string())?;
        serde_yaml_ng::from_str(&body).map_err(|e| format!("invalid document at {}: {}", url, e))
    }
}
