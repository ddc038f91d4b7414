//! In-memory registry of packages, services, and functions
//!
//! The storage owns every loaded object, keyed by canonical identifier.
//! Services refer to their functions by identifier only; navigation goes
//! through [`Storage::function`]. A storage lives for a single validation
//! run.
//!
//! Registration is idempotent: registering a file that is already loaded,
//! or a descriptor whose identifier is already loaded with identical
//! content, returns the existing identifier and records no events.

mod function;
mod links;
mod node;
mod package;
mod service;

pub use function::{Function, Unit};
pub use links::{Bridge, Link, LinkSet};
pub use node::{Interface, Node, NodeData};
pub use package::Package;
pub use service::{
    DuplicatePosition, ForwardingGraph, ForwardingPath, FunctionRef, OrderedPath, PathEntry,
    Service,
};

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use sonata_core::types::{FunctionDescriptor, PackageDescriptor, ServiceDescriptor};
use sonata_core::{
    classify, codes, read_descriptor_async, DescriptorId, DescriptorKind, EventLog,
    RawDescriptor,
};
use tracing::debug;

use crate::archive::MANIFEST_PATH;
use crate::error::Result;
use crate::loader::FunctionLoader;

/// How a connection point reference made inside a service resolves
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint<'a> {
    /// A connection point declared on the service itself
    Service,
    /// `<vnf_id>:<port>` with the port declared on the mapped function
    Function { vnf_id: &'a str, port: &'a str },
    /// The vnf id is mapped but its function is not loaded
    Unloaded { vnf_id: &'a str },
    /// Nothing declares this connection point
    Undeclared,
}

enum Admission {
    New(DescriptorId),
    Existing(DescriptorId),
    Rejected,
}

#[derive(Debug, Default)]
pub struct Storage {
    packages: BTreeMap<DescriptorId, Package>,
    services: BTreeMap<DescriptorId, Service>,
    functions: BTreeMap<DescriptorId, Function>,
    paths: HashMap<PathBuf, DescriptorId>,
}

impl Storage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn package(&self, id: &DescriptorId) -> Option<&Package> {
        self.packages.get(id)
    }

    pub fn service(&self, id: &DescriptorId) -> Option<&Service> {
        self.services.get(id)
    }

    pub fn function(&self, id: &DescriptorId) -> Option<&Function> {
        self.functions.get(id)
    }

    pub fn packages(&self) -> impl Iterator<Item = &Package> {
        self.packages.values()
    }

    pub fn services(&self) -> impl Iterator<Item = &Service> {
        self.services.values()
    }

    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.functions.values()
    }

    /// Load the package whose root directory is `root`
    pub async fn create_package(
        &mut self,
        root: &Path,
        log: &mut EventLog,
    ) -> Result<Option<DescriptorId>> {
        let manifest = root.join(MANIFEST_PATH);
        match self.read(&manifest, DescriptorKind::Package, log).await? {
            Some(raw) => self.register_package(raw, root, log),
            None => Ok(None),
        }
    }

    /// Load a service descriptor and the functions it references
    pub async fn create_service(
        &mut self,
        path: &Path,
        loader: &dyn FunctionLoader,
        log: &mut EventLog,
    ) -> Result<Option<DescriptorId>> {
        match self.read(path, DescriptorKind::Service, log).await? {
            Some(raw) => self.register_service(raw, loader, log).await,
            None => Ok(None),
        }
    }

    /// Load a function descriptor
    pub async fn create_function(
        &mut self,
        path: &Path,
        log: &mut EventLog,
    ) -> Result<Option<DescriptorId>> {
        if let Some(id) = self.paths.get(path) {
            return Ok(Some(id.clone()));
        }
        match self.read(path, DescriptorKind::Function, log).await? {
            Some(raw) => self.register_function(raw, log),
            None => Ok(None),
        }
    }

    /// Register an already-read package manifest rooted at `root`
    pub fn register_package(
        &mut self,
        raw: RawDescriptor,
        root: &Path,
        log: &mut EventLog,
    ) -> Result<Option<DescriptorId>> {
        let id = match self.admit(&raw, DescriptorKind::Package, log)? {
            Admission::New(id) => id,
            Admission::Existing(id) => return Ok(Some(id)),
            Admission::Rejected => return Ok(None),
        };
        let Some(manifest) = Self::typed::<PackageDescriptor>(&raw, DescriptorKind::Package, log)?
        else {
            return Ok(None);
        };

        debug!("Registered package {}", id);
        self.paths.insert(raw.path.clone(), id.clone());
        self.packages.insert(
            id.clone(),
            Package::new(id.clone(), raw, root.to_path_buf(), manifest),
        );
        Ok(Some(id))
    }

    /// Register an already-read service and load its functions through
    /// `loader`
    pub async fn register_service(
        &mut self,
        raw: RawDescriptor,
        loader: &dyn FunctionLoader,
        log: &mut EventLog,
    ) -> Result<Option<DescriptorId>> {
        let id = match self.admit(&raw, DescriptorKind::Service, log)? {
            Admission::New(id) => id,
            Admission::Existing(id) => return Ok(Some(id)),
            Admission::Rejected => return Ok(None),
        };
        let Some(descriptor) = Self::typed::<ServiceDescriptor>(&raw, DescriptorKind::Service, log)?
        else {
            return Ok(None);
        };

        let mut functions = Vec::with_capacity(descriptor.network_functions.len());
        for nf in &descriptor.network_functions {
            let reference = nf.reference();
            let source = loader.locate(&reference);
            let resolved = match &source {
                Some(path) => self.create_function(path, log).await?,
                None => {
                    debug!("No descriptor found for {} ({})", nf.vnf_id, reference);
                    None
                }
            };
            functions.push(FunctionRef {
                vnf_id: nf.vnf_id.clone(),
                reference,
                resolved,
                source,
            });
        }

        let path = raw.path.clone();
        let service = Service::load(id.clone(), raw, &descriptor, functions, log)?;
        debug!(
            "Registered service {} with {} function reference(s)",
            id,
            service.functions().len()
        );
        self.paths.insert(path, id.clone());
        self.services.insert(id.clone(), service);
        Ok(Some(id))
    }

    /// Register an already-read function descriptor
    pub fn register_function(
        &mut self,
        raw: RawDescriptor,
        log: &mut EventLog,
    ) -> Result<Option<DescriptorId>> {
        let id = match self.admit(&raw, DescriptorKind::Function, log)? {
            Admission::New(id) => id,
            Admission::Existing(id) => return Ok(Some(id)),
            Admission::Rejected => return Ok(None),
        };
        let Some(descriptor) =
            Self::typed::<FunctionDescriptor>(&raw, DescriptorKind::Function, log)?
        else {
            return Ok(None);
        };

        let path = raw.path.clone();
        let function = Function::load(id.clone(), raw, &descriptor, log)?;
        debug!(
            "Registered function {} with {} unit(s)",
            id,
            function.units().len()
        );
        self.paths.insert(path, id.clone());
        self.functions.insert(id.clone(), function);
        Ok(Some(id))
    }

    /// Resolve a connection point reference made inside `service`
    pub fn resolve_endpoint<'a>(&self, service: &Service, reference: &'a str) -> Endpoint<'a> {
        if service.has_interface(reference) {
            return Endpoint::Service;
        }

        let Some((vnf_id, port)) = reference.split_once(':') else {
            return Endpoint::Undeclared;
        };
        let Some(function_ref) = service.function_ref(vnf_id) else {
            return Endpoint::Undeclared;
        };

        match function_ref.resolved.as_ref().and_then(|id| self.function(id)) {
            Some(function) if function.has_interface(port) => Endpoint::Function { vnf_id, port },
            Some(_) => Endpoint::Undeclared,
            None => Endpoint::Unloaded { vnf_id },
        }
    }

    /// Functions referenced by `service` that were loaded, without repeats
    pub fn service_functions(&self, service: &Service) -> Vec<&Function> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for f in service.functions() {
            if let Some(id) = &f.resolved {
                if !seen.contains(&id) {
                    seen.push(id);
                    if let Some(function) = self.function(id) {
                        out.push(function);
                    }
                }
            }
        }
        out
    }

    async fn read(
        &self,
        path: &Path,
        expected: DescriptorKind,
        log: &mut EventLog,
    ) -> Result<Option<RawDescriptor>> {
        let object_id = path.display().to_string();
        let raw = match read_descriptor_async(path).await {
            Ok(raw) => raw,
            Err(e @ sonata_core::Error::Read { .. }) => {
                log.log(&object_id, codes::EVT_READ_ERROR, expected, e.to_string())?;
                return Ok(None);
            }
            Err(e @ sonata_core::Error::Parse { .. }) => {
                log.log(&object_id, codes::EVT_PARSE_ERROR, expected, e.to_string())?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if raw.id.is_none() {
            log.log(
                &object_id,
                codes::EVT_MISSING_ID,
                expected,
                "descriptor lacks vendor, name, or version",
            )?;
            return Ok(None);
        }

        match classify(&raw.content) {
            Some(kind) if kind == expected => Ok(Some(raw)),
            found => {
                log.log(
                    raw.object_id(),
                    codes::EVT_CLASSIFY,
                    expected,
                    format!(
                        "expected a {} descriptor, found {}",
                        expected,
                        found.map_or_else(|| "no known descriptor kind".to_string(), |k| k.to_string())
                    ),
                )?;
                Ok(None)
            }
        }
    }

    fn admit(
        &self,
        raw: &RawDescriptor,
        kind: DescriptorKind,
        log: &mut EventLog,
    ) -> Result<Admission> {
        if let Some(id) = self.paths.get(&raw.path) {
            return Ok(Admission::Existing(id.clone()));
        }

        // The reader has already reported descriptors without an id
        let Some(id) = raw.id.clone() else {
            return Ok(Admission::Rejected);
        };

        let existing = match kind {
            DescriptorKind::Package => self.packages.get(&id).map(|p| p.source()),
            DescriptorKind::Service => self.services.get(&id).map(|s| s.source()),
            DescriptorKind::Function => self.functions.get(&id).map(|f| f.source()),
        };

        match existing {
            None => Ok(Admission::New(id)),
            Some(source) if source.content == raw.content => Ok(Admission::Existing(id)),
            Some(source) => {
                log.log(
                    id.to_string(),
                    codes::EVT_DUPLICATE_ID,
                    kind,
                    format!(
                        "{:?} declares {} already loaded from {:?}",
                        raw.path, id, source.path
                    ),
                )?;
                Ok(Admission::Rejected)
            }
        }
    }

    fn typed<T: DeserializeOwned>(
        raw: &RawDescriptor,
        kind: DescriptorKind,
        log: &mut EventLog,
    ) -> Result<Option<T>> {
        match serde_json::from_value(raw.content.clone()) {
            Ok(typed) => Ok(Some(typed)),
            Err(e) => {
                log.log(
                    raw.object_id(),
                    codes::EVT_PARSE_ERROR,
                    kind,
                    format!("malformed {} descriptor: {}", kind, e),
                )?;
                Ok(None)
            }
        }
    }
}
