//! Validator façade
//!
//! Drives one validation run through its layers:
//!
//! ```text
//! READ -> CLASSIFY -> SYNTAX -> INTEGRITY -> TOPOLOGY -> REPORT
//! ```
//!
//! Read and classification failures end the run. A syntax failure skips
//! integrity and topology; an integrity failure skips topology. Every run
//! owns its storage, event log and scratch directory, and returns a
//! [`ValidationReport`] unless it was cancelled or hit an internal error.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use sonata_core::{
    codes, read_descriptor_async, Descriptor, DescriptorKind, EventCatalog, EventLog,
    SchemaResolver, SyntaxOutcome, SyntaxValidator, Workspace,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::archive::PackageSource;
use crate::error::{Error, Result};
use crate::integrity::IntegrityValidator;
use crate::loader::{ChainLoader, DirectoryLoader, PackageLoader};
use crate::report::ValidationReport;
use crate::storage::Storage;
use crate::topology::{
    PathTrace, TopologyGraph, TopologyLevel, TopologyOptions, TopologyValidator,
};

/// Which layers run, and how
#[derive(Debug, Clone)]
pub struct ValidatorConfig {
    pub syntax: bool,
    pub integrity: bool,
    pub topology: bool,

    /// Directory searched for function descriptors referenced by services
    pub function_path: Option<PathBuf>,

    /// Graph level used to trace forwarding paths
    pub topology_level: TopologyLevel,

    /// Cancels runs at their next suspension point
    pub cancellation: CancellationToken,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            syntax: true,
            integrity: true,
            topology: true,
            function_path: None,
            topology_level: TopologyLevel::default(),
            cancellation: CancellationToken::new(),
        }
    }
}

impl ValidatorConfig {
    /// Enable exactly the given layers
    pub fn layers(syntax: bool, integrity: bool, topology: bool) -> Self {
        Self {
            syntax,
            integrity,
            topology,
            ..Self::default()
        }
    }

    pub fn with_function_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.function_path = Some(path.into());
        self
    }

    pub fn with_topology_level(mut self, level: TopologyLevel) -> Self {
        self.topology_level = level;
        self
    }

    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancellation = token;
        self
    }
}

/// Validates packages, services, and functions
pub struct Validator {
    config: ValidatorConfig,
    resolver: Arc<SchemaResolver>,
    catalog: Arc<EventCatalog>,
}

impl Validator {
    pub fn new(resolver: Arc<SchemaResolver>, catalog: Arc<EventCatalog>) -> Self {
        Self {
            config: ValidatorConfig::default(),
            resolver,
            catalog,
        }
    }

    /// Validator using the schema sources and event levels configured for
    /// `workspace`
    pub fn from_workspace(workspace: &Workspace) -> Result<Self> {
        let config = workspace.load_config()?;
        let resolver = SchemaResolver::from_config(&config)?;
        let catalog = workspace.load_event_catalog()?;
        Ok(Self::new(Arc::new(resolver), Arc::new(catalog)))
    }

    pub fn configure(&mut self, config: ValidatorConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn resolver(&self) -> &Arc<SchemaResolver> {
        &self.resolver
    }

    /// Validate a package archive or extracted package directory
    pub async fn validate_package(&self, path: &Path) -> Result<ValidationReport> {
        self.run(DescriptorKind::Package, path).await
    }

    /// Validate a service descriptor and the functions it references
    pub async fn validate_service(&self, path: &Path) -> Result<ValidationReport> {
        self.run(DescriptorKind::Service, path).await
    }

    /// Validate a function descriptor
    pub async fn validate_function(&self, path: &Path) -> Result<ValidationReport> {
        self.run(DescriptorKind::Function, path).await
    }

    async fn run(&self, kind: DescriptorKind, path: &Path) -> Result<ValidationReport> {
        info!(
            "Validating {} {:?} (syntax: {}, integrity: {}, topology: {})",
            kind, path, self.config.syntax, self.config.integrity, self.config.topology
        );
        if self.config.cancellation.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut run = Run::new(self, path);
        match kind {
            DescriptorKind::Package => run.package(path).await?,
            DescriptorKind::Service => run.service(path, None, true).await?,
            DescriptorKind::Function => run.function(path).await?,
        }

        let report = run.finish(kind);
        info!(
            "Validated {} {}: {} error(s), {} warning(s)",
            kind, report.object_id, report.error_count, report.warning_count
        );
        Ok(report)
    }
}

/// Await `fut` unless `token` is cancelled first
async fn guarded<F: Future>(token: &CancellationToken, fut: F) -> Result<F::Output> {
    tokio::select! {
        biased;
        _ = token.cancelled() => Err(Error::Cancelled),
        output = fut => Ok(output),
    }
}

/// State of a single validation run
struct Run<'v> {
    config: &'v ValidatorConfig,
    resolver: &'v SchemaResolver,
    token: CancellationToken,
    storage: Storage,
    log: EventLog,
    object_id: String,
    traces: Vec<PathTrace>,
    topology: Option<TopologyGraph>,
}

impl<'v> Run<'v> {
    fn new(validator: &'v Validator, path: &Path) -> Self {
        Self {
            config: &validator.config,
            resolver: &validator.resolver,
            token: validator.config.cancellation.clone(),
            storage: Storage::new(),
            log: EventLog::new(Arc::clone(&validator.catalog)),
            object_id: path.display().to_string(),
            traces: Vec::new(),
            topology: None,
        }
    }

    fn finish(self, kind: DescriptorKind) -> ValidationReport {
        ValidationReport::from_log(self.object_id, kind, &self.log, self.traces, self.topology)
    }

    fn deeper_layers(&self) -> bool {
        self.config.integrity || self.config.topology
    }

    fn topology_options(&self) -> TopologyOptions {
        TopologyOptions {
            level: self.config.topology_level,
            ..TopologyOptions::default()
        }
    }

    /// READ and CLASSIFY
    async fn load(&mut self, path: &Path, expected: DescriptorKind) -> Result<Option<Descriptor>> {
        let object_id = path.display().to_string();

        let raw = match guarded(&self.token, read_descriptor_async(path)).await? {
            Ok(raw) => raw,
            Err(e @ sonata_core::Error::Read { .. }) => {
                self.log
                    .log(&object_id, codes::EVT_READ_ERROR, expected, e.to_string())?;
                return Ok(None);
            }
            Err(e @ sonata_core::Error::Parse { .. }) => {
                self.log
                    .log(&object_id, codes::EVT_PARSE_ERROR, expected, e.to_string())?;
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        if raw.id.is_none() {
            self.log.log(
                &object_id,
                codes::EVT_MISSING_ID,
                expected,
                "descriptor lacks vendor, name, or version",
            )?;
        }

        match self.resolver.classify(raw) {
            Ok(descriptor) if descriptor.kind() == expected => Ok(Some(descriptor)),
            Ok(descriptor) => {
                self.log.log(
                    descriptor.object_id(),
                    codes::EVT_CLASSIFY,
                    expected,
                    format!(
                        "expected a {} descriptor, found a {} descriptor",
                        expected,
                        descriptor.kind()
                    ),
                )?;
                Ok(None)
            }
            Err(raw) => {
                self.log.log(
                    raw.object_id(),
                    codes::EVT_CLASSIFY,
                    expected,
                    "no package, service, or function discriminator keys",
                )?;
                Ok(None)
            }
        }
    }

    /// SYNTAX. Returns whether deeper layers may run.
    async fn syntax(&mut self, descriptor: &Descriptor) -> Result<bool> {
        if !self.config.syntax {
            return Ok(true);
        }

        let validator = SyntaxValidator::new(self.resolver);
        let outcome = guarded(&self.token, validator.validate(descriptor, &mut self.log)).await??;
        if let SyntaxOutcome::Invalid(count) = outcome {
            info!(
                "{} failed syntax validation with {} violation(s), skipping deeper layers",
                descriptor.object_id(),
                count
            );
            return Ok(false);
        }
        Ok(true)
    }

    async fn function(&mut self, path: &Path) -> Result<()> {
        let Some(descriptor) = self.load(path, DescriptorKind::Function).await? else {
            return Ok(());
        };
        self.object_id = descriptor.object_id();

        if !self.syntax(&descriptor).await? || !self.deeper_layers() {
            return Ok(());
        }

        let checkpoint = self.log.checkpoint();
        let Some(id) = self
            .storage
            .register_function(descriptor.into_raw(), &mut self.log)?
        else {
            return Ok(());
        };
        let function = self
            .storage
            .function(&id)
            .ok_or_else(|| Error::internal(format!("function {} vanished from storage", id)))?;

        if self.config.integrity {
            IntegrityValidator::new(&self.storage).validate_function(function, &mut self.log)?;
        }

        if !self.config.topology {
            return Ok(());
        }
        if self.log.errors_since(checkpoint) > 0 {
            info!("Integrity errors in {}, skipping topology", id);
            return Ok(());
        }

        let outcome = TopologyValidator::new(&self.storage, self.topology_options())
            .validate_function(function, &mut self.log)?;
        self.topology = Some(outcome.graph);
        Ok(())
    }

    /// Validate a service. `package_loader` is set when the service is the
    /// entry service of a package; `topology_allowed` is false when the
    /// enclosing package already failed integrity.
    async fn service(
        &mut self,
        path: &Path,
        package_loader: Option<PackageLoader>,
        topology_allowed: bool,
    ) -> Result<()> {
        let in_package = package_loader.is_some();
        let Some(descriptor) = self.load(path, DescriptorKind::Service).await? else {
            return Ok(());
        };
        if !in_package {
            self.object_id = descriptor.object_id();
        }

        if !self.syntax(&descriptor).await? || !self.deeper_layers() {
            return Ok(());
        }

        let mut loader = ChainLoader::new();
        if let Some(package_loader) = package_loader {
            loader = loader.with(package_loader);
        }
        if let Some(dir) = &self.config.function_path {
            let scanned = guarded(&self.token, DirectoryLoader::scan_async(dir.clone())).await??;
            loader = loader.with(scanned);
        }

        let checkpoint = self.log.checkpoint();
        let registered = guarded(
            &self.token,
            self.storage
                .register_service(descriptor.into_raw(), &loader, &mut self.log),
        )
        .await??;
        let Some(id) = registered else {
            return Ok(());
        };

        let service = self
            .storage
            .service(&id)
            .ok_or_else(|| Error::internal(format!("service {} vanished from storage", id)))?;

        if self.config.syntax {
            let functions: Vec<Descriptor> = self
                .storage
                .service_functions(service)
                .into_iter()
                .map(|f| Descriptor::Function(f.source().clone()))
                .collect();

            let mut functions_valid = true;
            for function in &functions {
                functions_valid &= self.syntax(function).await?;
            }
            if !functions_valid {
                return Ok(());
            }
        }

        let service = self
            .storage
            .service(&id)
            .ok_or_else(|| Error::internal(format!("service {} vanished from storage", id)))?;

        if self.config.integrity {
            let integrity = IntegrityValidator::new(&self.storage);
            integrity.validate_service(service, &mut self.log)?;
            for function in self.storage.service_functions(service) {
                integrity.validate_function(function, &mut self.log)?;
            }
        }

        if !self.config.topology {
            return Ok(());
        }
        if !topology_allowed || self.log.errors_since(checkpoint) > 0 {
            info!("Integrity errors in {}, skipping topology", id);
            return Ok(());
        }

        let outcome = TopologyValidator::new(&self.storage, self.topology_options())
            .validate_service(service, &mut self.log)?;
        debug!(
            "Traced {} forwarding path(s) in {}",
            outcome.traces.len(),
            id
        );
        self.traces = outcome.traces;
        self.topology = Some(outcome.graph);
        Ok(())
    }

    async fn package(&mut self, path: &Path) -> Result<()> {
        let source = match guarded(&self.token, PackageSource::open(path)).await? {
            Ok(source) => source,
            Err(e @ Error::Internal { .. }) => return Err(e),
            Err(e) => {
                self.log.log(
                    path.display().to_string(),
                    codes::EVT_READ_ERROR,
                    DescriptorKind::Package,
                    format!("cannot open package: {}", e),
                )?;
                return Ok(());
            }
        };

        let manifest = source.manifest_path();
        let Some(descriptor) = self.load(&manifest, DescriptorKind::Package).await? else {
            return Ok(());
        };
        self.object_id = descriptor.object_id();

        if !self.syntax(&descriptor).await? || !self.deeper_layers() {
            return Ok(());
        }

        let checkpoint = self.log.checkpoint();
        let Some(id) =
            self.storage
                .register_package(descriptor.into_raw(), source.root(), &mut self.log)?
        else {
            return Ok(());
        };

        let package = self
            .storage
            .package(&id)
            .ok_or_else(|| Error::internal(format!("package {} vanished from storage", id)))?;

        let entry_service = if self.config.integrity {
            let integrity = IntegrityValidator::new(&self.storage);
            guarded(&self.token, integrity.validate_package(package, &mut self.log)).await??;
            integrity.entry_service(package, &mut self.log)?
        } else {
            package.entry_service_path().filter(|path| path.is_file())
        };
        let loader = guarded(&self.token, PackageLoader::from_package_async(package)).await??;

        let package_ok = self.log.errors_since(checkpoint) == 0;
        if let Some(entry_service) = entry_service {
            self.service(&entry_service, Some(loader), package_ok).await?;
        }

        // Extracted files are removed here
        drop(source);
        Ok(())
    }
}
