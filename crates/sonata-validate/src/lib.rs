//! # sonata-validate
//!
//! Validation layers above the schema check:
//! - Package extraction and hashing
//! - An in-memory storage of packages, services, and functions
//! - Integrity checks on the cross references between them
//! - Topology graphs and forwarding path tracing
//! - The [`Validator`] façade that runs the layers in order and produces a
//!   [`ValidationReport`]
//!
//! ```no_run
//! # async fn run() -> sonata_validate::Result<()> {
//! use sonata_core::Workspace;
//! use sonata_validate::{Validator, ValidatorConfig};
//!
//! let workspace = Workspace::locate()?;
//! let mut validator = Validator::from_workspace(&workspace)?;
//! validator.configure(ValidatorConfig::default().with_function_path("vnfs"));
//!
//! let report = validator.validate_service("nsd.yml".as_ref()).await?;
//! println!("{} error(s)", report.error_count);
//! # Ok(())
//! # }
//! ```

pub mod archive;
pub mod error;
pub mod integrity;
pub mod loader;
pub mod report;
pub mod storage;
pub mod topology;
pub mod validator;

pub use archive::{extract_archive, file_md5, file_sha256, PackageSource, MANIFEST_PATH};
pub use error::{Error, Result};
pub use integrity::IntegrityValidator;
pub use loader::{ChainLoader, DirectoryLoader, FunctionLoader, NoFunctions, PackageLoader};
pub use report::{ValidationReport, ValidationResult};
pub use storage::{Endpoint, Function, Package, Service, Storage};
pub use topology::{
    trace_path, PathTrace, TopologyBuilder, TopologyGraph, TopologyLevel, TopologyOptions,
    TopologyValidator, TraceStep,
};
pub use validator::{Validator, ValidatorConfig};
