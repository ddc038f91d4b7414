//! Scenario fixtures
//!
//! Services, functions, and packages laid out in temporary directories the
//! way `son-validate` finds them on disk.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use sonata_core::{EventCatalog, SchemaResolver};
use sonata_validate::{Validator, ValidatorConfig};
use tempfile::TempDir;

use super::builders::{FunctionBuilder, PackageBuilder, ServiceBuilder};

/// Path through both chained functions from `svc:in` to `svc:out`
pub const CHAIN_PATH: &[(&str, u32)] = &[
    ("svc:in", 1),
    ("A:in", 2),
    ("A:out", 3),
    ("B:in", 4),
    ("B:out", 5),
    ("svc:out", 6),
];

/// Validator using the bundled schemas and default event levels
pub fn validator(config: ValidatorConfig) -> Validator {
    let mut validator = Validator::new(
        Arc::new(SchemaResolver::bundled()),
        Arc::new(EventCatalog::embedded().expect("embedded event catalog")),
    );
    validator.configure(config);
    validator
}

/// Service `svc:in - A - B - svc:out` over E-Line links `l1`, `l2`, `l3`
pub fn chain_service() -> ServiceBuilder {
    ServiceBuilder::new("chain-service")
        .with_function("A", "vnf-a")
        .with_function("B", "vnf-b")
        .with_ports(&["svc:in", "svc:out"])
        .with_link("l1", "E-Line", &["svc:in", "A:in"])
        .with_link("l2", "E-Line", &["A:out", "B:in"])
        .with_link("l3", "E-Line", &["B:out", "svc:out"])
}

pub fn chain_functions() -> Vec<FunctionBuilder> {
    vec![
        FunctionBuilder::pass_through("vnf-a"),
        FunctionBuilder::pass_through("vnf-b"),
    ]
}

/// Service whose port `svc:m1` shares bridge `b1` with `A:m1` and `B:m1`
pub fn bridged_service() -> ServiceBuilder {
    ServiceBuilder::new("bridged-service")
        .with_function("A", "vnf-a")
        .with_function("B", "vnf-b")
        .with_ports(&["svc:m1"])
        .with_link("b1", "E-LAN", &["svc:m1", "A:m1", "B:m1"])
}

pub fn bridged_functions() -> Vec<FunctionBuilder> {
    vec![
        FunctionBuilder::single_port("vnf-a"),
        FunctionBuilder::single_port("vnf-b"),
    ]
}

/// A service descriptor next to a directory of function descriptors
pub struct ServiceFixture {
    pub dir: TempDir,
    pub service: PathBuf,
    pub functions: PathBuf,
}

impl ServiceFixture {
    pub fn new(service: &ServiceBuilder, functions: &[FunctionBuilder]) -> Self {
        let dir = TempDir::new().unwrap();
        let service_path = dir.path().join("nsd.yml");
        fs::write(&service_path, service.to_yaml()).unwrap();

        let function_dir = dir.path().join("vnfs");
        fs::create_dir_all(&function_dir).unwrap();
        for function in functions {
            fs::write(
                function_dir.join(format!("{}.yml", function.name())),
                function.to_yaml(),
            )
            .unwrap();
        }

        Self {
            dir,
            service: service_path,
            functions: function_dir,
        }
    }

    /// All layers, functions looked up in the fixture's function directory
    pub fn config(&self) -> ValidatorConfig {
        ValidatorConfig::default().with_function_path(&self.functions)
    }
}

/// A single function descriptor on disk
pub struct FunctionFixture {
    pub dir: TempDir,
    pub path: PathBuf,
}

impl FunctionFixture {
    pub fn new(function: &FunctionBuilder) -> Self {
        Self::from_yaml(&function.to_yaml())
    }

    pub fn from_yaml(content: &str) -> Self {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("vnfd.yml");
        fs::write(&path, content).unwrap();
        Self { dir, path }
    }
}

/// Chained service package built from [`chain_service`] and
/// [`chain_functions`]
pub fn chain_package() -> PackageBuilder {
    let mut package = PackageBuilder::new("chain-package")
        .with_service(chain_service().with_path("fp01", CHAIN_PATH));
    for function in chain_functions() {
        package = package.with_function(function);
    }
    package
}
