//! Integration tests for function validation
//!
//! Key scenarios:
//! - Valid function with units and internal links
//! - Unused and undeclared unit connection points
//! - Storage-level findings (duplicate units and ports, bad links)
//! - Read, parse, classification, and syntax failures
//! - Event level overrides from the workspace

mod common;

use std::collections::BTreeMap;
use std::fs;
use std::sync::Arc;

use common::*;
use serial_test::serial;
use sonata_core::{codes, EventCatalog, EventLevel, SchemaResolver, SchemaSources, Workspace};
use sonata_validate::{Validator, ValidatorConfig};
use tempfile::TempDir;

fn three_port_unit() -> FunctionBuilder {
    FunctionBuilder::new("vnf-x")
        .with_ports(&["in", "out"])
        .with_unit("vdu01", &["eth0", "eth1", "eth2"])
        .with_link("in-link", "E-Line", &["in", "vdu01:eth0"])
        .with_link("out-link", "E-Line", &["vdu01:eth1", "out"])
}

#[tokio::test]
async fn test_valid_function() {
    let function = FunctionBuilder::pass_through("vnf-a");
    let fixture = FunctionFixture::new(&function);

    let report = validator(ValidatorConfig::default())
        .validate_function(&fixture.path)
        .await
        .unwrap();

    assert_no_errors(&report);
    assert_eq!(report.warning_count, 0);
    assert_eq!(report.object_id, function.id());

    let graph = report.topology.as_ref().unwrap();
    assert!(graph.contains(&function.id()));
    assert!(graph.contains("vdu01"));
    assert!(graph.contains("in"));
    assert!(graph.is_adjacent("in", "vdu01"));
}

#[tokio::test]
async fn test_unused_unit_port_warns() {
    let fixture = FunctionFixture::new(&three_port_unit());
    let report = validator(ValidatorConfig::default())
        .validate_function(&fixture.path)
        .await
        .unwrap();

    assert_no_errors(&report);
    assert_event_mentions(&report, codes::EVT_CPOINT_UNUSED, "vdu01:eth2");
}

#[tokio::test]
async fn test_link_to_unknown_unit() {
    let function = FunctionBuilder::pass_through("vnf-a").with_link(
        "mgmt-link",
        "E-Line",
        &["in", "vdu02:eth0"],
    );
    let fixture = FunctionFixture::new(&function);

    let report = validator(ValidatorConfig::default())
        .validate_function(&fixture.path)
        .await
        .unwrap();

    assert_event_mentions(&report, codes::EVT_LINK_ENDPOINT_UNDEFINED, "vdu02:eth0");
    assert!(report.topology.is_none());
}

#[tokio::test]
async fn test_unavailable_schema_still_runs_deeper_layers() {
    let resolver = SchemaResolver::new(SchemaSources {
        bundled: false,
        ..SchemaSources::bundled_only()
    });
    let mut validator = Validator::new(
        Arc::new(resolver),
        Arc::new(EventCatalog::embedded().unwrap()),
    );
    validator.configure(ValidatorConfig::default());
    let fixture = FunctionFixture::new(&three_port_unit());

    let report = validator.validate_function(&fixture.path).await.unwrap();

    let event = single_event(&report, codes::EVT_SCHEMA_UNAVAILABLE);
    assert_eq!(event.level, EventLevel::Error);
    assert_event_mentions(&report, codes::EVT_CPOINT_UNUSED, "vdu01:eth2");
    assert!(report.topology.is_some());
}

#[tokio::test]
async fn test_duplicate_unit() {
    let function = FunctionBuilder::pass_through("vnf-a").with_unit("vdu01", &["eth9"]);
    let fixture = FunctionFixture::new(&function);

    let report = validator(ValidatorConfig::default())
        .validate_function(&fixture.path)
        .await
        .unwrap();

    assert_event_mentions(&report, codes::EVT_UNIT_DUPLICATE, "vdu01");
    // Load errors stop the topology layer too
    assert!(report.topology.is_none());
}

#[tokio::test]
async fn test_duplicate_connection_point() {
    let function = FunctionBuilder::pass_through("vnf-a").with_ports(&["in"]);
    let fixture = FunctionFixture::new(&function);

    let report = validator(ValidatorConfig::default())
        .validate_function(&fixture.path)
        .await
        .unwrap();

    assert_event_count(&report, codes::EVT_CPOINT_DUPLICATE, 1);
}

#[tokio::test]
async fn test_e_line_needs_two_endpoints() {
    let function = FunctionBuilder::pass_through("vnf-a").with_link(
        "wide",
        "E-Line",
        &["in", "out", "vdu01:eth0"],
    );
    let fixture = FunctionFixture::new(&function);

    let report = validator(ValidatorConfig::default())
        .validate_function(&fixture.path)
        .await
        .unwrap();

    assert_event_mentions(&report, codes::EVT_LINK_ENDPOINTS, "wide");
}

#[tokio::test]
async fn test_missing_units_fail_syntax() {
    let fixture = FunctionFixture::from_yaml(
        "vendor: eu.sonata-nfv\nname: empty\nversion: \"0.1\"\nvirtual_deployment_units: []\n",
    );
    let report = validator(ValidatorConfig::default())
        .validate_function(&fixture.path)
        .await
        .unwrap();

    assert_event_mentions(&report, codes::EVT_SYNTAX, "/virtual_deployment_units");
    assert!(report.topology.is_none());
}

#[tokio::test]
async fn test_missing_identifier() {
    let fixture = FunctionFixture::from_yaml(
        "vendor: eu.sonata-nfv\nname: anonymous\nvirtual_deployment_units:\n  - id: vdu01\n",
    );
    let report = validator(ValidatorConfig::default())
        .validate_function(&fixture.path)
        .await
        .unwrap();

    assert_event_count(&report, codes::EVT_MISSING_ID, 1);
    assert!(!report.is_valid());
}

#[tokio::test]
async fn test_malformed_yaml() {
    let fixture = FunctionFixture::from_yaml("vendor: [unclosed\n");
    let report = validator(ValidatorConfig::default())
        .validate_function(&fixture.path)
        .await
        .unwrap();

    assert_eq!(report.error_count, 1);
    assert_event_count(&report, codes::EVT_PARSE_ERROR, 1);
}

#[tokio::test]
async fn test_service_passed_as_function() {
    let fixture = FunctionFixture::from_yaml(&chain_service().to_yaml());
    let report = validator(ValidatorConfig::default())
        .validate_function(&fixture.path)
        .await
        .unwrap();

    assert_event_mentions(&report, codes::EVT_CLASSIFY, "found a service descriptor");
}

#[tokio::test]
async fn test_silenced_event_is_not_counted() {
    let mut catalog = EventCatalog::embedded().unwrap();
    catalog
        .apply_overrides(BTreeMap::from([(
            codes::EVT_CPOINT_UNUSED.to_string(),
            EventLevel::None,
        )]))
        .unwrap();
    let validator = Validator::new(Arc::new(SchemaResolver::bundled()), Arc::new(catalog));

    let fixture = FunctionFixture::new(&three_port_unit());
    let report = validator.validate_function(&fixture.path).await.unwrap();

    assert_no_errors(&report);
    assert_eq!(report.warning_count, 0);
    assert!(report.is_valid());
}

#[tokio::test]
#[serial]
async fn test_workspace_event_overrides() {
    let workspace = TempDir::new().unwrap();
    fs::write(
        workspace.path().join("eventcfg.yml"),
        "events:\n  evt_cpoint_unused: error\n",
    )
    .unwrap();

    let validator = Validator::from_workspace(&Workspace::with_root(workspace.path())).unwrap();
    let fixture = FunctionFixture::new(&three_port_unit());
    let report = validator.validate_function(&fixture.path).await.unwrap();

    let event = single_event(&report, codes::EVT_CPOINT_UNUSED);
    assert_eq!(event.level, EventLevel::Error);
    assert_eq!(report.exit_code(), 1);
}
