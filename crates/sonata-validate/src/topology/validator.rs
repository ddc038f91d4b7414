//! Topology validation: forwarding paths, undeclared and unused
//! connection points

use std::collections::BTreeSet;

use sonata_core::{codes, DescriptorKind, EventLog};
use tracing::debug;

use crate::error::Result;
use crate::storage::{Endpoint, Function, Node, Service, Storage};

use super::builder::{TopologyBuilder, TopologyOptions};
use super::graph::TopologyGraph;
use super::trace::{trace_path, PathTrace};

/// Graph and path traces produced by a topology check
#[derive(Debug, Clone)]
pub struct TopologyOutcome {
    pub graph: TopologyGraph,
    pub traces: Vec<PathTrace>,
    /// Whether the check recorded no error events
    pub passed: bool,
}

pub struct TopologyValidator<'a> {
    storage: &'a Storage,
    options: TopologyOptions,
}

impl<'a> TopologyValidator<'a> {
    /// Bridges are always part of the graph used for validation
    pub fn new(storage: &'a Storage, options: TopologyOptions) -> Self {
        Self {
            storage,
            options: TopologyOptions {
                bridges: true,
                ..options
            },
        }
    }

    pub fn validate_service(&self, service: &Service, log: &mut EventLog) -> Result<TopologyOutcome> {
        let checkpoint = log.checkpoint();
        let object_id = service.id().to_string();
        let scope = DescriptorKind::Service;

        let graph = TopologyBuilder::new(self.storage, self.options).build_service(service);
        debug!(
            "Service {} topology at level {}: {} node(s), {} edge(s)",
            object_id,
            self.options.level,
            graph.node_count(),
            graph.edge_count()
        );

        let is_declared = |reference: &str| {
            matches!(
                self.storage.resolve_endpoint(service, reference),
                Endpoint::Service | Endpoint::Function { .. }
            )
        };

        let mut used: BTreeSet<String> = BTreeSet::new();
        let mut undeclared: BTreeSet<String> = BTreeSet::new();

        for (_, reference) in service.links().references() {
            used.insert(reference.to_string());
            if !is_declared(reference) {
                undeclared.insert(reference.to_string());
            }
        }

        let mut traces = Vec::new();
        for fg in service.forwarding_graphs() {
            for path in &fg.paths {
                let ordered = path.ordered();

                for dup in &ordered.duplicates {
                    log.log(
                        &object_id,
                        codes::EVT_FP_DUPLICATE_POSITION,
                        scope,
                        format!(
                            "path '{}': position {} used by '{}' and '{}', ignoring '{}'",
                            path.id,
                            dup.kept.position,
                            dup.kept.reference,
                            dup.ignored.reference,
                            dup.ignored.reference
                        ),
                    )?;
                }

                let mut visited = BTreeSet::new();
                for endpoint in &ordered.endpoints {
                    used.insert(endpoint.clone());
                    if !visited.insert(endpoint.as_str()) {
                        log.log(
                            &object_id,
                            codes::EVT_FP_CYCLE,
                            scope,
                            format!("path '{}' visits '{}' more than once", path.id, endpoint),
                        )?;
                    }
                    if !is_declared(endpoint) {
                        undeclared.insert(endpoint.clone());
                        log.log(
                            &object_id,
                            codes::EVT_FP_CPOINT_UNDEFINED,
                            scope,
                            format!(
                                "path '{}' references undefined connection point '{}'",
                                path.id, endpoint
                            ),
                        )?;
                    }
                }

                let trace = trace_path(&graph, &fg.id, &path.id, &ordered.endpoints);
                for brk in &trace.breaks {
                    log.log(
                        &object_id,
                        codes::EVT_FP_BREAK,
                        scope,
                        format!("path '{}' breaks between '{}' and '{}'", path.id, brk.from, brk.to),
                    )?;
                }
                traces.push(trace);
            }
        }

        for reference in &undeclared {
            log.log(
                &object_id,
                codes::EVT_CPOINT_UNDECLARED,
                scope,
                format!("'{}' is referenced but not declared", reference),
            )?;
        }

        for declared in self.declared_service_points(service) {
            if !used.contains(&declared) {
                log.log(
                    &object_id,
                    codes::EVT_CPOINT_UNUSED,
                    scope,
                    format!("'{}' is declared but never used", declared),
                )?;
            }
        }

        Ok(TopologyOutcome {
            graph,
            traces,
            passed: log.errors_since(checkpoint) == 0,
        })
    }

    pub fn validate_function(
        &self,
        function: &Function,
        log: &mut EventLog,
    ) -> Result<TopologyOutcome> {
        let checkpoint = log.checkpoint();
        let object_id = function.id().to_string();
        let scope = DescriptorKind::Function;

        let graph = TopologyBuilder::new(self.storage, self.options).build_function(function);
        debug!(
            "Function {} topology: {} node(s), {} edge(s)",
            object_id,
            graph.node_count(),
            graph.edge_count()
        );

        let mut used = BTreeSet::new();
        let mut undeclared = BTreeSet::new();
        for (_, reference) in function.links().references() {
            used.insert(reference.to_string());
            if !function.resolves(reference) {
                undeclared.insert(reference.to_string());
            }
        }

        for reference in &undeclared {
            log.log(
                &object_id,
                codes::EVT_CPOINT_UNDECLARED,
                scope,
                format!("'{}' is referenced but not declared", reference),
            )?;
        }

        for declared in function.endpoints() {
            if !used.contains(&declared) {
                log.log(
                    &object_id,
                    codes::EVT_CPOINT_UNUSED,
                    scope,
                    format!("'{}' is declared but never used", declared),
                )?;
            }
        }

        Ok(TopologyOutcome {
            graph,
            traces: Vec::new(),
            passed: log.errors_since(checkpoint) == 0,
        })
    }

    /// Service connection points plus `<vnf_id>:<port>` for every port of
    /// every mapped function
    fn declared_service_points(&self, service: &Service) -> Vec<String> {
        let own = service.interfaces().iter().map(|i| i.id.clone());
        let mapped = service
            .function_map()
            .into_iter()
            .filter_map(|(vnf_id, f)| {
                let function = f.resolved.as_ref().and_then(|id| self.storage.function(id))?;
                Some(
                    function
                        .interfaces()
                        .iter()
                        .map(|i| format!("{}:{}", vnf_id, i.id))
                        .collect::<Vec<_>>(),
                )
            })
            .flatten();
        own.chain(mapped).collect()
    }
}
