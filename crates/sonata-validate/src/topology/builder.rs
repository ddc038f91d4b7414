//! Topology graph construction from storage objects
//!
//! | Level | Adds |
//! |---|---|
//! | 0 | service connection points, one node per function |
//! | 1 | function connection points, fully connected inside their function |
//! | 2 | one node per unit and the function's internal links |
//!
//! Each level keeps everything the level below it has, so the function
//! clique is still present at levels 2 and 3.
//! | 3 | unit connection points, fully connected inside their unit |
//!
//! Node names are the references used in descriptors: service connection
//! points as declared, `<vnf_id>:<port>` for function connection points,
//! `<vnf_id>:<unit>` and `<vnf_id>:<unit>:<port>` below that. A reference
//! to something collapsed at the chosen level resolves to the node it is
//! collapsed onto.

use std::fmt;

use crate::storage::{Function, LinkSet, Node, Service, Storage};

use super::graph::{EdgeKind, NodeKind, TopologyGraph};

/// Granularity of the built graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum TopologyLevel {
    Functions = 0,
    #[default]
    FunctionInterfaces = 1,
    Units = 2,
    UnitInterfaces = 3,
}

impl TryFrom<u8> for TopologyLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Functions),
            1 => Ok(Self::FunctionInterfaces),
            2 => Ok(Self::Units),
            3 => Ok(Self::UnitInterfaces),
            other => Err(format!("topology level must be 0-3, got {}", other)),
        }
    }
}

impl fmt::Display for TopologyLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", *self as u8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopologyOptions {
    pub level: TopologyLevel,
    /// Include bridges as synthetic star nodes
    pub bridges: bool,
    /// Connect the connection points of each unit at level 3
    pub vdu_in: bool,
}

impl Default for TopologyOptions {
    fn default() -> Self {
        Self {
            level: TopologyLevel::default(),
            bridges: false,
            vdu_in: true,
        }
    }
}

pub struct TopologyBuilder<'a> {
    storage: &'a Storage,
    options: TopologyOptions,
}

impl<'a> TopologyBuilder<'a> {
    pub fn new(storage: &'a Storage, options: TopologyOptions) -> Self {
        Self { storage, options }
    }

    pub fn options(&self) -> &TopologyOptions {
        &self.options
    }

    /// Graph of a service and the functions mapped in its vnf-id map
    pub fn build_service(&self, service: &Service) -> TopologyGraph {
        let mut graph = TopologyGraph::new();

        for cp in service.interfaces() {
            graph.add_node(&cp.id, NodeKind::ServiceInterface, Some(service.id()));
        }

        for (vnf_id, function_ref) in service.function_map() {
            let Some(function) = function_ref
                .resolved
                .as_ref()
                .and_then(|id| self.storage.function(id))
            else {
                continue;
            };
            self.add_function(&mut graph, vnf_id, Some(vnf_id), function, self.options.level);
        }

        self.add_links(&mut graph, service.links(), None);
        graph
    }

    /// Graph of a single function. Units are always expanded.
    pub fn build_function(&self, function: &Function) -> TopologyGraph {
        let mut graph = TopologyGraph::new();
        let level = self.options.level.max(TopologyLevel::Units);
        self.add_function(&mut graph, function.id(), None, function, level);
        graph
    }

    fn add_function(
        &self,
        graph: &mut TopologyGraph,
        node: &str,
        prefix: Option<&str>,
        function: &Function,
        level: TopologyLevel,
    ) {
        let owner = prefix.unwrap_or(node);
        graph.add_node(node, NodeKind::Function, Some(owner));

        let ports: Vec<String> = function
            .interfaces()
            .iter()
            .map(|i| qualify(prefix, &i.id))
            .collect();

        if level == TopologyLevel::Functions {
            for port in ports {
                graph.add_alias(port, node);
            }
            return;
        }

        for port in &ports {
            graph.add_node(port, NodeKind::FunctionInterface, Some(owner));
            graph.add_edge(port, node, EdgeKind::Membership, owner);
        }
        graph.add_clique(&ports, EdgeKind::FunctionInternal, owner);

        if level == TopologyLevel::FunctionInterfaces {
            return;
        }

        for unit in function.units() {
            let unit_node = qualify(prefix, unit.id());
            graph.add_node(&unit_node, NodeKind::Unit, Some(owner));
            graph.add_edge(&unit_node, node, EdgeKind::Membership, owner);

            let unit_ports: Vec<String> = unit
                .interfaces()
                .iter()
                .map(|i| format!("{}:{}", unit_node, i.id))
                .collect();

            if level == TopologyLevel::Units {
                for port in unit_ports {
                    graph.add_alias(port, &unit_node);
                }
                continue;
            }

            for port in &unit_ports {
                graph.add_node(port, NodeKind::UnitInterface, Some(&unit_node));
                graph.add_edge(port, &unit_node, EdgeKind::Membership, &unit_node);
            }
            if self.options.vdu_in {
                graph.add_clique(&unit_ports, EdgeKind::VduIn, &unit_node);
            }
        }

        self.add_links(graph, function.links(), prefix);
    }

    fn add_links(&self, graph: &mut TopologyGraph, links: &LinkSet, prefix: Option<&str>) {
        for link in &links.links {
            let ends = [
                qualify(prefix, &link.endpoints[0]),
                qualify(prefix, &link.endpoints[1]),
            ];
            let a = endpoint_node(graph, &ends[0]);
            let b = endpoint_node(graph, &ends[1]);
            graph.add_edge(&a, &b, EdgeKind::Link, &link.id);
            for reference in ends {
                graph.mark_linked(reference);
            }
        }

        if !self.options.bridges {
            return;
        }

        for bridge in &links.bridges {
            let name = qualify(prefix, &format!("br-{}", bridge.id));
            graph.add_node(&name, NodeKind::Bridge, prefix);
            for member in &bridge.members {
                let reference = qualify(prefix, member);
                let node = endpoint_node(graph, &reference);
                graph.add_edge(&name, &node, EdgeKind::Bridge, &bridge.id);
                graph.mark_linked(reference);
            }
        }
    }
}

fn qualify(prefix: Option<&str>, reference: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, reference),
        None => reference.to_string(),
    }
}

/// Node for a link endpoint, adding an undeclared node if nothing matches
fn endpoint_node(graph: &mut TopologyGraph, reference: &str) -> String {
    if let Some(node) = graph.locate(reference) {
        return node.to_string();
    }
    graph.add_node(reference, NodeKind::Undeclared, None);
    reference.to_string()
}
