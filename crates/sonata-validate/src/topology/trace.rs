//! Forwarding path tracing
//!
//! A path is traced hop by hop over a built graph. A hop is feasible when
//! both endpoints resolve to the same node, to adjacent nodes, or to two
//! nodes sharing a bridge. A hop touching a connection point that no link
//! or bridge attaches is never feasible, also when the level collapses it
//! onto its function or unit. Infeasible hops insert a
//! [`TraceStep::Break`] into the trace.

use std::fmt;

use serde::{Serialize, Serializer};

use super::graph::{NodeKind, TopologyGraph};

/// Marker rendered for a break in a trace
pub const BREAK_MARKER: &str = "BREAK";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TraceStep {
    Node(String),
    Break,
}

impl fmt::Display for TraceStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Node(name) => write!(f, "{}", name),
            Self::Break => write!(f, "{}", BREAK_MARKER),
        }
    }
}

impl Serialize for TraceStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Infeasible hop between two consecutive endpoints
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathBreak {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathTrace {
    pub graph_id: String,
    pub path_id: String,
    pub steps: Vec<TraceStep>,
    pub breaks: Vec<PathBreak>,
}

impl PathTrace {
    pub fn is_complete(&self) -> bool {
        self.breaks.is_empty()
    }
}

enum Hop {
    Direct,
    Via(String),
    Broken,
}

/// Trace `endpoints` over `graph`. Pure: the same inputs always produce
/// the same trace.
pub fn trace_path(
    graph: &TopologyGraph,
    graph_id: &str,
    path_id: &str,
    endpoints: &[String],
) -> PathTrace {
    let mut steps = Vec::with_capacity(endpoints.len());
    let mut breaks = Vec::new();

    for (i, endpoint) in endpoints.iter().enumerate() {
        if i > 0 {
            let previous = &endpoints[i - 1];
            match hop(graph, previous, endpoint) {
                Hop::Direct => {}
                Hop::Via(bridge) => steps.push(TraceStep::Node(bridge)),
                Hop::Broken => {
                    steps.push(TraceStep::Break);
                    breaks.push(PathBreak {
                        from: previous.clone(),
                        to: endpoint.clone(),
                    });
                }
            }
        }
        steps.push(TraceStep::Node(endpoint.clone()));
    }

    PathTrace {
        graph_id: graph_id.to_string(),
        path_id: path_id.to_string(),
        steps,
        breaks,
    }
}

fn hop(graph: &TopologyGraph, from: &str, to: &str) -> Hop {
    if graph.is_detached(from) || graph.is_detached(to) {
        return Hop::Broken;
    }

    let (Some(a), Some(b)) = (graph.locate(from), graph.locate(to)) else {
        return Hop::Broken;
    };

    if a == b || graph.is_adjacent(a, b) {
        return Hop::Direct;
    }

    let shared_bridge = graph.neighbours(a).find_map(|(n, _)| {
        let is_bridge = graph.node(n).is_some_and(|attrs| attrs.kind == NodeKind::Bridge);
        (is_bridge && graph.is_adjacent(n, b)).then(|| n.to_string())
    });

    match shared_bridge {
        Some(bridge) => Hop::Via(bridge),
        None => Hop::Broken,
    }
}
