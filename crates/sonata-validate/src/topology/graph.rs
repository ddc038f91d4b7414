//! Undirected labelled graph used for topology validation

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fmt::Write as _;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    ServiceInterface,
    Function,
    FunctionInterface,
    Unit,
    UnitInterface,
    Bridge,
    /// Referenced by a link but not declared anywhere
    Undeclared,
}

impl NodeKind {
    /// Whether nodes of this kind are connection points
    pub fn is_interface(&self) -> bool {
        matches!(
            self,
            Self::ServiceInterface | Self::FunctionInterface | Self::UnitInterface
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::ServiceInterface => "service_interface",
            Self::Function => "function",
            Self::FunctionInterface => "function_interface",
            Self::Unit => "unit",
            Self::UnitInterface => "unit_interface",
            Self::Bridge => "bridge",
            Self::Undeclared => "undeclared",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Declared E-Line link
    Link,
    /// Bridge star edge
    Bridge,
    /// Opaque wiring inside a function
    FunctionInternal,
    /// Connection point to its owning function or unit
    Membership,
    /// Wiring between the connection points of one unit
    VduIn,
}

impl EdgeKind {
    /// Whether the edge comes from a declared virtual link
    pub fn is_declared(&self) -> bool {
        matches!(self, Self::Link | Self::Bridge)
    }
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Link => "link",
            Self::Bridge => "bridge",
            Self::FunctionInternal => "function_internal",
            Self::Membership => "membership",
            Self::VduIn => "vdu_in",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeAttrs {
    pub kind: NodeKind,
    /// Object the node belongs to (service id, vnf id, unit)
    pub owner: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeAttrs {
    pub kind: EdgeKind,
    pub label: String,
}

/// Undirected graph keyed by node name. Iteration order is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TopologyGraph {
    nodes: BTreeMap<String, NodeAttrs>,
    adjacency: BTreeMap<String, BTreeMap<String, EdgeAttrs>>,
    aliases: BTreeMap<String, String>,
    /// References a declared link or bridge touches, as written
    linked: BTreeSet<String>,
}

impl TopologyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. An existing node keeps its attributes.
    pub fn add_node(&mut self, name: impl Into<String>, kind: NodeKind, owner: Option<&str>) {
        let name = name.into();
        self.adjacency.entry(name.clone()).or_default();
        self.nodes.entry(name).or_insert_with(|| NodeAttrs {
            kind,
            owner: owner.map(str::to_string),
        });
    }

    /// Add an undirected edge between two existing nodes. Self-loops and
    /// edges to unknown nodes are ignored; the first edge between a pair
    /// wins.
    pub fn add_edge(&mut self, a: &str, b: &str, kind: EdgeKind, label: impl Into<String>) {
        if a == b || !self.contains(a) || !self.contains(b) {
            return;
        }
        let attrs = EdgeAttrs {
            kind,
            label: label.into(),
        };
        self.adjacency
            .entry(a.to_string())
            .or_default()
            .entry(b.to_string())
            .or_insert_with(|| attrs.clone());
        self.adjacency
            .entry(b.to_string())
            .or_default()
            .entry(a.to_string())
            .or_insert(attrs);
    }

    /// Fully connect `members` with edges of `kind`
    pub fn add_clique(&mut self, members: &[String], kind: EdgeKind, label: &str) {
        for (i, a) in members.iter().enumerate() {
            for b in &members[i + 1..] {
                self.add_edge(a, b, kind, label);
            }
        }
    }

    /// Make `reference` resolve to `node` without adding a node
    pub fn add_alias(&mut self, reference: impl Into<String>, node: impl Into<String>) {
        self.aliases.insert(reference.into(), node.into());
    }

    /// Record that a declared link or bridge touches `reference`
    pub fn mark_linked(&mut self, reference: impl Into<String>) {
        self.linked.insert(reference.into());
    }

    pub fn contains(&self, name: &str) -> bool {
        self.nodes.contains_key(name)
    }

    pub fn node(&self, name: &str) -> Option<&NodeAttrs> {
        self.nodes.get(name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&str, &NodeAttrs)> {
        self.nodes.iter().map(|(n, a)| (n.as_str(), a))
    }

    /// Node a connection point reference maps to: the node of that name, or
    /// the node it is collapsed onto at this level
    pub fn locate(&self, reference: &str) -> Option<&str> {
        if let Some((name, _)) = self.nodes.get_key_value(reference) {
            return Some(name.as_str());
        }
        self.aliases.get(reference).map(|n| n.as_str())
    }

    pub fn neighbours(&self, name: &str) -> impl Iterator<Item = (&str, &EdgeAttrs)> {
        self.adjacency
            .get(name)
            .into_iter()
            .flat_map(|edges| edges.iter().map(|(n, e)| (n.as_str(), e)))
    }

    pub fn edge(&self, a: &str, b: &str) -> Option<&EdgeAttrs> {
        self.adjacency.get(a).and_then(|edges| edges.get(b))
    }

    pub fn is_adjacent(&self, a: &str, b: &str) -> bool {
        self.edge(a, b).is_some()
    }

    /// Whether a declared link or bridge touches `name`
    pub fn is_attached(&self, name: &str) -> bool {
        self.neighbours(name).any(|(_, e)| e.kind.is_declared())
    }

    /// Whether `reference` names a connection point that no declared link
    /// or bridge touches. Connection points collapsed onto another node at
    /// this level are judged by the reference itself, not by that node.
    pub fn is_detached(&self, reference: &str) -> bool {
        match self.nodes.get(reference) {
            Some(attrs) => attrs.kind.is_interface() && !self.is_attached(reference),
            None => self.aliases.contains_key(reference) && !self.linked.contains(reference),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|e| e.len()).sum::<usize>() / 2
    }

    /// Render the graph as GraphML
    pub fn to_graphml(&self) -> String {
        let mut out = String::new();
        out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
        out.push_str("<graphml xmlns=\"http://graphml.graphdrawing.org/xmlns\">\n");
        out.push_str("  <key id=\"kind\" for=\"node\" attr.name=\"kind\" attr.type=\"string\"/>\n");
        out.push_str("  <key id=\"owner\" for=\"node\" attr.name=\"owner\" attr.type=\"string\"/>\n");
        out.push_str("  <key id=\"type\" for=\"edge\" attr.name=\"kind\" attr.type=\"string\"/>\n");
        out.push_str("  <key id=\"label\" for=\"edge\" attr.name=\"label\" attr.type=\"string\"/>\n");
        out.push_str("  <graph id=\"topology\" edgedefault=\"undirected\">\n");

        for (name, attrs) in &self.nodes {
            let _ = write!(
                out,
                "    <node id=\"{}\"><data key=\"kind\">{}</data>",
                escape_xml(name),
                attrs.kind
            );
            if let Some(owner) = &attrs.owner {
                let _ = write!(out, "<data key=\"owner\">{}</data>", escape_xml(owner));
            }
            out.push_str("</node>\n");
        }

        for (a, edges) in &self.adjacency {
            for (b, attrs) in edges.iter().filter(|(b, _)| a < *b) {
                let _ = writeln!(
                    out,
                    "    <edge source=\"{}\" target=\"{}\"><data key=\"type\">{}</data><data key=\"label\">{}</data></edge>",
                    escape_xml(a),
                    escape_xml(b),
                    attrs.kind,
                    escape_xml(&attrs.label)
                );
            }
        }

        out.push_str("  </graph>\n</graphml>\n");
        out
    }
}

fn escape_xml(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}
