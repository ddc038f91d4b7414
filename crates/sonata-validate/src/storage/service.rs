//! Service (NSD) objects and forwarding graphs

use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::path::PathBuf;

use sonata_core::types::{ForwardingGraphDescriptor, ServiceDescriptor};
use sonata_core::{DescriptorId, DescriptorKind, EventLog, RawDescriptor};

use super::links::LinkSet;
use super::node::{Node, NodeData};
use crate::error::Result;

/// Entry of the service's vnf-id map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    /// Local alias used in `<vnf_id>:<port>` references
    pub vnf_id: String,

    /// Identifier the service asks for
    pub reference: DescriptorId,

    /// Identifier of the function the loader produced, if any
    pub resolved: Option<DescriptorId>,

    /// File the function was loaded from
    pub source: Option<PathBuf>,
}

/// `(position, connection_point_ref)` entry of a path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry {
    pub position: u32,
    pub reference: String,
}

/// Two entries claiming the same position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DuplicatePosition {
    pub kept: PathEntry,
    pub ignored: PathEntry,
}

/// Endpoints of a path in position order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderedPath {
    pub endpoints: Vec<String>,
    pub duplicates: Vec<DuplicatePosition>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingPath {
    pub id: String,
    pub policy: Option<String>,
    pub entries: Vec<PathEntry>,
}

impl ForwardingPath {
    /// Order entries by position. When two entries share a position the
    /// first one declared wins.
    pub fn ordered(&self) -> OrderedPath {
        let mut by_position: BTreeMap<u32, &PathEntry> = BTreeMap::new();
        let mut duplicates = Vec::new();

        for entry in &self.entries {
            match by_position.entry(entry.position) {
                Entry::Vacant(slot) => {
                    slot.insert(entry);
                }
                Entry::Occupied(slot) => duplicates.push(DuplicatePosition {
                    kept: (*slot.get()).clone(),
                    ignored: entry.clone(),
                }),
            }
        }

        OrderedPath {
            endpoints: by_position.values().map(|e| e.reference.clone()).collect(),
            duplicates,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForwardingGraph {
    pub id: String,
    pub constituent_vnfs: Vec<String>,
    pub constituent_links: Vec<String>,
    pub paths: Vec<ForwardingPath>,
}

impl From<&ForwardingGraphDescriptor> for ForwardingGraph {
    fn from(fg: &ForwardingGraphDescriptor) -> Self {
        Self {
            id: fg.fg_id.clone(),
            constituent_vnfs: fg.constituent_vnfs.clone(),
            constituent_links: fg.constituent_virtual_links.clone(),
            paths: fg
                .network_forwarding_paths
                .iter()
                .map(|fp| ForwardingPath {
                    id: fp.fp_id.clone(),
                    policy: fp.policy.clone(),
                    entries: fp
                        .connection_points
                        .iter()
                        .map(|p| PathEntry {
                            position: p.position,
                            reference: p.connection_point_ref.clone(),
                        })
                        .collect(),
                })
                .collect(),
        }
    }
}

/// A loaded service descriptor
#[derive(Debug, Clone)]
pub struct Service {
    node: NodeData,
    descriptor_id: DescriptorId,
    source: RawDescriptor,
    functions: Vec<FunctionRef>,
    links: LinkSet,
    forwarding_graphs: Vec<ForwardingGraph>,
}

impl Service {
    /// Build the service object. `functions` is the vnf-id map, already
    /// resolved by the caller.
    pub(crate) fn load(
        descriptor_id: DescriptorId,
        source: RawDescriptor,
        descriptor: &ServiceDescriptor,
        functions: Vec<FunctionRef>,
        log: &mut EventLog,
    ) -> Result<Self> {
        let owner = descriptor_id.to_string();
        let scope = DescriptorKind::Service;

        let mut node = NodeData::new(&owner);
        node.load_interfaces(&descriptor.connection_points, None, &owner, scope, log)?;
        let links = LinkSet::load(&descriptor.virtual_links, &owner, scope, log)?;

        Ok(Self {
            node,
            descriptor_id,
            source,
            functions,
            links,
            forwarding_graphs: descriptor
                .forwarding_graphs
                .iter()
                .map(ForwardingGraph::from)
                .collect(),
        })
    }

    pub fn descriptor_id(&self) -> &DescriptorId {
        &self.descriptor_id
    }

    pub fn source(&self) -> &RawDescriptor {
        &self.source
    }

    /// Every `network_functions` entry in declaration order, duplicates
    /// included
    pub fn functions(&self) -> &[FunctionRef] {
        &self.functions
    }

    /// vnf-id map entry for `vnf_id`. The first declaration wins.
    pub fn function_ref(&self, vnf_id: &str) -> Option<&FunctionRef> {
        self.functions.iter().find(|f| f.vnf_id == vnf_id)
    }

    /// vnf-id map without shadowed duplicates
    pub fn function_map(&self) -> BTreeMap<&str, &FunctionRef> {
        let mut map = BTreeMap::new();
        for f in &self.functions {
            map.entry(f.vnf_id.as_str()).or_insert(f);
        }
        map
    }

    pub fn links(&self) -> &LinkSet {
        &self.links
    }

    pub fn forwarding_graphs(&self) -> &[ForwardingGraph] {
        &self.forwarding_graphs
    }
}

impl Node for Service {
    fn data(&self) -> &NodeData {
        &self.node
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(position: u32, reference: &str) -> PathEntry {
        PathEntry {
            position,
            reference: reference.to_string(),
        }
    }

    #[test]
    fn test_ordered_sorts_by_position() {
        let path = ForwardingPath {
            id: "fp1".into(),
            policy: None,
            entries: vec![entry(3, "c"), entry(1, "a"), entry(2, "b")],
        };
        let ordered = path.ordered();
        assert_eq!(ordered.endpoints, vec!["a", "b", "c"]);
        assert!(ordered.duplicates.is_empty());
    }

    #[test]
    fn test_ordered_keeps_first_duplicate() {
        let path = ForwardingPath {
            id: "fp1".into(),
            policy: None,
            entries: vec![entry(1, "a"), entry(2, "b"), entry(2, "x"), entry(3, "c")],
        };
        let ordered = path.ordered();
        assert_eq!(ordered.endpoints, vec!["a", "b", "c"]);
        assert_eq!(
            ordered.duplicates,
            vec![DuplicatePosition {
                kept: entry(2, "b"),
                ignored: entry(2, "x"),
            }]
        );
    }
}
