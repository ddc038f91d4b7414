//! Network service descriptor (NSD) types

use serde::{Deserialize, Serialize};

use super::common_types::{deserialize_scalar, ConnectionPoint, VirtualLink};
use crate::descriptor::DescriptorId;

/// Network service descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceDescriptor {
    /// Functions composing the service
    #[serde(default)]
    pub network_functions: Vec<NetworkFunctionRef>,

    /// Service-level connection points
    #[serde(default)]
    pub connection_points: Vec<ConnectionPoint>,

    /// Links between service and function connection points
    #[serde(default)]
    pub virtual_links: Vec<VirtualLink>,

    /// Forwarding graphs over the service topology
    #[serde(default)]
    pub forwarding_graphs: Vec<ForwardingGraphDescriptor>,
}

/// Reference from a service to a function descriptor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkFunctionRef {
    /// Local alias of the function inside the service
    pub vnf_id: String,

    #[serde(deserialize_with = "deserialize_scalar")]
    pub vnf_vendor: String,

    #[serde(deserialize_with = "deserialize_scalar")]
    pub vnf_name: String,

    #[serde(deserialize_with = "deserialize_scalar")]
    pub vnf_version: String,
}

impl NetworkFunctionRef {
    /// Canonical identifier of the referenced function
    pub fn reference(&self) -> DescriptorId {
        DescriptorId::new(&self.vnf_vendor, &self.vnf_name, &self.vnf_version)
    }
}

/// Forwarding graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardingGraphDescriptor {
    pub fg_id: String,

    #[serde(default)]
    pub number_of_endpoints: Option<u32>,

    #[serde(default)]
    pub number_of_virtual_links: Option<u32>,

    /// vnf ids taking part in the graph
    #[serde(default)]
    pub constituent_vnfs: Vec<String>,

    /// Virtual link ids taking part in the graph
    #[serde(default)]
    pub constituent_virtual_links: Vec<String>,

    #[serde(default)]
    pub network_forwarding_paths: Vec<ForwardingPathDescriptor>,
}

/// Forwarding path inside a forwarding graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForwardingPathDescriptor {
    pub fp_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,

    /// Positioned connection point references
    #[serde(default)]
    pub connection_points: Vec<PathPoint>,
}

/// `(position, connection_point_ref)` entry of a forwarding path
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathPoint {
    pub connection_point_ref: String,
    pub position: u32,
}
