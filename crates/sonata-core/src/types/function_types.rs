//! Virtual network function descriptor (VNFD) types

use serde::{Deserialize, Serialize};

use super::common_types::{ConnectionPoint, VirtualLink};

/// Virtual network function descriptor
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FunctionDescriptor {
    /// Function-level connection points
    #[serde(default)]
    pub connection_points: Vec<ConnectionPoint>,

    /// Deployment units of the function
    #[serde(default)]
    pub virtual_deployment_units: Vec<DeploymentUnit>,

    /// Internal links between function and unit connection points
    #[serde(default)]
    pub virtual_links: Vec<VirtualLink>,
}

/// Virtual deployment unit (VDU)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeploymentUnit {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vm_image: Option<String>,

    #[serde(default)]
    pub connection_points: Vec<ConnectionPoint>,
}
