//! Function (VNF) and unit (VDU) objects

use sonata_core::codes;
use sonata_core::types::FunctionDescriptor;
use sonata_core::{DescriptorId, DescriptorKind, EventLog, RawDescriptor};

use super::links::LinkSet;
use super::node::{Node, NodeData};
use crate::error::Result;

/// Virtual deployment unit inside a function
#[derive(Debug, Clone)]
pub struct Unit {
    node: NodeData,
    vm_image: Option<String>,
}

impl Unit {
    pub fn vm_image(&self) -> Option<&str> {
        self.vm_image.as_deref()
    }
}

impl Node for Unit {
    fn data(&self) -> &NodeData {
        &self.node
    }
}

/// A loaded function descriptor
#[derive(Debug, Clone)]
pub struct Function {
    node: NodeData,
    descriptor_id: DescriptorId,
    source: RawDescriptor,
    units: Vec<Unit>,
    links: LinkSet,
}

impl Function {
    pub(crate) fn load(
        descriptor_id: DescriptorId,
        source: RawDescriptor,
        descriptor: &FunctionDescriptor,
        log: &mut EventLog,
    ) -> Result<Self> {
        let owner = descriptor_id.to_string();
        let scope = DescriptorKind::Function;

        let mut node = NodeData::new(&owner);
        node.load_interfaces(&descriptor.connection_points, None, &owner, scope, log)?;

        let mut units: Vec<Unit> = Vec::new();
        for vdu in &descriptor.virtual_deployment_units {
            if units.iter().any(|u| u.id() == vdu.id) {
                log.log(
                    &owner,
                    codes::EVT_UNIT_DUPLICATE,
                    scope,
                    format!("unit '{}' declared more than once", vdu.id),
                )?;
                continue;
            }

            let mut unit_node = NodeData::new(&vdu.id);
            unit_node.load_interfaces(&vdu.connection_points, Some(&vdu.id), &owner, scope, log)?;
            units.push(Unit {
                node: unit_node,
                vm_image: vdu.vm_image.clone(),
            });
        }

        let links = LinkSet::load(&descriptor.virtual_links, &owner, scope, log)?;

        Ok(Self {
            node,
            descriptor_id,
            source,
            units,
            links,
        })
    }

    pub fn descriptor_id(&self) -> &DescriptorId {
        &self.descriptor_id
    }

    pub fn source(&self) -> &RawDescriptor {
        &self.source
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn unit(&self, id: &str) -> Option<&Unit> {
        self.units.iter().find(|u| u.id() == id)
    }

    pub fn links(&self) -> &LinkSet {
        &self.links
    }

    /// Whether `reference` names a function connection point or a unit
    /// connection point written `<unit>:<port>`
    pub fn resolves(&self, reference: &str) -> bool {
        if self.has_interface(reference) {
            return true;
        }
        match reference.split_once(':') {
            Some((unit, port)) => self.unit(unit).is_some_and(|u| u.has_interface(port)),
            None => false,
        }
    }

    /// Function connection points followed by every unit connection point
    /// qualified as `<unit>:<port>`
    pub fn endpoints(&self) -> Vec<String> {
        let own = self.interfaces().iter().map(|i| i.id.clone());
        let units = self.units.iter().flat_map(|u| {
            u.interfaces()
                .iter()
                .map(move |i| format!("{}:{}", u.id(), i.id))
        });
        own.chain(units).collect()
    }
}

impl Node for Function {
    fn data(&self) -> &NodeData {
        &self.node
    }
}
