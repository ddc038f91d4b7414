//! Node data shared by packages, services, functions, and units

use sonata_core::codes;
use sonata_core::types::ConnectionPoint;
use sonata_core::{DescriptorKind, EventLog};

use crate::error::Result;

/// A connection point owned by a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interface {
    pub id: String,
    pub interface: Option<String>,
    pub kind: Option<String>,
}

impl From<&ConnectionPoint> for Interface {
    fn from(cp: &ConnectionPoint) -> Self {
        Self {
            id: cp.id.clone(),
            interface: cp.interface.clone(),
            kind: cp.kind.clone(),
        }
    }
}

/// Identifier plus the connection points declared on a node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeData {
    id: String,
    interfaces: Vec<Interface>,
}

impl NodeData {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            interfaces: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn interfaces(&self) -> &[Interface] {
        &self.interfaces
    }

    pub fn has_interface(&self, id: &str) -> bool {
        self.interfaces.iter().any(|i| i.id == id)
    }

    /// Add an interface. Returns `false` and leaves the node unchanged if
    /// an interface with the same id already exists.
    pub fn add_interface(&mut self, interface: Interface) -> bool {
        if self.has_interface(&interface.id) {
            return false;
        }
        self.interfaces.push(interface);
        true
    }

    /// Add every connection point, logging `evt_cpoint_duplicate` for
    /// repeated ids. `prefix` is stripped from ids that carry it.
    pub(crate) fn load_interfaces(
        &mut self,
        connection_points: &[ConnectionPoint],
        prefix: Option<&str>,
        owner: &str,
        scope: DescriptorKind,
        log: &mut EventLog,
    ) -> Result<()> {
        for cp in connection_points {
            let mut interface = Interface::from(cp);
            if let Some(stripped) = prefix.and_then(|p| strip_owner(&cp.id, p)) {
                interface.id = stripped.to_string();
            }

            let id = interface.id.clone();
            if !self.add_interface(interface) {
                log.log(
                    owner,
                    codes::EVT_CPOINT_DUPLICATE,
                    scope,
                    format!("connection point '{}' declared more than once on '{}'", id, self.id),
                )?;
            }
        }
        Ok(())
    }
}

/// Strip an `<owner>:` prefix from a connection point reference
pub(crate) fn strip_owner<'a>(reference: &'a str, owner: &str) -> Option<&'a str> {
    reference
        .strip_prefix(owner)
        .and_then(|rest| rest.strip_prefix(':'))
}

/// Common view over every stored object
pub trait Node {
    fn data(&self) -> &NodeData;

    fn id(&self) -> &str {
        self.data().id()
    }

    fn interfaces(&self) -> &[Interface] {
        self.data().interfaces()
    }

    fn has_interface(&self, id: &str) -> bool {
        self.data().has_interface(id)
    }
}
