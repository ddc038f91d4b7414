//! Virtual links: E-Line links and E-LAN bridges

use sonata_core::codes;
use sonata_core::types::{ConnectivityType, VirtualLink};
use sonata_core::{DescriptorKind, EventLog};

use crate::error::Result;

/// Point-to-point link between two connection point references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: String,
    pub endpoints: [String; 2],
}

/// Multi-point link joining two or more connection point references
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bridge {
    pub id: String,
    pub connectivity: ConnectivityType,
    pub members: Vec<String>,
}

/// Links and bridges declared by one descriptor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkSet {
    pub links: Vec<Link>,
    pub bridges: Vec<Bridge>,
}

impl LinkSet {
    /// Convert declared virtual links. E-Line becomes a [`Link`], E-LAN and
    /// E-Tree become a [`Bridge`]. Malformed links are logged and dropped.
    pub(crate) fn load(
        virtual_links: &[VirtualLink],
        owner: &str,
        scope: DescriptorKind,
        log: &mut EventLog,
    ) -> Result<Self> {
        let mut set = Self::default();

        for vl in virtual_links {
            let refs = &vl.connection_points_reference;
            match vl.connectivity() {
                Some(ConnectivityType::ELine) => {
                    if refs.len() != 2 {
                        log.log(
                            owner,
                            codes::EVT_LINK_ENDPOINTS,
                            scope,
                            format!(
                                "E-Line link '{}' has {} endpoints, expected 2",
                                vl.id,
                                refs.len()
                            ),
                        )?;
                        continue;
                    }
                    set.links.push(Link {
                        id: vl.id.clone(),
                        endpoints: [refs[0].clone(), refs[1].clone()],
                    });
                }
                Some(connectivity) => {
                    if refs.len() < 2 {
                        log.log(
                            owner,
                            codes::EVT_LINK_ENDPOINTS,
                            scope,
                            format!(
                                "{} link '{}' has {} member(s), expected at least 2",
                                connectivity,
                                vl.id,
                                refs.len()
                            ),
                        )?;
                        continue;
                    }
                    set.bridges.push(Bridge {
                        id: vl.id.clone(),
                        connectivity,
                        members: refs.clone(),
                    });
                }
                None => {
                    log.log(
                        owner,
                        codes::EVT_LINK_TYPE_UNKNOWN,
                        scope,
                        format!(
                            "link '{}' has unknown connectivity type '{}'",
                            vl.id, vl.connectivity_type
                        ),
                    )?;
                }
            }
        }

        Ok(set)
    }

    /// Every endpoint reference, in declaration order, with the id of the
    /// link or bridge that declares it
    pub fn references(&self) -> impl Iterator<Item = (&str, &str)> {
        let links = self
            .links
            .iter()
            .flat_map(|l| l.endpoints.iter().map(move |e| (l.id.as_str(), e.as_str())));
        let bridges = self
            .bridges
            .iter()
            .flat_map(|b| b.members.iter().map(move |m| (b.id.as_str(), m.as_str())));
        links.chain(bridges)
    }

    /// Whether a link or bridge with this id exists
    pub fn contains(&self, id: &str) -> bool {
        self.links.iter().any(|l| l.id == id) || self.bridges.iter().any(|b| b.id == id)
    }
}
