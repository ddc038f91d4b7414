//! Types shared by service and function descriptors

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Named attachment point on a service, function, or deployment unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionPoint {
    /// Connection point identifier, unique within its owner
    pub id: String,

    /// Interface family (e.g., "ipv4")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<String>,

    /// Role of the connection point (e.g., "management", "external")
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

/// Virtual link between connection points
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VirtualLink {
    /// Link identifier
    pub id: String,

    /// Connectivity type as written in the descriptor (e.g., "E-Line")
    pub connectivity_type: String,

    /// Connection point references joined by this link
    #[serde(default)]
    pub connection_points_reference: Vec<String>,
}

impl VirtualLink {
    /// Parsed connectivity type, `None` when unrecognized
    pub fn connectivity(&self) -> Option<ConnectivityType> {
        ConnectivityType::parse(&self.connectivity_type)
    }
}

/// Virtual link connectivity types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectivityType {
    /// Point-to-point link with exactly two endpoints
    ELine,
    /// Multipoint link (bridge)
    ELan,
    /// Rooted multipoint link
    ETree,
}

impl ConnectivityType {
    /// Parse a connectivity type, ignoring case
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "e-line" => Some(Self::ELine),
            "e-lan" => Some(Self::ELan),
            "e-tree" => Some(Self::ETree),
            _ => None,
        }
    }
}

impl fmt::Display for ConnectivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ELine => write!(f, "E-Line"),
            Self::ELan => write!(f, "E-LAN"),
            Self::ETree => write!(f, "E-Tree"),
        }
    }
}

/// Render a YAML scalar as a string.
///
/// Descriptor versions are frequently written unquoted (`version: 0.2`),
/// which YAML reads as a number.
pub fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Deserialize a string field that may have been written as a bare scalar
pub fn deserialize_scalar<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    scalar_to_string(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("expected a scalar, got {}", value)))
}
