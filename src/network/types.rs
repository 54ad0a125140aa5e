use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::physics::{BodyParams, ConstraintParams};

use super::error::NetworkError;

/// Relationship category. `Origin` is reserved for the single root node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConnectionType {
    Origin,
    Family,
    Friend,
    Partner,
    Colleague,
    Acquaintance,
    Stranger,
    Other(String),
}

impl ConnectionType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Origin => "Origin",
            Self::Family => "Family",
            Self::Friend => "Friend",
            Self::Partner => "Partner",
            Self::Colleague => "Colleague",
            Self::Acquaintance => "Acquaintance",
            Self::Stranger => "Stranger",
            Self::Other(name) => name,
        }
    }

    pub fn is_origin(&self) -> bool {
        matches!(self, Self::Origin)
    }
}

impl From<String> for ConnectionType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "Origin" => Self::Origin,
            "Family" => Self::Family,
            "Friend" => Self::Friend,
            "Partner" => Self::Partner,
            "Colleague" => Self::Colleague,
            "Acquaintance" => Self::Acquaintance,
            "Stranger" => Self::Stranger,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for ConnectionType {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<ConnectionType> for String {
    fn from(value: ConnectionType) -> Self {
        match value {
            ConnectionType::Other(name) => name,
            other => other.as_str().to_owned(),
        }
    }
}

impl fmt::Display for ConnectionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeStyle {
    pub color: String,
    pub radius: f32,
    #[serde(default)]
    pub hover_scale: Option<f32>,
    #[serde(default)]
    pub hover_tint: Option<f32>,
    #[serde(default)]
    pub texture_tint: Option<f32>,
    #[serde(default, rename = "textVisibleRadiusThresh")]
    pub text_visible_radius: Option<f32>,
    #[serde(default)]
    pub font_size: Option<f32>,
    #[serde(default)]
    pub physics: BodyParams,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeStyle {
    pub color: String,
    pub width: f32,
    #[serde(default)]
    pub line_style: LineStyle,
    #[serde(default)]
    pub show_arrow: bool,
    #[serde(default)]
    pub show_counters: bool,
    #[serde(default)]
    pub counter_color: Option<String>,
    #[serde(default)]
    pub distance_factor: Option<f32>,
    #[serde(default)]
    pub physics: ConstraintParams,
}

impl EdgeStyle {
    /// Rest length of the constraint backing an edge of this style.
    pub fn rest_length(&self) -> f32 {
        self.distance_factor.unwrap_or(1.0) * self.physics.length
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionStyle {
    pub node_style: NodeStyle,
    pub edge_style: EdgeStyle,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRef {
    pub id: String,
    pub label: String,
    #[serde(rename = "connectionToOrigin")]
    pub connection_type: ConnectionType,
}

impl NodeRef {
    pub fn new(id: &str, label: &str, connection_type: impl Into<ConnectionType>) -> Self {
        Self {
            id: id.to_owned(),
            label: label.to_owned(),
            connection_type: connection_type.into(),
        }
    }

    pub fn is_origin(&self) -> bool {
        self.connection_type.is_origin()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRef {
    pub id: String,
    pub source: String,
    pub target: String,
    pub connection_type: ConnectionType,
}

impl EdgeRef {
    pub fn new(id: &str, source: &str, target: &str, connection_type: impl Into<ConnectionType>) -> Self {
        Self {
            id: id.to_owned(),
            source: source.to_owned(),
            target: target.to_owned(),
            connection_type: connection_type.into(),
        }
    }

    pub fn touches(&self, node_id: &str) -> bool {
        self.source == node_id || self.target == node_id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnStyle {
    pub spawn_radius: f32,
    #[serde(default)]
    pub randomize_spawn_radius: bool,
}

impl Default for SpawnStyle {
    fn default() -> Self {
        Self {
            spawn_radius: 400.0,
            randomize_spawn_radius: true,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkStyle {
    pub connections: HashMap<ConnectionType, ConnectionStyle>,
    #[serde(default)]
    pub network: SpawnStyle,
}

impl NetworkStyle {
    pub fn connection(&self, connection_type: &ConnectionType) -> Result<&ConnectionStyle, NetworkError> {
        self.connections
            .get(connection_type)
            .ok_or_else(|| NetworkError::MissingStyle(connection_type.clone()))
    }
}

/// Construction input for a network.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkData {
    pub nodes: Vec<NodeRef>,
    pub edges: Vec<EdgeRef>,
    pub center_node_id: String,
    #[serde(default = "default_sizing_factor")]
    pub sizing_factor: f32,
    pub style: NetworkStyle,
}

fn default_sizing_factor() -> f32 {
    1.0
}

impl NetworkData {
    pub fn origin(&self) -> Result<&NodeRef, NetworkError> {
        let mut origins = self.nodes.iter().filter(|node| node.is_origin());
        let origin = origins.next().ok_or(NetworkError::MissingOrigin)?;
        if let Some(second) = origins.next() {
            return Err(NetworkError::MultipleOrigins {
                first: origin.id.clone(),
                second: second.id.clone(),
            });
        }
        Ok(origin)
    }

    pub fn node(&self, id: &str) -> Option<&NodeRef> {
        self.nodes.iter().find(|node| node.id == id)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        use anyhow::Context;
        serde_json::from_str(raw).context("invalid people network JSON")
    }
}
