use std::collections::HashMap;

use crate::physics::{BodyParams, ConstraintParams};

use super::types::{
    ConnectionStyle, ConnectionType, EdgeRef, EdgeStyle, LineStyle, NetworkData, NetworkStyle,
    NodeRef, NodeStyle, SpawnStyle,
};

fn connection(
    color: &str,
    radius: f32,
    body: BodyParams,
    edge_color: &str,
    width: f32,
    line_style: LineStyle,
    distance_factor: Option<f32>,
) -> ConnectionStyle {
    ConnectionStyle {
        node_style: NodeStyle {
            color: color.to_owned(),
            radius,
            hover_scale: None,
            hover_tint: None,
            texture_tint: None,
            text_visible_radius: None,
            font_size: None,
            physics: body,
        },
        edge_style: EdgeStyle {
            color: edge_color.to_owned(),
            width,
            line_style,
            show_arrow: false,
            show_counters: false,
            counter_color: None,
            distance_factor,
            physics: ConstraintParams::default(),
        },
    }
}

fn solid(color: &str, radius: f32, width: f32, distance_factor: Option<f32>) -> ConnectionStyle {
    connection(
        color,
        radius,
        BodyParams::default(),
        color,
        width,
        LineStyle::Solid,
        distance_factor,
    )
}

pub fn default_connections() -> HashMap<ConnectionType, ConnectionStyle> {
    HashMap::from([
        (ConnectionType::Origin, solid("#d4d4d4", 50.0, 0.0, None)),
        (ConnectionType::Family, solid("#fd85ff", 40.0, 3.0, None)),
        (ConnectionType::Friend, solid("#32a852", 40.0, 2.0, Some(1.25))),
        (ConnectionType::Partner, solid("#FFC8DD", 45.0, 4.0, Some(0.75))),
        (ConnectionType::Colleague, solid("#FAF3DD", 25.0, 1.0, Some(1.5))),
        (ConnectionType::Acquaintance, solid("#CAFFBF", 25.0, 1.0, Some(1.75))),
        (ConnectionType::Stranger, solid("#FFD97D", 10.0, 2.0, Some(2.0))),
    ])
}

/// A more varied table: heavier origin, pinned partner, patterned lines.
pub fn enhanced_connections() -> HashMap<ConnectionType, ConnectionStyle> {
    let origin_body = BodyParams {
        mass: Some(1.0),
        friction: Some(0.5),
        friction_air: Some(0.1),
        restitution: Some(0.5),
        density: Some(0.5),
        is_static: None,
    };
    let pinned = BodyParams {
        is_static: Some(true),
        ..BodyParams::default()
    };

    HashMap::from([
        (
            ConnectionType::Origin,
            connection("#2A004E", 80.0, origin_body, "#2A004E", 0.0, LineStyle::Solid, None),
        ),
        (ConnectionType::Family, solid("#758694", 40.0, 3.0, None)),
        (ConnectionType::Friend, solid("#F3C623", 40.0, 2.0, Some(1.25))),
        (
            ConnectionType::Partner,
            connection("#C62300", 60.0, pinned, "#fff", 10.0, LineStyle::Dashed, Some(0.9)),
        ),
        (ConnectionType::Colleague, solid("#758694", 25.0, 1.0, Some(1.5))),
        (ConnectionType::Acquaintance, solid("#758694", 25.0, 1.0, Some(1.75))),
        (
            ConnectionType::Stranger,
            connection(
                "#758694",
                20.0,
                BodyParams::default(),
                "#758694",
                2.0,
                LineStyle::Dotted,
                Some(2.0),
            ),
        ),
    ])
}

/// Alice and nine people around her, two hops deep through Zoe.
pub fn example_network() -> NetworkData {
    let nodes = vec![
        NodeRef::new("1", "Alice", ConnectionType::Origin),
        NodeRef::new("2", "Bob", ConnectionType::Family),
        NodeRef::new("3", "Charlie", ConnectionType::Friend),
        NodeRef::new("4", "David", ConnectionType::Colleague),
        NodeRef::new("5", "Eve", ConnectionType::Acquaintance),
        NodeRef::new("6", "Zoe", ConnectionType::Partner),
        NodeRef::new("7", "Zoe's Mom", ConnectionType::Family),
        NodeRef::new("8", "Zoe's Dad", ConnectionType::Family),
        NodeRef::new("9", "Zoe's Sister", ConnectionType::Family),
        NodeRef::new("10", "Zoe's Brother", ConnectionType::Family),
    ];

    let edges = vec![
        EdgeRef::new("1", "1", "2", ConnectionType::Family),
        EdgeRef::new("2", "1", "3", ConnectionType::Friend),
        EdgeRef::new("3", "1", "4", ConnectionType::Colleague),
        EdgeRef::new("4", "1", "5", ConnectionType::Acquaintance),
        EdgeRef::new("5", "2", "3", ConnectionType::Family),
        EdgeRef::new("6", "2", "4", ConnectionType::Friend),
        EdgeRef::new("9", "3", "5", ConnectionType::Friend),
        EdgeRef::new("10", "4", "5", ConnectionType::Family),
        EdgeRef::new("11", "1", "6", ConnectionType::Partner),
        EdgeRef::new("12", "6", "7", ConnectionType::Family),
        EdgeRef::new("13", "6", "8", ConnectionType::Family),
        EdgeRef::new("14", "6", "9", ConnectionType::Family),
        EdgeRef::new("15", "6", "10", ConnectionType::Family),
    ];

    NetworkData {
        nodes,
        edges,
        center_node_id: "1".to_owned(),
        sizing_factor: 1.0,
        style: NetworkStyle {
            connections: enhanced_connections(),
            network: SpawnStyle::default(),
        },
    }
}

pub fn simple_network() -> NetworkData {
    NetworkData {
        nodes: vec![
            NodeRef::new("1", "Alice", ConnectionType::Origin),
            NodeRef::new("2", "Bob", ConnectionType::Family),
        ],
        edges: vec![EdgeRef::new("1", "1", "2", ConnectionType::Family)],
        center_node_id: "1".to_owned(),
        sizing_factor: 1.0,
        style: NetworkStyle {
            connections: default_connections(),
            network: SpawnStyle::default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_cover_every_builtin_connection_type() {
        for table in [default_connections(), enhanced_connections()] {
            for connection_type in [
                ConnectionType::Origin,
                ConnectionType::Family,
                ConnectionType::Friend,
                ConnectionType::Partner,
                ConnectionType::Colleague,
                ConnectionType::Acquaintance,
                ConnectionType::Stranger,
            ] {
                assert!(table.contains_key(&connection_type), "{connection_type} missing");
            }
        }
    }

    #[test]
    fn example_edges_reference_existing_nodes() {
        let data = example_network();
        for edge in &data.edges {
            assert!(data.node(&edge.source).is_some(), "edge {} source", edge.id);
            assert!(data.node(&edge.target).is_some(), "edge {} target", edge.id);
        }
        assert_eq!(data.origin().expect("origin").id, data.center_node_id);
    }

    #[test]
    fn enhanced_partner_is_pinned() {
        let table = enhanced_connections();
        let partner = &table[&ConnectionType::Partner];
        assert_eq!(partner.node_style.physics.is_static, Some(true));
        assert_eq!(partner.edge_style.line_style, LineStyle::Dashed);
    }
}
