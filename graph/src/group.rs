use serde::{Deserialize, Serialize};

use common::seq_id_type;

use crate::node_collection::NodeCollection;

seq_id_type!(GroupId);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Default for Color {
    fn default() -> Self {
        Color {
            r: 160,
            g: 190,
            b: 220,
        }
    }
}

/// Named, colored set of nodes. Purely organizational: evaluation never
/// looks at groups.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeGroup {
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub color: Color,
    pub nodes: NodeCollection,
}

impl NodeGroup {
    pub fn new(name: &str) -> Self {
        Self {
            id: GroupId::INVALID,
            name: name.to_string(),
            color: Color::default(),
            nodes: NodeCollection::new(),
        }
    }

    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}
