use std::path::Path;

use common::{FileExtensionError, FileFormat, SerdeFormatError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::connection_manager::Connection;
use crate::group::NodeGroup;
use crate::node::Node;
use crate::node_lib::{NodeLib, NodeType, NodeTypeId};
use crate::node_manager::{GraphError, NodeManager};
use crate::slot::{NodeId, SlotId};

pub const GRAPH_FORMAT_VERSION: u32 = 1;

/// Serialized form of a `NodeManager`. Calculation state and cached values
/// are not part of it.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub version: u32,
    #[serde(default)]
    pub next_node_id: u64,
    #[serde(default)]
    pub next_group_id: u64,
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub groups: Vec<NodeGroup>,
}

/// `Serde`, `UnsupportedVersion`, `Io` and `FileFormat` mean the stream could
/// not be read at all; `InvalidGraph` and `UnknownNodeType` mean it was read
/// but does not describe a valid graph.
#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Graph serialization failed: {0}")]
    Serde(#[from] SerdeFormatError),
    #[error("Unsupported graph format version {0}")]
    UnsupportedVersion(u32),
    #[error("Graph file access failed: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    FileFormat(#[from] FileExtensionError),
    #[error("Invalid graph: {0}")]
    InvalidGraph(#[from] GraphError),
    #[error("Node {node_id} has unknown type {type_id}")]
    UnknownNodeType { node_id: NodeId, type_id: NodeTypeId },
}

impl StreamError {
    pub fn is_invalid_graph(&self) -> bool {
        matches!(
            self,
            StreamError::InvalidGraph(_) | StreamError::UnknownNodeType { .. }
        )
    }
}

pub type StreamResult<T> = std::result::Result<T, StreamError>;

impl NodeManager {
    pub fn to_document(&self) -> GraphDocument {
        GraphDocument {
            version: GRAPH_FORMAT_VERSION,
            next_node_id: self.node_ids.peek(),
            next_group_id: self.group_ids.peek(),
            nodes: self.nodes.iter().cloned().collect(),
            connections: self.connections.connections().copied().collect(),
            groups: self.groups.iter().cloned().collect(),
        }
    }

    /// Rebuilds a manager from `document`, keeping every id. Node types are
    /// not checked; see `read` for that.
    pub fn from_document(document: GraphDocument) -> StreamResult<NodeManager> {
        if document.version != GRAPH_FORMAT_VERSION {
            return Err(StreamError::UnsupportedVersion(document.version));
        }

        let mut manager = NodeManager::new();
        manager
            .node_ids
            .reserve_past(document.next_node_id.saturating_sub(1));
        manager
            .group_ids
            .reserve_past(document.next_group_id.saturating_sub(1));

        for node in document.nodes {
            manager.add_node(node)?;
        }
        for connection in document.connections {
            manager.connect(connection.output, connection.input)?;
        }
        for group in document.groups {
            manager.add_group(group)?;
        }

        Ok(manager)
    }

    pub fn write(&self, format: FileFormat) -> StreamResult<String> {
        Ok(common::serialize(&self.to_document(), format)?)
    }

    /// Replaces the content with the graph in `serialized`. The manager is
    /// cleared first and stays empty if reading fails.
    pub fn read(&mut self, serialized: &str, format: FileFormat, lib: &NodeLib) -> StreamResult<()> {
        self.clear();

        let document: GraphDocument = common::deserialize(serialized, format)?;
        for node in document.nodes.iter() {
            let node_type = lib.by_id(node.type_id).ok_or(StreamError::UnknownNodeType {
                node_id: node.id,
                type_id: node.type_id,
            })?;
            if !matches_type(node, node_type) {
                return Err(GraphError::NodeLayoutMismatch(node.id).into());
            }
        }

        let mut manager = NodeManager::from_document(document)?;
        manager
            .node_ids
            .reserve_past(self.node_ids.peek().saturating_sub(1));
        manager
            .group_ids
            .reserve_past(self.group_ids.peek().saturating_sub(1));
        *self = manager;

        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> StreamResult<()> {
        let format = FileFormat::from_file_name(&path.to_string_lossy())?;
        let serialized = self.write(format)?;
        std::fs::write(path, serialized)?;

        info!(path = %path.display(), nodes = self.node_count(), "graph saved");
        Ok(())
    }

    pub fn open_file(&mut self, path: &Path, lib: &NodeLib) -> StreamResult<()> {
        self.clear();
        let format = FileFormat::from_file_name(&path.to_string_lossy())?;
        let serialized = std::fs::read_to_string(path)?;
        self.read(&serialized, format, lib)?;

        info!(path = %path.display(), nodes = self.node_count(), "graph opened");
        Ok(())
    }
}

/// Slot ids must run `0..n` and counts must agree with the type.
fn matches_type(node: &Node, node_type: &NodeType) -> bool {
    let inputs_match = node.inputs.len() == node_type.inputs.len()
        && node
            .inputs
            .iter()
            .enumerate()
            .all(|(idx, slot)| slot.id == SlotId(idx as u32));
    let outputs_match = node.outputs.len() == node_type.outputs.len()
        && node
            .outputs
            .iter()
            .enumerate()
            .all(|(idx, slot)| slot.id == SlotId(idx as u32));

    inputs_match && outputs_match && node.params.len() == node_type.params.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::basic_lib::BasicLib;
    use crate::value::Value;

    #[test]
    fn unsupported_version_is_a_stream_failure() {
        let lib = BasicLib::node_lib();
        let mut manager = NodeManager::new();
        let serialized = "{\"version\": 7, \"nodes\": []}";

        let err = manager
            .read(serialized, FileFormat::Json, &lib)
            .unwrap_err();
        assert!(matches!(err, StreamError::UnsupportedVersion(7)));
        assert!(!err.is_invalid_graph());
    }

    #[test]
    fn garbage_is_a_stream_failure() {
        let lib = BasicLib::node_lib();
        let mut manager = NodeManager::new();
        let err = manager
            .read("not a graph", FileFormat::Json, &lib)
            .unwrap_err();
        assert!(matches!(err, StreamError::Serde(_)));
    }

    #[test]
    fn dangling_connection_is_an_invalid_graph() -> anyhow::Result<()> {
        let lib = BasicLib::node_lib();
        let mut source = NodeManager::new();
        let a = source.add_node(lib.create_node_by_name("number").unwrap())?;
        let view = source.add_node(lib.create_node_by_name("viewer").unwrap())?;
        source.connect((a, 0).into(), (view, 0).into())?;

        let mut document = source.to_document();
        document.nodes.retain(|node| node.id != a);
        let serialized = common::serialize(&document, FileFormat::Json)?;

        let mut manager = NodeManager::new();
        let err = manager
            .read(&serialized, FileFormat::Json, &lib)
            .unwrap_err();
        assert!(err.is_invalid_graph());
        assert!(manager.is_empty());

        Ok(())
    }

    #[test]
    fn unknown_type_is_an_invalid_graph() -> anyhow::Result<()> {
        let lib = BasicLib::node_lib();
        let mut source = NodeManager::new();
        let mut node = lib.create_node_by_name("number").unwrap();
        node.type_id = NodeTypeId::from_u128(42);
        let node_id = source.add_node(node)?;
        let serialized = source.write(FileFormat::Yaml)?;

        let mut manager = NodeManager::new();
        let err = manager
            .read(&serialized, FileFormat::Yaml, &lib)
            .unwrap_err();
        assert!(
            matches!(err, StreamError::UnknownNodeType { node_id: id, .. } if id == node_id)
        );

        Ok(())
    }

    #[test]
    fn read_keeps_ids_and_parameters() -> anyhow::Result<()> {
        let lib = BasicLib::node_lib();
        let mut source = NodeManager::new();
        let a = source.add_node(lib.create_node_by_name("number").unwrap().with_param(0, 2.5))?;
        source.delete_node(a)?;
        let b = source.add_node(lib.create_node_by_name("number").unwrap().with_param(0, 4.0))?;
        let serialized = source.write(FileFormat::Json)?;

        let mut manager = NodeManager::new();
        manager.read(&serialized, FileFormat::Json, &lib)?;

        assert_eq!(manager.node_ids(), [b].into_iter().collect());
        assert_eq!(manager.node(b).unwrap().params, vec![Value::Float(4.0)]);
        let next = manager.add_node(lib.create_node_by_name("number").unwrap())?;
        assert!(next > b);

        Ok(())
    }
}
