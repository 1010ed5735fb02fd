use common::FileFormat;
use glam::Vec2;
use thiserror::Error;
use tracing::debug;

use crate::document::{GraphDocument, StreamError};
use crate::merge::{IdPolicy, MergeError};
use crate::node_collection::NodeCollection;
use crate::node_manager::NodeManager;

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("Nothing is selected")]
    EmptySelection,
    #[error("Clipboard is empty")]
    Empty,
    #[error(transparent)]
    Stream(#[from] StreamError),
    #[error(transparent)]
    Merge(#[from] MergeError),
}

pub type ClipboardResult<T> = std::result::Result<T, ClipboardError>;

/// Holds one copied subgraph as a serialized document. Pasting the same
/// buffer repeatedly produces fresh ids every time.
#[derive(Debug, Default, Clone)]
pub struct CopyPasteHandler {
    buffer: Option<String>,
}

impl CopyPasteHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_content(&self) -> bool {
        self.buffer.is_some()
    }

    pub fn clear(&mut self) {
        self.buffer = None;
    }

    /// Copies the selected nodes, the connections among them and their group
    /// membership. Replaces any previous buffer.
    pub fn copy_from(
        &mut self,
        manager: &NodeManager,
        selection: &NodeCollection,
    ) -> ClipboardResult<()> {
        let mut copied = NodeManager::new();
        manager.merge_to(
            &mut copied,
            |node| selection.contains(node.id),
            IdPolicy::KeepOriginal,
        )?;
        if copied.is_empty() {
            return Err(ClipboardError::EmptySelection);
        }

        let serialized = copied.write(FileFormat::Json)?;
        self.buffer = Some(serialized);

        debug!(nodes = copied.node_count(), "nodes copied");
        Ok(())
    }

    /// Inserts the buffer into `manager` with fresh ids and returns them in
    /// the order they were copied.
    pub fn paste_to(&self, manager: &mut NodeManager) -> ClipboardResult<NodeCollection> {
        let buffer = self.buffer.as_ref().ok_or(ClipboardError::Empty)?;
        let document: GraphDocument = common::deserialize(buffer, FileFormat::Json)
            .map_err(StreamError::from)?;
        let copied = NodeManager::from_document(document)?;

        let id_map = copied.merge_to(manager, |_| true, IdPolicy::Regenerate)?;
        let pasted: NodeCollection = copied
            .nodes()
            .filter_map(|node| id_map.get(&node.id).copied())
            .collect();

        debug!(nodes = pasted.len(), "nodes pasted");
        Ok(pasted)
    }
}

/// Mean position of the given nodes, `None` if none of them exist.
pub fn centroid(manager: &NodeManager, nodes: &NodeCollection) -> Option<Vec2> {
    let positions: Vec<Vec2> = nodes
        .iter()
        .filter_map(|id| manager.node(id).map(|node| node.pos))
        .collect();
    if positions.is_empty() {
        return None;
    }
    Some(positions.iter().copied().sum::<Vec2>() / positions.len() as f32)
}

/// Moves the given nodes by `offset`. Ids that are not in `manager` are skipped.
pub fn translate(manager: &mut NodeManager, nodes: &NodeCollection, offset: Vec2) {
    for node_id in nodes.iter() {
        if let Some(node) = manager.nodes.by_key_mut(&node_id) {
            node.pos += offset;
        }
    }
}
