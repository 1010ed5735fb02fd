use hashbrown::HashMap;

use crate::slot::NodeId;
use crate::value::Value;

#[derive(Clone, Debug, Default)]
struct CacheEntry {
    outputs: Vec<Value>,
    valid: bool,
}

/// Last calculated output values per node.
///
/// An entry is only served while it is valid; the owning manager keeps
/// validity in step with the node's calculation status.
#[derive(Clone, Debug, Default)]
pub struct NodeValueCache {
    entries: HashMap<NodeId, CacheEntry>,
}

impl NodeValueCache {
    pub fn get(&self, node_id: NodeId) -> Option<&[Value]> {
        self.entries
            .get(&node_id)
            .filter(|entry| entry.valid)
            .map(|entry| entry.outputs.as_slice())
    }

    /// Returns the stored values even when stale. Used to feed a downstream
    /// node whose upstream failed or sits on a cycle.
    pub fn get_stale(&self, node_id: NodeId) -> Option<&[Value]> {
        self.entries
            .get(&node_id)
            .map(|entry| entry.outputs.as_slice())
    }

    pub fn store(&mut self, node_id: NodeId, outputs: Vec<Value>) {
        self.entries.insert(
            node_id,
            CacheEntry {
                outputs,
                valid: true,
            },
        );
    }

    pub fn is_valid(&self, node_id: NodeId) -> bool {
        self.entries.get(&node_id).is_some_and(|entry| entry.valid)
    }

    /// Marks the entry stale without dropping it. Returns true if it was valid.
    pub fn invalidate(&mut self, node_id: NodeId) -> bool {
        match self.entries.get_mut(&node_id) {
            Some(entry) => std::mem::replace(&mut entry.valid, false),
            None => false,
        }
    }

    pub fn remove(&mut self, node_id: NodeId) {
        self.entries.remove(&node_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
