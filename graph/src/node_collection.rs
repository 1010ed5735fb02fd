use hashbrown::HashSet;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::slot::NodeId;

/// Insertion-ordered set of node ids. Used for selections, group membership
/// and traversal results. Equality compares the sequences element-wise.
#[derive(Clone, Default, Debug)]
pub struct NodeCollection {
    ids: Vec<NodeId>,
    lookup: HashSet<NodeId>,
}

impl NodeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_id(node_id: NodeId) -> Self {
        let mut collection = Self::new();
        collection.insert(node_id);
        collection
    }

    /// Returns false if the id was already present.
    pub fn insert(&mut self, node_id: NodeId) -> bool {
        if !self.lookup.insert(node_id) {
            return false;
        }
        self.ids.push(node_id);
        true
    }

    pub fn erase(&mut self, node_id: NodeId) -> bool {
        if !self.lookup.remove(&node_id) {
            return false;
        }
        self.ids.retain(|id| *id != node_id);
        true
    }

    pub fn contains(&self, node_id: NodeId) -> bool {
        self.lookup.contains(&node_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn first(&self) -> Option<NodeId> {
        self.ids.first().copied()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.ids.last().copied()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = NodeId> + ExactSizeIterator + '_ {
        self.ids.iter().copied()
    }

    pub fn as_slice(&self) -> &[NodeId] {
        &self.ids
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.lookup.clear();
    }

    pub fn retain(&mut self, mut keep: impl FnMut(NodeId) -> bool) {
        let lookup = &mut self.lookup;
        self.ids.retain(|id| {
            let keep = keep(*id);
            if !keep {
                lookup.remove(id);
            }
            keep
        });
    }
}

impl PartialEq for NodeCollection {
    fn eq(&self, other: &Self) -> bool {
        self.ids == other.ids
    }
}

impl Eq for NodeCollection {}

impl Extend<NodeId> for NodeCollection {
    fn extend<T: IntoIterator<Item = NodeId>>(&mut self, iter: T) {
        for node_id in iter {
            self.insert(node_id);
        }
    }
}

impl FromIterator<NodeId> for NodeCollection {
    fn from_iter<T: IntoIterator<Item = NodeId>>(iter: T) -> Self {
        let mut collection = NodeCollection::new();
        collection.extend(iter);
        collection
    }
}

impl<'a> IntoIterator for &'a NodeCollection {
    type Item = NodeId;
    type IntoIter = std::iter::Copied<std::slice::Iter<'a, NodeId>>;

    fn into_iter(self) -> Self::IntoIter {
        self.ids.iter().copied()
    }
}

impl Serialize for NodeCollection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.ids.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for NodeCollection {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let ids: Vec<NodeId> = Vec::deserialize(deserializer)?;
        Ok(ids.into_iter().collect())
    }
}
