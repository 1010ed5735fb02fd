use graph::prelude::{GroupId, NodeCollection, NodeId, NodeManager};
use hashbrown::HashSet;

/// Tracks which node and group drawings are current. Anything not recorded
/// as drawn is stale, including nodes the cache has never seen.
#[derive(Debug, Default)]
pub struct DrawingCache {
    drawn_nodes: HashSet<NodeId>,
    drawn_groups: HashSet<GroupId>,
}

impl DrawingCache {
    pub fn is_node_stale(&self, node_id: NodeId) -> bool {
        !self.drawn_nodes.contains(&node_id)
    }

    pub fn is_group_stale(&self, group_id: GroupId) -> bool {
        !self.drawn_groups.contains(&group_id)
    }

    pub fn mark_node_drawn(&mut self, node_id: NodeId) {
        self.drawn_nodes.insert(node_id);
    }

    pub fn mark_group_drawn(&mut self, group_id: GroupId) {
        self.drawn_groups.insert(group_id);
    }

    /// Invalidates the node and the group it belongs to.
    pub fn invalidate_node(&mut self, manager: &NodeManager, node_id: NodeId) {
        self.drawn_nodes.remove(&node_id);
        if let Some(group_id) = manager.node_group(node_id) {
            self.drawn_groups.remove(&group_id);
        }
    }

    pub fn invalidate_nodes(&mut self, manager: &NodeManager, nodes: &NodeCollection) {
        for node_id in nodes.iter() {
            self.invalidate_node(manager, node_id);
        }
    }

    pub fn invalidate_group(&mut self, group_id: GroupId) {
        self.drawn_groups.remove(&group_id);
    }

    /// Forgets a node that is about to disappear.
    pub fn remove_node(&mut self, node_id: NodeId) {
        self.drawn_nodes.remove(&node_id);
    }

    pub fn invalidate_all(&mut self) {
        self.drawn_nodes.clear();
        self.drawn_groups.clear();
    }

    pub fn stale_node_count(&self, manager: &NodeManager) -> usize {
        manager
            .nodes()
            .filter(|node| self.is_node_stale(node.id))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use graph::prelude::{BasicLib, NodeGroup};

    use super::*;

    #[test]
    fn member_invalidation_reaches_group() -> anyhow::Result<()> {
        let lib = BasicLib::node_lib();
        let mut manager = NodeManager::new();
        let a = manager.add_node(lib.create_node_by_name("number").unwrap())?;
        let b = manager.add_node(lib.create_node_by_name("number").unwrap())?;
        let group_id = manager.add_group({
            let mut group = NodeGroup::new("g");
            group.nodes.insert(a);
            group
        })?;

        let mut cache = DrawingCache::default();
        assert_eq!(cache.stale_node_count(&manager), 2);
        cache.mark_node_drawn(a);
        cache.mark_node_drawn(b);
        cache.mark_group_drawn(group_id);
        assert_eq!(cache.stale_node_count(&manager), 0);

        cache.invalidate_node(&manager, b);
        assert!(!cache.is_group_stale(group_id));

        cache.invalidate_node(&manager, a);
        assert!(cache.is_node_stale(a));
        assert!(cache.is_group_stale(group_id));

        Ok(())
    }
}
