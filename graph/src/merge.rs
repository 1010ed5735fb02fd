use hashbrown::HashMap;
use thiserror::Error;
use tracing::debug;

use crate::group::{GroupId, NodeGroup};
use crate::node::Node;
use crate::node_collection::NodeCollection;
use crate::node_manager::{GraphError, NodeManager};
use crate::slot::{InputSlotRef, NodeId, OutputSlotRef};

/// How node ids are carried over by `NodeManager::merge_to`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdPolicy {
    /// Ids stay as they are. Used to restore history snapshots.
    #[default]
    KeepOriginal,
    /// Every merged node gets a fresh id from the target.
    Regenerate,
}

/// Observer for nodes that disappear when a manager is replaced wholesale.
pub trait MergeEventHandler {
    fn before_node_delete(&mut self, node_id: NodeId);
}

impl MergeEventHandler for () {
    fn before_node_delete(&mut self, _node_id: NodeId) {}
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum MergeError {
    #[error("Node {0} already exists in the merge target")]
    IdCollision(NodeId),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type MergeResult<T> = std::result::Result<T, MergeError>;

/// Source id to target id, for every merged node.
pub type IdMap = HashMap<NodeId, NodeId>;

impl NodeManager {
    /// Copies the nodes accepted by `filter` into `target`, together with the
    /// connections between them and their group membership. The target is
    /// left untouched on error.
    pub fn merge_to(
        &self,
        target: &mut NodeManager,
        filter: impl Fn(&Node) -> bool,
        policy: IdPolicy,
    ) -> MergeResult<IdMap> {
        let selected: NodeCollection = self
            .nodes
            .iter()
            .filter(|node| filter(node))
            .map(|node| node.id)
            .collect();

        if policy == IdPolicy::KeepOriginal {
            if let Some(collision) = selected.iter().find(|id| target.contains_node(*id)) {
                return Err(MergeError::IdCollision(collision));
            }
        }

        let mut staged = target.clone();
        let mut id_map = IdMap::with_capacity(selected.len());

        for node_id in selected.iter() {
            let Some(node) = self.node(node_id) else {
                continue;
            };
            let mut node = node.clone();
            if policy == IdPolicy::Regenerate {
                node.id = NodeId::INVALID;
            }
            let new_id = staged.add_node(node)?;
            id_map.insert(node_id, new_id);
        }

        for connection in self.connections.connections() {
            let (Some(&output_node), Some(&input_node)) = (
                id_map.get(&connection.output.node_id),
                id_map.get(&connection.input.node_id),
            ) else {
                continue;
            };
            staged.connect(
                OutputSlotRef {
                    node_id: output_node,
                    slot_id: connection.output.slot_id,
                },
                InputSlotRef {
                    node_id: input_node,
                    slot_id: connection.input.slot_id,
                },
            )?;
        }

        for group in self.groups.iter() {
            let nodes: NodeCollection = group
                .nodes
                .iter()
                .filter_map(|id| id_map.get(&id).copied())
                .collect();
            if nodes.is_empty() {
                continue;
            }
            staged.add_group(NodeGroup {
                id: match policy {
                    IdPolicy::KeepOriginal => group.id,
                    IdPolicy::Regenerate => GroupId::INVALID,
                },
                name: group.name.clone(),
                color: group.color,
                nodes,
            })?;
        }

        *target = staged;

        debug!(nodes = id_map.len(), ?policy, "nodes merged");
        Ok(id_map)
    }

    /// Makes this manager match `source` while keeping node ids. `handler`
    /// hears about every node that is about to vanish; nothing is touched and
    /// nobody is notified if the rebuild fails.
    pub fn replace_with(
        &mut self,
        source: &NodeManager,
        handler: &mut dyn MergeEventHandler,
    ) -> MergeResult<()> {
        let mut staged = NodeManager {
            node_ids: self.node_ids,
            group_ids: self.group_ids,
            ..NodeManager::default()
        };
        staged
            .node_ids
            .reserve_past(source.node_ids.peek().saturating_sub(1));
        staged
            .group_ids
            .reserve_past(source.group_ids.peek().saturating_sub(1));

        source.merge_to(&mut staged, |_| true, IdPolicy::KeepOriginal)?;

        // ids are kept, so groups carry over as they are, empty ones included
        staged.groups = source.groups.clone();

        let vanishing: Vec<NodeId> = self
            .nodes
            .keys()
            .filter(|id| !source.contains_node(*id))
            .collect();
        for node_id in vanishing {
            handler.before_node_delete(node_id);
        }

        *self = staged;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec2;

    use super::*;
    use crate::elements::basic_lib::BasicLib;

    struct Recorder(Vec<NodeId>);

    impl MergeEventHandler for Recorder {
        fn before_node_delete(&mut self, node_id: NodeId) {
            self.0.push(node_id);
        }
    }

    fn chain() -> anyhow::Result<(NodeManager, [NodeId; 3])> {
        let lib = BasicLib::node_lib();
        let mut manager = NodeManager::new();
        let a = manager.add_node(lib.create_node_by_name("number").unwrap())?;
        let b = manager.add_node(lib.create_node_by_name("number").unwrap())?;
        let add = manager.add_node(
            lib.create_node_by_name("add")
                .unwrap()
                .with_pos(Vec2::new(10.0, 0.0)),
        )?;
        manager.connect((a, 0).into(), (add, 0).into())?;
        manager.connect((b, 0).into(), (add, 1).into())?;
        Ok((manager, [a, b, add]))
    }

    #[test]
    fn only_internal_connections_are_merged() -> anyhow::Result<()> {
        let (manager, [a, _b, add]) = chain()?;
        let mut target = NodeManager::new();

        let id_map = manager.merge_to(
            &mut target,
            |node| node.id == a || node.id == add,
            IdPolicy::KeepOriginal,
        )?;

        assert_eq!(id_map.len(), 2);
        assert_eq!(target.node_count(), 2);
        assert_eq!(target.connection_count(), 1);
        assert!(target.is_connected((a, 0).into(), (add, 0).into()));
        assert_eq!(target.node(add).unwrap().pos, Vec2::new(10.0, 0.0));

        Ok(())
    }

    #[test]
    fn regenerate_remaps_connections() -> anyhow::Result<()> {
        let (manager, [a, b, add]) = chain()?;
        let mut target = manager.clone();

        let id_map = manager.merge_to(&mut target, |_| true, IdPolicy::Regenerate)?;

        assert_eq!(target.node_count(), 6);
        assert_eq!(target.connection_count(), 4);
        for old in [a, b, add] {
            assert_ne!(id_map[&old], old);
        }
        assert!(target.is_connected((id_map[&a], 0).into(), (id_map[&add], 0).into()));
        assert!(target.is_connected((id_map[&b], 0).into(), (id_map[&add], 1).into()));

        Ok(())
    }

    #[test]
    fn keep_original_collision_leaves_target_untouched() -> anyhow::Result<()> {
        let (manager, [_a, _b, add]) = chain()?;
        let lib = BasicLib::node_lib();
        let mut target = NodeManager::new();
        let mut clash = lib.create_node_by_name("viewer").unwrap();
        clash.id = add;
        target.add_node(clash)?;

        let result = manager.merge_to(&mut target, |_| true, IdPolicy::KeepOriginal);

        assert_eq!(result, Err(MergeError::IdCollision(add)));
        assert_eq!(target.node_count(), 1);
        assert_eq!(target.connection_count(), 0);

        Ok(())
    }

    #[test]
    fn replace_with_notifies_vanishing_nodes() -> anyhow::Result<()> {
        let (snapshot, [a, b, add]) = chain()?;
        let lib = BasicLib::node_lib();
        let mut live = snapshot.clone();
        let extra = live.add_node(lib.create_node_by_name("viewer").unwrap())?;
        live.connect((add, 0).into(), (extra, 0).into())?;
        live.delete_node(b)?;

        let mut recorder = Recorder(vec![]);
        live.replace_with(&snapshot, &mut recorder)?;

        assert_eq!(recorder.0, vec![extra]);
        assert_eq!(live.node_ids(), [a, b, add].into_iter().collect());
        assert_eq!(live.connection_count(), 2);

        let next = live.add_node(lib.create_node_by_name("number").unwrap())?;
        assert!(next > extra);

        Ok(())
    }
}
