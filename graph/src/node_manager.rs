use common::key_index_vec::{KeyIndexKey, KeyIndexVec};
use glam::Vec2;
use thiserror::Error;
use tracing::debug;

use crate::connection_manager::{Connection, ConnectionError, ConnectionManager};
use crate::group::{GroupId, NodeGroup};
use crate::node::Node;
use crate::node_collection::NodeCollection;
use crate::slot::{IdGenerator, InputSlotRef, NodeId, OutputSlotRef};
use crate::value::Value;
use crate::value_cache::NodeValueCache;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),
    #[error("Node {0} already exists")]
    NodeAlreadyExists(NodeId),
    #[error("Input slot {0} does not exist")]
    InputSlotNotFound(InputSlotRef),
    #[error("Output slot {0} does not exist")]
    OutputSlotNotFound(OutputSlotRef),
    #[error("Slots of node {0} cannot be connected to each other")]
    SelfConnection(NodeId),
    #[error(transparent)]
    Connection(#[from] ConnectionError),
    #[error("Group {0} not found")]
    GroupNotFound(GroupId),
    #[error("Group {0} already exists")]
    GroupAlreadyExists(GroupId),
    #[error("Node {node_id} has no parameter {index}")]
    ParamOutOfRange { node_id: NodeId, index: usize },
    #[error("Node {0} does not match the slots and parameters of its type")]
    NodeLayoutMismatch(NodeId),
}

pub type GraphResult<T> = std::result::Result<T, GraphError>;

impl KeyIndexKey<NodeId> for Node {
    fn key(&self) -> &NodeId {
        &self.id
    }
}

impl KeyIndexKey<GroupId> for NodeGroup {
    fn key(&self) -> &GroupId {
        &self.id
    }
}

/// Owns the nodes, their connections and groups, and the per-node value
/// cache. Everything outside refers to nodes by `NodeId` only.
#[derive(Clone, Debug, Default)]
pub struct NodeManager {
    pub(crate) nodes: KeyIndexVec<NodeId, Node>,
    pub(crate) connections: ConnectionManager,
    pub(crate) groups: KeyIndexVec<GroupId, NodeGroup>,
    pub(crate) node_ids: IdGenerator,
    pub(crate) group_ids: IdGenerator,
    pub(crate) cache: NodeValueCache,
}

impl NodeManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drops nodes, connections, groups and cached values. Id generators keep
    /// counting so ids handed out earlier are never reused.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.connections.clear();
        self.groups.clear();
        self.cache.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn contains_node(&self, node_id: NodeId) -> bool {
        self.nodes.contains_key(&node_id)
    }

    pub fn node(&self, node_id: NodeId) -> Option<&Node> {
        self.nodes.by_key(&node_id)
    }

    pub fn node_by_name(&self, name: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> + '_ {
        self.nodes.iter()
    }

    pub fn node_ids(&self) -> NodeCollection {
        self.nodes.keys().collect()
    }

    /// Registers `node`. An invalid id gets a fresh one; an explicit id is
    /// kept and the generator moves past it.
    pub fn add_node(&mut self, mut node: Node) -> GraphResult<NodeId> {
        if node.id.is_valid() {
            if self.contains_node(node.id) {
                return Err(GraphError::NodeAlreadyExists(node.id));
            }
            self.node_ids.reserve_past(node.id.as_u64());
        } else {
            node.id = NodeId::new(self.node_ids.generate());
        }

        let node_id = node.id;
        node.mark_dirty();
        self.cache.remove(node_id);
        self.nodes.push(node);

        debug!(%node_id, "node added");
        Ok(node_id)
    }

    /// Removes the node, every connection touching it and its group
    /// membership. Former dependents are invalidated.
    pub fn delete_node(&mut self, node_id: NodeId) -> GraphResult<Node> {
        if !self.contains_node(node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }

        let dependents = self.dependent_nodes(node_id);
        self.connections.disconnect_node(node_id);
        for group in self.groups.iter_mut() {
            group.nodes.erase(node_id);
        }
        self.cache.remove(node_id);
        let node = self
            .nodes
            .remove_by_key(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;

        for dependent in dependents.iter() {
            self.invalidate_node(dependent);
        }

        debug!(%node_id, "node deleted");
        Ok(node)
    }

    pub fn set_node_param(
        &mut self,
        node_id: NodeId,
        index: usize,
        value: Value,
    ) -> GraphResult<()> {
        let node = self
            .nodes
            .by_key_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        let param = node
            .params
            .get_mut(index)
            .ok_or(GraphError::ParamOutOfRange { node_id, index })?;
        *param = value;

        self.invalidate_node(node_id);
        Ok(())
    }

    pub fn set_node_position(&mut self, node_id: NodeId, pos: Vec2) -> GraphResult<()> {
        let node = self
            .nodes
            .by_key_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.pos = pos;
        Ok(())
    }

    pub fn set_node_name(&mut self, node_id: NodeId, name: &str) -> GraphResult<()> {
        let node = self
            .nodes
            .by_key_mut(&node_id)
            .ok_or(GraphError::NodeNotFound(node_id))?;
        node.name = name.to_string();
        Ok(())
    }

    // connections

    /// Validates slots and returns `(max_fan_in, max_fan_out)`.
    fn slot_limits(
        &self,
        output: OutputSlotRef,
        input: InputSlotRef,
    ) -> GraphResult<(usize, usize)> {
        let output_node = self
            .node(output.node_id)
            .ok_or(GraphError::NodeNotFound(output.node_id))?;
        let input_node = self
            .node(input.node_id)
            .ok_or(GraphError::NodeNotFound(input.node_id))?;
        let output_slot = output_node
            .output(output.slot_id)
            .ok_or(GraphError::OutputSlotNotFound(output))?;
        let input_slot = input_node
            .input(input.slot_id)
            .ok_or(GraphError::InputSlotNotFound(input))?;
        if output.node_id == input.node_id {
            return Err(GraphError::SelfConnection(output.node_id));
        }

        Ok((
            input_slot.mode.max_connections(),
            output_slot.mode.max_connections(),
        ))
    }

    fn check_input(&self, input: InputSlotRef) -> GraphResult<()> {
        self.node(input.node_id)
            .ok_or(GraphError::NodeNotFound(input.node_id))?
            .input(input.slot_id)
            .ok_or(GraphError::InputSlotNotFound(input))?;
        Ok(())
    }

    fn check_output(&self, output: OutputSlotRef) -> GraphResult<()> {
        self.node(output.node_id)
            .ok_or(GraphError::NodeNotFound(output.node_id))?
            .output(output.slot_id)
            .ok_or(GraphError::OutputSlotNotFound(output))?;
        Ok(())
    }

    pub fn can_connect(&self, output: OutputSlotRef, input: InputSlotRef) -> GraphResult<()> {
        let (max_fan_in, max_fan_out) = self.slot_limits(output, input)?;
        self.connections
            .can_connect(output, input, max_fan_in, max_fan_out)?;
        Ok(())
    }

    pub fn connect(&mut self, output: OutputSlotRef, input: InputSlotRef) -> GraphResult<()> {
        let (max_fan_in, max_fan_out) = self.slot_limits(output, input)?;
        self.connections
            .connect(output, input, max_fan_in, max_fan_out)?;
        self.invalidate_node(input.node_id);

        debug!(%output, %input, "slots connected");
        Ok(())
    }

    pub fn disconnect(&mut self, output: OutputSlotRef, input: InputSlotRef) -> GraphResult<()> {
        self.check_output(output)?;
        self.check_input(input)?;
        self.connections.disconnect(output, input)?;
        self.invalidate_node(input.node_id);

        debug!(%output, %input, "slots disconnected");
        Ok(())
    }

    /// Removes every connection feeding `input`.
    pub fn disconnect_all_from_input(&mut self, input: InputSlotRef) -> GraphResult<Vec<Connection>> {
        self.check_input(input)?;
        let removed = self.connections.disconnect_all_from_input(input);
        if !removed.is_empty() {
            self.invalidate_node(input.node_id);
        }
        Ok(removed)
    }

    /// Removes every connection leaving `output`.
    pub fn disconnect_all_from_output(
        &mut self,
        output: OutputSlotRef,
    ) -> GraphResult<Vec<Connection>> {
        self.check_output(output)?;
        let removed = self.connections.disconnect_all_from_output(output);
        let targets: NodeCollection = removed
            .iter()
            .map(|connection| connection.input.node_id)
            .collect();
        for target in targets.iter() {
            self.invalidate_node(target);
        }
        Ok(removed)
    }

    pub fn is_connected(&self, output: OutputSlotRef, input: InputSlotRef) -> bool {
        self.connections.is_connected(output, input)
    }

    pub fn has_input_connection(&self, input: InputSlotRef) -> bool {
        self.connections.has_input_connection(input)
    }

    pub fn has_output_connection(&self, output: OutputSlotRef) -> bool {
        self.connections.has_output_connection(output)
    }

    pub fn has_connected_input_slots(&self, node_id: NodeId) -> bool {
        self.node(node_id).is_some_and(|node| {
            node.input_refs()
                .any(|input| self.connections.has_input_connection(input))
        })
    }

    pub fn has_connected_output_slots(&self, node_id: NodeId) -> bool {
        self.node(node_id).is_some_and(|node| {
            node.output_refs()
                .any(|output| self.connections.has_output_connection(output))
        })
    }

    pub fn connected_inputs(&self, output: OutputSlotRef) -> &[InputSlotRef] {
        self.connections.connected_inputs(output)
    }

    pub fn connected_outputs(&self, input: InputSlotRef) -> &[OutputSlotRef] {
        self.connections.connected_outputs(input)
    }

    /// Every connection in insertion order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.connections.connections()
    }

    // dependencies

    /// Nodes consuming any output of `node_id`.
    pub fn dependent_nodes(&self, node_id: NodeId) -> NodeCollection {
        let mut result = NodeCollection::new();
        if let Some(node) = self.node(node_id) {
            for output in node.output_refs() {
                for input in self.connections.connected_inputs(output) {
                    result.insert(input.node_id);
                }
            }
        }
        result
    }

    /// Nodes feeding any input of `node_id`.
    pub fn input_nodes(&self, node_id: NodeId) -> NodeCollection {
        let mut result = NodeCollection::new();
        if let Some(node) = self.node(node_id) {
            for input in node.input_refs() {
                for output in self.connections.connected_outputs(input) {
                    result.insert(output.node_id);
                }
            }
        }
        result
    }

    pub fn dependent_nodes_recursive(&self, node_id: NodeId) -> NodeCollection {
        self.collect_recursive(node_id, |manager, id| manager.dependent_nodes(id))
    }

    pub fn input_nodes_recursive(&self, node_id: NodeId) -> NodeCollection {
        self.collect_recursive(node_id, |manager, id| manager.input_nodes(id))
    }

    // breadth-first; the start node only appears if it lies on a cycle
    fn collect_recursive(
        &self,
        node_id: NodeId,
        neighbours: impl Fn(&NodeManager, NodeId) -> NodeCollection,
    ) -> NodeCollection {
        let mut visited = NodeCollection::new();
        let mut queue = vec![node_id];
        let mut index = 0;
        while index < queue.len() {
            let current = queue[index];
            index += 1;
            for next in neighbours(self, current).iter() {
                if visited.insert(next) {
                    queue.push(next);
                }
            }
        }
        visited
    }

    /// Marks `node_id` and everything downstream of it for recalculation and
    /// drops their cached values. Returns the affected nodes.
    pub fn invalidate_node(&mut self, node_id: NodeId) -> NodeCollection {
        let mut invalidated = NodeCollection::new();
        if !self.contains_node(node_id) {
            return invalidated;
        }
        invalidated.insert(node_id);
        invalidated.extend(self.dependent_nodes_recursive(node_id).iter());

        for id in invalidated.iter() {
            if let Some(node) = self.nodes.by_key_mut(&id) {
                node.mark_dirty();
            }
            self.cache.invalidate(id);
        }
        invalidated
    }

    pub fn invalidate_all_nodes(&mut self) {
        for node in self.nodes.iter_mut() {
            node.mark_dirty();
        }
        self.cache.clear();
    }

    /// Cached output values, if the node is up to date.
    pub fn values(&self, node_id: NodeId) -> Option<&[Value]> {
        self.cache.get(node_id)
    }

    pub fn output_value(&self, output: OutputSlotRef) -> Option<&Value> {
        self.values(output.node_id)?
            .get(output.slot_id.0 as usize)
    }

    // groups

    /// Registers `group`. Members must exist; a member already in another
    /// group is moved out of it.
    pub fn add_group(&mut self, mut group: NodeGroup) -> GraphResult<GroupId> {
        if let Some(missing) = group.nodes.iter().find(|id| !self.contains_node(*id)) {
            return Err(GraphError::NodeNotFound(missing));
        }
        if group.id.is_valid() {
            if self.groups.contains_key(&group.id) {
                return Err(GraphError::GroupAlreadyExists(group.id));
            }
            self.group_ids.reserve_past(group.id.as_u64());
        } else {
            group.id = GroupId::new(self.group_ids.generate());
        }

        for node_id in group.nodes.iter() {
            self.detach_from_groups(node_id);
        }
        let group_id = group.id;
        self.groups.push(group);

        debug!(%group_id, "group added");
        Ok(group_id)
    }

    pub fn delete_group(&mut self, group_id: GroupId) -> GraphResult<NodeGroup> {
        self.groups
            .remove_by_key(&group_id)
            .ok_or(GraphError::GroupNotFound(group_id))
    }

    pub fn add_node_to_group(&mut self, group_id: GroupId, node_id: NodeId) -> GraphResult<()> {
        if !self.contains_node(node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }
        if !self.groups.contains_key(&group_id) {
            return Err(GraphError::GroupNotFound(group_id));
        }
        self.detach_from_groups(node_id);
        if let Some(group) = self.groups.by_key_mut(&group_id) {
            group.nodes.insert(node_id);
        }
        Ok(())
    }

    /// Returns the group the node was removed from, if any.
    pub fn remove_node_from_group(&mut self, node_id: NodeId) -> GraphResult<Option<GroupId>> {
        if !self.contains_node(node_id) {
            return Err(GraphError::NodeNotFound(node_id));
        }
        Ok(self.detach_from_groups(node_id))
    }

    fn detach_from_groups(&mut self, node_id: NodeId) -> Option<GroupId> {
        let mut detached = None;
        for group in self.groups.iter_mut() {
            if group.nodes.erase(node_id) {
                detached = Some(group.id);
            }
        }
        detached
    }

    pub fn node_group(&self, node_id: NodeId) -> Option<GroupId> {
        self.groups
            .iter()
            .find(|group| group.nodes.contains(node_id))
            .map(|group| group.id)
    }

    pub fn group(&self, group_id: GroupId) -> Option<&NodeGroup> {
        self.groups.by_key(&group_id)
    }

    pub fn groups(&self) -> impl Iterator<Item = &NodeGroup> + '_ {
        self.groups.iter()
    }
}
