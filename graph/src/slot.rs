use std::fmt;

use serde::{Deserialize, Serialize};

use common::seq_id_type;

seq_id_type!(NodeId);

/// Identifies a slot within its owning node. Input and output slots have
/// separate id spaces; the role is carried by [`InputSlotRef`] /
/// [`OutputSlotRef`], never by the value.
#[derive(
    Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SlotId(pub u32);

#[derive(
    Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct InputSlotRef {
    pub node_id: NodeId,
    pub slot_id: SlotId,
}

#[derive(
    Clone, Copy, PartialEq, Eq, Ord, PartialOrd, Hash, Debug, Default, Serialize, Deserialize,
)]
pub struct OutputSlotRef {
    pub node_id: NodeId,
    pub slot_id: SlotId,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
pub enum ConnectionMode {
    #[default]
    Single,
    Multiple,
    Disabled,
}

impl ConnectionMode {
    pub fn max_connections(&self) -> usize {
        match self {
            ConnectionMode::Single => 1,
            ConnectionMode::Multiple => usize::MAX,
            ConnectionMode::Disabled => 0,
        }
    }
}

impl InputSlotRef {
    pub fn new(node_id: NodeId, slot_id: u32) -> Self {
        Self {
            node_id,
            slot_id: SlotId(slot_id),
        }
    }
}

impl OutputSlotRef {
    pub fn new(node_id: NodeId, slot_id: u32) -> Self {
        Self {
            node_id,
            slot_id: SlotId(slot_id),
        }
    }
}

impl From<(NodeId, u32)> for InputSlotRef {
    fn from((node_id, slot_id): (NodeId, u32)) -> Self {
        InputSlotRef::new(node_id, slot_id)
    }
}

impl From<(NodeId, u32)> for OutputSlotRef {
    fn from((node_id, slot_id): (NodeId, u32)) -> Self {
        OutputSlotRef::new(node_id, slot_id)
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for InputSlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.in{}", self.node_id, self.slot_id)
    }
}

impl fmt::Display for OutputSlotRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.out{}", self.node_id, self.slot_id)
    }
}

/// Monotonic generator for sequential ids. Never hands out the same value
/// twice and never moves backwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdGenerator {
    next: u64,
}

impl Default for IdGenerator {
    fn default() -> Self {
        Self { next: 1 }
    }
}

impl IdGenerator {
    pub fn generate(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }

    pub fn peek(&self) -> u64 {
        self.next
    }

    /// Makes sure every future id is greater than `used`.
    pub fn reserve_past(&mut self, used: u64) {
        self.next = self.next.max(used.saturating_add(1));
    }
}
