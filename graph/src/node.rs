use glam::Vec2;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use thiserror::Error;

use crate::node_lib::{NodeType, NodeTypeId};
use crate::slot::{ConnectionMode, InputSlotRef, NodeId, OutputSlotRef, SlotId};
use crate::value::{DataType, Value};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum CalcStatus {
    UpToDate,
    #[default]
    NeedToCalculate,
    NeedToCalculateButDisabled,
}

/// Why a node could not produce values. Local to the node; never aborts an
/// evaluation pass.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum NodeError {
    #[error("Node type {0} is not registered")]
    UnknownType(NodeTypeId),
    #[error("Node is part of a dependency cycle")]
    Cycle,
    #[error("Input slot {slot} cannot be converted to {expected}")]
    InputConversion { slot: SlotId, expected: DataType },
    #[error("Calculation failed: {0}")]
    Calculation(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct InputSlot {
    pub id: SlotId,
    pub name: String,
    pub data_type: DataType,
    pub mode: ConnectionMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<Value>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OutputSlot {
    pub id: SlotId,
    pub name: String,
    pub data_type: DataType,
    pub mode: ConnectionMode,
}

/// A unit of computation. Owned by a `NodeManager`; everything else refers to
/// it by `NodeId`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub type_id: NodeTypeId,
    pub name: String,
    /// Editor placement. Evaluation ignores it.
    #[serde(default)]
    pub pos: Vec2,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub params: Vec<Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub inputs: Vec<InputSlot>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub outputs: Vec<OutputSlot>,

    #[serde(skip)]
    pub(crate) status: CalcStatus,
    #[serde(skip)]
    pub(crate) error: Option<NodeError>,
}

/// Compares the persisted fields only; calculation state is ignored.
impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
            && self.type_id == other.type_id
            && self.name == other.name
            && self.pos == other.pos
            && self.params == other.params
            && self.inputs == other.inputs
            && self.outputs == other.outputs
    }
}

impl Node {
    pub fn from_type(node_type: &NodeType) -> Node {
        let inputs = node_type
            .inputs
            .iter()
            .enumerate()
            .map(|(idx, info)| InputSlot {
                id: SlotId(idx as u32),
                name: info.name.clone(),
                data_type: info.data_type,
                mode: info.mode,
                default_value: info.default_value.clone(),
            })
            .collect();
        let outputs = node_type
            .outputs
            .iter()
            .enumerate()
            .map(|(idx, info)| OutputSlot {
                id: SlotId(idx as u32),
                name: info.name.clone(),
                data_type: info.data_type,
                mode: info.mode,
            })
            .collect();

        Node {
            id: NodeId::INVALID,
            type_id: node_type.id,
            name: node_type.name.clone(),
            pos: Vec2::ZERO,
            params: node_type
                .params
                .iter()
                .map(|param| param.default_value.clone())
                .collect(),
            inputs,
            outputs,
            status: CalcStatus::NeedToCalculate,
            error: None,
        }
    }

    pub fn with_pos(mut self, pos: Vec2) -> Self {
        self.pos = pos;
        self
    }

    pub fn with_param(mut self, idx: usize, value: impl Into<Value>) -> Self {
        if let Some(param) = self.params.get_mut(idx) {
            *param = value.into();
        }
        self
    }

    pub fn status(&self) -> CalcStatus {
        self.status
    }

    pub fn error(&self) -> Option<&NodeError> {
        self.error.as_ref()
    }

    pub fn input(&self, slot_id: SlotId) -> Option<&InputSlot> {
        self.inputs.iter().find(|slot| slot.id == slot_id)
    }

    pub fn output(&self, slot_id: SlotId) -> Option<&OutputSlot> {
        self.outputs.iter().find(|slot| slot.id == slot_id)
    }

    pub fn input_by_name(&self, name: &str) -> Option<InputSlotRef> {
        self.inputs
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| InputSlotRef {
                node_id: self.id,
                slot_id: slot.id,
            })
    }

    pub fn output_by_name(&self, name: &str) -> Option<OutputSlotRef> {
        self.outputs
            .iter()
            .find(|slot| slot.name == name)
            .map(|slot| OutputSlotRef {
                node_id: self.id,
                slot_id: slot.id,
            })
    }

    pub fn input_refs(&self) -> impl Iterator<Item = InputSlotRef> + '_ {
        self.inputs.iter().map(|slot| InputSlotRef {
            node_id: self.id,
            slot_id: slot.id,
        })
    }

    pub fn output_refs(&self) -> impl Iterator<Item = OutputSlotRef> + '_ {
        self.outputs.iter().map(|slot| OutputSlotRef {
            node_id: self.id,
            slot_id: slot.id,
        })
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.status = CalcStatus::NeedToCalculate;
        self.error = None;
    }
}
