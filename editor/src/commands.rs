use std::fmt::Debug;

use glam::Vec2;
use graph::prelude::*;
use thiserror::Error;

use crate::ui_manager::NodeUiManager;

#[derive(Debug, Error)]
pub enum CommandError {
    #[error("Node type {0} is not registered")]
    UnknownNodeType(NodeTypeId),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Clipboard(#[from] ClipboardError),
    #[error(transparent)]
    Undo(#[from] UndoError),
}

pub type CommandResult<T> = std::result::Result<T, CommandError>;

/// One user-level edit. Run through `NodeUiManager::execute_command` so
/// undoable commands are snapshotted first.
pub trait Command: Debug {
    fn name(&self) -> &'static str;

    fn is_undoable(&self) -> bool {
        true
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()>;
}

#[derive(Debug, Clone)]
pub struct AddNodeCommand {
    pub type_id: NodeTypeId,
    pub pos: Vec2,
}

impl Command for AddNodeCommand {
    fn name(&self) -> &'static str {
        "add node"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.add_node(self.type_id, self.pos)?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct DeleteNodesCommand {
    pub nodes: NodeCollection,
}

impl Command for DeleteNodesCommand {
    fn name(&self) -> &'static str {
        "delete nodes"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.delete_nodes(&self.nodes)
    }
}

#[derive(Debug, Clone)]
pub struct MoveNodesCommand {
    pub nodes: NodeCollection,
    pub offset: Vec2,
}

impl Command for MoveNodesCommand {
    fn name(&self) -> &'static str {
        "move nodes"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.move_nodes(&self.nodes, self.offset)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConnectSlotsCommand {
    pub output: OutputSlotRef,
    pub input: InputSlotRef,
}

impl Command for ConnectSlotsCommand {
    fn name(&self) -> &'static str {
        "connect slots"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.connect(self.output, self.input)
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DisconnectSlotsCommand {
    pub output: OutputSlotRef,
    pub input: InputSlotRef,
}

impl Command for DisconnectSlotsCommand {
    fn name(&self) -> &'static str {
        "disconnect slots"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.disconnect(self.output, self.input)
    }
}

/// Drops every input fed by `output`.
#[derive(Debug, Clone, Copy)]
pub struct DisconnectAllInputSlotsCommand {
    pub output: OutputSlotRef,
}

impl Command for DisconnectAllInputSlotsCommand {
    fn name(&self) -> &'static str {
        "disconnect all input slots"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.disconnect_all_from_output(self.output)
    }
}

/// Drops every output feeding `input`.
#[derive(Debug, Clone, Copy)]
pub struct DisconnectAllOutputSlotsCommand {
    pub input: InputSlotRef,
}

impl Command for DisconnectAllOutputSlotsCommand {
    fn name(&self) -> &'static str {
        "disconnect all output slots"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.disconnect_all_from_input(self.input)
    }
}

#[derive(Debug, Clone)]
pub struct SetParameterCommand {
    pub node_id: NodeId,
    pub index: usize,
    pub value: Value,
}

impl Command for SetParameterCommand {
    fn name(&self) -> &'static str {
        "set parameter"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.set_node_param(self.node_id, self.index, self.value.clone())
    }
}

#[derive(Debug, Clone)]
pub struct AddGroupCommand {
    pub name: String,
    pub color: Color,
    pub nodes: NodeCollection,
}

impl AddGroupCommand {
    pub fn new(name: &str, nodes: NodeCollection) -> Self {
        Self {
            name: name.to_string(),
            color: Color::default(),
            nodes,
        }
    }
}

impl Command for AddGroupCommand {
    fn name(&self) -> &'static str {
        "add group"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        let mut group = NodeGroup::new(&self.name).with_color(self.color);
        group.nodes = self.nodes.clone();
        ui.add_group(group)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
pub struct DeleteGroupCommand {
    pub group_id: GroupId,
}

impl Command for DeleteGroupCommand {
    fn name(&self) -> &'static str {
        "delete group"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.delete_group(self.group_id)
    }
}

#[derive(Debug, Clone)]
pub struct RemoveNodesFromGroupCommand {
    pub nodes: NodeCollection,
}

impl Command for RemoveNodesFromGroupCommand {
    fn name(&self) -> &'static str {
        "remove nodes from group"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.remove_nodes_from_group(&self.nodes)
    }
}

#[derive(Debug, Clone)]
pub struct CopyNodesCommand {
    pub nodes: NodeCollection,
}

impl Command for CopyNodesCommand {
    fn name(&self) -> &'static str {
        "copy nodes"
    }

    fn is_undoable(&self) -> bool {
        false
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.copy_nodes(&self.nodes)
    }
}

/// Pastes the clipboard centered at `target`.
#[derive(Debug, Clone, Copy)]
pub struct PasteNodesCommand {
    pub target: Vec2,
}

impl Command for PasteNodesCommand {
    fn name(&self) -> &'static str {
        "paste nodes"
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.paste_nodes(self.target)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UndoCommand;

impl Command for UndoCommand {
    fn name(&self) -> &'static str {
        "undo"
    }

    fn is_undoable(&self) -> bool {
        false
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.undo()
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct RedoCommand;

impl Command for RedoCommand {
    fn name(&self) -> &'static str {
        "redo"
    }

    fn is_undoable(&self) -> bool {
        false
    }

    fn execute(&self, ui: &mut NodeUiManager) -> CommandResult<()> {
        ui.redo()
    }
}
