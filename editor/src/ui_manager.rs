use std::path::Path;

use glam::Vec2;
use graph::prelude::*;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use tracing::{debug, info};

use crate::commands::{Command, CommandError, CommandResult};
use crate::config::EditorConfig;
use crate::drawing_cache::DrawingCache;
use crate::env::{EvaluationEnv, NodeDrawer};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, Serialize, Deserialize)]
pub enum UpdateMode {
    /// Every `update` evaluates whatever changed.
    #[default]
    Automatic,
    /// `update` only refreshes drawings; evaluation waits for `manual_update`.
    Manual,
}

/// Pending work flags. Each is cleared by the call that handles it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdateStatus {
    need_to_recalculate: bool,
    need_to_redraw: bool,
    need_to_save: bool,
}

impl UpdateStatus {
    pub fn need_to_recalculate(&self) -> bool {
        self.need_to_recalculate
    }

    pub fn need_to_redraw(&self) -> bool {
        self.need_to_redraw
    }

    pub fn need_to_save(&self) -> bool {
        self.need_to_save
    }
}

/// Keeps selection and drawings free of nodes that vanish during undo/redo.
struct UiMergeEventHandler<'a> {
    selection: &'a mut NodeCollection,
    drawings: &'a mut DrawingCache,
}

impl MergeEventHandler for UiMergeEventHandler<'_> {
    fn before_node_delete(&mut self, node_id: NodeId) {
        self.selection.erase(node_id);
        self.drawings.remove_node(node_id);
    }
}

/// Editing session: the document, its history and clipboard, and the state
/// the host needs to decide when to evaluate, draw and save.
#[derive(Debug)]
pub struct NodeUiManager {
    lib: NodeLib,
    manager: NodeManager,
    history: UndoHandler,
    clipboard: CopyPasteHandler,
    selection: NodeCollection,
    drawings: DrawingCache,
    status: UpdateStatus,
    mode: UpdateMode,
}

impl NodeUiManager {
    pub fn new(lib: NodeLib, config: &EditorConfig) -> Self {
        Self {
            lib,
            manager: NodeManager::new(),
            history: UndoHandler::new(config.undo),
            clipboard: CopyPasteHandler::new(),
            selection: NodeCollection::new(),
            drawings: DrawingCache::default(),
            status: UpdateStatus::default(),
            mode: config.update_mode,
        }
    }

    pub fn node_manager(&self) -> &NodeManager {
        &self.manager
    }

    /// Direct access for bootstrap work that must not enter history.
    pub fn node_manager_mut(&mut self) -> &mut NodeManager {
        self.request_recalculate_and_redraw();
        self.drawings.invalidate_all();
        &mut self.manager
    }

    pub fn node_lib(&self) -> &NodeLib {
        &self.lib
    }

    pub fn status(&self) -> UpdateStatus {
        self.status
    }

    pub fn update_mode(&self) -> UpdateMode {
        self.mode
    }

    pub fn set_update_mode(&mut self, mode: UpdateMode) {
        self.mode = mode;
        self.request_recalculate_and_redraw();
    }

    pub fn history(&self) -> &UndoHandler {
        &self.history
    }

    pub fn can_paste(&self) -> bool {
        self.clipboard.has_content()
    }

    pub fn selection(&self) -> &NodeCollection {
        &self.selection
    }

    pub fn set_selection(&mut self, selection: NodeCollection) {
        let previous = std::mem::take(&mut self.selection);
        self.drawings.invalidate_nodes(&self.manager, &previous);
        self.selection = selection
            .iter()
            .filter(|id| self.manager.contains_node(*id))
            .collect();
        self.drawings.invalidate_nodes(&self.manager, &self.selection);
        self.request_redraw();
    }

    pub fn drawings(&self) -> &DrawingCache {
        &self.drawings
    }

    pub fn request_recalculate_and_redraw(&mut self) {
        self.status.need_to_recalculate = true;
        self.status.need_to_redraw = true;
    }

    pub fn request_redraw(&mut self) {
        self.status.need_to_redraw = true;
    }

    pub fn request_save(&mut self) {
        self.status.need_to_save = true;
    }

    /// Snapshots first when the command is undoable. The document counts as
    /// modified whether or not the command succeeds.
    pub fn execute_command(&mut self, command: &dyn Command) -> CommandResult<()> {
        debug!(command = command.name(), "executing command");

        if command.is_undoable() {
            self.history.save_undo_state(&self.manager)?;
        }
        let result = command.execute(self);
        self.request_save();

        result
    }

    /// Drains `need_to_recalculate` and `need_to_redraw`. Returns the stats of
    /// the evaluation pass, if one ran.
    pub fn update(&mut self, env: &mut dyn EvaluationEnv) -> Option<EvaluationStats> {
        let mut stats = None;

        if self.status.need_to_recalculate {
            self.invalidate_drawings_for_invalidated_nodes();
            if self.mode == UpdateMode::Automatic {
                stats = Some(self.run_evaluation(env, false));
            }
            self.status.need_to_recalculate = false;
        }

        if self.status.need_to_redraw {
            env.on_redraw_requested();
            self.status.need_to_redraw = false;
        }

        stats
    }

    /// Invalidates drawings of pending nodes, then recomputes every node,
    /// failed ones included, if a recalculation was requested. Runs in either
    /// mode.
    pub fn manual_update(&mut self, env: &mut dyn EvaluationEnv) -> Option<EvaluationStats> {
        self.invalidate_drawings_for_invalidated_nodes();

        let mut stats = None;
        if self.status.need_to_recalculate {
            stats = Some(self.run_evaluation(env, true));
            self.status.need_to_recalculate = false;
        }

        if self.status.need_to_redraw {
            env.on_redraw_requested();
            self.status.need_to_redraw = false;
        }

        stats
    }

    fn run_evaluation(&mut self, env: &mut dyn EvaluationEnv, force: bool) -> EvaluationStats {
        env.on_evaluation_begin();
        let stats = if force {
            self.manager.force_evaluate_all_nodes(&self.lib, env.context())
        } else {
            self.manager.evaluate_all_nodes(&self.lib, env.context())
        };
        env.on_evaluation_end(&stats);
        env.on_values_recalculated();

        if force {
            self.drawings.invalidate_all();
            self.status.need_to_redraw = true;
        }
        stats
    }

    /// Invalidates drawings of nodes waiting for calculation, and of
    /// everything depending on them.
    pub fn invalidate_drawings_for_invalidated_nodes(&mut self) {
        let pending: Vec<NodeId> = self
            .manager
            .nodes()
            .filter(|node| node.status() != CalcStatus::UpToDate)
            .map(|node| node.id)
            .collect();
        if pending.is_empty() {
            return;
        }

        for node_id in pending {
            self.drawings.invalidate_node(&self.manager, node_id);
            let dependents = self.manager.dependent_nodes_recursive(node_id);
            self.drawings.invalidate_nodes(&self.manager, &dependents);
        }
        self.status.need_to_redraw = true;
    }

    /// Hands every stale group and node to `drawer`, then marks them drawn.
    pub fn draw(&mut self, drawer: &mut dyn NodeDrawer) -> usize {
        let mut drawn = 0;

        for group in self.manager.groups() {
            if self.drawings.is_group_stale(group.id) {
                drawer.draw_group(group);
                self.drawings.mark_group_drawn(group.id);
                drawn += 1;
            }
        }
        for node in self.manager.nodes() {
            if self.drawings.is_node_stale(node.id) {
                let values = self.manager.values(node.id);
                drawer.draw_node(node, values, self.selection.contains(node.id));
                self.drawings.mark_node_drawn(node.id);
                drawn += 1;
            }
        }

        self.status.need_to_redraw = false;
        drawn
    }

    pub fn save(&mut self, path: &Path) -> Result<(), StreamError> {
        self.manager.save_to_file(path)?;
        self.status.need_to_save = false;
        Ok(())
    }

    /// Loads a document, dropping history, selection and drawings. On failure
    /// the document is left empty.
    pub fn open(&mut self, path: &Path) -> Result<(), StreamError> {
        self.history.clear();
        self.selection.clear();
        self.drawings.invalidate_all();
        self.request_recalculate_and_redraw();

        let result = self.manager.open_file(path, &self.lib);
        self.status.need_to_save = false;

        info!(path = %path.display(), ok = result.is_ok(), "document opened");
        result
    }

    // operations behind the commands

    pub(crate) fn add_node(&mut self, type_id: NodeTypeId, pos: Vec2) -> CommandResult<NodeId> {
        let node = self
            .lib
            .create_node(type_id)
            .ok_or(CommandError::UnknownNodeType(type_id))?
            .with_pos(pos);
        let node_id = self.manager.add_node(node)?;

        self.drawings.invalidate_node(&self.manager, node_id);
        self.request_recalculate_and_redraw();
        Ok(node_id)
    }

    pub(crate) fn delete_nodes(&mut self, nodes: &NodeCollection) -> CommandResult<()> {
        if let Some(missing) = nodes.iter().find(|id| !self.manager.contains_node(*id)) {
            return Err(GraphError::NodeNotFound(missing).into());
        }

        for node_id in nodes.iter() {
            self.drawings.invalidate_node(&self.manager, node_id);
            let dependents = self.manager.dependent_nodes(node_id);
            self.drawings.invalidate_nodes(&self.manager, &dependents);
            self.selection.erase(node_id);
            self.drawings.remove_node(node_id);
            self.manager.delete_node(node_id)?;
        }

        self.request_recalculate_and_redraw();
        Ok(())
    }

    pub(crate) fn move_nodes(&mut self, nodes: &NodeCollection, offset: Vec2) -> CommandResult<()> {
        if let Some(missing) = nodes.iter().find(|id| !self.manager.contains_node(*id)) {
            return Err(GraphError::NodeNotFound(missing).into());
        }

        translate(&mut self.manager, nodes, offset);
        self.drawings.invalidate_nodes(&self.manager, nodes);
        self.request_redraw();
        Ok(())
    }

    pub(crate) fn connect(&mut self, output: OutputSlotRef, input: InputSlotRef) -> CommandResult<()> {
        self.manager.connect(output, input)?;
        self.drawings.invalidate_node(&self.manager, output.node_id);
        self.drawings.invalidate_node(&self.manager, input.node_id);
        self.request_recalculate_and_redraw();
        Ok(())
    }

    pub(crate) fn disconnect(
        &mut self,
        output: OutputSlotRef,
        input: InputSlotRef,
    ) -> CommandResult<()> {
        self.manager.disconnect(output, input)?;
        self.drawings.invalidate_node(&self.manager, output.node_id);
        self.drawings.invalidate_node(&self.manager, input.node_id);
        self.request_recalculate_and_redraw();
        Ok(())
    }

    pub(crate) fn disconnect_all_from_output(&mut self, output: OutputSlotRef) -> CommandResult<()> {
        let removed = self.manager.disconnect_all_from_output(output)?;
        self.invalidate_connection_drawings(&removed);
        Ok(())
    }

    pub(crate) fn disconnect_all_from_input(&mut self, input: InputSlotRef) -> CommandResult<()> {
        let removed = self.manager.disconnect_all_from_input(input)?;
        self.invalidate_connection_drawings(&removed);
        Ok(())
    }

    fn invalidate_connection_drawings(&mut self, removed: &[Connection]) {
        for connection in removed {
            self.drawings
                .invalidate_node(&self.manager, connection.output.node_id);
            self.drawings
                .invalidate_node(&self.manager, connection.input.node_id);
        }
        if !removed.is_empty() {
            self.request_recalculate_and_redraw();
        }
    }

    pub(crate) fn set_node_param(
        &mut self,
        node_id: NodeId,
        index: usize,
        value: Value,
    ) -> CommandResult<()> {
        self.manager.set_node_param(node_id, index, value)?;
        self.drawings.invalidate_node(&self.manager, node_id);
        self.request_recalculate_and_redraw();
        Ok(())
    }

    pub(crate) fn add_group(&mut self, group: NodeGroup) -> CommandResult<GroupId> {
        // members may leave other groups
        let members = group.nodes.clone();
        self.drawings.invalidate_nodes(&self.manager, &members);
        let group_id = self.manager.add_group(group)?;
        self.drawings.invalidate_group(group_id);
        self.request_redraw();
        Ok(group_id)
    }

    pub(crate) fn delete_group(&mut self, group_id: GroupId) -> CommandResult<()> {
        let group = self.manager.delete_group(group_id)?;
        self.drawings.invalidate_group(group_id);
        self.drawings.invalidate_nodes(&self.manager, &group.nodes);
        self.request_redraw();
        Ok(())
    }

    pub(crate) fn remove_nodes_from_group(&mut self, nodes: &NodeCollection) -> CommandResult<()> {
        for node_id in nodes.iter() {
            if let Some(group_id) = self.manager.remove_node_from_group(node_id)? {
                self.drawings.invalidate_group(group_id);
            }
            self.drawings.invalidate_node(&self.manager, node_id);
        }
        self.request_redraw();
        Ok(())
    }

    pub(crate) fn copy_nodes(&mut self, nodes: &NodeCollection) -> CommandResult<()> {
        self.clipboard.copy_from(&self.manager, nodes)?;
        Ok(())
    }

    /// Pastes the clipboard centered at `target` and selects the new nodes.
    pub(crate) fn paste_nodes(&mut self, target: Vec2) -> CommandResult<NodeCollection> {
        let pasted = self.clipboard.paste_to(&mut self.manager)?;
        if let Some(center) = centroid(&self.manager, &pasted) {
            translate(&mut self.manager, &pasted, target - center);
        }

        self.set_selection(pasted.clone());
        self.request_recalculate_and_redraw();
        Ok(pasted)
    }

    pub(crate) fn undo(&mut self) -> CommandResult<()> {
        let mut handler = UiMergeEventHandler {
            selection: &mut self.selection,
            drawings: &mut self.drawings,
        };
        self.history.undo(&mut self.manager, &mut handler)?;
        self.after_history_jump();
        Ok(())
    }

    pub(crate) fn redo(&mut self) -> CommandResult<()> {
        let mut handler = UiMergeEventHandler {
            selection: &mut self.selection,
            drawings: &mut self.drawings,
        };
        self.history.redo(&mut self.manager, &mut handler)?;
        self.after_history_jump();
        Ok(())
    }

    fn after_history_jump(&mut self) {
        self.drawings.invalidate_all();
        self.request_recalculate_and_redraw();
    }
}
