use glam::Vec2;
use graph::elements::basic_lib::{Math2ArgOp, NUMBER_TYPE_ID, VIEWER_TYPE_ID};
use graph::prelude::*;

use crate::commands::*;
use crate::config::EditorConfig;
use crate::env::{EvaluationEnv, TextDrawer};
use crate::ui_manager::{NodeUiManager, UpdateMode};

#[derive(Debug, Default)]
struct RecordingEnv {
    ctx: EvaluationContext,
    events: Vec<&'static str>,
}

impl EvaluationEnv for RecordingEnv {
    fn context(&mut self) -> &mut EvaluationContext {
        &mut self.ctx
    }

    fn on_evaluation_begin(&mut self) {
        self.events.push("begin");
    }

    fn on_evaluation_end(&mut self, _stats: &EvaluationStats) {
        self.events.push("end");
    }

    fn on_values_recalculated(&mut self) {
        self.events.push("recalculated");
    }

    fn on_redraw_requested(&mut self) {
        self.events.push("redraw");
    }
}

fn session(mode: UpdateMode) -> NodeUiManager {
    let config = EditorConfig {
        update_mode: mode,
        ..Default::default()
    };
    NodeUiManager::new(BasicLib::node_lib(), &config)
}

fn last_node(ui: &NodeUiManager) -> NodeId {
    ui.node_manager().nodes().last().unwrap().id
}

fn add(ui: &mut NodeUiManager, type_id: NodeTypeId, pos: Vec2) -> anyhow::Result<NodeId> {
    ui.execute_command(&AddNodeCommand { type_id, pos })?;
    Ok(last_node(ui))
}

/// number(3) -> add.a, number(4) -> add.b, add -> viewer
fn build_sum(ui: &mut NodeUiManager) -> anyhow::Result<[NodeId; 4]> {
    let a = add(ui, NUMBER_TYPE_ID, Vec2::new(0.0, 0.0))?;
    let b = add(ui, NUMBER_TYPE_ID, Vec2::new(0.0, 100.0))?;
    let sum = add(ui, Math2ArgOp::Add.type_id(), Vec2::new(200.0, 50.0))?;
    let view = add(ui, VIEWER_TYPE_ID, Vec2::new(400.0, 50.0))?;
    ui.execute_command(&SetParameterCommand {
        node_id: a,
        index: 0,
        value: Value::Float(3.0),
    })?;
    ui.execute_command(&SetParameterCommand {
        node_id: b,
        index: 0,
        value: Value::Float(4.0),
    })?;
    for (output, input) in [((a, 0), (sum, 0)), ((b, 0), (sum, 1)), ((sum, 0), (view, 0))] {
        ui.execute_command(&ConnectSlotsCommand {
            output: output.into(),
            input: input.into(),
        })?;
    }
    Ok([a, b, sum, view])
}

#[test]
fn command_marks_status_and_update_drains_it() -> anyhow::Result<()> {
    let mut ui = session(UpdateMode::Automatic);
    assert_eq!(ui.status(), Default::default());

    let [.., view] = build_sum(&mut ui)?;
    assert_eq!(ui.history().undo_len(), 9);
    assert!(ui.status().need_to_recalculate());
    assert!(ui.status().need_to_redraw());
    assert!(ui.status().need_to_save());

    let mut env = RecordingEnv::default();
    let stats = ui.update(&mut env).unwrap();

    assert_eq!(stats.evaluated, 4);
    assert_eq!(env.events, vec!["begin", "end", "recalculated", "redraw"]);
    assert_eq!(env.ctx.output.take(), vec!["7"]);
    assert_eq!(
        ui.node_manager().output_value((view, 0).into()),
        Some(&Value::Float(7.0))
    );
    assert!(!ui.status().need_to_recalculate());
    assert!(!ui.status().need_to_redraw());
    assert!(ui.status().need_to_save());

    // nothing pending, nothing happens
    env.events.clear();
    assert!(ui.update(&mut env).is_none());
    assert!(env.events.is_empty());

    Ok(())
}

#[test]
fn copy_is_not_recorded_in_history() -> anyhow::Result<()> {
    let mut ui = session(UpdateMode::Automatic);
    let a = add(&mut ui, NUMBER_TYPE_ID, Vec2::ZERO)?;
    let undo_len = ui.history().undo_len();

    ui.execute_command(&CopyNodesCommand {
        nodes: NodeCollection::from_id(a),
    })?;

    assert_eq!(ui.history().undo_len(), undo_len);
    assert!(ui.can_paste());
    assert!(ui.status().need_to_save());

    Ok(())
}

#[test]
fn failed_command_still_occupies_history() -> anyhow::Result<()> {
    let mut ui = session(UpdateMode::Automatic);
    let a = add(&mut ui, NUMBER_TYPE_ID, Vec2::ZERO)?;
    let b = add(&mut ui, NUMBER_TYPE_ID, Vec2::ZERO)?;

    // numbers have no inputs
    let result = ui.execute_command(&ConnectSlotsCommand {
        output: (a, 0).into(),
        input: (b, 0).into(),
    });

    assert!(matches!(
        result,
        Err(CommandError::Graph(GraphError::InputSlotNotFound(_)))
    ));
    assert_eq!(ui.history().undo_len(), 3);

    Ok(())
}

#[test]
fn undo_and_redo_keep_selection_consistent() -> anyhow::Result<()> {
    let mut ui = session(UpdateMode::Automatic);
    let kept = add(&mut ui, NUMBER_TYPE_ID, Vec2::ZERO)?;
    let added = add(&mut ui, VIEWER_TYPE_ID, Vec2::ONE)?;
    ui.set_selection([kept, added].into_iter().collect());

    ui.execute_command(&UndoCommand)?;

    assert!(!ui.node_manager().contains_node(added));
    assert_eq!(ui.selection(), &NodeCollection::from_id(kept));
    assert!(ui.history().can_redo());
    assert!(ui.status().need_to_recalculate());

    ui.execute_command(&RedoCommand)?;
    assert!(ui.node_manager().contains_node(added));
    assert_eq!(ui.node_manager().node(added).unwrap().pos, Vec2::ONE);

    // a new edit after undo drops the redo branch
    ui.execute_command(&UndoCommand)?;
    add(&mut ui, NUMBER_TYPE_ID, Vec2::ZERO)?;
    assert!(!ui.history().can_redo());
    assert!(matches!(
        ui.execute_command(&RedoCommand),
        Err(CommandError::Undo(UndoError::NothingToRedo))
    ));

    Ok(())
}

#[test]
fn manual_mode_waits_for_manual_update() -> anyhow::Result<()> {
    let mut ui = session(UpdateMode::Manual);
    let [a, _, sum, view] = build_sum(&mut ui)?;
    let mut env = RecordingEnv::default();
    let mut drawer = TextDrawer::default();

    assert!(ui.update(&mut env).is_none());
    assert_eq!(env.events, vec!["redraw"]);
    assert_eq!(
        ui.node_manager().node(view).unwrap().status(),
        CalcStatus::NeedToCalculate
    );
    ui.draw(&mut drawer);
    assert_eq!(ui.drawings().stale_node_count(ui.node_manager()), 0);

    // pending nodes get their drawings refreshed on every update
    ui.execute_command(&SetParameterCommand {
        node_id: a,
        index: 0,
        value: Value::Float(10.0),
    })?;
    ui.update(&mut env);
    assert!(ui.drawings().is_node_stale(sum));
    assert!(ui.drawings().is_node_stale(view));

    // the update above consumed the request
    env.events.clear();
    assert!(ui.manual_update(&mut env).is_none());
    assert_eq!(env.events, vec!["redraw"]);

    env.events.clear();
    ui.request_recalculate_and_redraw();
    let stats = ui.manual_update(&mut env).unwrap();
    assert_eq!(stats.evaluated, 4);
    assert_eq!(env.events, vec!["begin", "end", "recalculated", "redraw"]);
    assert_eq!(
        ui.node_manager().output_value((view, 0).into()),
        Some(&Value::Float(14.0))
    );

    Ok(())
}

#[test]
fn disabled_nodes_need_manual_update() -> anyhow::Result<()> {
    let mut ui = session(UpdateMode::Automatic);
    let a = add(&mut ui, NUMBER_TYPE_ID, Vec2::ZERO)?;
    let divide = add(&mut ui, Math2ArgOp::Divide.type_id(), Vec2::ZERO)?;
    ui.execute_command(&ConnectSlotsCommand {
        output: (a, 0).into(),
        input: (divide, 0).into(),
    })?;
    let mut env = RecordingEnv::default();

    let stats = ui.update(&mut env).unwrap();
    assert_eq!(stats.failed, 1);
    assert_eq!(
        ui.node_manager().node(divide).unwrap().status(),
        CalcStatus::NeedToCalculateButDisabled
    );

    let mut drawer = TextDrawer::default();
    ui.draw(&mut drawer);
    assert!(drawer
        .lines
        .iter()
        .any(|line| line.contains("error: Calculation failed: Division by zero")));

    ui.request_recalculate_and_redraw();
    let stats = ui.manual_update(&mut env).unwrap();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.evaluated, 1);

    Ok(())
}

#[test]
fn paste_centers_at_target_and_selects() -> anyhow::Result<()> {
    let mut ui = session(UpdateMode::Automatic);
    let a = add(&mut ui, NUMBER_TYPE_ID, Vec2::new(0.0, 0.0))?;
    let view = add(&mut ui, VIEWER_TYPE_ID, Vec2::new(100.0, 40.0))?;
    ui.execute_command(&ConnectSlotsCommand {
        output: (a, 0).into(),
        input: (view, 0).into(),
    })?;

    let selection: NodeCollection = [a, view].into_iter().collect();
    ui.execute_command(&CopyNodesCommand {
        nodes: selection.clone(),
    })?;
    ui.execute_command(&PasteNodesCommand {
        target: Vec2::new(500.0, 500.0),
    })?;

    let pasted = ui.selection().clone();
    assert_eq!(pasted.len(), 2);
    assert!(pasted.iter().all(|id| !selection.contains(id)));
    assert_eq!(
        centroid(ui.node_manager(), &pasted),
        Some(Vec2::new(500.0, 500.0))
    );
    let pasted_a = pasted.first().unwrap();
    let pasted_view = pasted.last().unwrap();
    assert_eq!(
        ui.node_manager().node(pasted_a).unwrap().pos,
        Vec2::new(450.0, 480.0)
    );
    assert!(ui
        .node_manager()
        .is_connected((pasted_a, 0).into(), (pasted_view, 0).into()));

    // paste is undoable as one step
    ui.execute_command(&UndoCommand)?;
    assert_eq!(ui.node_manager().node_count(), 2);
    assert!(ui.selection().is_empty());

    Ok(())
}

#[test]
fn group_commands_and_drawings() -> anyhow::Result<()> {
    let mut ui = session(UpdateMode::Automatic);
    let a = add(&mut ui, NUMBER_TYPE_ID, Vec2::ZERO)?;
    let b = add(&mut ui, NUMBER_TYPE_ID, Vec2::ZERO)?;
    ui.execute_command(&AddGroupCommand::new(
        "inputs",
        [a, b].into_iter().collect(),
    ))?;
    let group_id = ui.node_manager().node_group(a).unwrap();

    let mut drawer = TextDrawer::default();
    assert_eq!(ui.draw(&mut drawer), 3);
    assert!(!ui.status().need_to_redraw());
    assert!(!ui.drawings().is_group_stale(group_id));

    ui.execute_command(&MoveNodesCommand {
        nodes: NodeCollection::from_id(a),
        offset: Vec2::new(5.0, 5.0),
    })?;
    assert!(ui.drawings().is_group_stale(group_id));
    assert!(!ui.drawings().is_node_stale(b));
    assert_eq!(ui.node_manager().node(a).unwrap().pos, Vec2::new(5.0, 5.0));

    ui.execute_command(&RemoveNodesFromGroupCommand {
        nodes: NodeCollection::from_id(b),
    })?;
    assert_eq!(
        ui.node_manager().group(group_id).unwrap().nodes,
        NodeCollection::from_id(a)
    );

    ui.execute_command(&DeleteGroupCommand { group_id })?;
    assert_eq!(ui.node_manager().group_count(), 0);
    assert_eq!(ui.node_manager().node_count(), 2);

    Ok(())
}

#[test]
fn delete_and_disconnect_commands() -> anyhow::Result<()> {
    let mut ui = session(UpdateMode::Automatic);
    let [a, b, sum, view] = build_sum(&mut ui)?;
    ui.set_selection([a, sum].into_iter().collect());

    ui.execute_command(&DisconnectAllOutputSlotsCommand {
        input: (sum, 0).into(),
    })?;
    assert!(!ui.node_manager().has_input_connection((sum, 0).into()));

    ui.execute_command(&DisconnectAllInputSlotsCommand {
        output: (sum, 0).into(),
    })?;
    assert!(!ui.node_manager().has_connected_input_slots(view));

    ui.execute_command(&DisconnectSlotsCommand {
        output: (b, 0).into(),
        input: (sum, 1).into(),
    })?;
    assert_eq!(ui.node_manager().connection_count(), 0);

    ui.execute_command(&DeleteNodesCommand {
        nodes: [a, sum].into_iter().collect(),
    })?;
    assert_eq!(ui.node_manager().node_count(), 2);
    assert!(ui.selection().is_empty());

    Ok(())
}

#[test]
fn save_and_open_reset_session() -> anyhow::Result<()> {
    let dir = std::env::temp_dir().join(format!("node-editor-session-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("doc.yaml");

    let mut ui = session(UpdateMode::Automatic);
    let [a, ..] = build_sum(&mut ui)?;
    ui.save(&path)?;
    assert!(!ui.status().need_to_save());

    let mut other = session(UpdateMode::Automatic);
    add(&mut other, VIEWER_TYPE_ID, Vec2::ZERO)?;
    other.set_selection(NodeCollection::from_id(last_node(&other)));
    other.open(&path)?;

    assert_eq!(other.node_manager().node_count(), 4);
    assert!(other.node_manager().contains_node(a));
    assert!(other.selection().is_empty());
    assert!(!other.history().can_undo());
    assert!(!other.status().need_to_save());
    assert!(other.status().need_to_recalculate());

    assert!(other.open(&dir.join("missing.yaml")).is_err());
    assert!(other.node_manager().is_empty());

    std::fs::remove_dir_all(&dir)?;
    Ok(())
}
