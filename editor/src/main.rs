use std::path::Path;

use anyhow::Result;
use editor::commands::*;
use editor::config::EditorConfig;
use editor::env::{LoggingEnv, TextDrawer};
use editor::ui_manager::NodeUiManager;
use glam::Vec2;
use graph::elements::basic_lib::{Math2ArgOp, NUMBER_TYPE_ID, VIEWER_TYPE_ID};
use graph::prelude::*;
use tracing::{info, warn};

fn main() -> Result<()> {
    let config = EditorConfig::load_or_default(Path::new("editor.yaml"));
    if let Err(err) = common::log_setup::setup_logging(&config.log_level, Path::new("logs")) {
        eprintln!("logging disabled: {err}");
    }

    let mut ui = NodeUiManager::new(BasicLib::node_lib(), &config);
    let mut env = LoggingEnv::default();

    let [a, b, _, view] = build_demo_graph(&mut ui)?;
    ui.update(&mut env);
    print_drawing(&mut ui);

    for line in env.ctx.output.take() {
        println!("> {line}");
    }

    ui.execute_command(&SetParameterCommand {
        node_id: b,
        index: 0,
        value: Value::Float(38.0),
    })?;
    ui.update(&mut env);
    info!(
        result = ?ui.node_manager().output_value((view, 0).into()),
        "after parameter change"
    );

    ui.execute_command(&UndoCommand)?;
    ui.update(&mut env);
    info!(
        result = ?ui.node_manager().output_value((view, 0).into()),
        "after undo"
    );

    ui.execute_command(&RedoCommand)?;
    ui.execute_command(&CopyNodesCommand {
        nodes: [a, b].into_iter().collect(),
    })?;
    ui.execute_command(&PasteNodesCommand {
        target: Vec2::new(0.0, 300.0),
    })?;
    ui.update(&mut env);
    print_drawing(&mut ui);

    if let Err(err) = ui.save(Path::new("demo_graph.yaml")) {
        warn!(%err, "failed to save demo graph");
    }

    Ok(())
}

/// number(2) and number(40) feed an adder whose result goes to a viewer.
fn build_demo_graph(ui: &mut NodeUiManager) -> Result<[NodeId; 4]> {
    let mut add = |type_id: NodeTypeId, pos: Vec2| -> Result<NodeId> {
        ui.execute_command(&AddNodeCommand { type_id, pos })?;
        ui.node_manager()
            .nodes()
            .last()
            .map(|node| node.id)
            .ok_or_else(|| anyhow::anyhow!("node was not added"))
    };

    let a = add(NUMBER_TYPE_ID, Vec2::new(0.0, 0.0))?;
    let b = add(NUMBER_TYPE_ID, Vec2::new(0.0, 120.0))?;
    let sum = add(Math2ArgOp::Add.type_id(), Vec2::new(220.0, 60.0))?;
    let view = add(VIEWER_TYPE_ID, Vec2::new(440.0, 60.0))?;

    for (node_id, value) in [(a, 2.0), (b, 40.0)] {
        ui.execute_command(&SetParameterCommand {
            node_id,
            index: 0,
            value: Value::Float(value),
        })?;
    }
    for (output, input) in [((a, 0), (sum, 0)), ((b, 0), (sum, 1)), ((sum, 0), (view, 0))] {
        ui.execute_command(&ConnectSlotsCommand {
            output: output.into(),
            input: input.into(),
        })?;
    }
    ui.execute_command(&AddGroupCommand::new(
        "inputs",
        [a, b].into_iter().collect(),
    ))?;

    Ok([a, b, sum, view])
}

fn print_drawing(ui: &mut NodeUiManager) {
    let mut drawer = TextDrawer::default();
    ui.draw(&mut drawer);
    for line in drawer.lines {
        println!("{line}");
    }
}
