use common::FileFormat;
use glam::Vec2;

use crate::document::{GraphDocument, StreamError, GRAPH_FORMAT_VERSION};
use crate::elements::basic_lib::BasicLib;
use crate::evaluation::EvaluationContext;
use crate::group::{Color, NodeGroup};
use crate::node::CalcStatus;
use crate::node_collection::NodeCollection;
use crate::node_lib::NodeLib;
use crate::node_manager::{GraphError, NodeManager};
use crate::slot::{NodeId, SlotId};
use crate::value::Value;

struct Sample {
    manager: NodeManager,
    a: NodeId,
    b: NodeId,
    add: NodeId,
    view: NodeId,
}

fn sample(lib: &NodeLib) -> anyhow::Result<Sample> {
    let mut manager = NodeManager::new();
    let a = manager.add_node(
        lib.create_node_by_name("number")
            .unwrap()
            .with_param(0, 1.5)
            .with_pos(Vec2::new(0.0, 0.0)),
    )?;
    let b = manager.add_node(
        lib.create_node_by_name("number")
            .unwrap()
            .with_param(0, 2.0)
            .with_pos(Vec2::new(0.0, 80.0)),
    )?;
    let add = manager.add_node(
        lib.create_node_by_name("add")
            .unwrap()
            .with_pos(Vec2::new(160.0, 40.0)),
    )?;
    let view = manager.add_node(lib.create_node_by_name("viewer").unwrap())?;
    manager.connect((a, 0).into(), (add, 0).into())?;
    manager.connect((b, 0).into(), (add, 1).into())?;
    manager.connect((add, 0).into(), (view, 0).into())?;

    let mut group = NodeGroup::new("inputs").with_color(Color { r: 1, g: 2, b: 3 });
    group.nodes.extend([a, b]);
    manager.add_group(group)?;

    Ok(Sample {
        manager,
        a,
        b,
        add,
        view,
    })
}

#[test]
fn write_read_restores_everything() -> anyhow::Result<()> {
    let lib = BasicLib::node_lib();

    for format in [FileFormat::Json, FileFormat::Yaml] {
        let Sample {
            manager,
            a,
            b,
            add,
            view,
        } = sample(&lib)?;
        let serialized = manager.write(format)?;

        let mut restored = NodeManager::new();
        restored.read(&serialized, format, &lib)?;

        assert_eq!(restored.node_ids(), [a, b, add, view].into_iter().collect());
        assert_eq!(restored.to_document(), manager.to_document());
        assert_eq!(
            restored.connections().collect::<Vec<_>>(),
            manager.connections().collect::<Vec<_>>()
        );
        assert_eq!(restored.node(add).unwrap().pos, Vec2::new(160.0, 40.0));
        assert!(restored
            .nodes()
            .all(|node| node.status() == CalcStatus::NeedToCalculate));

        let group = restored.groups().next().unwrap();
        assert_eq!(group.name, "inputs");
        assert_eq!(group.color, Color { r: 1, g: 2, b: 3 });
        assert_eq!(group.nodes, [a, b].into_iter().collect());

        // writing again yields the same text
        assert_eq!(restored.write(format)?, serialized);
    }

    Ok(())
}

#[test]
fn read_replaces_previous_content() -> anyhow::Result<()> {
    let lib = BasicLib::node_lib();
    let Sample { manager, view, .. } = sample(&lib)?;
    let serialized = manager.write(FileFormat::Json)?;

    let mut target = NodeManager::new();
    for _ in 0..6 {
        target.add_node(lib.create_node_by_name("sum").unwrap())?;
    }
    target.read(&serialized, FileFormat::Json, &lib)?;

    assert_eq!(target.node_count(), 4);
    assert_eq!(target.connection_count(), 3);

    // ids handed out before the read are still never reused
    let fresh = target.add_node(lib.create_node_by_name("number").unwrap())?;
    assert!(fresh > view);
    assert!(fresh.as_u64() > 6);

    Ok(())
}

#[test]
fn evaluated_after_read() -> anyhow::Result<()> {
    let lib = BasicLib::node_lib();
    let Sample { manager, view, .. } = sample(&lib)?;
    let serialized = manager.write(FileFormat::Yaml)?;

    let mut restored = NodeManager::new();
    restored.read(&serialized, FileFormat::Yaml, &lib)?;
    let mut ctx = EvaluationContext::default();
    restored.evaluate_all_nodes(&lib, &mut ctx);

    assert_eq!(
        restored.output_value((view, 0).into()),
        Some(&Value::Float(3.5))
    );
    assert_eq!(ctx.output.take(), vec!["3.5"]);

    Ok(())
}

#[test]
fn save_and_open_file() -> anyhow::Result<()> {
    let lib = BasicLib::node_lib();
    let Sample { manager, .. } = sample(&lib)?;
    let dir = std::env::temp_dir().join(format!("node-graph-test-{}", std::process::id()));
    std::fs::create_dir_all(&dir)?;

    for name in ["graph.json", "graph.yaml"] {
        let path = dir.join(name);
        manager.save_to_file(&path)?;

        let mut opened = NodeManager::new();
        opened.open_file(&path, &lib)?;
        assert_eq!(opened.to_document(), manager.to_document());
    }

    let bad = dir.join("graph.txt");
    assert!(manager.save_to_file(&bad).is_err());
    std::fs::remove_dir_all(&dir)?;

    Ok(())
}

#[test]
fn document_carries_version_and_generators() -> anyhow::Result<()> {
    let lib = BasicLib::node_lib();
    let Sample { manager, view, .. } = sample(&lib)?;
    let document = manager.to_document();

    assert_eq!(document.version, GRAPH_FORMAT_VERSION);
    assert_eq!(document.next_node_id, view.as_u64() + 1);
    assert_eq!(document.nodes.len(), 4);
    assert_eq!(document.connections.len(), 3);
    assert_eq!(document.groups.len(), 1);

    Ok(())
}

#[test]
fn disconnect_all_invalidates_targets() -> anyhow::Result<()> {
    let lib = BasicLib::node_lib();
    let Sample {
        mut manager,
        a,
        add,
        view,
        ..
    } = sample(&lib)?;
    let mut ctx = EvaluationContext::default();
    manager.evaluate_all_nodes(&lib, &mut ctx);

    let extra = manager.add_node(lib.create_node_by_name("viewer").unwrap())?;
    manager.connect((add, 0).into(), (extra, 0).into())?;
    manager.evaluate_all_nodes(&lib, &mut ctx);

    let removed = manager.disconnect_all_from_output((add, 0).into())?;
    assert_eq!(removed.len(), 2);
    assert_eq!(manager.node(view).unwrap().status(), CalcStatus::NeedToCalculate);
    assert_eq!(manager.node(extra).unwrap().status(), CalcStatus::NeedToCalculate);
    assert_eq!(manager.node(a).unwrap().status(), CalcStatus::UpToDate);

    let removed = manager.disconnect_all_from_input((add, 0).into())?;
    assert_eq!(removed.len(), 1);
    assert!(!manager.has_output_connection((a, 0).into()));
    assert_eq!(manager.dependent_nodes(a), NodeCollection::new());

    Ok(())
}

#[test]
fn node_not_matching_its_type_is_rejected() -> anyhow::Result<()> {
    let lib = BasicLib::node_lib();
    let Sample { manager, a, add, .. } = sample(&lib)?;

    let edits: [(NodeId, fn(&mut crate::node::Node)); 3] = [
        (a, |node| node.params.clear()),
        (add, |node| node.inputs.clear()),
        (add, |node| node.outputs[0].id = SlotId(3)),
    ];
    for (node_id, edit) in edits {
        let mut document: GraphDocument = manager.to_document();
        let node = document
            .nodes
            .iter_mut()
            .find(|node| node.id == node_id)
            .unwrap();
        edit(node);
        let serialized = common::serialize(&document, FileFormat::Json)?;

        let mut target = NodeManager::new();
        let err = target
            .read(&serialized, FileFormat::Json, &lib)
            .unwrap_err();

        assert!(matches!(
            err,
            StreamError::InvalidGraph(GraphError::NodeLayoutMismatch(id)) if id == node_id
        ));
        assert!(err.is_invalid_graph());
        assert!(target.is_empty());
    }

    Ok(())
}
