use graph::prelude::{EvaluationContext, EvaluationStats, Node, NodeGroup, Value};
use tracing::info;

/// Host side of an update: owns the evaluation context and hears about the
/// phases of `NodeUiManager::update`.
pub trait EvaluationEnv {
    fn context(&mut self) -> &mut EvaluationContext;

    fn on_evaluation_begin(&mut self) {}
    fn on_evaluation_end(&mut self, _stats: &EvaluationStats) {}
    fn on_values_recalculated(&mut self) {}
    fn on_redraw_requested(&mut self) {}
}

/// Receives the nodes and groups whose drawings are stale.
pub trait NodeDrawer {
    fn draw_group(&mut self, group: &NodeGroup);
    fn draw_node(&mut self, node: &Node, values: Option<&[Value]>, selected: bool);
}

/// Environment that only logs, for headless use.
#[derive(Debug, Default)]
pub struct LoggingEnv {
    pub ctx: EvaluationContext,
    pub last_stats: Option<EvaluationStats>,
}

impl EvaluationEnv for LoggingEnv {
    fn context(&mut self) -> &mut EvaluationContext {
        &mut self.ctx
    }

    fn on_evaluation_end(&mut self, stats: &EvaluationStats) {
        info!(
            evaluated = stats.evaluated,
            failed = stats.failed,
            "evaluation pass"
        );
        self.last_stats = Some(*stats);
    }
}

/// Drawer that renders each node as one line of text.
#[derive(Debug, Default)]
pub struct TextDrawer {
    pub lines: Vec<String>,
}

impl NodeDrawer for TextDrawer {
    fn draw_group(&mut self, group: &NodeGroup) {
        self.lines
            .push(format!("[{}] {} ({} nodes)", group.id, group.name, group.nodes.len()));
    }

    fn draw_node(&mut self, node: &Node, values: Option<&[Value]>, selected: bool) {
        let marker = if selected { "*" } else { " " };
        let values = match values {
            Some(values) => values
                .iter()
                .map(|value| value.to_string())
                .collect::<Vec<_>>()
                .join(", "),
            None => match node.error() {
                Some(error) => format!("error: {error}"),
                None => "-".to_string(),
            },
        };
        self.lines.push(format!(
            "{marker}{} {} @ ({}, {}) = {values}",
            node.id, node.name, node.pos.x, node.pos.y
        ));
    }
}
