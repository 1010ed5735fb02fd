use common::output_stream::OutputStream;
use hashbrown::{HashMap, HashSet};
use tracing::{debug, warn};

use crate::node::{CalcStatus, Node, NodeError};
use crate::node_collection::NodeCollection;
use crate::node_lib::NodeLib;
use crate::node_manager::NodeManager;
use crate::slot::{ConnectionMode, NodeId};
use crate::value::Value;

/// Shared state handed to every node calculation of a pass.
#[derive(Debug, Default, Clone)]
pub struct EvaluationContext {
    pub output: OutputStream,
}

impl EvaluationContext {
    pub fn new(output: OutputStream) -> Self {
        Self { output }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EvaluationStats {
    pub evaluated: usize,
    pub failed: usize,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum VisitState {
    Visiting,
    Visited,
}

#[derive(Debug)]
enum VisitCause {
    Enter,
    Done,
}

#[derive(Debug)]
struct Visit {
    node_id: NodeId,
    cause: VisitCause,
}

#[derive(Debug, Default)]
struct EvaluationOrder {
    order: Vec<NodeId>,
    cyclic: NodeCollection,
}

impl NodeManager {
    /// Calculates every node that needs it, upstream first. Failing nodes are
    /// recorded on the node and never abort the pass.
    pub fn evaluate_all_nodes(
        &mut self,
        lib: &NodeLib,
        ctx: &mut EvaluationContext,
    ) -> EvaluationStats {
        let order = self.evaluation_order();
        let mut stats = EvaluationStats::default();

        for node_id in order.order.iter().copied() {
            let Some(node) = self.node(node_id) else {
                continue;
            };
            if node.status != CalcStatus::NeedToCalculate {
                continue;
            }

            let result = if order.cyclic.contains(node_id) {
                Err(NodeError::Cycle)
            } else {
                self.calculate_node(node, lib, ctx)
            };

            match result {
                Ok(outputs) => {
                    stats.evaluated += 1;
                    self.cache.store(node_id, outputs);
                    if let Some(node) = self.nodes.by_key_mut(&node_id) {
                        node.status = CalcStatus::UpToDate;
                        node.error = None;
                    }
                }
                Err(error) => {
                    stats.failed += 1;
                    warn!(%node_id, %error, "node calculation failed");
                    self.fail_node(node_id, error);
                }
            }
        }

        debug!(
            evaluated = stats.evaluated,
            failed = stats.failed,
            "evaluation finished"
        );
        stats
    }

    /// Recalculates every node, including failed ones.
    pub fn force_evaluate_all_nodes(
        &mut self,
        lib: &NodeLib,
        ctx: &mut EvaluationContext,
    ) -> EvaluationStats {
        self.invalidate_all_nodes();
        self.evaluate_all_nodes(lib, ctx)
    }

    fn fail_node(&mut self, node_id: NodeId, error: NodeError) {
        let Some(node) = self.nodes.by_key_mut(&node_id) else {
            return;
        };
        node.status = CalcStatus::NeedToCalculateButDisabled;
        node.error = Some(error);

        let invalid = vec![Value::Invalid; node.outputs.len()];
        self.cache.store(node_id, invalid);
        self.cache.invalidate(node_id);
    }

    fn calculate_node(
        &self,
        node: &Node,
        lib: &NodeLib,
        ctx: &mut EvaluationContext,
    ) -> Result<Vec<Value>, NodeError> {
        let node_type = lib
            .by_id(node.type_id)
            .ok_or(NodeError::UnknownType(node.type_id))?;

        let inputs = self.gather_inputs(node)?;
        let mut outputs = vec![Value::None; node.outputs.len()];
        node_type
            .lambda
            .invoke(ctx, &node.params, &inputs, &mut outputs)
            .map_err(|err| NodeError::Calculation(err.to_string()))?;

        Ok(outputs)
    }

    fn gather_inputs(&self, node: &Node) -> Result<Vec<Value>, NodeError> {
        let mut inputs = Vec::with_capacity(node.inputs.len());

        for (slot, input) in node.inputs.iter().zip(node.input_refs()) {
            let upstream = self.connections.connected_outputs(input);
            let convert = |value: Value| {
                value
                    .convert_type(slot.data_type)
                    .ok_or(NodeError::InputConversion {
                        slot: slot.id,
                        expected: slot.data_type,
                    })
            };

            let value = if upstream.is_empty() {
                slot.default_value.clone().unwrap_or_default()
            } else if slot.mode == ConnectionMode::Multiple {
                let values = upstream
                    .iter()
                    .map(|output| convert(self.upstream_value(output.node_id, output.slot_id.0)))
                    .collect::<Result<Vec<_>, _>>()?;
                Value::List(values)
            } else {
                let output = upstream[0];
                convert(self.upstream_value(output.node_id, output.slot_id.0))?
            };

            inputs.push(value);
        }

        Ok(inputs)
    }

    // stale values of a failed or cyclic node are its `Invalid` outputs
    fn upstream_value(&self, node_id: NodeId, slot: u32) -> Value {
        self.cache
            .get_stale(node_id)
            .and_then(|values| values.get(slot as usize))
            .cloned()
            .unwrap_or(Value::Invalid)
    }

    /// Post-order over input edges, so every node follows its upstream. Nodes
    /// on a cycle are collected separately and keep their place in the order.
    fn evaluation_order(&self) -> EvaluationOrder {
        let mut order: Vec<NodeId> = Vec::with_capacity(self.node_count());
        let mut states: HashMap<NodeId, VisitState> = HashMap::with_capacity(self.node_count());
        let mut stack: Vec<Visit> = Vec::new();

        for root in self.nodes.keys() {
            if states.contains_key(&root) {
                continue;
            }
            stack.push(Visit {
                node_id: root,
                cause: VisitCause::Enter,
            });

            while let Some(visit) = stack.pop() {
                if let VisitCause::Done = visit.cause {
                    states.insert(visit.node_id, VisitState::Visited);
                    order.push(visit.node_id);
                    continue;
                }
                if states.contains_key(&visit.node_id) {
                    continue;
                }

                states.insert(visit.node_id, VisitState::Visiting);
                stack.push(Visit {
                    node_id: visit.node_id,
                    cause: VisitCause::Done,
                });

                for upstream in self.input_nodes(visit.node_id).iter().rev() {
                    stack.push(Visit {
                        node_id: upstream,
                        cause: VisitCause::Enter,
                    });
                }
            }
        }

        let cyclic = self.cyclic_nodes(&order);
        EvaluationOrder { order, cyclic }
    }

    /// Members of every strongly connected component larger than one node.
    /// Second Kosaraju pass: `finish_order` comes from the walk over input
    /// edges, so components are grown along dependent edges in reverse.
    fn cyclic_nodes(&self, finish_order: &[NodeId]) -> NodeCollection {
        let mut assigned: HashSet<NodeId> = HashSet::with_capacity(finish_order.len());
        let mut cyclic = NodeCollection::new();

        for root in finish_order.iter().rev().copied() {
            if !assigned.insert(root) {
                continue;
            }

            let mut component = vec![root];
            let mut stack = vec![root];
            while let Some(node_id) = stack.pop() {
                for dependent in self.dependent_nodes(node_id).iter() {
                    if assigned.insert(dependent) {
                        component.push(dependent);
                        stack.push(dependent);
                    }
                }
            }

            // self-connections are rejected, so a single node is never a cycle
            if component.len() > 1 {
                cyclic.extend(component);
            }
        }

        cyclic
    }
}
