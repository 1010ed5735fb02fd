use common::key_index_vec::{KeyIndexKey, KeyIndexVec};
use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::slot::{InputSlotRef, NodeId, OutputSlotRef};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    #[error("Slots {output} and {input} are already connected")]
    AlreadyConnected {
        output: OutputSlotRef,
        input: InputSlotRef,
    },
    #[error("Input slot {input} accepts at most {max} connection(s)")]
    InputSlotFull { input: InputSlotRef, max: usize },
    #[error("Output slot {output} accepts at most {max} connection(s)")]
    OutputSlotFull { output: OutputSlotRef, max: usize },
    #[error("Slots {output} and {input} are not connected")]
    NotConnected {
        output: OutputSlotRef,
        input: InputSlotRef,
    },
}

pub type ConnectionResult<T> = std::result::Result<T, ConnectionError>;

#[derive(Clone, Copy, Default, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub output: OutputSlotRef,
    pub input: InputSlotRef,
}

impl KeyIndexKey<Connection> for Connection {
    fn key(&self) -> &Connection {
        self
    }
}

impl Connection {
    pub fn new(output: OutputSlotRef, input: InputSlotRef) -> Self {
        Self { output, input }
    }

    pub fn touches(&self, node_id: NodeId) -> bool {
        self.output.node_id == node_id || self.input.node_id == node_id
    }
}

/// Edge table between output and input slots.
///
/// Knows nothing about nodes: callers validate that both endpoints exist and
/// supply the slot limits. Enumeration order is insertion order.
#[derive(Clone, Default, Debug)]
pub struct ConnectionManager {
    edges: KeyIndexVec<Connection, Connection>,
    inputs_by_output: HashMap<OutputSlotRef, Vec<InputSlotRef>>,
    outputs_by_input: HashMap<InputSlotRef, Vec<OutputSlotRef>>,
}

impl ConnectionManager {
    pub fn connect(
        &mut self,
        output: OutputSlotRef,
        input: InputSlotRef,
        max_fan_in: usize,
        max_fan_out: usize,
    ) -> ConnectionResult<()> {
        self.can_connect(output, input, max_fan_in, max_fan_out)?;

        self.edges.push(Connection::new(output, input));
        self.inputs_by_output.entry(output).or_default().push(input);
        self.outputs_by_input.entry(input).or_default().push(output);

        Ok(())
    }

    pub fn can_connect(
        &self,
        output: OutputSlotRef,
        input: InputSlotRef,
        max_fan_in: usize,
        max_fan_out: usize,
    ) -> ConnectionResult<()> {
        if self.is_connected(output, input) {
            return Err(ConnectionError::AlreadyConnected { output, input });
        }
        if self.connected_outputs(input).len() >= max_fan_in {
            return Err(ConnectionError::InputSlotFull {
                input,
                max: max_fan_in,
            });
        }
        if self.connected_inputs(output).len() >= max_fan_out {
            return Err(ConnectionError::OutputSlotFull {
                output,
                max: max_fan_out,
            });
        }

        Ok(())
    }

    pub fn disconnect(&mut self, output: OutputSlotRef, input: InputSlotRef) -> ConnectionResult<()> {
        if self
            .edges
            .remove_by_key(&Connection::new(output, input))
            .is_none()
        {
            return Err(ConnectionError::NotConnected { output, input });
        }
        self.unlink(output, input);

        Ok(())
    }

    /// Removes every edge feeding `input`.
    pub fn disconnect_all_from_input(&mut self, input: InputSlotRef) -> Vec<Connection> {
        self.remove_where(|connection| connection.input == input)
    }

    /// Removes every edge leaving `output`.
    pub fn disconnect_all_from_output(&mut self, output: OutputSlotRef) -> Vec<Connection> {
        self.remove_where(|connection| connection.output == output)
    }

    /// Removes every edge with either endpoint on `node_id`.
    pub fn disconnect_node(&mut self, node_id: NodeId) -> Vec<Connection> {
        self.remove_where(|connection| connection.touches(node_id))
    }

    pub fn is_connected(&self, output: OutputSlotRef, input: InputSlotRef) -> bool {
        self.edges.contains_key(&Connection::new(output, input))
    }

    pub fn has_input_connection(&self, input: InputSlotRef) -> bool {
        !self.connected_outputs(input).is_empty()
    }

    pub fn has_output_connection(&self, output: OutputSlotRef) -> bool {
        !self.connected_inputs(output).is_empty()
    }

    /// Input slots fed by `output`, in connection order.
    pub fn connected_inputs(&self, output: OutputSlotRef) -> &[InputSlotRef] {
        self.inputs_by_output
            .get(&output)
            .map_or(&[], |inputs| inputs.as_slice())
    }

    /// Output slots feeding `input`, in connection order.
    pub fn connected_outputs(&self, input: InputSlotRef) -> &[OutputSlotRef] {
        self.outputs_by_input
            .get(&input)
            .map_or(&[], |outputs| outputs.as_slice())
    }

    pub fn connections(&self) -> impl Iterator<Item = &Connection> + '_ {
        self.edges.iter()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn clear(&mut self) {
        self.edges.clear();
        self.inputs_by_output.clear();
        self.outputs_by_input.clear();
    }

    fn remove_where(&mut self, predicate: impl Fn(&Connection) -> bool) -> Vec<Connection> {
        let removed = self.edges.retain(|connection| !predicate(connection));
        for connection in removed.iter() {
            self.unlink(connection.output, connection.input);
        }
        removed
    }

    fn unlink(&mut self, output: OutputSlotRef, input: InputSlotRef) {
        if let Some(inputs) = self.inputs_by_output.get_mut(&output) {
            inputs.retain(|slot| *slot != input);
            if inputs.is_empty() {
                self.inputs_by_output.remove(&output);
            }
        }
        if let Some(outputs) = self.outputs_by_input.get_mut(&input) {
            outputs.retain(|slot| *slot != output);
            if outputs.is_empty() {
                self.outputs_by_input.remove(&input);
            }
        }
    }
}
