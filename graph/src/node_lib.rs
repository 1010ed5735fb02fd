use std::fmt;
use std::sync::Arc;

use common::id_type;
use hashbrown::hash_map::{Entry, Values};
use hashbrown::HashMap;

use crate::evaluation::EvaluationContext;
use crate::node::Node;
use crate::slot::ConnectionMode;
use crate::value::{DataType, Value};

id_type!(NodeTypeId);

/// Calculation entry point of a node type: `(ctx, params, inputs, outputs)`.
/// `outputs` arrives filled with `Value::None`, one per output slot.
pub trait NodeLambdaFn:
    Fn(&mut EvaluationContext, &[Value], &[Value], &mut [Value]) -> anyhow::Result<()>
    + Send
    + Sync
    + 'static
{
}

impl<T> NodeLambdaFn for T where
    T: Fn(&mut EvaluationContext, &[Value], &[Value], &mut [Value]) -> anyhow::Result<()>
        + Send
        + Sync
        + 'static
{
}

#[derive(Clone, Default)]
pub enum NodeLambda {
    #[default]
    None,
    Lambda(Arc<dyn NodeLambdaFn>),
}

impl NodeLambda {
    pub fn new<F>(lambda: F) -> Self
    where
        F: Fn(&mut EvaluationContext, &[Value], &[Value], &mut [Value]) -> anyhow::Result<()>
            + Send
            + Sync
            + 'static,
    {
        NodeLambda::Lambda(Arc::new(lambda))
    }

    pub fn invoke(
        &self,
        ctx: &mut EvaluationContext,
        params: &[Value],
        inputs: &[Value],
        outputs: &mut [Value],
    ) -> anyhow::Result<()> {
        match self {
            NodeLambda::None => Err(anyhow::anyhow!("Node type has no calculation")),
            NodeLambda::Lambda(inner) => (inner)(ctx, params, inputs, outputs),
        }
    }
}

impl fmt::Debug for NodeLambda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeLambda::None => write!(f, "NodeLambda::None"),
            NodeLambda::Lambda(_) => write!(f, "NodeLambda::Lambda"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct InputInfo {
    pub name: String,
    pub data_type: DataType,
    pub mode: ConnectionMode,
    pub default_value: Option<Value>,
}

#[derive(Clone, Debug)]
pub struct OutputInfo {
    pub name: String,
    pub data_type: DataType,
    pub mode: ConnectionMode,
}

#[derive(Clone, Debug)]
pub struct ParamInfo {
    pub name: String,
    pub default_value: Value,
}

#[derive(Clone, Debug, Default)]
pub struct NodeType {
    pub id: NodeTypeId,
    pub name: String,
    pub category: String,
    pub inputs: Vec<InputInfo>,
    pub outputs: Vec<OutputInfo>,
    pub params: Vec<ParamInfo>,
    pub lambda: NodeLambda,
}

/// Registry of node types, keyed by the type tag stored on every node.
#[derive(Clone, Debug, Default)]
pub struct NodeLib {
    types: HashMap<NodeTypeId, NodeType>,
}

impl InputInfo {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            mode: ConnectionMode::Single,
            default_value: None,
        }
    }

    pub fn with_mode(mut self, mode: ConnectionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

impl OutputInfo {
    pub fn new(name: &str, data_type: DataType) -> Self {
        Self {
            name: name.to_string(),
            data_type,
            mode: ConnectionMode::Multiple,
        }
    }
}

impl ParamInfo {
    pub fn new(name: &str, default_value: impl Into<Value>) -> Self {
        Self {
            name: name.to_string(),
            default_value: default_value.into(),
        }
    }
}

impl NodeType {
    pub fn input_index(&self, name: &str) -> Option<usize> {
        self.inputs.iter().position(|input| input.name == name)
    }

    pub fn output_index(&self, name: &str) -> Option<usize> {
        self.outputs.iter().position(|output| output.name == name)
    }
}

impl NodeLib {
    /// Returns false if a type with the same id is already registered.
    pub fn add(&mut self, node_type: NodeType) -> bool {
        match self.types.entry(node_type.id) {
            Entry::Occupied(_) => false,
            Entry::Vacant(entry) => {
                entry.insert(node_type);
                true
            }
        }
    }

    pub fn merge(&mut self, other: NodeLib) {
        for (_id, node_type) in other.types {
            self.add(node_type);
        }
    }

    pub fn by_id(&self, id: NodeTypeId) -> Option<&NodeType> {
        self.types.get(&id)
    }

    pub fn by_name(&self, name: &str) -> Option<&NodeType> {
        self.types.values().find(|node_type| node_type.name == name)
    }

    pub fn contains(&self, id: NodeTypeId) -> bool {
        self.types.contains_key(&id)
    }

    /// Builds an unregistered node (invalid id) for the type.
    pub fn create_node(&self, id: NodeTypeId) -> Option<Node> {
        self.by_id(id).map(Node::from_type)
    }

    pub fn create_node_by_name(&self, name: &str) -> Option<Node> {
        self.by_name(name).map(Node::from_type)
    }

    pub fn iter(&self) -> Values<'_, NodeTypeId, NodeType> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl<It> From<It> for NodeLib
where
    It: IntoIterator<Item = NodeType>,
{
    fn from(iter: It) -> Self {
        let mut lib = NodeLib::default();
        for node_type in iter {
            lib.add(node_type);
        }
        lib
    }
}
