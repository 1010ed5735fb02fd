use anyhow::{anyhow, bail};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tracing::info;

use crate::node_lib::{
    InputInfo, NodeLambda, NodeLib, NodeType, NodeTypeId, OutputInfo, ParamInfo,
};
use crate::slot::ConnectionMode;
use crate::value::{DataType, Value};

pub const NUMBER_TYPE_ID: NodeTypeId = NodeTypeId::from_u128(0x01896910_0790_ad1b_aa12_3f1437196789);
pub const SUM_TYPE_ID: NodeTypeId = NodeTypeId::from_u128(0x01896a88_bf15_dead_4a15_5969da5a9e65);
pub const VIEWER_TYPE_ID: NodeTypeId = NodeTypeId::from_u128(0x01896c2e_59a4_4c44_8f2b_1e0c6a5f7d31);

#[derive(Debug, Display, EnumIter, Copy, Clone, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum Math2ArgOp {
    Add,
    Subtract,
    Multiply,
    Divide,
}

impl Math2ArgOp {
    pub fn type_id(&self) -> NodeTypeId {
        let base: u128 = 0x01896910_4bc9_77aa_6973_64cc1c56b900;
        NodeTypeId::from_u128(base + *self as u128)
    }

    fn apply(&self, a: f64, b: f64) -> anyhow::Result<f64> {
        Ok(match self {
            Math2ArgOp::Add => a + b,
            Math2ArgOp::Subtract => a - b,
            Math2ArgOp::Multiply => a * b,
            Math2ArgOp::Divide => {
                if b == 0.0 {
                    bail!("Division by zero");
                }
                a / b
            }
        })
    }

    fn node_type(self) -> NodeType {
        NodeType {
            id: self.type_id(),
            name: self.to_string(),
            category: "math".to_string(),
            inputs: vec![
                InputInfo::new("a", DataType::Float).with_default(0.0),
                InputInfo::new("b", DataType::Float).with_default(0.0),
            ],
            outputs: vec![OutputInfo::new("result", DataType::Float)],
            lambda: NodeLambda::new(move |_, _, inputs, outputs| {
                let [a, b] = inputs else {
                    bail!("Expected 2 inputs, got {}", inputs.len());
                };
                let a = float_input(a, "a")?;
                let b = float_input(b, "b")?;
                set_output(outputs, Value::Float(self.apply(a, b)?))
            }),
            ..Default::default()
        }
    }
}

fn set_output(outputs: &mut [Value], value: Value) -> anyhow::Result<()> {
    let output = outputs
        .first_mut()
        .ok_or_else(|| anyhow!("Node has no output slot"))?;
    *output = value;
    Ok(())
}

fn first_input(inputs: &[Value]) -> anyhow::Result<&Value> {
    inputs
        .first()
        .ok_or_else(|| anyhow!("Node has no input slot"))
}

fn float_input(value: &Value, name: &str) -> anyhow::Result<f64> {
    if value.is_invalid() {
        bail!("Input '{name}' is invalid");
    }
    value
        .as_float()
        .ok_or_else(|| anyhow!("Input '{name}' has no numeric value"))
}

/// Small arithmetic library used by the editor demo and tests.
#[derive(Debug)]
pub struct BasicLib;

impl BasicLib {
    pub fn node_lib() -> NodeLib {
        let mut lib = NodeLib::default();

        // constant number, taken from the first parameter
        lib.add(NodeType {
            id: NUMBER_TYPE_ID,
            name: "number".to_string(),
            category: "math".to_string(),
            outputs: vec![OutputInfo::new("value", DataType::Float)],
            params: vec![ParamInfo::new("value", 0.0)],
            lambda: NodeLambda::new(|_, params, _, outputs| {
                let value = params
                    .first()
                    .ok_or_else(|| anyhow!("Missing parameter 'value'"))?
                    .clone()
                    .convert_type(DataType::Float)
                    .ok_or_else(|| anyhow!("Parameter is not a number"))?;
                set_output(outputs, value)
            }),
            ..Default::default()
        });

        for op in Math2ArgOp::iter() {
            lib.add(op.node_type());
        }

        lib.add(NodeType {
            id: SUM_TYPE_ID,
            name: "sum".to_string(),
            category: "math".to_string(),
            inputs: vec![
                InputInfo::new("values", DataType::Float).with_mode(ConnectionMode::Multiple)
            ],
            outputs: vec![OutputInfo::new("result", DataType::Float)],
            lambda: NodeLambda::new(|_, _, inputs, outputs| {
                let total = match first_input(inputs)? {
                    Value::List(values) => values
                        .iter()
                        .map(|value| float_input(value, "values"))
                        .sum::<anyhow::Result<f64>>()?,
                    Value::None => 0.0,
                    other => float_input(other, "values")?,
                };
                set_output(outputs, Value::Float(total))
            }),
            ..Default::default()
        });

        // prints its input and passes it through
        lib.add(NodeType {
            id: VIEWER_TYPE_ID,
            name: "viewer".to_string(),
            category: "output".to_string(),
            inputs: vec![InputInfo::new("value", DataType::Any)],
            outputs: vec![OutputInfo::new("value", DataType::Any)],
            lambda: NodeLambda::new(|ctx, _, inputs, outputs| {
                let value = first_input(inputs)?;
                let text = value.to_string();
                info!(value = %text, "viewer");
                ctx.output.write(text);
                set_output(outputs, value.clone())
            }),
            ..Default::default()
        });

        lib
    }
}
