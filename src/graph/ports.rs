//! # Port Layout
//!
//! Fixed slot indices per node kind. Link type checking, validation and the
//! code generator all read port numbers from here.
//!
//! | Kind | Inputs | Outputs |
//! |---|---|---|
//! | Start | | 0 flow, 1+i argument i |
//! | Argument | | 0 value |
//! | Variable | | any port |
//! | Let | 0 flow, 2 value | 1 flow |
//! | End | 0 flow, 1 return value | |
//! | Operation / Condition | 0 left, 1 right | 1 result |
//! | Control | 0 flow, 1 condition | 2 then, 3 continue (if) or else (if-else) |
//! | Goto | 0 flow | 1 target |
//! | Function | arg i at base+i | result after the args |
//! | Process | 0 flow, 2+i argument i | 1 flow, 2+n result |

use super::function::{FunctionRecord, Functions};
use super::link::Connector;
use super::node::{End, Node, NodeData, Port};
use super::types::ValueType;

pub const FLOW_IN: Port = 0;
pub const FLOW_OUT: Port = 1;
pub const START_FLOW_OUT: Port = 0;
pub const START_FIRST_ARG: Port = 1;
pub const LET_VALUE_IN: Port = 2;
pub const END_VALUE_IN: Port = 1;
pub const LEFT_OPERAND_IN: Port = 0;
pub const RIGHT_OPERAND_IN: Port = 1;
pub const RESULT_OUT: Port = 1;
pub const CONDITION_IN: Port = 1;
pub const THEN_OUT: Port = 2;
pub const ELSE_OUT: Port = 3;
pub const PROCESS_FIRST_ARG: Port = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PortSpec {
    pub port: Port,
    pub connector: Connector,
    /// Must be linked for the node to compile to something meaningful.
    pub required: bool,
}

impl PortSpec {
    fn flow(port: Port) -> Self {
        Self { port, connector: Connector::Flow, required: false }
    }

    fn value(port: Port, value_type: ValueType) -> Self {
        Self { port, connector: Connector::value(value_type), required: false }
    }

    fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortLayout {
    pub inputs: Vec<PortSpec>,
    pub outputs: Vec<PortSpec>,
    /// Connector accepted on input ports not listed in `inputs`.
    pub any_input: Option<Connector>,
    /// Connector offered on output ports not listed in `outputs`.
    pub any_output: Option<Connector>,
}

impl PortLayout {
    pub fn input(&self, port: Port) -> Option<Connector> {
        self.inputs
            .iter()
            .find(|spec| spec.port == port)
            .map(|spec| spec.connector)
            .or(self.any_input)
    }

    pub fn output(&self, port: Port) -> Option<Connector> {
        self.outputs
            .iter()
            .find(|spec| spec.port == port)
            .map(|spec| spec.connector)
            .or(self.any_output)
    }

    pub fn required_inputs(&self) -> impl Iterator<Item = &PortSpec> {
        self.inputs.iter().filter(|spec| spec.required)
    }

    pub fn required_outputs(&self) -> impl Iterator<Item = &PortSpec> {
        self.outputs.iter().filter(|spec| spec.required)
    }
}

/// Layout of `node` inside `function`.
///
/// `functions` resolves Process callees; without it a Process node accepts
/// any value port.
pub fn port_layout(node: &Node, function: &FunctionRecord, functions: Option<&Functions>) -> PortLayout {
    let mut layout = PortLayout::default();

    match &node.data {
        NodeData::Start => {
            layout.outputs.push(PortSpec::flow(START_FLOW_OUT));
            for (i, decl) in function.args.values().enumerate() {
                layout.outputs.push(PortSpec::value(START_FIRST_ARG + i as Port, decl.value_type));
            }
        }
        NodeData::Argument { name } => {
            let value_type = function
                .args
                .get(name)
                .map(|decl| decl.value_type)
                .unwrap_or(ValueType::Variable);
            layout.outputs.push(PortSpec::value(0, value_type));
        }
        NodeData::Variable { variable } => {
            let value_type = function
                .vars
                .get(&variable.name)
                .map(|decl| decl.value_type)
                .unwrap_or(ValueType::Variable);
            layout.outputs.push(PortSpec::value(0, value_type));
            layout.any_output = Some(Connector::value(value_type));
        }
        NodeData::Let { assignment } => {
            layout.inputs.push(PortSpec::flow(FLOW_IN));
            layout.outputs.push(PortSpec::flow(FLOW_OUT));
            if assignment.value.is_unset() {
                layout
                    .inputs
                    .push(PortSpec::value(LET_VALUE_IN, assignment.value.value_type()).required());
            }
        }
        NodeData::End { end } => {
            layout.inputs.push(PortSpec::flow(FLOW_IN));
            if let End::Return { return_type, value } = end {
                let spec = PortSpec::value(END_VALUE_IN, *return_type);
                layout.inputs.push(if value.is_unset() { spec.required() } else { spec });
            }
        }
        NodeData::Operation { operation } => {
            let value_type = operation.value_type();
            if operation.left_literal().is_none() {
                layout.inputs.push(PortSpec::value(LEFT_OPERAND_IN, value_type).required());
            }
            if !operation.is_unary() && operation.right_literal().is_none() {
                layout.inputs.push(PortSpec::value(RIGHT_OPERAND_IN, value_type).required());
            }
            layout.outputs.push(PortSpec::value(RESULT_OUT, value_type));
        }
        NodeData::Condition { condition } => {
            let value_type = condition.value_type();
            if condition.left_literal().is_none() {
                layout.inputs.push(PortSpec::value(LEFT_OPERAND_IN, value_type).required());
            }
            if condition.right_literal().is_none() {
                layout.inputs.push(PortSpec::value(RIGHT_OPERAND_IN, value_type).required());
            }
            layout.outputs.push(PortSpec::value(RESULT_OUT, ValueType::Uint64));
        }
        NodeData::Control { .. } => {
            layout.inputs.push(PortSpec::flow(FLOW_IN));
            layout.inputs.push(PortSpec::value(CONDITION_IN, ValueType::Uint64).required());
            layout.outputs.push(PortSpec::flow(THEN_OUT).required());
            // `if` falls through on port 3, `if-else` jumps to its else target
            layout.outputs.push(PortSpec::flow(ELSE_OUT));
        }
        NodeData::Goto => {
            layout.inputs.push(PortSpec::flow(FLOW_IN));
            layout.outputs.push(PortSpec::flow(FLOW_OUT).required());
        }
        NodeData::Function { function: call } => {
            if call.as_process {
                layout.inputs.push(PortSpec::flow(FLOW_IN));
                layout.outputs.push(PortSpec::flow(FLOW_OUT));
            }
            let base = call.arg_base();
            for (i, slot) in call.args.values().enumerate() {
                if slot.is_unset() {
                    layout
                        .inputs
                        .push(PortSpec::value(base + i as Port, slot.value_type()).required());
                }
            }
            layout.outputs.push(PortSpec::value(call.result_port(), call.returns));
        }
        NodeData::Process { process } => {
            layout.inputs.push(PortSpec::flow(FLOW_IN));
            layout.outputs.push(PortSpec::flow(FLOW_OUT));
            match functions.and_then(|f| f.get(&process.name)) {
                Some(callee) => {
                    for (i, decl) in callee.args.values().enumerate() {
                        layout.inputs.push(
                            PortSpec::value(PROCESS_FIRST_ARG + i as Port, decl.value_type).required(),
                        );
                    }
                    let result = PROCESS_FIRST_ARG + callee.args.len() as Port;
                    layout.outputs.push(PortSpec::value(result, callee.returns));
                }
                None => {
                    layout.any_input = Some(Connector::value(ValueType::Variable));
                    layout.any_output = Some(Connector::value(ValueType::Variable));
                }
            }
        }
    }

    layout
}
