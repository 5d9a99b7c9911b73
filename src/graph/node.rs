//! # Nodes
//!
//! A node is a vertex of a function graph. Its [`NodeData`] variant decides
//! how the code generator treats it; the remaining attributes only matter to
//! the editor.

use super::types::{
    Operands, Slot, StringComparator, StringOperator, TypedSlot, Uint64Comparator,
    Uint64Operator, Value, ValueType,
};
use crate::metadata::DvmFunction;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Node id, unique within its owning function.
pub type NodeId = u32;

/// Index of an input or output slot, local to a node.
pub type Port = u32;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

impl Position {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub name: String,
    #[serde(default)]
    pub edit: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub position: Position,
    pub data: NodeData,
}

impl Node {
    pub fn new(name: impl Into<String>, data: NodeData) -> Self {
        Self {
            name: name.into(),
            edit: false,
            locked: false,
            position: Position::default(),
            data,
        }
    }

    /// The locked entry node every function starts with.
    pub fn start() -> Self {
        Self {
            locked: true,
            ..Self::new("Start", NodeData::Start)
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Position::new(x, y);
        self
    }
}

/// Tagged payload of a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum NodeData {
    Start,
    Argument {
        name: String,
    },
    Function {
        function: FunctionCall,
    },
    Operation {
        operation: Operation,
    },
    Condition {
        condition: Condition,
    },
    Process {
        process: ProcessRef,
    },
    Let {
        #[serde(rename = "let")]
        assignment: Let,
    },
    Variable {
        variable: VariableRef,
    },
    Goto,
    End {
        end: End,
    },
    Control {
        control: Control,
    },
}

impl NodeData {
    pub fn kind(&self) -> &'static str {
        match self {
            NodeData::Start => "start",
            NodeData::Argument { .. } => "argument",
            NodeData::Function { .. } => "function",
            NodeData::Operation { .. } => "operation",
            NodeData::Condition { .. } => "condition",
            NodeData::Process { .. } => "process",
            NodeData::Let { .. } => "let",
            NodeData::Variable { .. } => "variable",
            NodeData::Goto => "goto",
            NodeData::End { .. } => "end",
            NodeData::Control { .. } => "control",
        }
    }

    pub fn argument(name: impl Into<String>) -> Self {
        NodeData::Argument { name: name.into() }
    }

    pub fn variable(name: impl Into<String>) -> Self {
        NodeData::Variable { variable: VariableRef { name: name.into() } }
    }

    pub fn process(name: impl Into<String>) -> Self {
        NodeData::Process { process: ProcessRef { name: name.into() } }
    }

    pub fn builtin(function: DvmFunction) -> Self {
        NodeData::Function { function: FunctionCall::builtin(function) }
    }

    pub fn assign(name: impl Into<String>, value: TypedSlot) -> Self {
        NodeData::Let { assignment: Let { name: name.into(), value } }
    }

    pub fn return_literal(value: Value) -> Self {
        NodeData::End {
            end: End::Return { return_type: value.value_type(), value: Slot::Literal(value) },
        }
    }

    pub fn return_linked(return_type: ValueType) -> Self {
        NodeData::End { end: End::Return { return_type, value: Slot::Unset } }
    }

    pub fn panic() -> Self {
        NodeData::End { end: End::Panic }
    }
}

/// Call of a built-in DVM function, with one literal slot per argument.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: DvmFunction,
    pub args: IndexMap<String, TypedSlot>,
    #[serde(rename = "return")]
    pub returns: ValueType,
    #[serde(rename = "asProcess", default)]
    pub as_process: bool,
}

impl FunctionCall {
    /// Fresh call with every argument unset, following the catalog.
    pub fn builtin(function: DvmFunction) -> Self {
        let signature = function.signature();
        Self {
            name: function,
            args: signature
                .args
                .iter()
                .map(|(name, value_type)| (name.to_string(), TypedSlot::unset(*value_type)))
                .collect(),
            returns: signature.returns,
            as_process: signature.as_process,
        }
    }

    /// First input port used by arguments.
    pub fn arg_base(&self) -> Port {
        if self.as_process {
            2
        } else {
            0
        }
    }

    /// Output port carrying the call's result.
    pub fn result_port(&self) -> Port {
        self.arg_base() + self.args.len() as Port
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Operation {
    Uint64 {
        operator: Uint64Operator,
        #[serde(rename = "valueSet", default)]
        operands: Operands<u64>,
    },
    String {
        operator: StringOperator,
        #[serde(rename = "valueSet", default)]
        operands: Operands<String>,
    },
}

impl Operation {
    pub fn uint64(operator: Uint64Operator, left: Slot<u64>, right: Slot<u64>) -> Self {
        Operation::Uint64 { operator, operands: Operands { left, right } }
    }

    pub fn string(operator: StringOperator, left: Slot<String>, right: Slot<String>) -> Self {
        Operation::String { operator, operands: Operands { left, right } }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Operation::Uint64 { .. } => ValueType::Uint64,
            Operation::String { .. } => ValueType::String,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Operation::Uint64 { operator, .. } => operator.symbol(),
            Operation::String { operator, .. } => operator.symbol(),
        }
    }

    /// Bitwise NOT only reads its left operand.
    pub fn is_unary(&self) -> bool {
        matches!(self, Operation::Uint64 { operator: Uint64Operator::BitwiseNot, .. })
    }

    pub fn left_literal(&self) -> Option<String> {
        match self {
            Operation::Uint64 { operands, .. } => operands.left.to_literal(),
            Operation::String { operands, .. } => operands.left.to_literal(),
        }
    }

    pub fn right_literal(&self) -> Option<String> {
        match self {
            Operation::Uint64 { operands, .. } => operands.right.to_literal(),
            Operation::String { operands, .. } => operands.right.to_literal(),
        }
    }

    pub fn assign(&mut self, key: &str, value: Slot<Value>) -> bool {
        match self {
            Operation::Uint64 { operands, .. } => operands.assign(key, value),
            Operation::String { operands, .. } => operands.assign(key, value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Condition {
    Uint64 {
        operator: Uint64Comparator,
        #[serde(rename = "valueSet", default)]
        operands: Operands<u64>,
    },
    String {
        operator: StringComparator,
        #[serde(rename = "valueSet", default)]
        operands: Operands<String>,
    },
}

impl Condition {
    pub fn uint64(operator: Uint64Comparator, left: Slot<u64>, right: Slot<u64>) -> Self {
        Condition::Uint64 { operator, operands: Operands { left, right } }
    }

    pub fn string(operator: StringComparator, left: Slot<String>, right: Slot<String>) -> Self {
        Condition::String { operator, operands: Operands { left, right } }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Condition::Uint64 { .. } => ValueType::Uint64,
            Condition::String { .. } => ValueType::String,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Condition::Uint64 { operator, .. } => operator.symbol(),
            Condition::String { operator, .. } => operator.symbol(),
        }
    }

    pub fn left_literal(&self) -> Option<String> {
        match self {
            Condition::Uint64 { operands, .. } => operands.left.to_literal(),
            Condition::String { operands, .. } => operands.left.to_literal(),
        }
    }

    pub fn right_literal(&self) -> Option<String> {
        match self {
            Condition::Uint64 { operands, .. } => operands.right.to_literal(),
            Condition::String { operands, .. } => operands.right.to_literal(),
        }
    }

    pub fn assign(&mut self, key: &str, value: Slot<Value>) -> bool {
        match self {
            Condition::Uint64 { operands, .. } => operands.assign(key, value),
            Condition::String { operands, .. } => operands.assign(key, value),
        }
    }
}

/// Call of a user-defined function by name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessRef {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableRef {
    pub name: String,
}

/// `LET <name> = <value>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Let {
    pub name: String,
    #[serde(rename = "in")]
    pub value: TypedSlot,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum End {
    Panic,
    Return {
        #[serde(rename = "returnType")]
        return_type: ValueType,
        #[serde(default)]
        value: Slot<Value>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Control {
    #[serde(rename = "if")]
    If,
    #[serde(rename = "if-else")]
    IfElse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_call_ports() {
        let store = FunctionCall::builtin(DvmFunction::Store);
        assert!(store.as_process);
        assert_eq!(store.arg_base(), 2);
        assert_eq!(store.result_port(), 4);

        let min = FunctionCall::builtin(DvmFunction::Min);
        assert!(!min.as_process);
        assert_eq!(min.result_port(), 2);
        assert!(min.args.values().all(TypedSlot::is_unset));
    }

    #[test]
    fn test_node_document_shape() {
        let json = r#"{
            "name": "End",
            "edit": false,
            "locked": false,
            "position": { "x": 256, "y": 16 },
            "data": { "type": "end", "end": { "type": "return", "returnType": "Uint64", "value": 0 } }
        }"#;

        let node: Node = serde_json::from_str(json).unwrap();
        assert_eq!(node.data, NodeData::return_literal(Value::Uint64(0)));
        assert_eq!(node.position, Position::new(256.0, 16.0));
    }

    #[test]
    fn test_unary_not() {
        let not = Operation::uint64(Uint64Operator::BitwiseNot, Slot::Unset, Slot::Unset);
        assert!(not.is_unary());
        assert_eq!(not.symbol(), "!");
        let add = Operation::uint64(Uint64Operator::Add, Slot::Literal(1), Slot::Unset);
        assert!(!add.is_unary());
        assert_eq!(add.left_literal(), Some("1".to_string()));
    }
}
