//! # Graph Model
//!
//! Projects, functions, nodes and links as stored in the project document,
//! plus the port layout and traversal helpers shared by validation and code
//! generation.

pub mod function;
pub mod link;
pub mod node;
pub mod ports;
pub mod topo;
pub mod types;

pub use function::{
    normalize_function_name, Declaration, FunctionRecord, Functions, Links, Nodes, Project,
    ENTRY_FUNCTION, PRIVATE_ENTRY_FUNCTION, RESERVED_FUNCTIONS,
};
pub use link::{Connector, LinkFrom, LinkTo, NodeLink};
pub use node::{
    Condition, Control, End, FunctionCall, Let, Node, NodeData, NodeId, Operation, Port, Position,
    ProcessRef, VariableRef,
};
pub use ports::{port_layout, PortLayout, PortSpec};
pub use topo::{topo_sort, BackEdge, Traversal};
pub use types::{
    LiteralKind, Operands, Slot, StringComparator, StringOperator, TypedSlot, Uint64Comparator,
    Uint64Operator, Value, ValueType,
};
