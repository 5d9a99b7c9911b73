//! # Errors
//!
//! The single error type shared by the reducers, the project lifecycle
//! operations and the compiler entry points.

use crate::graph::{Connector, NodeId, Port, ValueType};
use crate::validation::ValidationError;
use thiserror::Error;

pub type Result<T, E = GraphError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum GraphError {
    #[error("node {0} not found")]
    NodeNotFound(NodeId),

    #[error("no node id left after {0}")]
    NodeIdsExhausted(NodeId),

    #[error("node {0} is locked and cannot be deleted")]
    NodeLocked(NodeId),

    #[error("link {from_id}:{from_port} -> {to_id}:{to_port} already exists")]
    DuplicateLink {
        from_id: NodeId,
        from_port: Port,
        to_id: NodeId,
        to_port: Port,
    },

    #[error("cannot link {source_connector} output to {sink_connector} input")]
    IncompatibleLink {
        source_connector: Connector,
        sink_connector: Connector,
    },

    #[error("port {port} of node {node} does not exist")]
    PortNotFound { node: NodeId, port: Port },

    #[error("literal for '{slot}' on node {node} must be {expected}")]
    LiteralTypeMismatch {
        node: NodeId,
        slot: String,
        expected: ValueType,
    },

    #[error("node {node} has no literal slot '{slot}'")]
    UnknownSlot { node: NodeId, slot: String },

    #[error("function '{0}' already exists")]
    FunctionExists(String),

    #[error("function '{0}' not found")]
    FunctionNotFound(String),

    #[error("function '{0}' is reserved")]
    ReservedFunction(String),

    #[error("invalid function name '{0}'")]
    InvalidFunctionName(String),

    #[error("graph is invalid ({} errors)", .0.len())]
    InvalidGraph(Vec<ValidationError>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
