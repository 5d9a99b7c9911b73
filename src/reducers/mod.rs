//! # Mutation Reducers
//!
//! The only way a function graph changes. Each reducer comes in two layers:
//!
//! - `try_reduce_*` applies an action in place and returns a [`GraphError`]
//!   on rejection, leaving the collection untouched.
//! - `reduce_*` is the collaborator-facing form: it takes the collection by
//!   value, logs any rejection and always hands a collection back.

mod links;
mod nodes;

pub use links::{reduce_links, try_reduce_links, LinksAction};
pub use nodes::{next_node_id, reduce_nodes, try_reduce_nodes, NodesAction};

use crate::error::GraphError;

/// Log a rejected action at the level its kind deserves.
pub(crate) fn log_rejection(action: &str, err: &GraphError) {
    match err {
        GraphError::NodeNotFound(_) | GraphError::PortNotFound { .. } => {
            tracing::error!("[REDUCER] {} rejected: {}", action, err);
        }
        _ => tracing::warn!("[REDUCER] {} rejected: {}", action, err),
    }
}
