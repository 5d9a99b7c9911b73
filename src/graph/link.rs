//! # Links
//!
//! Directed edges between node ports, tagged with what may flow across them.

use super::node::{NodeId, Port};
use super::types::ValueType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What a link (or a port) carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Connector {
    /// Unconditional sequencing.
    Flow,
    Value {
        #[serde(rename = "valueType")]
        value_type: ValueType,
    },
}

impl Connector {
    pub fn value(value_type: ValueType) -> Self {
        Connector::Value { value_type }
    }

    pub fn is_flow(&self) -> bool {
        matches!(self, Connector::Flow)
    }

    pub fn is_compatible_with(&self, other: &Connector) -> bool {
        match (self, other) {
            (Connector::Flow, Connector::Flow) => true,
            (Connector::Value { value_type: a }, Connector::Value { value_type: b }) => {
                a.is_compatible_with(*b)
            }
            _ => false,
        }
    }
}

impl fmt::Display for Connector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Connector::Flow => f.write_str("flow"),
            Connector::Value { value_type } => write!(f, "{} value", value_type),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkFrom {
    pub id: NodeId,
    pub output: Port,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LinkTo {
    pub id: NodeId,
    pub input: Port,
}

/// `from` output port to `to` input port.
///
/// Equality is structural over both endpoints and the connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeLink {
    pub from: LinkFrom,
    pub to: LinkTo,
    #[serde(rename = "type")]
    pub connector: Connector,
}

impl NodeLink {
    pub fn flow(from_id: NodeId, output: Port, to_id: NodeId, input: Port) -> Self {
        Self {
            from: LinkFrom { id: from_id, output },
            to: LinkTo { id: to_id, input },
            connector: Connector::Flow,
        }
    }

    pub fn value(
        from_id: NodeId,
        output: Port,
        to_id: NodeId,
        input: Port,
        value_type: ValueType,
    ) -> Self {
        Self {
            from: LinkFrom { id: from_id, output },
            to: LinkTo { id: to_id, input },
            connector: Connector::value(value_type),
        }
    }

    pub fn is_flow(&self) -> bool {
        self.connector.is_flow()
    }

    pub fn touches(&self, node: NodeId) -> bool {
        self.from.id == node || self.to.id == node
    }

    pub fn shares_source(&self, other: &NodeLink) -> bool {
        self.from == other.from
    }

    pub fn shares_sink(&self, other: &NodeLink) -> bool {
        self.to == other.to
    }
}

impl fmt::Display for NodeLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} -> {}:{} ({})",
            self.from.id, self.from.output, self.to.id, self.to.input, self.connector
        )
    }
}
