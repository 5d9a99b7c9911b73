use crate::error::{GraphError, Result};
use crate::graph::{NodeData, NodeId, Nodes, Node, Position, Slot, Value};
use serde::{Deserialize, Serialize};

/// Structural edits to a function's node map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum NodesAction {
    #[serde(rename = "add node")]
    AddNode(Node),
    #[serde(rename = "update node position")]
    UpdateNodePosition { id: NodeId, position: Position },
    #[serde(rename = "update node edit mode")]
    UpdateNodeEditMode { id: NodeId, edit: bool },
    /// Replace the payload wholesale.
    #[serde(rename = "edit node")]
    EditNode {
        id: NodeId,
        #[serde(rename = "newData")]
        data: NodeData,
    },
    /// Set one literal slot of a Function, Operation or Condition node.
    /// `arg` is the argument name, or `"left"` / `"right"` for operands.
    #[serde(rename = "edit arg value")]
    EditNodeArgValue {
        id: NodeId,
        arg: String,
        #[serde(rename = "valueSet")]
        value: Slot<Value>,
    },
    /// Does not touch links; pair with `LinksAction::RemoveRelated`.
    #[serde(rename = "delete node")]
    DeleteNode { id: NodeId },
}

impl NodesAction {
    fn name(&self) -> &'static str {
        match self {
            NodesAction::AddNode(_) => "AddNode",
            NodesAction::UpdateNodePosition { .. } => "UpdateNodePosition",
            NodesAction::UpdateNodeEditMode { .. } => "UpdateNodeEditMode",
            NodesAction::EditNode { .. } => "EditNode",
            NodesAction::EditNodeArgValue { .. } => "EditNodeArgValue",
            NodesAction::DeleteNode { .. } => "DeleteNode",
        }
    }
}

/// `max(existing ids) + 1`, or 1 for an empty map.
pub fn next_node_id(nodes: &Nodes) -> Result<NodeId> {
    let max = nodes.keys().next_back().copied().unwrap_or(0);
    max.checked_add(1).ok_or(GraphError::NodeIdsExhausted(max))
}

/// Apply `action` and return the id of the affected node.
pub fn try_reduce_nodes(nodes: &mut Nodes, action: NodesAction) -> Result<NodeId> {
    match action {
        NodesAction::AddNode(node) => {
            let id = next_node_id(nodes)?;
            tracing::debug!("[REDUCER] Adding {} node {} as {}", node.data.kind(), node.name, id);
            nodes.insert(id, node);
            Ok(id)
        }
        NodesAction::UpdateNodePosition { id, position } => {
            get_mut(nodes, id)?.position = position;
            Ok(id)
        }
        NodesAction::UpdateNodeEditMode { id, edit } => {
            get_mut(nodes, id)?.edit = edit;
            Ok(id)
        }
        NodesAction::EditNode { id, data } => {
            let node = get_mut(nodes, id)?;
            tracing::debug!("[REDUCER] Node {}: {} -> {}", id, node.data.kind(), data.kind());
            node.data = data;
            Ok(id)
        }
        NodesAction::EditNodeArgValue { id, arg, value } => {
            assign_literal(id, &mut get_mut(nodes, id)?.data, &arg, value)?;
            Ok(id)
        }
        NodesAction::DeleteNode { id } => {
            if get_mut(nodes, id)?.locked {
                return Err(GraphError::NodeLocked(id));
            }
            nodes.remove(&id);
            Ok(id)
        }
    }
}

/// Collaborator-facing node reducer. Rejected actions are logged and the
/// collection is returned unchanged.
pub fn reduce_nodes(mut nodes: Nodes, action: NodesAction) -> Nodes {
    let name = action.name();
    if let Err(e) = try_reduce_nodes(&mut nodes, action) {
        super::log_rejection(name, &e);
    }
    nodes
}

fn get_mut(nodes: &mut Nodes, id: NodeId) -> Result<&mut Node> {
    nodes.get_mut(&id).ok_or(GraphError::NodeNotFound(id))
}

fn assign_literal(id: NodeId, data: &mut NodeData, arg: &str, value: Slot<Value>) -> Result<()> {
    let unknown = || GraphError::UnknownSlot { node: id, slot: arg.to_string() };
    let is_operand = arg == "left" || arg == "right";

    let (accepted, expected) = match data {
        NodeData::Function { function } => {
            let slot = function.args.get_mut(arg).ok_or_else(unknown)?;
            let expected = slot.value_type();
            (slot.assign(value), expected)
        }
        NodeData::Operation { operation } if is_operand => {
            (operation.assign(arg, value), operation.value_type())
        }
        NodeData::Condition { condition } if is_operand => {
            (condition.assign(arg, value), condition.value_type())
        }
        NodeData::Operation { .. } | NodeData::Condition { .. } => return Err(unknown()),
        other => {
            tracing::debug!("[REDUCER] Node {} ({}) has no literal slots", id, other.kind());
            return Ok(());
        }
    };

    if accepted {
        Ok(())
    } else {
        Err(GraphError::LiteralTypeMismatch { node: id, slot: arg.to_string(), expected })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{FunctionRecord, Operation, Uint64Operator, ValueType};
    use crate::metadata::DvmFunction;
    use pretty_assertions::assert_eq;

    fn add(nodes: &mut Nodes) -> NodeId {
        try_reduce_nodes(nodes, NodesAction::AddNode(Node::new("goto", NodeData::Goto))).unwrap()
    }

    #[test]
    fn test_ids_are_max_plus_one() {
        let mut nodes = Nodes::new();
        assert_eq!((add(&mut nodes), add(&mut nodes), add(&mut nodes)), (1, 2, 3));

        try_reduce_nodes(&mut nodes, NodesAction::DeleteNode { id: 2 }).unwrap();
        assert_eq!(add(&mut nodes), 4);

        try_reduce_nodes(&mut nodes, NodesAction::DeleteNode { id: 4 }).unwrap();
        assert_eq!(add(&mut nodes), 4);
    }

    #[test]
    fn test_add_after_largest_id_is_rejected() {
        let mut nodes = Nodes::new();
        nodes.insert(NodeId::MAX, Node::new("goto", NodeData::Goto));

        let err = try_reduce_nodes(&mut nodes, NodesAction::AddNode(Node::new("goto", NodeData::Goto)))
            .unwrap_err();
        assert!(matches!(err, GraphError::NodeIdsExhausted(NodeId::MAX)));
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_template_nodes_continue_from_max() {
        let mut nodes = FunctionRecord::new(false).nodes;
        assert_eq!(add(&mut nodes), 2);
    }

    #[test]
    fn test_locked_start_cannot_be_deleted() {
        let nodes = FunctionRecord::new(false).nodes;

        let mut attempt = nodes.clone();
        let err = try_reduce_nodes(&mut attempt, NodesAction::DeleteNode { id: 0 }).unwrap_err();
        assert!(matches!(err, GraphError::NodeLocked(0)));
        assert_eq!(attempt, nodes);

        assert_eq!(reduce_nodes(nodes.clone(), NodesAction::DeleteNode { id: 0 }), nodes);
    }

    #[test]
    fn test_missing_node_is_reported() {
        let nodes = FunctionRecord::new(false).nodes;
        let mut attempt = nodes.clone();
        let err = try_reduce_nodes(
            &mut attempt,
            NodesAction::UpdateNodePosition { id: 9, position: Position::new(1.0, 1.0) },
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::NodeNotFound(9)));
        assert_eq!(attempt, nodes);
    }

    #[test]
    fn test_edit_arg_value_is_type_checked() {
        let mut nodes = Nodes::new();
        let op = try_reduce_nodes(
            &mut nodes,
            NodesAction::AddNode(Node::new(
                "add",
                NodeData::Operation {
                    operation: Operation::uint64(Uint64Operator::Add, Slot::Unset, Slot::Unset),
                },
            )),
        )
        .unwrap();

        let set = |arg: &str, value: Value| NodesAction::EditNodeArgValue {
            id: op,
            arg: arg.to_string(),
            value: Slot::Literal(value),
        };

        try_reduce_nodes(&mut nodes, set("left", Value::Uint64(2))).unwrap();
        let err = try_reduce_nodes(&mut nodes, set("right", Value::from("x"))).unwrap_err();
        assert!(matches!(
            err,
            GraphError::LiteralTypeMismatch { expected: ValueType::Uint64, .. }
        ));
        assert!(matches!(
            try_reduce_nodes(&mut nodes, set("middle", Value::Uint64(1))),
            Err(GraphError::UnknownSlot { .. })
        ));

        match &nodes[&op].data {
            NodeData::Operation { operation } => {
                assert_eq!(operation.left_literal(), Some("2".to_string()));
                assert_eq!(operation.right_literal(), None);
            }
            other => panic!("unexpected payload {:?}", other),
        }
    }

    #[test]
    fn test_edit_arg_value_on_builtin_and_other_kinds() {
        let mut nodes = Nodes::new();
        let call = try_reduce_nodes(
            &mut nodes,
            NodesAction::AddNode(Node::new("itoa", NodeData::builtin(DvmFunction::Itoa))),
        )
        .unwrap();
        let goto = add(&mut nodes);

        try_reduce_nodes(
            &mut nodes,
            NodesAction::EditNodeArgValue { id: call, arg: "n".into(), value: Slot::Literal(Value::Uint64(5)) },
        )
        .unwrap();
        match &nodes[&call].data {
            NodeData::Function { function } => {
                assert_eq!(function.args["n"].to_literal(), Some("5".to_string()));
            }
            other => panic!("unexpected payload {:?}", other),
        }

        let before = nodes.clone();
        try_reduce_nodes(
            &mut nodes,
            NodesAction::EditNodeArgValue { id: goto, arg: "n".into(), value: Slot::Unset },
        )
        .unwrap();
        assert_eq!(nodes, before);
    }

    #[test]
    fn test_action_document_shape() {
        let action: NodesAction =
            serde_json::from_str(r#"{ "action": "delete node", "data": { "id": 3 } }"#).unwrap();
        assert_eq!(action, NodesAction::DeleteNode { id: 3 });

        let action: NodesAction = serde_json::from_str(
            r#"{ "action": "edit arg value", "data": { "id": 1, "arg": "left", "valueSet": null } }"#,
        )
        .unwrap();
        assert_eq!(
            action,
            NodesAction::EditNodeArgValue { id: 1, arg: "left".into(), value: Slot::Unset }
        );
    }
}
