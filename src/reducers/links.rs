use crate::error::{GraphError, Result};
use crate::graph::{Links, NodeId, NodeLink};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "data")]
pub enum LinksAction {
    /// Insert a link, replacing whatever already occupies its ports.
    #[serde(rename = "add")]
    Add(NodeLink),
    /// Remove the first structurally equal link.
    #[serde(rename = "remove")]
    Remove(NodeLink),
    /// Remove every link touching a node.
    #[serde(rename = "remove related")]
    RemoveRelated {
        #[serde(rename = "nodeId")]
        node_id: NodeId,
    },
}

impl LinksAction {
    fn name(&self) -> &'static str {
        match self {
            LinksAction::Add(_) => "Add",
            LinksAction::Remove(_) => "Remove",
            LinksAction::RemoveRelated { .. } => "RemoveRelated",
        }
    }
}

pub fn try_reduce_links(links: &mut Links, action: LinksAction) -> Result<()> {
    match action {
        LinksAction::Add(link) => add_link(links, link),
        LinksAction::Remove(link) => {
            match links.iter().position(|l| *l == link) {
                Some(index) => {
                    links.remove(index);
                }
                None => tracing::debug!("[REDUCER] No link {} to remove", link),
            }
            Ok(())
        }
        LinksAction::RemoveRelated { node_id } => {
            let before = links.len();
            links.retain(|l| !l.touches(node_id));
            tracing::debug!("[REDUCER] Removed {} links of node {}", before - links.len(), node_id);
            Ok(())
        }
    }
}

/// Collaborator-facing link reducer. Rejected actions are logged and the
/// collection is returned unchanged.
pub fn reduce_links(mut links: Links, action: LinksAction) -> Links {
    let name = action.name();
    if let Err(e) = try_reduce_links(&mut links, action) {
        super::log_rejection(name, &e);
    }
    links
}

/// A control output feeds one successor; a value input reads one source.
/// The new link takes the place of the first link it evicts.
fn add_link(links: &mut Links, link: NodeLink) -> Result<()> {
    if links.contains(&link) {
        return Err(GraphError::DuplicateLink {
            from_id: link.from.id,
            from_port: link.from.output,
            to_id: link.to.id,
            to_port: link.to.input,
        });
    }

    let mut slot = None;

    if let Some(index) = links.iter().position(|l| l.shares_source(&link)) {
        tracing::debug!("[REDUCER] {} replaces {}", link, links[index]);
        links[index] = link;
        slot = Some(index);
    }

    if !link.is_flow() {
        let sink = links
            .iter()
            .enumerate()
            .position(|(i, l)| Some(i) != slot && l.shares_sink(&link));
        if let Some(index) = sink {
            tracing::debug!("[REDUCER] {} replaces {}", link, links[index]);
            match slot {
                Some(_) => {
                    links.remove(index);
                }
                None => {
                    links[index] = link;
                    slot = Some(index);
                }
            }
        }
    }

    if slot.is_none() {
        links.push(link);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::ValueType;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    fn assert_exclusive(links: &Links) {
        let mut flow_sources = HashSet::new();
        let mut value_sinks = HashSet::new();
        for link in links {
            if link.is_flow() {
                assert!(flow_sources.insert(link.from), "shared flow output in {:?}", links);
            } else {
                assert!(value_sinks.insert(link.to), "shared value input in {:?}", links);
            }
        }
    }

    #[test]
    fn test_duplicate_link_is_rejected() {
        let link = NodeLink::flow(0, 0, 1, 0);
        let mut links = vec![link];
        let err = try_reduce_links(&mut links, LinksAction::Add(link)).unwrap_err();
        assert!(matches!(err, GraphError::DuplicateLink { from_id: 0, to_id: 1, .. }));
        assert_eq!(links, vec![link]);
    }

    #[test]
    fn test_flow_link_replaces_same_output() {
        let links = vec![NodeLink::flow(0, 0, 1, 0), NodeLink::flow(2, 1, 1, 0)];
        let links = reduce_links(links, LinksAction::Add(NodeLink::flow(0, 0, 3, 0)));
        assert_eq!(links, vec![NodeLink::flow(0, 0, 3, 0), NodeLink::flow(2, 1, 1, 0)]);
    }

    #[test]
    fn test_value_link_evicts_source_and_sink() {
        let links = vec![
            NodeLink::value(1, 1, 5, 0, ValueType::Uint64),
            NodeLink::flow(0, 0, 5, 0),
            NodeLink::value(2, 1, 6, 1, ValueType::Uint64),
        ];
        // Same source as the first link, same sink as the third
        let links = reduce_links(links, LinksAction::Add(NodeLink::value(1, 1, 6, 1, ValueType::Uint64)));
        assert_eq!(
            links,
            vec![NodeLink::value(1, 1, 6, 1, ValueType::Uint64), NodeLink::flow(0, 0, 5, 0)]
        );
    }

    #[test]
    fn test_exclusivity_holds_after_any_adds() {
        let mut links = Links::new();
        for from in 0..4u32 {
            for to in 0..4u32 {
                for port in 0..3u32 {
                    links = reduce_links(links, LinksAction::Add(NodeLink::flow(from, port % 2, to, 0)));
                    links = reduce_links(
                        links,
                        LinksAction::Add(NodeLink::value(from, port, to, port, ValueType::Variable)),
                    );
                    assert_exclusive(&links);
                }
            }
        }
    }

    #[test]
    fn test_add_then_remove_restores_links() {
        let original = vec![NodeLink::flow(0, 0, 1, 0), NodeLink::value(2, 1, 1, 1, ValueType::Uint64)];
        let link = NodeLink::value(3, 1, 4, 2, ValueType::String);

        let added = reduce_links(original.clone(), LinksAction::Add(link));
        assert_eq!(added.len(), 3);
        assert_eq!(reduce_links(added, LinksAction::Remove(link)), original);
    }

    #[test]
    fn test_remove_related_drops_both_directions() {
        let links = vec![
            NodeLink::flow(0, 0, 1, 0),
            NodeLink::flow(1, 1, 2, 0),
            NodeLink::value(3, 1, 2, 1, ValueType::Uint64),
        ];
        let links = reduce_links(links, LinksAction::RemoveRelated { node_id: 1 });
        assert_eq!(links, vec![NodeLink::value(3, 1, 2, 1, ValueType::Uint64)]);
    }

    #[test]
    fn test_action_document_shape() {
        let action: LinksAction =
            serde_json::from_str(r#"{ "action": "remove related", "data": { "nodeId": 4 } }"#).unwrap();
        assert_eq!(action, LinksAction::RemoveRelated { node_id: 4 });
    }
}
