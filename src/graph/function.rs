//! # Functions and Projects
//!
//! A [`FunctionRecord`] owns one function's declarations and graph. A
//! [`Project`] is the named, insertion-ordered collection of functions that
//! is imported and exported as JSON.

use super::link::NodeLink;
use super::node::{Node, NodeData, NodeId, Position};
use super::ports::port_layout;
use super::types::{Value, ValueType};
use crate::error::{GraphError, Result};
use crate::reducers::{try_reduce_links, try_reduce_nodes, LinksAction, NodesAction};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub type Nodes = BTreeMap<NodeId, Node>;
pub type Links = Vec<NodeLink>;
pub type Functions = IndexMap<String, FunctionRecord>;

/// Default entry function of every project.
pub const ENTRY_FUNCTION: &str = "Initialize";
/// Private-invocation variant of the entry function.
pub const PRIVATE_ENTRY_FUNCTION: &str = "InitializePrivate";
pub const RESERVED_FUNCTIONS: [&str; 2] = [ENTRY_FUNCTION, PRIVATE_ENTRY_FUNCTION];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Declaration {
    #[serde(rename = "type")]
    pub value_type: ValueType,
}

impl Declaration {
    pub fn new(value_type: ValueType) -> Self {
        Self { value_type }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionRecord {
    #[serde(rename = "isProcess", default)]
    pub is_process: bool,
    #[serde(default)]
    pub args: IndexMap<String, Declaration>,
    #[serde(default)]
    pub vars: IndexMap<String, Declaration>,
    #[serde(rename = "return")]
    pub returns: ValueType,
    #[serde(default)]
    pub nodes: Nodes,
    #[serde(default)]
    pub links: Links,
}

impl FunctionRecord {
    /// A fresh function: a locked Start node flowing into `RETURN 0`.
    pub fn new(is_process: bool) -> Self {
        let mut nodes = Nodes::new();
        nodes.insert(0, Node::start().at(16.0, 16.0));
        nodes.insert(1, Node::new("End", NodeData::return_literal(Value::Uint64(0))).at(256.0, 16.0));

        Self {
            is_process,
            args: IndexMap::new(),
            vars: IndexMap::new(),
            returns: ValueType::Uint64,
            nodes,
            links: vec![NodeLink::flow(0, 0, 1, 0)],
        }
    }

    /// Id of the entry node, if any.
    pub fn start_node(&self) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|(_, node)| matches!(node.data, NodeData::Start))
            .map(|(id, _)| *id)
    }

    /// Apply a node action. Does not cascade to links.
    pub fn update_nodes(&mut self, action: NodesAction) -> Result<NodeId> {
        try_reduce_nodes(&mut self.nodes, action)
    }

    /// Apply a link action, rejecting links whose ports are incompatible.
    ///
    /// `functions` resolves Process callees for the port check.
    pub fn update_links(&mut self, action: LinksAction, functions: Option<&Functions>) -> Result<()> {
        if let LinksAction::Add(link) = &action {
            self.check_link(link, functions)?;
        }
        try_reduce_links(&mut self.links, action)
    }

    /// Delete a node together with every link touching it.
    pub fn remove_node(&mut self, id: NodeId) -> Result<()> {
        try_reduce_nodes(&mut self.nodes, NodesAction::DeleteNode { id })?;
        try_reduce_links(&mut self.links, LinksAction::RemoveRelated { node_id: id })
    }

    /// Both ports of `link` exist and agree with its connector.
    pub fn check_link(&self, link: &NodeLink, functions: Option<&Functions>) -> Result<()> {
        let source = self
            .nodes
            .get(&link.from.id)
            .ok_or(GraphError::NodeNotFound(link.from.id))?;
        let sink = self
            .nodes
            .get(&link.to.id)
            .ok_or(GraphError::NodeNotFound(link.to.id))?;

        let source_connector = port_layout(source, self, functions)
            .output(link.from.output)
            .ok_or(GraphError::PortNotFound { node: link.from.id, port: link.from.output })?;
        let sink_connector = port_layout(sink, self, functions)
            .input(link.to.input)
            .ok_or(GraphError::PortNotFound { node: link.to.id, port: link.to.input })?;

        let compatible = source_connector.is_compatible_with(&sink_connector)
            && link.connector.is_compatible_with(&source_connector)
            && link.connector.is_compatible_with(&sink_connector);

        if compatible {
            Ok(())
        } else {
            Err(GraphError::IncompatibleLink { source_connector, sink_connector })
        }
    }
}

/// The persisted project document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
    pub functions: Functions,
}

impl Default for Project {
    fn default() -> Self {
        Self::new("Initial Project")
    }
}

impl Project {
    /// A project holding the two reserved entry functions.
    pub fn new(name: impl Into<String>) -> Self {
        let functions = RESERVED_FUNCTIONS
            .iter()
            .map(|name| (name.to_string(), FunctionRecord::new(false)))
            .collect();
        Self { name: name.into(), functions }
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let project: Project = serde_json::from_str(json)?;
        tracing::info!(
            "[PROJECT] Imported '{}' ({} functions)",
            project.name,
            project.functions.len()
        );
        Ok(project)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_reserved(name: &str) -> bool {
        RESERVED_FUNCTIONS.contains(&name)
    }

    pub fn function(&self, name: &str) -> Result<&FunctionRecord> {
        self.functions
            .get(name)
            .ok_or_else(|| GraphError::FunctionNotFound(name.to_string()))
    }

    pub fn function_mut(&mut self, name: &str) -> Result<&mut FunctionRecord> {
        self.functions
            .get_mut(name)
            .ok_or_else(|| GraphError::FunctionNotFound(name.to_string()))
    }

    /// Add a new function and return its normalised name.
    pub fn add_function(&mut self, name: &str, is_process: bool) -> Result<String> {
        let name = normalize_function_name(name, is_process)?;
        if self.functions.contains_key(&name) {
            return Err(GraphError::FunctionExists(name));
        }

        tracing::debug!("[PROJECT] Adding {} '{}'", kind(is_process), name);
        self.functions.insert(name.clone(), FunctionRecord::new(is_process));
        Ok(name)
    }

    /// Rename in place, keeping the function's position, and re-point
    /// every Process node that called it.
    pub fn rename_function(&mut self, old: &str, new: &str) -> Result<String> {
        if Self::is_reserved(old) {
            return Err(GraphError::ReservedFunction(old.to_string()));
        }
        let is_process = self.function(old)?.is_process;
        let new = normalize_function_name(new, is_process)?;
        if self.functions.contains_key(&new) {
            return Err(GraphError::FunctionExists(new));
        }

        let functions = std::mem::take(&mut self.functions);
        self.functions = functions
            .into_iter()
            .map(|(name, record)| if name == old { (new.clone(), record) } else { (name, record) })
            .collect();

        let mut patched = 0;
        for record in self.functions.values_mut() {
            for node in record.nodes.values_mut() {
                if let NodeData::Process { process } = &mut node.data {
                    if process.name == old {
                        process.name = new.clone();
                        patched += 1;
                    }
                }
            }
        }

        tracing::debug!("[PROJECT] Renamed '{}' to '{}' ({} call sites)", old, new, patched);
        Ok(new)
    }

    /// Remove a function. Process nodes still calling it are left in place
    /// and reported.
    pub fn delete_function(&mut self, name: &str) -> Result<FunctionRecord> {
        if Self::is_reserved(name) {
            return Err(GraphError::ReservedFunction(name.to_string()));
        }
        let removed = self
            .functions
            .shift_remove(name)
            .ok_or_else(|| GraphError::FunctionNotFound(name.to_string()))?;

        for (caller, ids) in self.callers_of(name) {
            tracing::warn!(
                "[PROJECT] '{}' still calls deleted '{}' from nodes {:?}",
                caller,
                name,
                ids
            );
        }

        Ok(removed)
    }

    /// Process nodes calling `name`, grouped by calling function.
    pub fn callers_of(&self, name: &str) -> Vec<(String, Vec<NodeId>)> {
        self.functions
            .iter()
            .filter_map(|(caller, record)| {
                let ids: Vec<NodeId> = record
                    .nodes
                    .iter()
                    .filter(|(_, node)| {
                        matches!(&node.data, NodeData::Process { process } if process.name == name)
                    })
                    .map(|(id, _)| *id)
                    .collect();
                (!ids.is_empty()).then(|| (caller.clone(), ids))
            })
            .collect()
    }

    pub fn declare_argument(&mut self, function: &str, name: &str, value_type: ValueType) -> Result<()> {
        self.function_mut(function)?
            .args
            .insert(name.to_string(), Declaration::new(value_type));
        Ok(())
    }

    pub fn declare_variable(&mut self, function: &str, name: &str, value_type: ValueType) -> Result<()> {
        self.function_mut(function)?
            .vars
            .insert(name.to_string(), Declaration::new(value_type));
        Ok(())
    }

    pub fn update_nodes(&mut self, function: &str, action: NodesAction) -> Result<NodeId> {
        self.function_mut(function)?.update_nodes(action)
    }

    pub fn update_links(&mut self, function: &str, action: LinksAction) -> Result<()> {
        if let LinksAction::Add(link) = &action {
            self.function(function)?.check_link(link, Some(&self.functions))?;
        }
        try_reduce_links(&mut self.function_mut(function)?.links, action)
    }

    /// Convenience for adding a node at a canvas position.
    pub fn add_node(&mut self, function: &str, name: &str, data: NodeData, position: Position) -> Result<NodeId> {
        let mut node = Node::new(name, data);
        node.position = position;
        self.update_nodes(function, NodesAction::AddNode(node))
    }

    /// Import the functions of `other`. Existing functions are kept unless
    /// `overwrite` is set. Returns the names that were imported.
    pub fn merge(&mut self, other: Project, overwrite: bool) -> Vec<String> {
        let mut imported = Vec::new();
        for (name, record) in other.functions {
            if self.functions.contains_key(&name) && !overwrite {
                tracing::debug!("[PROJECT] Skipping existing function '{}'", name);
                continue;
            }
            self.functions.insert(name.clone(), record);
            imported.push(name);
        }
        imported
    }
}

fn kind(is_process: bool) -> &'static str {
    if is_process {
        "process"
    } else {
        "function"
    }
}

/// Process names start lower-case, function names upper-case.
pub fn normalize_function_name(name: &str, is_process: bool) -> Result<String> {
    let name = name.trim();
    let mut chars = name.chars();
    let first = chars
        .next()
        .filter(|c| c.is_ascii_alphabetic())
        .ok_or_else(|| GraphError::InvalidFunctionName(name.to_string()))?;

    if !chars.as_str().chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(GraphError::InvalidFunctionName(name.to_string()));
    }

    let first = if is_process {
        first.to_ascii_lowercase()
    } else {
        first.to_ascii_uppercase()
    };
    Ok(format!("{}{}", first, chars.as_str()))
}
