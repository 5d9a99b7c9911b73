//! # Graph Validation
//!
//! Structural checks run before generation:
//! - every function has a Start node and no link points at a missing node
//! - no control output feeds two links, no value input reads two links
//! - every node reachable from Start has its required ports connected
//! - links agree with the port layout of both endpoints
//! - Argument, Variable, Let and Process names resolve
//!
//! Cycles are reported as warnings and do not make a graph invalid.

use crate::error::GraphError;
use crate::graph::{
    port_layout, topo_sort, FunctionRecord, Functions, NodeData, NodeId, NodeLink, Port,
};
use serde::Serialize;
use std::collections::{HashSet, VecDeque};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ValidationErrorKind {
    MissingConnection,
    InvalidPath,
    ConflictingLinks,
    IncompatibleLink { reason: String },
    UnknownReference { name: String },
    Cycle,
}

impl fmt::Display for ValidationErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationErrorKind::MissingConnection => f.write_str("required port is not connected"),
            ValidationErrorKind::InvalidPath => f.write_str("path leads to a missing node"),
            ValidationErrorKind::ConflictingLinks => f.write_str("port has more than one link"),
            ValidationErrorKind::IncompatibleLink { reason } => write!(f, "{}", reason),
            ValidationErrorKind::UnknownReference { name } => write!(f, "'{}' is not declared", name),
            ValidationErrorKind::Cycle => f.write_str("node is part of a cycle"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub function: String,
    pub node: Option<NodeId>,
    pub port: Option<Port>,
    #[serde(flatten)]
    pub kind: ValidationErrorKind,
    pub severity: Severity,
}

impl ValidationError {
    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.function)?;
        if let Some(node) = self.node {
            write!(f, ", node {}", node)?;
        }
        if let Some(port) = self.port {
            write!(f, ", port {}", port)?;
        }
        write!(f, ": {}", self.kind)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl Default for ValidationReport {
    fn default() -> Self {
        Self { valid: true, errors: Vec::new() }
    }
}

impl ValidationReport {
    fn merge(&mut self, other: ValidationReport) {
        self.valid = self.valid && other.valid;
        self.errors.extend(other.errors);
    }

    pub fn warnings(&self) -> impl Iterator<Item = &ValidationError> {
        self.errors.iter().filter(|e| !e.is_error())
    }
}

/// Collects findings for one function.
struct FunctionValidator<'a> {
    name: &'a str,
    function: &'a FunctionRecord,
    functions: Option<&'a Functions>,
    errors: Vec<ValidationError>,
}

impl<'a> FunctionValidator<'a> {
    fn report(&mut self, node: Option<NodeId>, port: Option<Port>, kind: ValidationErrorKind, severity: Severity) {
        tracing::debug!("[VALIDATE] {} node {:?} port {:?}: {}", self.name, node, port, kind);
        self.errors.push(ValidationError {
            function: self.name.to_string(),
            node,
            port,
            kind,
            severity,
        });
    }

    fn error(&mut self, node: NodeId, port: Option<Port>, kind: ValidationErrorKind) {
        self.report(Some(node), port, kind, Severity::Error);
    }

    fn check_endpoints(&mut self) {
        let function = self.function;
        let nodes = &function.nodes;
        for link in dangling_links(function) {
            if !nodes.contains_key(&link.to.id) {
                self.error(link.from.id, Some(link.from.output), ValidationErrorKind::InvalidPath);
            }
            if !nodes.contains_key(&link.from.id) {
                self.error(link.to.id, Some(link.to.input), ValidationErrorKind::InvalidPath);
            }
        }
    }

    fn check_conflicts(&mut self) {
        let mut flow_sources = HashSet::new();
        let mut value_sinks = HashSet::new();
        let mut reported = HashSet::new();

        let function = self.function;
        for link in &function.links {
            let (node, port, fresh) = if link.is_flow() {
                (link.from.id, link.from.output, flow_sources.insert(link.from))
            } else {
                (link.to.id, link.to.input, value_sinks.insert(link.to))
            };
            if !fresh && reported.insert((node, port)) {
                self.error(node, Some(port), ValidationErrorKind::ConflictingLinks);
            }
        }
    }

    fn check_link_types(&mut self) {
        let function = self.function;
        for link in &function.links {
            if !function.nodes.contains_key(&link.from.id) || !function.nodes.contains_key(&link.to.id) {
                continue;
            }
            if let Err(e) = function.check_link(link, self.functions) {
                let (node, port) = match e {
                    GraphError::PortNotFound { node, port } => (node, port),
                    _ => (link.to.id, link.to.input),
                };
                self.error(node, Some(port), ValidationErrorKind::IncompatibleLink { reason: e.to_string() });
            }
        }
    }

    /// Nodes on a control path from Start, plus everything feeding them values.
    fn reachable(&self, start: NodeId) -> HashSet<NodeId> {
        let links = &self.function.links;
        let mut on_path = HashSet::new();
        let mut reached = HashSet::new();
        let mut queue = VecDeque::from([(start, true)]);

        while let Some((id, via_flow)) = queue.pop_front() {
            let first_visit = reached.insert(id);
            if via_flow && on_path.insert(id) {
                for link in links.iter().filter(|l| l.from.id == id && l.is_flow()) {
                    queue.push_back((link.to.id, true));
                }
            }
            if first_visit {
                for link in links.iter().filter(|l| l.to.id == id && !l.is_flow()) {
                    queue.push_back((link.from.id, false));
                }
            }
        }

        reached.retain(|id| self.function.nodes.contains_key(id));
        reached
    }

    fn check_required_ports(&mut self, reachable: &HashSet<NodeId>) {
        let mut ids: Vec<NodeId> = reachable.iter().copied().collect();
        ids.sort_unstable();

        let function = self.function;
        for id in ids {
            let Some(node) = function.nodes.get(&id) else {
                continue;
            };
            let layout = port_layout(node, function, self.functions);
            let links = &function.links;

            let missing_inputs: Vec<Port> = layout
                .required_inputs()
                .filter(|spec| !links.iter().any(|l| l.to.id == id && l.to.input == spec.port))
                .map(|spec| spec.port)
                .collect();
            let missing_outputs: Vec<Port> = layout
                .required_outputs()
                .filter(|spec| !links.iter().any(|l| l.from.id == id && l.from.output == spec.port))
                .map(|spec| spec.port)
                .collect();

            for port in missing_inputs.into_iter().chain(missing_outputs) {
                self.error(id, Some(port), ValidationErrorKind::MissingConnection);
            }
        }
    }

    fn check_references(&mut self) {
        let function = self.function;
        for (id, node) in &function.nodes {
            let unknown = match &node.data {
                NodeData::Argument { name } if !function.args.contains_key(name) => Some(name),
                NodeData::Variable { variable } if !function.vars.contains_key(&variable.name) => {
                    Some(&variable.name)
                }
                NodeData::Let { assignment } if !function.vars.contains_key(&assignment.name) => {
                    Some(&assignment.name)
                }
                NodeData::Process { process } => self
                    .functions
                    .filter(|functions| !functions.contains_key(&process.name))
                    .map(|_| &process.name),
                _ => None,
            };
            if let Some(name) = unknown {
                self.error(*id, None, ValidationErrorKind::UnknownReference { name: name.clone() });
            }
        }
    }

    fn check_cycles(&mut self) {
        let traversal = topo_sort(&self.function.nodes, &self.function.links);
        for edge in traversal.back_edges {
            self.report(Some(edge.to), None, ValidationErrorKind::Cycle, Severity::Warning);
        }
    }

    fn run(mut self) -> ValidationReport {
        self.check_endpoints();
        self.check_conflicts();
        self.check_link_types();
        self.check_references();

        match self.function.start_node() {
            Some(start) => {
                let reachable = self.reachable(start);
                self.check_required_ports(&reachable);
            }
            None => self.report(None, None, ValidationErrorKind::InvalidPath, Severity::Error),
        }

        self.check_cycles();

        ValidationReport {
            valid: !self.errors.iter().any(ValidationError::is_error),
            errors: self.errors,
        }
    }
}

/// Validate one function. `functions` resolves Process callees; without it
/// Process nodes are not checked against their callee.
pub fn validate_function(name: &str, function: &FunctionRecord, functions: Option<&Functions>) -> ValidationReport {
    FunctionValidator { name, function, functions, errors: Vec::new() }.run()
}

/// Validate every function of a project.
pub fn validate_functions(functions: &Functions) -> ValidationReport {
    let mut report = ValidationReport::default();
    for (name, function) in functions {
        report.merge(validate_function(name, function, Some(functions)));
    }

    tracing::info!(
        "[VALIDATE] {} functions: {} ({} findings, {} warnings)",
        functions.len(),
        if report.valid { "valid" } else { "invalid" },
        report.errors.len(),
        report.warnings().count()
    );
    report
}

/// Links with a source or sink node missing from the function.
pub fn dangling_links(function: &FunctionRecord) -> Vec<NodeLink> {
    function
        .links
        .iter()
        .filter(|l| !function.nodes.contains_key(&l.from.id) || !function.nodes.contains_key(&l.to.id))
        .copied()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{
        Control, Declaration, Node, NodeData, Operation, Slot, Uint64Comparator, Uint64Operator,
        ValueType, Condition,
    };
    use pretty_assertions::assert_eq;

    fn kinds(report: &ValidationReport) -> Vec<(Option<NodeId>, Option<Port>, ValidationErrorKind)> {
        report
            .errors
            .iter()
            .map(|e| (e.node, e.port, e.kind.clone()))
            .collect()
    }

    #[test]
    fn test_template_function_is_valid() {
        let report = validate_function("Initialize", &FunctionRecord::new(false), None);
        assert!(report.valid);
        assert!(report.errors.is_empty());
    }

    #[test]
    fn test_unlinked_return_value_is_missing() {
        let mut function = FunctionRecord::new(false);
        function.nodes.insert(1, Node::new("End", NodeData::return_linked(ValueType::Uint64)));

        let report = validate_function("F", &function, None);
        assert!(!report.valid);
        assert_eq!(kinds(&report), vec![(Some(1), Some(1), ValidationErrorKind::MissingConnection)]);
    }

    #[test]
    fn test_unreachable_nodes_are_not_checked() {
        let mut function = FunctionRecord::new(false);
        function.nodes.insert(
            2,
            Node::new(
                "add",
                NodeData::Operation {
                    operation: Operation::uint64(Uint64Operator::Add, Slot::Unset, Slot::Unset),
                },
            ),
        );
        assert!(validate_function("F", &function, None).valid);
    }

    #[test]
    fn test_operands_of_reachable_nodes_are_checked() {
        let mut function = FunctionRecord::new(false);
        function.nodes.insert(1, Node::new("End", NodeData::return_linked(ValueType::Uint64)));
        function.nodes.insert(
            2,
            Node::new(
                "add",
                NodeData::Operation {
                    operation: Operation::uint64(Uint64Operator::Add, Slot::Literal(1), Slot::Unset),
                },
            ),
        );
        function.links.push(NodeLink::value(2, 1, 1, 1, ValueType::Uint64));

        let report = validate_function("F", &function, None);
        assert_eq!(kinds(&report), vec![(Some(2), Some(1), ValidationErrorKind::MissingConnection)]);
    }

    #[test]
    fn test_conflicting_links_are_reported_once_per_port() {
        let mut function = FunctionRecord::new(false);
        function.nodes.insert(2, Node::new("goto", NodeData::Goto));
        function.links.push(NodeLink::flow(0, 0, 2, 0));
        function.links.push(NodeLink::flow(2, 1, 1, 0));

        let report = validate_function("F", &function, None);
        assert!(!report.valid);
        assert_eq!(kinds(&report), vec![(Some(0), Some(0), ValidationErrorKind::ConflictingLinks)]);
    }

    #[test]
    fn test_link_to_missing_node_is_an_invalid_path() {
        let mut function = FunctionRecord::new(false);
        function.nodes.insert(2, Node::new("goto", NodeData::Goto));
        function.links = vec![NodeLink::flow(0, 0, 2, 0), NodeLink::flow(2, 1, 9, 0)];

        let report = validate_function("F", &function, None);
        assert!(kinds(&report).contains(&(Some(2), Some(1), ValidationErrorKind::InvalidPath)));
        assert_eq!(dangling_links(&function), vec![NodeLink::flow(2, 1, 9, 0)]);
    }

    #[test]
    fn test_unknown_names_are_reported() {
        let mut function = FunctionRecord::new(false);
        function.vars.insert("total".into(), Declaration::new(ValueType::Uint64));
        function.nodes.insert(2, Node::new("arg", NodeData::argument("missing")));
        function.nodes.insert(3, Node::new("var", NodeData::variable("total")));
        function.nodes.insert(4, Node::new("call", NodeData::process("nowhere")));

        let mut functions = Functions::new();
        functions.insert("F".into(), function.clone());

        let report = validate_function("F", &function, Some(&functions));
        assert_eq!(
            kinds(&report),
            vec![
                (Some(2), None, ValidationErrorKind::UnknownReference { name: "missing".into() }),
                (Some(4), None, ValidationErrorKind::UnknownReference { name: "nowhere".into() }),
            ]
        );
    }

    #[test]
    fn test_loop_is_a_warning() {
        // Start -> IF (1 == 1) THEN goto -> back to IF
        let mut function = FunctionRecord::new(false);
        function.nodes.remove(&1);
        function.links.clear();
        function.nodes.insert(1, Node::new("if", NodeData::Control { control: Control::If }));
        function.nodes.insert(2, Node::new("goto", NodeData::Goto));
        function.nodes.insert(
            3,
            Node::new(
                "cond",
                NodeData::Condition {
                    condition: Condition::uint64(Uint64Comparator::Equals, Slot::Literal(1), Slot::Literal(1)),
                },
            ),
        );
        function.links = vec![
            NodeLink::flow(0, 0, 1, 0),
            NodeLink::value(3, 1, 1, 1, ValueType::Uint64),
            NodeLink::flow(1, 2, 2, 0),
            NodeLink::flow(2, 1, 1, 0),
        ];

        let report = validate_function("F", &function, None);
        assert!(report.valid);
        assert_eq!(kinds(&report), vec![(Some(1), None, ValidationErrorKind::Cycle)]);
        assert_eq!(report.warnings().count(), 1);
    }

    #[test]
    fn test_incompatible_link_is_reported() {
        let mut function = FunctionRecord::new(false);
        function.args.insert("name".into(), Declaration::new(ValueType::String));
        function.nodes.insert(1, Node::new("End", NodeData::return_linked(ValueType::Uint64)));
        function.links.push(NodeLink::value(0, 1, 1, 1, ValueType::String));

        let report = validate_function("F", &function, None);
        assert!(!report.valid);
        assert!(matches!(
            report.errors[0].kind,
            ValidationErrorKind::IncompatibleLink { .. }
        ));
    }

    #[test]
    fn test_project_report_is_flattened() {
        let mut functions = Functions::new();
        functions.insert("A".into(), FunctionRecord::new(false));
        let mut broken = FunctionRecord::new(true);
        broken.nodes.insert(1, Node::new("End", NodeData::return_linked(ValueType::Uint64)));
        functions.insert("b".into(), broken);

        let report = validate_functions(&functions);
        assert!(!report.valid);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].function, "b");
        assert_eq!(report.errors[0].to_string(), "b, node 1, port 1: required port is not connected");
    }
}
