//! # DVM-BASIC Code Generator
//!
//! Linearizes one function graph into a numbered DVM-BASIC listing.

use super::listing::Listing;
use super::node_handlers::{synthesize, NodeContext, Outputs};
use super::{Diagnostic, GeneratedFunction};
use crate::graph::{topo_sort, FunctionRecord, Functions, NodeId, ValueType};
use std::collections::HashMap;

/// Generator for a single function.
///
/// Borrows the function for the duration of the call and never mutates it,
/// so generating twice from the same snapshot yields the same text.
pub struct DvmCodeGenerator<'a> {
    name: &'a str,
    function: &'a FunctionRecord,
    processes: Option<&'a Functions>,
    first_line: usize,
}

impl<'a> DvmCodeGenerator<'a> {
    pub fn new(name: &'a str, function: &'a FunctionRecord) -> Self {
        Self {
            name,
            function,
            processes: None,
            first_line: 1,
        }
    }

    /// Resolve Process callees against `functions` for positional binding.
    pub fn with_processes(mut self, functions: &'a Functions) -> Self {
        self.processes = Some(functions);
        self
    }

    pub fn with_first_line(mut self, first_line: usize) -> Self {
        self.first_line = first_line;
        self
    }

    pub fn generate(&self) -> GeneratedFunction {
        let mut diagnostics = Vec::new();

        let traversal = topo_sort(&self.function.nodes, &self.function.links);
        tracing::debug!(
            "[CODEGEN] {}: {} nodes in order, {} back edges",
            self.name,
            traversal.order.len(),
            traversal.back_edges.len()
        );

        let mut listing = Listing::new(self.header(), self.first_line);
        self.declare_variables(&mut listing, &mut diagnostics);

        let mut synthesized: HashMap<NodeId, Outputs> = HashMap::with_capacity(traversal.order.len());
        for id in traversal.order {
            let Some(node) = self.function.nodes.get(&id) else {
                continue;
            };

            let result = {
                let mut ctx = NodeContext {
                    id,
                    function: self.function,
                    processes: self.processes,
                    synthesized: &synthesized,
                    diagnostics: &mut diagnostics,
                };
                synthesize(&mut ctx, node)
            };

            tracing::debug!(
                "[CODEGEN] Node {} ({}): {} statements, {} outputs",
                id,
                node.data.kind(),
                result.statements.len(),
                result.outputs.len()
            );
            listing.push_node(id, result.statements);
            synthesized.insert(id, result.outputs);
        }

        let code = listing.render(&mut diagnostics);
        GeneratedFunction {
            name: self.name.to_string(),
            code,
            diagnostics,
        }
    }

    /// `Function <name>(<arg> <Type>, ...) <ReturnType>`
    fn header(&self) -> String {
        let args: Vec<String> = self
            .function
            .args
            .iter()
            .map(|(name, decl)| format!("{} {}", name, decl.value_type))
            .collect();
        format!("Function {}({}) {}", self.name, args.join(", "), self.function.returns)
    }

    /// One `DIM` line per concrete type, in declaration order.
    fn declare_variables(&self, listing: &mut Listing, diagnostics: &mut Vec<Diagnostic>) {
        for value_type in [ValueType::Uint64, ValueType::String] {
            let names: Vec<&str> = self
                .function
                .vars
                .iter()
                .filter(|(_, decl)| decl.value_type == value_type)
                .map(|(name, _)| name.as_str())
                .collect();
            if !names.is_empty() {
                listing.push_preamble(format!("DIM {} AS {}", names.join(", "), value_type));
            }
        }

        for (name, decl) in &self.function.vars {
            if decl.value_type == ValueType::Variable {
                tracing::warn!("[CODEGEN] {}: variable '{}' has no concrete type", self.name, name);
                diagnostics.push(Diagnostic::UntypedVariable { name: name.clone() });
            }
        }
    }
}
