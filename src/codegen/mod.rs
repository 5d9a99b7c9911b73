//! # DVM-BASIC Code Generation
//!
//! Pure generation entry points. Generation never fails: a degenerate graph
//! yields a partial listing and [`Diagnostic`]s describing what is missing.

mod dvm_codegen;
mod listing;
mod node_handlers;

pub use dvm_codegen::DvmCodeGenerator;
pub use listing::{Fragment, Listing, Statement, UNRESOLVED_LINE};
pub use node_handlers::Expr;

use crate::graph::{FunctionRecord, Functions, NodeId, Port};
use serde::Serialize;
use std::fmt;

/// Separator placed between functions in a project listing.
pub const FUNCTION_SEPARATOR: &str = "\n\n";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Diagnostic {
    /// An input needed an upstream expression and had none.
    MissingConnection { node: NodeId, port: Port },
    /// Neither a jump target nor anything after it emitted a line.
    UnresolvedJump { node: NodeId, target: NodeId },
    /// `Variable` typed declarations cannot be DIM'd.
    UntypedVariable { name: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::MissingConnection { node, port } => {
                write!(f, "node {}: no expression on input {}", node, port)
            }
            Diagnostic::UnresolvedJump { node, target } => write!(
                f,
                "node {}: jump target {} has no line to land on, wrote {}",
                node, target, UNRESOLVED_LINE
            ),
            Diagnostic::UntypedVariable { name } => {
                write!(f, "variable '{}' has no concrete type and was not declared", name)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedFunction {
    pub name: String,
    pub code: String,
    pub diagnostics: Vec<Diagnostic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedProject {
    pub code: String,
    pub functions: Vec<GeneratedFunction>,
}

impl GeneratedProject {
    /// Join the listings in order.
    pub fn assemble(functions: Vec<GeneratedFunction>, separator: &str) -> Self {
        let code = functions
            .iter()
            .map(|f| f.code.as_str())
            .collect::<Vec<_>>()
            .join(separator);
        Self { code, functions }
    }

    pub fn diagnostics(&self) -> impl Iterator<Item = (&str, &Diagnostic)> {
        self.functions
            .iter()
            .flat_map(|f| f.diagnostics.iter().map(move |d| (f.name.as_str(), d)))
    }
}

/// Generate one function on its own. Process callees are unknown here, so
/// their arguments are taken in input port order.
pub fn generate_function(name: &str, function: &FunctionRecord) -> GeneratedFunction {
    DvmCodeGenerator::new(name, function).generate()
}

/// Generate every function in collection order and join them with a blank line.
pub fn generate_project(functions: &Functions) -> GeneratedProject {
    let generated = functions
        .iter()
        .map(|(name, function)| {
            DvmCodeGenerator::new(name, function)
                .with_processes(functions)
                .generate()
        })
        .collect();
    GeneratedProject::assemble(generated, FUNCTION_SEPARATOR)
}
