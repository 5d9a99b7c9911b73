//! # DVM Blueprint Graph Compiler (DBGC)
//!
//! Compiles visual node graphs of DVM smart contract functions into
//! line-numbered DVM-BASIC.
//!
//! A [`Project`] holds named functions. Each function is a graph of typed
//! nodes (control flow, expressions, assignments, built-in and user calls)
//! joined by flow and value links. Graphs change only through the
//! [`reducers`], and compile through [`compile_project`].
//!
//! ## Quick Start
//!
//! ```rust
//! use dbgc::{compile_project, Project};
//!
//! let project = Project::new("Token");
//! match compile_project(&project) {
//!     Ok(compiled) => println!("{}", compiled.code()),
//!     Err(e) => eprintln!("Compilation failed: {}", e),
//! }
//! ```
//!
//! ## Architecture
//!
//! DBGC follows a multi-phase compilation pipeline:
//!
//! 1. **Catalog Loading** - Signatures of the DVM built-in functions
//! 2. **Validation** - Structural checks on every function graph
//! 3. **Ordering** - Depth-first post-order over flow and value links
//! 4. **Code Generation** - Per-node statements and expressions, then line
//!    numbering with jump targets resolved
//! 5. **Assembly** - Function listings joined in project order

pub mod codegen;
pub mod compiler;
pub mod error;
pub mod graph;
pub mod metadata;
pub mod options;
pub mod reducers;
pub mod validation;


// Re-export the main compilation API
pub use compiler::{
    compile_function,
    compile_function_with_options,
    compile_functions_with_options,
    compile_project,
    compile_project_with_options,
    CompiledProject,
};

pub use codegen::{
    generate_function, generate_project, Diagnostic, GeneratedFunction, GeneratedProject,
};
pub use error::{GraphError, Result};
pub use graph::{
    Connector, FunctionRecord, Functions, Node, NodeData, NodeId, NodeLink, Port, Project,
    ValueType,
};
pub use metadata::{get_builtin_metadata, lookup_builtin, DvmFunction};
pub use options::CompileOptions;
pub use reducers::{reduce_links, reduce_nodes, LinksAction, NodesAction};
pub use validation::{validate_functions, ValidationError, ValidationReport};
