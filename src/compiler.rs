//! # DVM Blueprint Compiler
//!
//! Main entry points for compiling function graphs to DVM-BASIC.

use crate::codegen::{DvmCodeGenerator, GeneratedFunction, GeneratedProject};
use crate::error::{GraphError, Result};
use crate::graph::{FunctionRecord, Functions, Project};
use crate::metadata::get_builtin_metadata;
use crate::options::CompileOptions;
use crate::validation::{validate_function, validate_functions, ValidationReport};
use serde::Serialize;

/// Result of a successful project compilation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledProject {
    pub output: GeneratedProject,
    /// Findings of the validation phase. Only warnings when the project was
    /// required to be valid.
    pub report: ValidationReport,
}

impl CompiledProject {
    pub fn code(&self) -> &str {
        &self.output.code
    }
}

/// Compile a single function with the default options.
///
/// Process calls inside the function bind their arguments in input port
/// order since no callee records are available.
///
/// # Examples
///
/// ```rust
/// use dbgc::{compile_function, FunctionRecord};
///
/// let function = FunctionRecord::new(false);
/// let generated = compile_function("Initialize", &function).unwrap();
/// assert_eq!(generated.code, "Function Initialize() Uint64\n1\tRETURN 0\nEnd Function");
/// ```
pub fn compile_function(name: &str, function: &FunctionRecord) -> Result<GeneratedFunction> {
    compile_function_with_options(name, function, &CompileOptions::default())
}

pub fn compile_function_with_options(
    name: &str,
    function: &FunctionRecord,
    options: &CompileOptions,
) -> Result<GeneratedFunction> {
    tracing::info!("[DBGC] Compiling function {} ({} nodes, {} links)",
        name,
        function.nodes.len(),
        function.links.len());

    tracing::info!("[DBGC] Phase 1: Validating graph...");
    let report = validate_function(name, function, None);
    gate(&report, options)?;

    tracing::info!("[DBGC] Phase 2: Generating DVM-BASIC...");
    let generated = DvmCodeGenerator::new(name, function)
        .with_first_line(options.first_line)
        .generate();
    log_diagnostics(&generated);

    tracing::info!("[DBGC] Function {} complete ({} bytes)", name, generated.code.len());
    Ok(generated)
}

/// Compile every function of a project with the default options.
///
/// # Examples
///
/// ```rust
/// use dbgc::{compile_project, Project};
///
/// let project = Project::new("Token");
/// let compiled = compile_project(&project).unwrap();
/// assert!(compiled.code().starts_with("Function Initialize() Uint64\n"));
/// ```
pub fn compile_project(project: &Project) -> Result<CompiledProject> {
    compile_functions_with_options(&project.functions, &CompileOptions::default())
}

pub fn compile_project_with_options(project: &Project, options: &CompileOptions) -> Result<CompiledProject> {
    compile_functions_with_options(&project.functions, options)
}

pub fn compile_functions_with_options(functions: &Functions, options: &CompileOptions) -> Result<CompiledProject> {
    tracing::info!("[DBGC] Starting project compilation");
    tracing::info!("[DBGC] {} functions", functions.len());

    // Phase 1: Built-in catalog
    tracing::info!("[DBGC] Phase 1: Loading built-in catalog...");
    tracing::info!("[DBGC] Loaded {} built-in functions", get_builtin_metadata().len());

    // Phase 2: Validation
    tracing::info!("[DBGC] Phase 2: Validating graphs...");
    let report = validate_functions(functions);
    gate(&report, options)?;

    // Phase 3: Generation
    tracing::info!("[DBGC] Phase 3: Generating DVM-BASIC...");
    let generated: Vec<GeneratedFunction> = functions
        .iter()
        .map(|(name, function)| {
            DvmCodeGenerator::new(name, function)
                .with_processes(functions)
                .with_first_line(options.first_line)
                .generate()
        })
        .collect();
    generated.iter().for_each(log_diagnostics);

    // Phase 4: Assembly
    tracing::info!("[DBGC] Phase 4: Assembling listing...");
    let output = GeneratedProject::assemble(generated, &options.function_separator);

    tracing::info!("[DBGC] Code generation complete ({} bytes)", output.code.len());
    tracing::info!("[DBGC] Compilation successful!");

    Ok(CompiledProject { output, report })
}

fn gate(report: &ValidationReport, options: &CompileOptions) -> Result<()> {
    for warning in report.warnings() {
        tracing::warn!("[DBGC] {}", warning);
    }

    if report.valid {
        return Ok(());
    }

    let errors: Vec<_> = report.errors.iter().filter(|e| e.is_error()).cloned().collect();
    if options.require_valid {
        tracing::error!("[DBGC] Validation failed with {} errors", errors.len());
        return Err(GraphError::InvalidGraph(errors));
    }

    tracing::warn!("[DBGC] Generating despite {} validation errors", errors.len());
    Ok(())
}

fn log_diagnostics(generated: &GeneratedFunction) {
    for diagnostic in &generated.diagnostics {
        tracing::warn!("[CODEGEN] {}: {}", generated.name, diagnostic);
    }
}
