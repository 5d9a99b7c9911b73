//! # Listing
//!
//! Two-pass emission. Statements are collected with jump targets kept as
//! node ids; [`Listing::render`] numbers the lines and swaps every target
//! for the start line of its node.

use super::Diagnostic;
use crate::graph::NodeId;
use std::collections::HashMap;

/// Line number written for a jump with no line to land on.
pub const UNRESOLVED_LINE: usize = 0;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Fragment {
    Text(String),
    /// Start line of the given node.
    Jump(NodeId),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Statement {
    fragments: Vec<Fragment>,
}

impl Statement {
    pub fn text(text: impl Into<String>) -> Self {
        Self { fragments: vec![Fragment::Text(text.into())] }
    }

    pub fn push_text(&mut self, text: &str) -> &mut Self {
        match self.fragments.last_mut() {
            Some(Fragment::Text(last)) => last.push_str(text),
            _ => self.fragments.push(Fragment::Text(text.to_string())),
        }
        self
    }

    pub fn push_jump(&mut self, target: NodeId) -> &mut Self {
        self.fragments.push(Fragment::Jump(target));
        self
    }

    fn render(
        &self,
        owner: Option<NodeId>,
        start_lines: &HashMap<NodeId, usize>,
        end_line: usize,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> String {
        let mut out = String::new();
        for fragment in &self.fragments {
            match fragment {
                Fragment::Text(text) => out.push_str(text),
                Fragment::Jump(target) => {
                    let line = match start_lines.get(target).filter(|line| **line < end_line) {
                        Some(line) => *line,
                        None => {
                            tracing::warn!("[CODEGEN] Jump to node {} has no line to land on", target);
                            diagnostics.push(Diagnostic::UnresolvedJump {
                                node: owner.unwrap_or(*target),
                                target: *target,
                            });
                            UNRESOLVED_LINE
                        }
                    };
                    out.push_str(&line.to_string());
                }
            }
        }
        out
    }
}

#[derive(Debug, Clone)]
struct Line {
    owner: Option<NodeId>,
    statement: Statement,
}

/// Numbered body of one function between its header and footer.
#[derive(Debug, Clone)]
pub struct Listing {
    header: String,
    first_line: usize,
    lines: Vec<Line>,
    start_lines: HashMap<NodeId, usize>,
}

impl Listing {
    pub fn new(header: impl Into<String>, first_line: usize) -> Self {
        Self {
            header: header.into(),
            first_line,
            lines: Vec::new(),
            start_lines: HashMap::new(),
        }
    }

    pub fn next_line(&self) -> usize {
        self.first_line + self.lines.len()
    }

    /// A numbered line not produced by any node, e.g. a `DIM`.
    pub fn push_preamble(&mut self, text: impl Into<String>) {
        self.lines.push(Line { owner: None, statement: Statement::text(text) });
    }

    /// Append the statements of `node`. Its start line is the next line, so
    /// a node that emits nothing lands on whatever is emitted after it.
    pub fn push_node(&mut self, node: NodeId, statements: Vec<Statement>) {
        self.start_lines.insert(node, self.next_line());
        self.lines.extend(
            statements
                .into_iter()
                .map(|statement| Line { owner: Some(node), statement }),
        );
    }

    pub fn render(&self, diagnostics: &mut Vec<Diagnostic>) -> String {
        let mut out = String::new();
        out.push_str(&self.header);
        out.push('\n');

        let end_line = self.next_line();
        for (offset, line) in self.lines.iter().enumerate() {
            let text = line.statement.render(line.owner, &self.start_lines, end_line, diagnostics);
            out.push_str(&format!("{}\t{}\n", self.first_line + offset, text));
        }

        out.push_str("End Function");
        out
    }
}
