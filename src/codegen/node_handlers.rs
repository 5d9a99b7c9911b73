//! # Node-Specific Handlers
//!
//! Code synthesis for each node kind. A handler reads the already
//! synthesized outputs of its upstream nodes through [`NodeContext`] and
//! returns its own statements plus the expressions it offers downstream,
//! keyed by output port.

use super::listing::Statement;
use super::Diagnostic;
use crate::graph::ports::{
    CONDITION_IN, ELSE_OUT, END_VALUE_IN, LEFT_OPERAND_IN, LET_VALUE_IN, PROCESS_FIRST_ARG,
    RESULT_OUT, RIGHT_OPERAND_IN, START_FIRST_ARG, THEN_OUT,
};
use crate::graph::{
    Control, End, FunctionCall, FunctionRecord, Functions, Let, Node, NodeData, NodeId, NodeLink,
    Port,
};
use std::collections::{BTreeMap, HashMap};

/// An expression offered on an output port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    pub text: String,
    /// Infix expression that needs parentheses when used as an operand.
    pub compound: bool,
}

impl Expr {
    pub fn atom(text: impl Into<String>) -> Self {
        Self { text: text.into(), compound: false }
    }

    pub fn compound(text: impl Into<String>) -> Self {
        Self { text: text.into(), compound: true }
    }

    fn as_operand(&self) -> String {
        if self.compound {
            format!("({})", self.text)
        } else {
            self.text.clone()
        }
    }
}

pub type Outputs = BTreeMap<Port, Expr>;

#[derive(Debug, Default)]
pub struct Synthesized {
    pub statements: Vec<Statement>,
    pub outputs: Outputs,
}

impl Synthesized {
    fn statement(statement: Statement) -> Self {
        Self { statements: vec![statement], outputs: Outputs::new() }
    }

    fn output(port: Port, expr: Expr) -> Self {
        Self { statements: Vec::new(), outputs: Outputs::from([(port, expr)]) }
    }
}

/// What a handler may see while synthesizing one node.
pub struct NodeContext<'a> {
    pub id: NodeId,
    pub function: &'a FunctionRecord,
    pub processes: Option<&'a Functions>,
    pub synthesized: &'a HashMap<NodeId, Outputs>,
    pub diagnostics: &'a mut Vec<Diagnostic>,
}

impl<'a> NodeContext<'a> {
    fn incoming(&self, port: Port) -> Option<&'a NodeLink> {
        let function: &'a FunctionRecord = self.function;
        function
            .links
            .iter()
            .find(|l| l.to.id == self.id && l.to.input == port)
    }

    fn outgoing(&self) -> impl Iterator<Item = &'a NodeLink> + 'a {
        let (id, function): (NodeId, &'a FunctionRecord) = (self.id, self.function);
        function.links.iter().filter(move |l| l.from.id == id)
    }

    fn upstream(&self, link: &NodeLink) -> Option<Expr> {
        self.synthesized
            .get(&link.from.id)
            .and_then(|outputs| outputs.get(&link.from.output))
            .cloned()
    }

    /// Expression arriving on `port`, recording a diagnostic when there is none.
    fn input(&mut self, port: Port) -> Option<Expr> {
        let expr = self.incoming(port).and_then(|link| self.upstream(link));
        if expr.is_none() {
            tracing::debug!("[CODEGEN] Node {} has no expression on input {}", self.id, port);
            self.diagnostics.push(Diagnostic::MissingConnection { node: self.id, port });
        }
        expr
    }

    /// Literal if set, otherwise the linked expression (empty when missing).
    fn value(&mut self, literal: Option<String>, port: Port) -> String {
        match literal {
            Some(text) => text,
            None => self.input(port).map(|e| e.text).unwrap_or_default(),
        }
    }

    fn operand(&mut self, literal: Option<String>, port: Port) -> String {
        match literal {
            Some(text) => text,
            None => self.input(port).map(|e| e.as_operand()).unwrap_or_default(),
        }
    }
}

/// Dispatch on the node kind.
pub fn synthesize(ctx: &mut NodeContext<'_>, node: &Node) -> Synthesized {
    match &node.data {
        NodeData::Start => start(ctx),
        NodeData::Argument { name } => Synthesized::output(0, Expr::atom(name.as_str())),
        NodeData::Variable { variable } => variable_outputs(ctx, &variable.name),
        NodeData::Let { assignment } => let_statement(ctx, assignment),
        NodeData::End { end } => end_statement(ctx, end),
        NodeData::Operation { operation } => {
            let expr = if operation.is_unary() {
                let operand = ctx.operand(operation.left_literal(), LEFT_OPERAND_IN);
                format!("{}{}", operation.symbol(), operand)
            } else {
                infix(ctx, operation.left_literal(), operation.symbol(), operation.right_literal())
            };
            Synthesized::output(RESULT_OUT, Expr::compound(expr))
        }
        NodeData::Condition { condition } => {
            let expr = infix(ctx, condition.left_literal(), condition.symbol(), condition.right_literal());
            Synthesized::output(RESULT_OUT, Expr::compound(expr))
        }
        NodeData::Control { control } => branch(ctx, *control),
        NodeData::Goto => goto(ctx),
        NodeData::Function { function } => builtin_call(ctx, function),
        NodeData::Process { process } => process_call(ctx, &process.name),
    }
}

fn start(ctx: &mut NodeContext<'_>) -> Synthesized {
    let outputs = ctx
        .function
        .args
        .keys()
        .enumerate()
        .map(|(i, name)| (START_FIRST_ARG + i as Port, Expr::atom(name.as_str())))
        .collect();
    Synthesized { statements: Vec::new(), outputs }
}

/// A variable is readable from whichever port a link leaves it by.
fn variable_outputs(ctx: &mut NodeContext<'_>, name: &str) -> Synthesized {
    let outputs = ctx
        .outgoing()
        .map(|link| (link.from.output, Expr::atom(name)))
        .collect();
    Synthesized { statements: Vec::new(), outputs }
}

fn let_statement(ctx: &mut NodeContext<'_>, assignment: &Let) -> Synthesized {
    let value = match assignment.value.to_literal() {
        Some(literal) => literal,
        None => match ctx.input(LET_VALUE_IN) {
            Some(expr) => expr.text,
            None => return Synthesized::default(),
        },
    };
    Synthesized::statement(Statement::text(format!("LET {} = {}", assignment.name, value)))
}

fn end_statement(ctx: &mut NodeContext<'_>, end: &End) -> Synthesized {
    let text = match end {
        End::Panic => "PANIC".to_string(),
        End::Return { value, .. } => {
            let literal = value.as_literal().map(|v| v.to_literal());
            let value = ctx.value(literal, END_VALUE_IN);
            if value.is_empty() {
                "RETURN".to_string()
            } else {
                format!("RETURN {}", value)
            }
        }
    };
    Synthesized::statement(Statement::text(text))
}

fn infix(ctx: &mut NodeContext<'_>, left: Option<String>, symbol: &str, right: Option<String>) -> String {
    let left = ctx.operand(left, LEFT_OPERAND_IN);
    let right = ctx.operand(right, RIGHT_OPERAND_IN);
    format!("{} {} {}", left, symbol, right)
}

fn flow_target(ctx: &NodeContext<'_>, port: Port) -> Option<NodeId> {
    ctx.outgoing()
        .find(|l| l.is_flow() && l.from.output == port)
        .map(|l| l.to.id)
}

/// `IF (<cond>) THEN GOTO <then> [ELSE GOTO <else>]`
fn branch(ctx: &mut NodeContext<'_>, control: Control) -> Synthesized {
    let then_target = match flow_target(ctx, THEN_OUT) {
        Some(target) => target,
        None => {
            ctx.diagnostics.push(Diagnostic::MissingConnection { node: ctx.id, port: THEN_OUT });
            return Synthesized::default();
        }
    };
    let condition = ctx.value(None, CONDITION_IN);

    let mut statement = Statement::text(format!("IF ({}) THEN GOTO ", condition));
    statement.push_jump(then_target);
    if control == Control::IfElse {
        if let Some(else_target) = flow_target(ctx, ELSE_OUT) {
            statement.push_text(" ELSE GOTO ").push_jump(else_target);
        }
    }
    Synthesized::statement(statement)
}

fn goto(ctx: &mut NodeContext<'_>) -> Synthesized {
    match ctx.outgoing().find(|l| l.is_flow()) {
        Some(link) => {
            let mut statement = Statement::text("GOTO ");
            statement.push_jump(link.to.id);
            Synthesized::statement(statement)
        }
        None => Synthesized::default(),
    }
}

fn builtin_call(ctx: &mut NodeContext<'_>, call: &FunctionCall) -> Synthesized {
    let base = call.arg_base();
    let args: Vec<String> = call
        .args
        .values()
        .enumerate()
        .map(|(i, slot)| ctx.value(slot.to_literal(), base + i as Port))
        .collect();

    let expr = format!("{}({})", call.name, args.join(", "));
    let mut synthesized = Synthesized::output(call.result_port(), Expr::atom(expr.as_str()));
    if call.as_process {
        synthesized.statements.push(Statement::text(expr));
    }
    synthesized
}

/// Callee arguments bind by position; without the callee's record the
/// linked inputs are taken in port order.
fn process_call(ctx: &mut NodeContext<'_>, name: &str) -> Synthesized {
    let callee = ctx.processes.and_then(|functions| functions.get(name));

    let args: Vec<String> = match callee {
        Some(callee) => (0..callee.args.len())
            .map(|i| ctx.value(None, PROCESS_FIRST_ARG + i as Port))
            .collect(),
        None => {
            let mut inputs: Vec<&NodeLink> = ctx
                .function
                .links
                .iter()
                .filter(|l| l.to.id == ctx.id && !l.is_flow())
                .collect();
            inputs.sort_by_key(|l| l.to.input);
            inputs
                .into_iter()
                .map(|l| ctx.upstream(l).map(|e| e.text).unwrap_or_default())
                .collect()
        }
    };

    let expr = Expr::atom(format!("{}({})", name, args.join(", ")));
    let mut outputs: Outputs = ctx
        .outgoing()
        .filter(|l| !l.is_flow())
        .map(|l| (l.from.output, expr.clone()))
        .collect();

    if outputs.is_empty() {
        return Synthesized::statement(Statement::text(expr.text));
    }
    if let Some(callee) = callee {
        outputs.insert(PROCESS_FIRST_ARG + callee.args.len() as Port, expr);
    }
    Synthesized { statements: Vec::new(), outputs }
}
