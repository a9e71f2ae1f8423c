use std::{collections::BTreeMap, mem::take};

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{Block, Node},
    ir::{ArithOp, GeneratedProgram, Instruction, Operand, PrintArg, RelOp},
    token::{TokenType, VarType},
};

/// Lowering hit a tree the parser never produces.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IRGenError {
    #[error("InternalError: operator '{operator}' used as a value (line: {line})")]
    NotAValue { operator: String, line: usize },
    #[error("InternalError: string literal used as a value (line: {line})")]
    StringAsValue { line: usize },
    #[error("InternalError: invalid integer literal '{text}' (line: {line})")]
    InvalidLiteral { text: String, line: usize },
    #[error("InternalError: {node} node in expression position")]
    NotAnExpression { node: &'static str },
    #[error("InternalError: {node} node in statement position")]
    NotAStatement { node: &'static str },
}

pub fn lower(program: &Block) -> Result<GeneratedProgram, IRGenError> {
    IRGen::new().compile(program)
}

fn node_name(node: &Node) -> &'static str {
    match node {
        Node::Number(_) => "number",
        Node::Ident(_) => "identifier",
        Node::Str(_) => "string",
        Node::UnaryOp(_) => "unary operator",
        Node::BinOp(_) => "binary operator",
        Node::Assign(_) => "assignment",
        Node::Decl(_) => "declaration",
        Node::Block(_) => "block",
        Node::If(_) => "if",
        Node::While(_) => "while",
        Node::Print(_) => "print",
    }
}

#[derive(Debug, Default)]
struct Context {
    pub instructions: Vec<Instruction>,
    pub tmp_cnt: usize,
    pub label_cnt: usize,
    pub identifiers: BTreeMap<String, VarType>,
    pub temporaries: BTreeMap<usize, String>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_tmp(&mut self) -> Operand {
        let id = self.tmp_cnt;
        self.tmp_cnt += 1;
        self.temporaries.insert(id, format!("tmp_{}", id));
        Operand::Temp(id)
    }

    pub fn new_label(&mut self) -> String {
        self.label_cnt += 1;
        format!("L{}", self.label_cnt - 1)
    }

    pub fn emit(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    pub fn label(&mut self, name: &str) {
        self.emit(Instruction::Label(name.to_string()));
    }

    pub fn jump(&mut self, target: &str) {
        self.emit(Instruction::Jump(target.to_string()));
    }
}

#[derive(Debug, Default)]
pub struct IRGen {
    constants: BTreeMap<String, String>,
    str_cnt: usize,
}

impl IRGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn compile(mut self, program: &Block) -> Result<GeneratedProgram, IRGenError> {
        let mut ctx = Context::new();
        self.compile_block(program, &mut ctx)?;
        debug!(
            instructions = ctx.instructions.len(),
            temporaries = ctx.tmp_cnt,
            labels = ctx.label_cnt,
            strings = self.str_cnt,
            "lowered program"
        );
        Ok(GeneratedProgram {
            instructions: take(&mut ctx.instructions),
            identifiers: take(&mut ctx.identifiers),
            constants: take(&mut self.constants),
            temporaries: take(&mut ctx.temporaries),
        })
    }

    fn intern_str(&mut self, text: &str) -> String {
        let sym = format!("S{}", self.str_cnt);
        self.str_cnt += 1;
        self.constants.insert(sym.clone(), text.to_string());
        sym
    }

    fn compile_block(&mut self, block: &Block, ctx: &mut Context) -> Result<(), IRGenError> {
        for stmt in &block.body {
            self.compile_stmt(stmt, ctx)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, node: &Node, ctx: &mut Context) -> Result<(), IRGenError> {
        match node {
            Node::Decl(decl) => {
                ctx.identifiers
                    .insert(decl.identifier.value.clone(), decl.typ);
            }
            Node::Assign(asg) => {
                let value = self.compile_expr(&asg.expression, ctx)?;
                ctx.emit(Instruction::Assign {
                    dst: Operand::Var(asg.identifier.value.clone()),
                    left: value,
                    rhs: None,
                });
            }
            Node::Print(p) => {
                let arg = match p.value.as_ref() {
                    Node::Str(s) => PrintArg::Str(self.intern_str(&s.token.value)),
                    value => PrintArg::Int(self.compile_expr(value, ctx)?),
                };
                ctx.emit(Instruction::Print(arg));
            }
            Node::Block(block) => self.compile_block(block, ctx)?,
            Node::If(i) => {
                let label_then = ctx.new_label();
                let label_end = ctx.new_label();
                match &i.else_branch {
                    Some(else_branch) => {
                        let label_else = ctx.new_label();
                        self.emit_condition(&i.condition, &label_then, &label_else, ctx)?;
                        ctx.label(&label_then);
                        self.compile_block(&i.then_branch, ctx)?;
                        ctx.jump(&label_end);
                        ctx.label(&label_else);
                        self.compile_block(else_branch, ctx)?;
                        ctx.label(&label_end);
                    }
                    None => {
                        self.emit_condition(&i.condition, &label_then, &label_end, ctx)?;
                        ctx.label(&label_then);
                        self.compile_block(&i.then_branch, ctx)?;
                        ctx.label(&label_end);
                    }
                }
            }
            Node::While(w) => {
                let label_start = ctx.new_label();
                let label_body = ctx.new_label();
                let label_end = ctx.new_label();
                ctx.label(&label_start);
                self.emit_condition(&w.condition, &label_body, &label_end, ctx)?;
                ctx.label(&label_body);
                self.compile_block(&w.body, ctx)?;
                ctx.jump(&label_start);
                ctx.label(&label_end);
            }
            Node::Number(_) | Node::Ident(_) | Node::Str(_) | Node::UnaryOp(_) | Node::BinOp(_) => {
                return Err(IRGenError::NotAStatement {
                    node: node_name(node),
                });
            }
        }
        Ok(())
    }

    fn compile_expr(&mut self, node: &Node, ctx: &mut Context) -> Result<Operand, IRGenError> {
        match node {
            Node::Number(n) => {
                n.token
                    .value
                    .parse::<i64>()
                    .map(Operand::Const)
                    .map_err(|_| IRGenError::InvalidLiteral {
                        text: n.token.value.clone(),
                        line: n.token.line,
                    })
            }
            Node::Ident(id) => Ok(Operand::Var(id.token.value.clone())),
            Node::BinOp(bin) => {
                let op = ArithOp::from_token(bin.operator.token).ok_or_else(|| {
                    IRGenError::NotAValue {
                        operator: bin.operator.value.clone(),
                        line: bin.operator.line,
                    }
                })?;
                let left = self.compile_expr(&bin.left, ctx)?;
                let right = self.compile_expr(&bin.right, ctx)?;
                let res_tmp = ctx.new_tmp();
                ctx.emit(Instruction::Assign {
                    dst: res_tmp.clone(),
                    left,
                    rhs: Some((op, right)),
                });
                Ok(res_tmp)
            }
            Node::UnaryOp(un) => Err(IRGenError::NotAValue {
                operator: un.operator.value.clone(),
                line: un.operator.line,
            }),
            Node::Str(s) => Err(IRGenError::StringAsValue {
                line: s.token.line,
            }),
            Node::Assign(_)
            | Node::Decl(_)
            | Node::Block(_)
            | Node::If(_)
            | Node::While(_)
            | Node::Print(_) => Err(IRGenError::NotAnExpression {
                node: node_name(node),
            }),
        }
    }

    /// Branches to `on_true` or `on_false` depending on `cond`, never
    /// materialising a boolean. `&&` and `||` only reach their right operand
    /// through the intermediate label.
    fn emit_condition(
        &mut self,
        cond: &Node,
        on_true: &str,
        on_false: &str,
        ctx: &mut Context,
    ) -> Result<(), IRGenError> {
        match cond {
            Node::UnaryOp(un) if un.operator.token == TokenType::LOGNOT => {
                return self.emit_condition(&un.argument, on_false, on_true, ctx);
            }
            Node::BinOp(bin) if bin.operator.token == TokenType::COMPAND => {
                let mid = ctx.new_label();
                self.emit_condition(&bin.left, &mid, on_false, ctx)?;
                ctx.label(&mid);
                return self.emit_condition(&bin.right, on_true, on_false, ctx);
            }
            Node::BinOp(bin) if bin.operator.token == TokenType::COMPOR => {
                let mid = ctx.new_label();
                self.emit_condition(&bin.left, on_true, &mid, ctx)?;
                ctx.label(&mid);
                return self.emit_condition(&bin.right, on_true, on_false, ctx);
            }
            Node::BinOp(bin) => {
                if let Some(op) = RelOp::from_token(bin.operator.token) {
                    let left = self.compile_expr(&bin.left, ctx)?;
                    let right = self.compile_expr(&bin.right, ctx)?;
                    ctx.emit(Instruction::Compare {
                        left,
                        op,
                        right,
                        target: on_true.to_string(),
                    });
                    ctx.jump(on_false);
                    return Ok(());
                }
            }
            _ => {}
        }

        let value = self.compile_expr(cond, ctx)?;
        ctx.emit(Instruction::Compare {
            left: value,
            op: RelOp::Ne,
            right: Operand::Const(0),
            target: on_true.to_string(),
        });
        ctx.jump(on_false);
        Ok(())
    }
}
