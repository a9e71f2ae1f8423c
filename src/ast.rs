use std::fmt::{self, Write};

use crate::token::{Token, VarType};

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(Number),
    Ident(Ident),
    Str(StrLit),
    UnaryOp(UnaryOp),
    BinOp(BinOp),
    Assign(Assignment),
    Decl(Declaration),
    Block(Block),
    If(If),
    While(While),
    Print(Print),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Number {
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ident {
    pub token: Token,
}

/// Only valid as the direct operand of a `cout` statement.
#[derive(Debug, Clone, PartialEq)]
pub struct StrLit {
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryOp {
    pub operator: Token,
    pub argument: Box<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinOp {
    pub left: Box<Node>,
    pub right: Box<Node>,
    pub operator: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub identifier: Token,
    pub expression: Box<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    pub typ: VarType,
    pub identifier: Token,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub body: Vec<Node>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct If {
    pub condition: Box<Node>,
    pub then_branch: Block,
    pub else_branch: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct While {
    pub condition: Box<Node>,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Print {
    pub value: Box<Node>,
}

impl Node {
    fn dump(&self, indent: usize, out: &mut String) -> fmt::Result {
        let pad = "  ".repeat(indent);
        match self {
            Node::Number(n) => writeln!(out, "{}Number({})", pad, n.token.value),
            Node::Ident(id) => writeln!(out, "{}Identifier({})", pad, id.token.value),
            Node::Str(s) => writeln!(out, "{}String({:?})", pad, s.token.value),
            Node::UnaryOp(un) => {
                writeln!(out, "{}UnaryOp({})", pad, un.operator.value)?;
                un.argument.dump(indent + 1, out)
            }
            Node::BinOp(bin) => {
                writeln!(out, "{}BinOp({})", pad, bin.operator.value)?;
                bin.left.dump(indent + 1, out)?;
                bin.right.dump(indent + 1, out)
            }
            Node::Assign(asg) => {
                writeln!(out, "{}Assignment({})", pad, asg.identifier.value)?;
                asg.expression.dump(indent + 1, out)
            }
            Node::Decl(decl) => writeln!(
                out,
                "{}Declaration(type={}, name={})",
                pad, decl.typ, decl.identifier.value
            ),
            Node::Print(p) => {
                writeln!(out, "{}Print", pad)?;
                p.value.dump(indent + 1, out)
            }
            Node::Block(block) => block.dump(indent, out),
            Node::If(i) => {
                writeln!(out, "{}If", pad)?;
                writeln!(out, "{}Condition:", pad)?;
                i.condition.dump(indent + 1, out)?;
                writeln!(out, "{}Then:", pad)?;
                i.then_branch.dump(indent + 1, out)?;
                if let Some(else_branch) = &i.else_branch {
                    writeln!(out, "{}Else:", pad)?;
                    else_branch.dump(indent + 1, out)?;
                }
                Ok(())
            }
            Node::While(w) => {
                writeln!(out, "{}While", pad)?;
                writeln!(out, "{}Condition:", pad)?;
                w.condition.dump(indent + 1, out)?;
                writeln!(out, "{}Body:", pad)?;
                w.body.dump(indent + 1, out)
            }
        }
    }
}

impl Block {
    fn dump(&self, indent: usize, out: &mut String) -> fmt::Result {
        writeln!(out, "{}Block", "  ".repeat(indent))?;
        for stmt in &self.body {
            stmt.dump(indent + 1, out)?;
        }
        Ok(())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.dump(0, &mut out)?;
        f.write_str(&out)
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.dump(0, &mut out)?;
        f.write_str(&out)
    }
}
