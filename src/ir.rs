use std::{collections::BTreeMap, fmt};

use serde::{Deserialize, Serialize};

use crate::token::{TokenType, VarType};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operand {
    Const(i64),
    Var(String),
    Temp(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrintArg {
    Int(Operand),
    /// Symbol of an interned string constant.
    Str(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// `dst = left` when `rhs` is empty, `dst = left op right` otherwise.
    Assign {
        dst: Operand,
        left: Operand,
        rhs: Option<(ArithOp, Operand)>,
    },
    Label(String),
    Jump(String),
    /// Jumps to `target` when the relation holds, falls through otherwise.
    Compare {
        left: Operand,
        op: RelOp,
        right: Operand,
        target: String,
    },
    Print(PrintArg),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GeneratedProgram {
    pub instructions: Vec<Instruction>,
    pub identifiers: BTreeMap<String, VarType>,
    pub constants: BTreeMap<String, String>,
    pub temporaries: BTreeMap<usize, String>,
}

impl ArithOp {
    pub fn from_token(token: TokenType) -> Option<Self> {
        match token {
            TokenType::ADD => Some(ArithOp::Add),
            TokenType::SUB => Some(ArithOp::Sub),
            TokenType::MUL => Some(ArithOp::Mul),
            TokenType::DIV => Some(ArithOp::Div),
            TokenType::MOD => Some(ArithOp::Mod),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            ArithOp::Add => "+",
            ArithOp::Sub => "-",
            ArithOp::Mul => "*",
            ArithOp::Div => "/",
            ArithOp::Mod => "%",
        }
    }
}

impl RelOp {
    pub fn from_token(token: TokenType) -> Option<Self> {
        match token {
            TokenType::COMPEQ => Some(RelOp::Eq),
            TokenType::COMPNE => Some(RelOp::Ne),
            TokenType::COMPLT => Some(RelOp::Lt),
            TokenType::COMPLE => Some(RelOp::Le),
            TokenType::COMPGT => Some(RelOp::Gt),
            TokenType::COMPGE => Some(RelOp::Ge),
            _ => None,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            RelOp::Eq => "==",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }
}

impl PrintArg {
    pub fn kind(&self) -> VarType {
        match self {
            PrintArg::Int(_) => VarType::Int,
            PrintArg::Str(_) => VarType::Str,
        }
    }
}

impl GeneratedProgram {
    pub fn prints(&self, kind: VarType) -> bool {
        self.instructions
            .iter()
            .any(|inst| matches!(inst, Instruction::Print(arg) if arg.kind() == kind))
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Const(n) => write!(f, "{}", n),
            Operand::Var(name) => write!(f, "{}", name),
            Operand::Temp(id) => write!(f, "T{}", id),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Assign { dst, left, rhs } => match rhs {
                Some((op, right)) => {
                    write!(f, "  {} = {} {} {}", dst, left, op.symbol(), right)
                }
                None => write!(f, "  {} = {}", dst, left),
            },
            Instruction::Label(name) => write!(f, "{}:", name),
            Instruction::Jump(target) => write!(f, "  goto {}", target),
            Instruction::Compare {
                left,
                op,
                right,
                target,
            } => write!(f, "  if {} {} {} goto {}", left, op.symbol(), right, target),
            Instruction::Print(PrintArg::Int(operand)) => write!(f, "  print_int {}", operand),
            Instruction::Print(PrintArg::Str(sym)) => write!(f, "  print_string {}", sym),
        }
    }
}

impl fmt::Display for GeneratedProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.constants.is_empty() {
            writeln!(f, "[constants]")?;
            for (sym, text) in &self.constants {
                writeln!(f, "  {} = {:?}", sym, text)?;
            }
        }
        writeln!(f, "[code]")?;
        for inst in &self.instructions {
            writeln!(f, "{}", inst)?;
        }
        Ok(())
    }
}
