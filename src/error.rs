use thiserror::Error;

use crate::{
    irgen::IRGenError, lexer::LexerError, parser::SyntaxError, serialize::SerializeError,
    toolchain::ToolchainError,
};

/// Any failure between reading the source and running the executable.
#[derive(Debug, Error)]
pub enum CompileError {
    #[error(transparent)]
    Lexer(#[from] LexerError),
    #[error(transparent)]
    Syntax(#[from] SyntaxError),
    #[error(transparent)]
    IRGen(#[from] IRGenError),
    #[error(transparent)]
    Toolchain(#[from] ToolchainError),
    #[error(transparent)]
    Serialize(#[from] SerializeError),
}

impl CompileError {
    /// The source line the error points at, for front-end failures.
    pub fn line(&self) -> Option<usize> {
        match self {
            CompileError::Lexer(e) => Some(e.line()),
            CompileError::Syntax(e) => Some(e.line),
            CompileError::IRGen(_)
            | CompileError::Toolchain(_)
            | CompileError::Serialize(_) => None,
        }
    }
}
