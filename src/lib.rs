//! A compiler for a small C-like language targeting NASM x86-64 on Linux.
//!
//! The pipeline is `lexer` → `parser` → `irgen` → `codegen`; `toolchain`
//! assembles, links and runs the result.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod ir;
pub mod irgen;
pub mod lexer;
pub mod parser;
pub mod serialize;
pub mod token;
pub mod toolchain;

use std::path::Path;

use tracing::info;

use crate::{
    ast::Block,
    error::CompileError,
    ir::GeneratedProgram,
    lexer::Lexer,
    token::Token,
    toolchain::{RunReport, Toolchain},
};

/// Every artifact produced while compiling one source text.
#[derive(Debug, Clone)]
pub struct Compilation {
    pub tokens: Vec<Token>,
    pub ast: Block,
    pub program: GeneratedProgram,
    pub asm: String,
}

pub fn compile_source(src: &str) -> Result<Compilation, CompileError> {
    let tokens = Lexer::new(src).tokenize()?;
    let ast = parser::parse(tokens.clone())?;
    let program = irgen::lower(&ast)?;
    let asm = codegen::emit(&program);
    info!(
        tokens = tokens.len(),
        instructions = program.instructions.len(),
        "compiled source"
    );
    Ok(Compilation {
        tokens,
        ast,
        program,
        asm,
    })
}

/// Generates assembly from IR saved by `serialize::save`.
pub fn compile_ir(path: &Path) -> Result<(GeneratedProgram, String), CompileError> {
    let program = serialize::load(path)?;
    let asm = codegen::emit(&program);
    Ok((program, asm))
}

/// Assembles, links and executes the assembly at `asm`.
pub fn assemble_and_run(asm: &Path, toolchain: &Toolchain) -> Result<RunReport, CompileError> {
    Ok(toolchain.build(asm, true)?)
}
