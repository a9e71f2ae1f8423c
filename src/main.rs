use std::{
    fs,
    path::PathBuf,
    process::ExitCode,
};

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueEnum};
use tracing::{Level, info, warn};

use tacc::{
    Compilation, assemble_and_run, compile_ir, compile_source, serialize,
    toolchain::{Toolchain, write_asm},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Emit {
    Tokens,
    Ast,
    Ir,
    Asm,
}

#[derive(Debug, Parser)]
#[command(name = "tacc", version, about = "Compile a small C-like language to x86-64 NASM")]
struct Cli {
    /// Source file, or a saved IR file with `--from-ir`
    input: PathBuf,

    /// Assembly output path
    #[arg(short, long, default_value = "output.asm")]
    output: PathBuf,

    /// Dump an intermediate stage to stdout
    #[arg(long, value_enum)]
    emit: Vec<Emit>,

    /// Write the lowered IR to this file
    #[arg(long, value_name = "PATH")]
    save_ir: Option<PathBuf>,

    /// Read `input` as saved IR instead of source
    #[arg(long)]
    from_ir: bool,

    /// Assemble, link and execute the output
    #[arg(long)]
    run: bool,

    #[arg(long, env = "TACC_ASSEMBLER", default_value = "nasm")]
    assembler: String,

    #[arg(long, env = "TACC_LINKER", default_value = "ld")]
    linker: String,

    /// More logging (repeatable)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    fn level(&self) -> Level {
        if self.quiet {
            return Level::ERROR;
        }
        match self.verbose {
            0 => Level::WARN,
            1 => Level::INFO,
            2 => Level::DEBUG,
            _ => Level::TRACE,
        }
    }

    fn toolchain(&self) -> Toolchain {
        Toolchain {
            assembler: self.assembler.clone(),
            linker: self.linker.clone(),
            ..Toolchain::for_output(&self.output)
        }
    }
}

fn dump(title: &str, body: &str) {
    println!("=== {} ===", title);
    print!("{}", body);
    if !body.ends_with('\n') {
        println!();
    }
}

fn from_source(cli: &Cli) -> Result<Compilation> {
    let src = fs::read_to_string(&cli.input)
        .with_context(|| format!("cannot read {}", cli.input.display()))?;
    let compilation = compile_source(&src)?;
    if cli.emit.contains(&Emit::Tokens) {
        let tokens = compilation
            .tokens
            .iter()
            .map(|tok| format!("{}\n", tok))
            .collect::<String>();
        dump("TOKENS", &tokens);
    }
    if cli.emit.contains(&Emit::Ast) {
        dump("AST", &compilation.ast.to_string());
    }
    Ok(compilation)
}

fn compile(cli: &Cli) -> Result<(tacc::ir::GeneratedProgram, String)> {
    if cli.from_ir {
        if cli.emit.iter().any(|e| matches!(e, Emit::Tokens | Emit::Ast)) {
            warn!("token and AST dumps are unavailable when reading IR");
        }
        return compile_ir(&cli.input)
            .with_context(|| format!("cannot load IR from {}", cli.input.display()));
    }
    let compilation = from_source(cli)?;
    Ok((compilation.program, compilation.asm))
}

fn run(cli: &Cli) -> Result<u8> {
    let (program, asm) = compile(cli)?;

    if cli.emit.contains(&Emit::Ir) {
        dump("IR", &program.to_string());
    }
    if cli.emit.contains(&Emit::Asm) {
        dump("ASM", &asm);
    }
    if let Some(path) = &cli.save_ir {
        serialize::save(path, &program)
            .with_context(|| format!("cannot save IR to {}", path.display()))?;
    }

    write_asm(&cli.output, &asm)?;
    if !cli.run {
        return Ok(0);
    }

    let report = assemble_and_run(&cli.output, &cli.toolchain())?;
    info!(step = %report.step, code = report.code, "toolchain finished");
    Ok(u8::try_from(report.code).unwrap_or(1))
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.level())
        .with_target(false)
        .init();

    match run(&cli) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("{:#}", err);
            ExitCode::FAILURE
        }
    }
}
