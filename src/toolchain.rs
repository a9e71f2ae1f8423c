use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

use thiserror::Error;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Assemble,
    Link,
    Run,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Assemble => write!(f, "assemble"),
            Step::Link => write!(f, "link"),
            Step::Run => write!(f, "run"),
        }
    }
}

#[derive(Debug, Error)]
pub enum ToolchainError {
    #[error("{tool} not found on PATH")]
    NotFound {
        tool: String,
        #[source]
        source: which::Error,
    },
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("cannot start {step} step ({program}): {source}")]
    Spawn {
        step: Step,
        program: String,
        #[source]
        source: io::Error,
    },
}

/// The last step that ran and its exit status. A non-zero `code` means the
/// later steps were skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub step: Step,
    pub code: i32,
}

impl RunReport {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

pub fn write_asm(path: &Path, asm: &str) -> Result<(), ToolchainError> {
    fs::write(path, asm).map_err(|source| ToolchainError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), bytes = asm.len(), "wrote assembly");
    Ok(())
}

fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    1
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub assembler: String,
    pub assembler_args: Vec<String>,
    pub linker: String,
    pub object: PathBuf,
    pub executable: PathBuf,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self::for_output(Path::new("output.asm"))
    }
}

impl Toolchain {
    /// `nasm -f elf64` and `ld`, with the object and executable placed next
    /// to `asm`.
    pub fn for_output(asm: &Path) -> Self {
        let mut executable = asm.with_extension("");
        if executable == asm {
            executable = asm.with_extension("out");
        }
        Self {
            assembler: "nasm".to_string(),
            assembler_args: vec!["-f".to_string(), "elf64".to_string()],
            linker: "ld".to_string(),
            object: asm.with_extension("o"),
            executable,
        }
    }

    fn tool(program: &str) -> Result<Command, ToolchainError> {
        let path = which::which(program).map_err(|source| ToolchainError::NotFound {
            tool: program.to_string(),
            source,
        })?;
        Ok(Command::new(path))
    }

    fn status(&self, step: Step, program: &str, cmd: &mut Command) -> Result<i32, ToolchainError> {
        info!(%step, command = ?cmd, "running toolchain step");
        let status = cmd.status().map_err(|source| ToolchainError::Spawn {
            step,
            program: program.to_string(),
            source,
        })?;
        let code = exit_code(status);
        if code != 0 {
            warn!(%step, code, "toolchain step failed");
        }
        Ok(code)
    }

    pub fn assemble(&self, asm: &Path) -> Result<i32, ToolchainError> {
        let mut cmd = Self::tool(&self.assembler)?;
        cmd.args(&self.assembler_args)
            .arg(asm)
            .arg("-o")
            .arg(&self.object);
        self.status(Step::Assemble, &self.assembler, &mut cmd)
    }

    pub fn link(&self) -> Result<i32, ToolchainError> {
        let mut cmd = Self::tool(&self.linker)?;
        cmd.arg(&self.object).arg("-o").arg(&self.executable);
        self.status(Step::Link, &self.linker, &mut cmd)
    }

    pub fn run(&self) -> Result<i32, ToolchainError> {
        let exe = if self.executable.is_relative() {
            Path::new(".").join(&self.executable)
        } else {
            self.executable.clone()
        };
        let program = exe.display().to_string();
        self.status(Step::Run, &program, &mut Command::new(&exe))
    }

    /// Assembles and links `asm`, then executes the result when `execute` is
    /// set. Stops at the first step with a non-zero status.
    pub fn build(&self, asm: &Path, execute: bool) -> Result<RunReport, ToolchainError> {
        let code = self.assemble(asm)?;
        if code != 0 {
            return Ok(RunReport {
                step: Step::Assemble,
                code,
            });
        }
        let code = self.link()?;
        if code != 0 || !execute {
            return Ok(RunReport {
                step: Step::Link,
                code,
            });
        }
        Ok(RunReport {
            step: Step::Run,
            code: self.run()?,
        })
    }
}
