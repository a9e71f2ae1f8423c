use std::collections::HashSet;

use tracing::{debug, warn};

use crate::{
    ir::{ArithOp, GeneratedProgram, Instruction, Operand, PrintArg, RelOp},
    token::VarType,
};

macro_rules! assemble {
    ($buf:expr, $fmt:literal $(, $arg:expr)* $(,)?) => {
        $buf.push_str(&format!(concat!($fmt, "\n") $(, $arg)*))
    };
}

pub fn emit(program: &GeneratedProgram) -> String {
    CodeGen::new(program).compile()
}

fn var_symbol(name: &str) -> String {
    format!("var_{}", name)
}

fn jump_for(op: RelOp) -> &'static str {
    match op {
        RelOp::Eq => "je",
        RelOp::Ne => "jne",
        RelOp::Lt => "jl",
        RelOp::Le => "jle",
        RelOp::Gt => "jg",
        RelOp::Ge => "jge",
    }
}

/// Emits NASM x86-64 assembly for Linux. Every value lives in a `.bss`
/// cell; `rax` and `rbx` are the only working registers.
pub struct CodeGen<'a> {
    program: &'a GeneratedProgram,
    bss: String,
    data: String,
    text: String,
    reserved: HashSet<String>,
}

impl<'a> CodeGen<'a> {
    pub fn new(program: &'a GeneratedProgram) -> Self {
        Self {
            program,
            bss: String::new(),
            data: String::new(),
            text: String::new(),
            reserved: HashSet::new(),
        }
    }

    pub fn compile(&mut self) -> String {
        let print_num = self.program.prints(VarType::Int);
        let print_str = self.program.prints(VarType::Str);

        self.gen_variables(print_num);
        self.gen_constants(print_num);

        assemble!(self.text, "section .text");
        assemble!(self.text, "    global _start");
        assemble!(self.text, "");
        assemble!(self.text, "_start:");
        let program = self.program;
        for inst in &program.instructions {
            self.compile_code(inst);
        }
        assemble!(self.text, "    mov rax, 60");
        assemble!(self.text, "    xor rdi, rdi");
        assemble!(self.text, "    syscall");

        if print_str {
            self.gen_print_string();
        }
        if print_num {
            self.gen_print_num();
        }

        debug!(
            cells = self.reserved.len(),
            print_num, print_str, "generated assembly"
        );
        format!("default rel\n\n{}\n{}\n{}", self.bss, self.data, self.text)
    }

    fn storage(&self, op: &Operand) -> Option<String> {
        match op {
            Operand::Const(_) => None,
            Operand::Var(name) => Some(var_symbol(name)),
            Operand::Temp(id) => Some(
                self.program
                    .temporaries
                    .get(id)
                    .cloned()
                    .unwrap_or_else(|| format!("tmp_{}", id)),
            ),
        }
    }

    fn reserve(&mut self, symbol: String) {
        if self.reserved.insert(symbol.clone()) {
            assemble!(self.bss, "    {} resq 1", symbol);
        }
    }

    fn gen_variables(&mut self, print_num: bool) {
        assemble!(self.bss, "section .bss");
        if print_num {
            assemble!(self.bss, "    digitSpace resb 128");
            assemble!(self.bss, "    digitSpacePos resq 1");
        }
        let program = self.program;
        for name in program.identifiers.keys() {
            self.reserve(var_symbol(name));
        }
        for symbol in program.temporaries.values() {
            self.reserve(symbol.clone());
        }

        for inst in &program.instructions {
            let operands: Vec<&Operand> = match inst {
                Instruction::Assign { dst, left, rhs } => {
                    let mut ops = vec![dst, left];
                    if let Some((_, right)) = rhs {
                        ops.push(right);
                    }
                    ops
                }
                Instruction::Compare { left, right, .. } => vec![left, right],
                Instruction::Print(PrintArg::Int(op)) => vec![op],
                Instruction::Print(PrintArg::Str(_))
                | Instruction::Label(_)
                | Instruction::Jump(_) => Vec::new(),
            };
            for op in operands {
                if let Some(symbol) = self.storage(op) {
                    if !self.reserved.contains(&symbol) {
                        warn!(operand = %op, %symbol, "operand missing from storage tables, reserving a cell");
                        self.reserve(symbol);
                    }
                }
            }
        }
    }

    fn gen_constants(&mut self, print_num: bool) {
        assemble!(self.data, "section .data");
        for (sym, text) in &self.program.constants {
            let bytes = text
                .bytes()
                .chain(std::iter::once(b'\n'))
                .map(|b| b.to_string())
                .collect::<Vec<_>>()
                .join(", ");
            assemble!(self.data, "    {} db {}", sym, bytes);
            assemble!(self.data, "    {}_len equ $-{}", sym, sym);
        }
        if print_num {
            assemble!(self.data, "    minus_sign db '-'");
        }
    }

    fn load(&mut self, op: &Operand, reg: &str) {
        match self.storage(op) {
            Some(symbol) => assemble!(self.text, "    mov {}, qword [{}]", reg, symbol),
            None => assemble!(self.text, "    mov {}, {}", reg, op),
        }
    }

    fn store(&mut self, dst: &Operand, reg: &str) {
        match self.storage(dst) {
            Some(symbol) => assemble!(self.text, "    mov qword [{}], {}", symbol, reg),
            None => {
                warn!(dst = %dst, "assignment to a constant, dropping the store");
                assemble!(self.text, "    ; cannot store into constant {}", dst);
            }
        }
    }

    fn compile_code(&mut self, code: &Instruction) {
        match code {
            Instruction::Assign {
                dst,
                left,
                rhs: None,
            } => {
                self.load(left, "rax");
                self.store(dst, "rax");
            }
            Instruction::Assign {
                dst,
                left,
                rhs: Some((op, right)),
            } => {
                self.load(left, "rax");
                self.load(right, "rbx");
                match op {
                    ArithOp::Add => assemble!(self.text, "    add rax, rbx"),
                    ArithOp::Sub => assemble!(self.text, "    sub rax, rbx"),
                    ArithOp::Mul => assemble!(self.text, "    imul rax, rbx"),
                    ArithOp::Div | ArithOp::Mod => {
                        assemble!(self.text, "    cqo");
                        assemble!(self.text, "    idiv rbx");
                    }
                }
                let result = if *op == ArithOp::Mod { "rdx" } else { "rax" };
                self.store(dst, result);
            }
            Instruction::Label(name) => assemble!(self.text, "{}:", name),
            Instruction::Jump(target) => assemble!(self.text, "    jmp {}", target),
            Instruction::Compare {
                left,
                op,
                right,
                target,
            } => {
                self.load(left, "rax");
                self.load(right, "rbx");
                assemble!(self.text, "    cmp rax, rbx");
                assemble!(self.text, "    {} {}", jump_for(*op), target);
            }
            Instruction::Print(PrintArg::Str(sym)) => {
                if !self.program.constants.contains_key(sym) {
                    warn!(%sym, "print of unknown string constant skipped");
                    assemble!(self.text, "    ; unknown string constant {}", sym);
                    return;
                }
                assemble!(self.text, "    lea rsi, [rel {}]", sym);
                assemble!(self.text, "    mov rdx, {}_len", sym);
                assemble!(self.text, "    call print_string");
            }
            Instruction::Print(PrintArg::Int(op)) => {
                self.load(op, "rdi");
                assemble!(self.text, "    call print_num");
            }
        }
    }

    // rsi = bytes, rdx = length
    fn gen_print_string(&mut self) {
        assemble!(self.text, "");
        assemble!(self.text, "print_string:");
        assemble!(self.text, "    mov rax, 1");
        assemble!(self.text, "    mov rdi, 1");
        assemble!(self.text, "    syscall");
        assemble!(self.text, "    ret");
    }

    /// Prints the signed value in `rdi` followed by a newline. Digits are
    /// collected least significant first after a leading newline byte, then
    /// written back to front one byte per syscall. The cursor lives in
    /// `digitSpacePos` because `syscall` clobbers `rcx` and `r11`.
    fn gen_print_num(&mut self) {
        assemble!(self.text, "");
        assemble!(self.text, "print_num:");
        assemble!(self.text, "    mov rax, rdi");
        assemble!(self.text, "    xor r8, r8");
        assemble!(self.text, "    cmp rax, 0");
        assemble!(self.text, "    jge .abs");
        assemble!(self.text, "    neg rax");
        assemble!(self.text, "    mov r8, 1");
        assemble!(self.text, ".abs:");
        assemble!(self.text, "    lea rcx, [rel digitSpace]");
        assemble!(self.text, "    mov byte [rcx], 10");
        assemble!(self.text, "    inc rcx");
        assemble!(self.text, "    mov rbx, 10");
        assemble!(self.text, ".digit:");
        assemble!(self.text, "    xor rdx, rdx");
        assemble!(self.text, "    div rbx");
        assemble!(self.text, "    add dl, '0'");
        assemble!(self.text, "    mov byte [rcx], dl");
        assemble!(self.text, "    inc rcx");
        assemble!(self.text, "    cmp rax, 0");
        assemble!(self.text, "    jne .digit");
        assemble!(self.text, "    mov qword [rel digitSpacePos], rcx");
        assemble!(self.text, "    cmp r8, 0");
        assemble!(self.text, "    je .write");
        assemble!(self.text, "    mov rax, 1");
        assemble!(self.text, "    mov rdi, 1");
        assemble!(self.text, "    lea rsi, [rel minus_sign]");
        assemble!(self.text, "    mov rdx, 1");
        assemble!(self.text, "    syscall");
        assemble!(self.text, ".write:");
        assemble!(self.text, "    mov rsi, qword [rel digitSpacePos]");
        assemble!(self.text, "    dec rsi");
        assemble!(self.text, "    mov qword [rel digitSpacePos], rsi");
        assemble!(self.text, "    mov rax, 1");
        assemble!(self.text, "    mov rdi, 1");
        assemble!(self.text, "    mov rdx, 1");
        assemble!(self.text, "    syscall");
        assemble!(self.text, "    mov rsi, qword [rel digitSpacePos]");
        assemble!(self.text, "    lea rcx, [rel digitSpace]");
        assemble!(self.text, "    cmp rsi, rcx");
        assemble!(self.text, "    jne .write");
        assemble!(self.text, "    ret");
    }
}
