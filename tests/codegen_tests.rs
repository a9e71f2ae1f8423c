use tacc::compile_source;
use tacc::error::CompileError;

macro_rules! asm {
    ($input:expr) => {{ compile_source($input).unwrap().asm }};
}

#[test]
fn test_sections_and_exit() {
    let asm = asm!("");
    assert!(asm.starts_with("default rel\n\nsection .bss\n"));
    assert!(asm.contains("section .data\n"));
    assert!(asm.contains("section .text\n    global _start\n\n_start:\n"));
    assert!(asm.ends_with("    mov rax, 60\n    xor rdi, rdi\n    syscall\n"));
    assert!(!asm.contains("print_string"));
    assert!(!asm.contains("print_num"));
}

#[test]
fn test_string_only_program_skips_number_runtime() {
    let asm = asm!(r#"cout << "hi";"#);
    assert!(asm.contains("    S0 db 104, 105, 10\n    S0_len equ $-S0\n"));
    assert!(asm.contains("    lea rsi, [rel S0]\n    mov rdx, S0_len\n    call print_string\n"));
    assert!(asm.contains("\nprint_string:\n"));
    assert!(!asm.contains("print_num"));
    assert!(!asm.contains("digitSpace"));
    assert!(!asm.contains("minus_sign"));
}

#[test]
fn test_number_program_reserves_cells() {
    let asm = asm!("int x; x = 7 / 2; cout << x;");
    assert!(asm.contains("    digitSpace resb 128\n    digitSpacePos resq 1\n"));
    assert!(asm.contains("    var_x resq 1\n"));
    assert!(asm.contains("    tmp_0 resq 1\n"));
    assert!(asm.contains("    minus_sign db '-'\n"));
    assert!(asm.contains(
        "    mov rax, 7\n    mov rbx, 2\n    cqo\n    idiv rbx\n    mov qword [tmp_0], rax\n"
    ));
    assert!(asm.contains("    mov rax, qword [tmp_0]\n    mov qword [var_x], rax\n"));
    assert!(asm.contains("    mov rdi, qword [var_x]\n    call print_num\n"));
    assert!(asm.contains("\nprint_num:\n"));
    assert!(!asm.contains("print_string"));
}

#[test]
fn test_register_named_variable_is_prefixed() {
    let asm = asm!("int rax; rax = 1;");
    assert!(asm.contains("    var_rax resq 1\n"));
    assert!(asm.contains("    mov rax, 1\n    mov qword [var_rax], rax\n"));
}

#[test]
fn test_branches_become_conditional_jumps() {
    let asm = asm!("int i; while (i != 3) { i = i + 1; }");
    assert!(asm.contains("L0:\n    mov rax, qword [var_i]\n    mov rbx, 3\n    cmp rax, rbx\n    jne L1\n    jmp L2\n"));
    assert!(asm.contains("    jmp L0\nL2:\n"));
}

#[test]
fn test_every_operator_lowers() {
    let asm = asm!("int a; a = 1 + 2 - 3 * 4 % 5;");
    for inst in ["add rax, rbx", "sub rax, rbx", "imul rax, rbx", "mov qword [tmp_2], rdx"] {
        assert!(asm.contains(inst), "missing {inst}");
    }
}

#[test]
fn test_output_is_deterministic() {
    let src = r#"int a; string s; a = 3; if (a >= 2 || a <= 0) { cout << "yes"; } cout << a;"#;
    assert_eq!(asm!(src), asm!(src));
}

#[test]
fn test_errors_produce_no_assembly() {
    assert!(matches!(
        compile_source("cout << y;"),
        Err(CompileError::Syntax(_))
    ));
    assert!(matches!(
        compile_source("int x; x = 1 $ 2;"),
        Err(CompileError::Lexer(_))
    ));
    let err = compile_source("int x;\nx = ;").unwrap_err();
    assert_eq!(err.line(), Some(2));
}
