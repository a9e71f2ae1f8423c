use tacc::ast::*;
use tacc::ir::{GeneratedProgram, Instruction, Operand, PrintArg};
use tacc::irgen::{IRGenError, lower};
use tacc::lexer::Lexer;
use tacc::parser::parse;
use tacc::token::{Token, TokenType, VarType};

macro_rules! lower {
    ($input:expr) => {{
        let tokens = Lexer::new($input).tokenize().unwrap();
        let ast = parse(tokens).unwrap();
        lower(&ast).unwrap()
    }};
}

fn listing(program: &GeneratedProgram) -> String {
    program.to_string()
}

#[test]
fn test_arithmetic_uses_fresh_temporaries() {
    let program = lower!("int x; x = 2 + 3 * 4;");
    assert_eq!(
        listing(&program),
        "[code]\n  T0 = 3 * 4\n  T1 = 2 + T0\n  x = T1\n"
    );
    assert_eq!(program.identifiers.get("x"), Some(&VarType::Int));
    assert_eq!(program.temporaries.len(), 2);
    assert_eq!(program.temporaries.get(&1).map(String::as_str), Some("tmp_1"));
}

#[test]
fn test_short_circuit_or() {
    let program = lower!("if (1 == 1 || 1 == 0) { cout << 1; }");
    assert_eq!(
        listing(&program),
        concat!(
            "[code]\n",
            "  if 1 == 1 goto L0\n",
            "  goto L2\n",
            "L2:\n",
            "  if 1 == 0 goto L0\n",
            "  goto L1\n",
            "L0:\n",
            "  print_int 1\n",
            "L1:\n",
        )
    );
}

#[test]
fn test_short_circuit_and_with_else() {
    let program = lower!(
        r#"int a; a = 5; if (a > 1 && a < 10) { cout << "in"; } else { cout << "out"; }"#
    );
    assert_eq!(
        listing(&program),
        concat!(
            "[constants]\n",
            "  S0 = \"in\"\n",
            "  S1 = \"out\"\n",
            "[code]\n",
            "  a = 5\n",
            "  if a > 1 goto L3\n",
            "  goto L2\n",
            "L3:\n",
            "  if a < 10 goto L0\n",
            "  goto L2\n",
            "L0:\n",
            "  print_string S0\n",
            "  goto L1\n",
            "L2:\n",
            "  print_string S1\n",
            "L1:\n",
        )
    );
}

#[test]
fn test_not_swaps_targets() {
    let program = lower!("int a; if (!(a == 0)) { cout << a; }");
    assert_eq!(
        listing(&program),
        "[code]\n  if a == 0 goto L1\n  goto L0\nL0:\n  print_int a\nL1:\n"
    );
}

#[test]
fn test_while_loop_shape() {
    let program = lower!("int i; i = 0; while (i < 3) { cout << i; i = i + 1; }");
    assert_eq!(
        listing(&program),
        concat!(
            "[code]\n",
            "  i = 0\n",
            "L0:\n",
            "  if i < 3 goto L1\n",
            "  goto L2\n",
            "L1:\n",
            "  print_int i\n",
            "  T0 = i + 1\n",
            "  i = T0\n",
            "  goto L0\n",
            "L2:\n",
        )
    );
}

#[test]
fn test_bare_value_condition_compares_with_zero() {
    let program = lower!("int x; x = 1; if (x) { cout << x; }");
    assert!(program.instructions.contains(&Instruction::Compare {
        left: Operand::Var("x".into()),
        op: tacc::ir::RelOp::Ne,
        right: Operand::Const(0),
        target: "L0".into(),
    }));
}

#[test]
fn test_print_kinds() {
    let program = lower!(r#"int x; cout << "x is"; cout << x;"#);
    let prints: Vec<&PrintArg> = program
        .instructions
        .iter()
        .filter_map(|inst| match inst {
            Instruction::Print(arg) => Some(arg),
            _ => None,
        })
        .collect();
    assert_eq!(
        prints,
        vec![
            &PrintArg::Str("S0".into()),
            &PrintArg::Int(Operand::Var("x".into()))
        ]
    );
    assert_eq!(program.constants.get("S0").map(String::as_str), Some("x is"));
}

#[test]
fn test_declarations_emit_no_code() {
    let program = lower!("int a; string b;");
    assert!(program.instructions.is_empty());
    assert_eq!(program.identifiers.get("b"), Some(&VarType::Str));
}

#[test]
fn test_lowering_is_repeatable() {
    let tokens = Lexer::new("int n; n = 3; while (n > 0 && !(n == 2)) { cout << n % 2; n = n - 1; }")
        .tokenize()
        .unwrap();
    let ast = parse(tokens).unwrap();
    assert_eq!(lower(&ast).unwrap(), lower(&ast).unwrap());
}

#[test]
fn test_string_value_is_rejected() {
    let ast = Block {
        body: vec![Node::Assign(Assignment {
            identifier: Token::new(TokenType::IDENT, "x", 4),
            expression: Box::new(Node::Str(StrLit {
                token: Token::new(TokenType::LITERAL(VarType::Str), "s", 4),
            })),
        })],
    };
    let err = lower(&ast).unwrap_err();
    assert_eq!(err, IRGenError::StringAsValue { line: 4 });
    assert!(err.to_string().starts_with("InternalError:"));
}

#[test]
fn test_expression_statement_is_rejected() {
    let ast = Block {
        body: vec![Node::Number(Number {
            token: Token::new(TokenType::LITERAL(VarType::Int), "1", 1),
        })],
    };
    assert_eq!(
        lower(&ast).unwrap_err(),
        IRGenError::NotAStatement { node: "number" }
    );
}

#[test]
fn test_comparison_as_value_is_rejected() {
    let one = || {
        Box::new(Node::Number(Number {
            token: Token::new(TokenType::LITERAL(VarType::Int), "1", 2),
        }))
    };
    let ast = Block {
        body: vec![Node::Print(Print {
            value: Box::new(Node::BinOp(BinOp {
                left: one(),
                right: one(),
                operator: Token::new(TokenType::COMPLT, "<", 2),
            })),
        })],
    };
    assert_eq!(
        lower(&ast).unwrap_err(),
        IRGenError::NotAValue {
            operator: "<".into(),
            line: 2
        }
    );
}

#[test]
fn test_parentheses_override_precedence() {
    let program = lower!("int x; x = (2+3)*4; cout << x;");
    assert_eq!(
        listing(&program),
        "[code]\n  T0 = 2 + 3\n  T1 = T0 * 4\n  x = T1\n  print_int x\n"
    );
}
