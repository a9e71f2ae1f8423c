use tacc::ast::*;
use tacc::lexer::Lexer;
use tacc::parser::{Parser, SyntaxError};
use tacc::token::{TokenType, VarType};

macro_rules! parse {
    ($input:expr) => {{
        let tokens = Lexer::new($input).tokenize().unwrap();
        Parser::new(tokens).parse()
    }};
}

fn syntax_error(src: &str) -> SyntaxError {
    parse!(src).unwrap_err()
}

#[test]
fn test_empty_program() {
    let block = parse!("").unwrap();
    assert!(block.body.is_empty());
}

#[test]
fn test_precedence() {
    let block = parse!("int x; x = 1 + 2 * 3;").unwrap();
    assert_eq!(block.body.len(), 2);
    match &block.body[1] {
        Node::Assign(asg) => {
            assert_eq!(asg.identifier.value, "x");
            match asg.expression.as_ref() {
                Node::BinOp(add) => {
                    assert_eq!(add.operator.token, TokenType::ADD);
                    assert!(matches!(add.left.as_ref(), Node::Number(n) if n.token.value == "1"));
                    assert!(matches!(
                        add.right.as_ref(),
                        Node::BinOp(mul) if mul.operator.token == TokenType::MUL
                    ));
                }
                other => panic!("expected BinOp, got {:?}", other),
            }
        }
        other => panic!("expected assignment, got {:?}", other),
    }
}

#[test]
fn test_left_associativity() {
    let block = parse!("int x; x = 10 - 4 - 3;").unwrap();
    let dump = block.to_string();
    assert_eq!(
        dump,
        "Block\n  Declaration(type=int, name=x)\n  Assignment(x)\n    BinOp(-)\n      BinOp(-)\n        Number(10)\n        Number(4)\n      Number(3)\n"
    );
}

#[test]
fn test_if_else() {
    let block = parse!("int a; if (a < 1) { a = 1; } else { a = 2; }").unwrap();
    match &block.body[1] {
        Node::If(i) => {
            assert!(matches!(
                i.condition.as_ref(),
                Node::BinOp(b) if b.operator.token == TokenType::COMPLT
            ));
            assert_eq!(i.then_branch.body.len(), 1);
            assert_eq!(i.else_branch.as_ref().map(|b| b.body.len()), Some(1));
        }
        other => panic!("expected if, got {:?}", other),
    }
}

#[test]
fn test_logical_precedence() {
    let block = parse!("int a; while (!(a == 1) && a < 3 || a > 9) { a = a + 1; }").unwrap();
    let dump = block.to_string();
    assert_eq!(
        dump,
        concat!(
            "Block\n",
            "  Declaration(type=int, name=a)\n",
            "  While\n",
            "  Condition:\n",
            "    BinOp(||)\n",
            "      BinOp(&&)\n",
            "        UnaryOp(!)\n",
            "          BinOp(==)\n",
            "            Identifier(a)\n",
            "            Number(1)\n",
            "        BinOp(<)\n",
            "          Identifier(a)\n",
            "          Number(3)\n",
            "      BinOp(>)\n",
            "        Identifier(a)\n",
            "        Number(9)\n",
            "  Body:\n",
            "    Block\n",
            "      Assignment(a)\n",
            "        BinOp(+)\n",
            "          Identifier(a)\n",
            "          Number(1)\n",
        )
    );
}

#[test]
fn test_print_string_and_expression() {
    let block = parse!(r#"int n; cout << "n:"; cout << n * 2;"#).unwrap();
    assert!(matches!(
        &block.body[1],
        Node::Print(p) if matches!(p.value.as_ref(), Node::Str(s) if s.token.value == "n:")
    ));
    assert!(matches!(
        &block.body[2],
        Node::Print(p) if matches!(p.value.as_ref(), Node::BinOp(_))
    ));
}

#[test]
fn test_declaration_table() {
    let tokens = Lexer::new("int a; string s; int a;").tokenize().unwrap();
    let mut parser = Parser::new(tokens);
    parser.parse().unwrap();
    assert_eq!(parser.declarations().get("a"), Some(&VarType::Int));
    assert_eq!(parser.declarations().get("s"), Some(&VarType::Str));
}

#[test]
fn test_redeclaration_overwrites_type() {
    let tokens = Lexer::new("int x; string x; x = 1;").tokenize().unwrap();
    let mut parser = Parser::new(tokens);
    parser.parse().unwrap();
    assert_eq!(parser.declarations().get("x"), Some(&VarType::Str));
}

#[test]
fn test_use_before_declaration() {
    let err = syntax_error("x = 1;\nint x;");
    assert_eq!(err.line, 1);
    assert_eq!(err.message, "assignment to undeclared identifier 'x'");
}

#[test]
fn test_undeclared_in_expression() {
    let err = syntax_error("int x;\nx = y + 1;");
    assert_eq!(
        err.to_string(),
        "SyntaxError: use of undeclared identifier 'y' (line: 2)"
    );
}

#[test]
fn test_declaration_scope_is_global() {
    assert!(parse!("if (1 == 1) { int x; } x = 3;").is_ok());
}

#[test]
fn test_missing_semicolon() {
    let err = syntax_error("int x;\nx = 1\ncout << x;");
    assert_eq!(err.message, "expected ';', found 'cout'");
    assert_eq!(err.line, 3);
}

#[test]
fn test_unclosed_block() {
    let err = syntax_error("if (1 < 2) {\n  cout << 1;");
    assert_eq!(err.message, "expected '}', found end of input");
}

#[test]
fn test_condition_requires_parens() {
    let err = syntax_error("int a; while a < 3 { }");
    assert_eq!(err.message, "expected '(', found 'a'");
}

#[test]
fn test_truth_value_in_arithmetic() {
    let err = syntax_error("int x; x = (1 < 2) + 3;");
    assert_eq!(err.message, "expected an arithmetic expression");
}

#[test]
fn test_comparison_in_assignment() {
    let err = syntax_error("int x; x = 1 < 2;");
    assert_eq!(err.message, "expected ';', found '<'");
}

#[test]
fn test_stray_token() {
    let err = syntax_error("int x; }");
    assert_eq!(err.message, "unexpected '}'");
}

#[test]
fn test_parenthesized_arithmetic() {
    let block = parse!("int x; x = (2 + 3) * 4;").unwrap();
    assert_eq!(
        block.to_string(),
        concat!(
            "Block\n",
            "  Declaration(type=int, name=x)\n",
            "  Assignment(x)\n",
            "    BinOp(*)\n",
            "      BinOp(+)\n",
            "        Number(2)\n",
            "        Number(3)\n",
            "      Number(4)\n",
        )
    );
}
