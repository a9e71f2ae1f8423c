use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TokenType {
    ADD,
    SUB,
    MUL,
    DIV,
    MOD,
    EQ,
    COMPEQ,
    COMPNE,
    COMPGT,
    COMPGE,
    COMPLT,
    COMPLE,
    COMPAND,
    COMPOR,
    LOGNOT,
    SHL,
    LITERAL(VarType),
    LPAREN,
    RPAREN,
    LBRACE,
    RBRACE,
    SEMICOLON,
    COMMA,
    OUT,
    IF,
    ELSE,
    WHILE,
    IDENT,
    Type(VarType),
    EOF,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum VarType {
    Int,
    Str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub token: TokenType,
    pub value: String,
    pub line: usize,
}

impl Token {
    pub fn new(token: TokenType, value: impl Into<String>, line: usize) -> Self {
        Self {
            token,
            value: value.into(),
            line,
        }
    }

    pub fn eof(line: usize) -> Self {
        Self::new(TokenType::EOF, "END", line)
    }
}

impl fmt::Display for VarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VarType::Int => write!(f, "int"),
            VarType::Str => write!(f, "string"),
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenType::ADD => "Plus",
            TokenType::SUB => "Minus",
            TokenType::MUL => "Star",
            TokenType::DIV => "Slash",
            TokenType::MOD => "Percent",
            TokenType::EQ => "Assign",
            TokenType::COMPEQ => "Equal",
            TokenType::COMPNE => "NotEqual",
            TokenType::COMPGT => "Greater",
            TokenType::COMPGE => "GreaterEq",
            TokenType::COMPLT => "Less",
            TokenType::COMPLE => "LessEq",
            TokenType::COMPAND => "And",
            TokenType::COMPOR => "Or",
            TokenType::LOGNOT => "Not",
            TokenType::SHL => "<<",
            TokenType::LITERAL(VarType::Int) => "IntLit",
            TokenType::LITERAL(VarType::Str) => "String",
            TokenType::LPAREN => "LParen",
            TokenType::RPAREN => "RParen",
            TokenType::LBRACE => "LBrace",
            TokenType::RBRACE => "RBrace",
            TokenType::SEMICOLON => "Semicolon",
            TokenType::COMMA => "Comma",
            TokenType::OUT => "Cout",
            TokenType::IF => "If",
            TokenType::ELSE => "Else",
            TokenType::WHILE => "While",
            TokenType::IDENT => "Var",
            TokenType::Type(VarType::Int) => "Int",
            TokenType::Type(VarType::Str) => "StringKw",
            TokenType::EOF => "End",
        };
        write!(f, "{}", name)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {:?}, line {})", self.token, self.value, self.line)
    }
}

/// Cursor over a lexed token sequence.
///
/// The sequence always ends with an `EOF` token: one is appended on
/// construction when missing, and reading past the end keeps returning it.
#[derive(Debug, Clone)]
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().map(|t| t.token) != Some(TokenType::EOF) {
            let line = tokens.last().map_or(1, |t| t.line);
            tokens.push(Token::eof(line));
        }
        Self { tokens, pos: 0 }
    }

    pub fn curr_tok(&self) -> &Token {
        let last = self.tokens.len() - 1;
        &self.tokens[self.pos.min(last)]
    }

    pub fn next_token(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }
}
