use std::{iter::Peekable, str::Chars};

use thiserror::Error;
use tracing::debug;

use crate::token::{Token, TokenType, VarType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexerError {
    #[error("unexpected character {found:?} (line: {line})")]
    UnexpectedChar { found: char, line: usize },
    #[error("unterminated string literal (line: {line})")]
    UnterminatedString { line: usize },
    #[error("integer literal {text} does not fit in 64 bits (line: {line})")]
    InvalidNumber { text: String, line: usize },
}

impl LexerError {
    pub fn line(&self) -> usize {
        match self {
            LexerError::UnexpectedChar { line, .. }
            | LexerError::UnterminatedString { line }
            | LexerError::InvalidNumber { line, .. } => *line,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    src: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    pub fn new(src: &'a str) -> Self {
        Lexer {
            src: src.chars().peekable(),
            line: 1,
        }
    }

    pub fn tokenize(mut self) -> Result<Vec<Token>, LexerError> {
        let mut tokens = Vec::new();
        loop {
            let tok = self.next_token()?;
            let done = tok.token == TokenType::EOF;
            tokens.push(tok);
            if done {
                break;
            }
        }
        debug!(count = tokens.len(), "lexed source");
        Ok(tokens)
    }

    fn current(&mut self) -> Option<char> {
        self.src.peek().copied()
    }

    fn bump(&mut self) {
        if self.src.next() == Some('\n') {
            self.line += 1;
        }
    }

    fn skip_spaces(&mut self) {
        loop {
            match self.current() {
                Some(' ' | '\t' | '\r' | '\n') => self.bump(),
                Some('/') => {
                    let mut ahead = self.src.clone();
                    ahead.next();
                    if ahead.peek() != Some(&'/') {
                        return;
                    }
                    while !matches!(self.current(), Some('\n') | None) {
                        self.bump();
                    }
                }
                _ => return,
            }
        }
    }

    fn parse_number(&mut self) -> Result<String, LexerError> {
        let mut text = String::new();
        while let Some(c) = self.current().filter(char::is_ascii_digit) {
            text.push(c);
            self.bump();
        }
        if text.parse::<i64>().is_err() {
            return Err(LexerError::InvalidNumber {
                text,
                line: self.line,
            });
        }
        Ok(text)
    }

    fn parse_ident(&mut self) -> String {
        let mut ident = String::new();
        while let Some(c) = self
            .current()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        {
            ident.push(c);
            self.bump();
        }
        ident
    }

    fn parse_string(&mut self) -> Result<String, LexerError> {
        let line = self.line;
        self.bump();
        let mut s = String::new();
        loop {
            match self.current() {
                Some('"') => {
                    self.bump();
                    return Ok(s);
                }
                None => return Err(LexerError::UnterminatedString { line }),
                Some('\\') => {
                    self.bump();
                    match self.current() {
                        Some('n') => s.push('\n'),
                        Some('t') => s.push('\t'),
                        Some('\\') => s.push('\\'),
                        Some('"') => s.push('"'),
                        None => return Err(LexerError::UnterminatedString { line }),
                        Some(c) => {
                            s.push('\\');
                            s.push(c);
                        }
                    }
                    self.bump();
                }
                Some(c) => {
                    s.push(c);
                    self.bump();
                }
            }
        }
    }

    /// Consumes `first`, then `second` if it follows, picking between the
    /// two-character and single-character token.
    fn either(
        &mut self,
        first: char,
        second: char,
        long: (TokenType, &str),
        short: Option<(TokenType, &str)>,
    ) -> Result<Token, LexerError> {
        self.bump();
        if self.current() == Some(second) {
            self.bump();
            return Ok(Token::new(long.0, long.1, self.line));
        }
        match short {
            Some((token, value)) => Ok(Token::new(token, value, self.line)),
            None => Err(LexerError::UnexpectedChar {
                found: first,
                line: self.line,
            }),
        }
    }

    fn single(&mut self, ch: char, token: TokenType) -> Token {
        self.bump();
        Token::new(token, ch.to_string(), self.line)
    }

    pub fn next_token(&mut self) -> Result<Token, LexerError> {
        self.skip_spaces();
        let line = self.line;
        let Some(c) = self.current() else {
            return Ok(Token::eof(line));
        };
        match c {
            c if c.is_ascii_digit() => {
                let text = self.parse_number()?;
                Ok(Token::new(TokenType::LITERAL(VarType::Int), text, line))
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let ident = self.parse_ident();
                let token = match ident.as_str() {
                    "if" => TokenType::IF,
                    "else" => TokenType::ELSE,
                    "while" => TokenType::WHILE,
                    "int" => TokenType::Type(VarType::Int),
                    "string" => TokenType::Type(VarType::Str),
                    "cout" => TokenType::OUT,
                    _ => TokenType::IDENT,
                };
                Ok(Token::new(token, ident, line))
            }
            '"' => {
                let s = self.parse_string()?;
                Ok(Token::new(TokenType::LITERAL(VarType::Str), s, line))
            }
            '+' => Ok(self.single(c, TokenType::ADD)),
            '-' => Ok(self.single(c, TokenType::SUB)),
            '*' => Ok(self.single(c, TokenType::MUL)),
            '/' => Ok(self.single(c, TokenType::DIV)),
            '%' => Ok(self.single(c, TokenType::MOD)),
            '(' => Ok(self.single(c, TokenType::LPAREN)),
            ')' => Ok(self.single(c, TokenType::RPAREN)),
            '{' => Ok(self.single(c, TokenType::LBRACE)),
            '}' => Ok(self.single(c, TokenType::RBRACE)),
            ';' => Ok(self.single(c, TokenType::SEMICOLON)),
            ',' => Ok(self.single(c, TokenType::COMMA)),
            '=' => self.either(c, '=', (TokenType::COMPEQ, "=="), Some((TokenType::EQ, "="))),
            '!' => self.either(c, '=', (TokenType::COMPNE, "!="), Some((TokenType::LOGNOT, "!"))),
            '>' => self.either(c, '=', (TokenType::COMPGE, ">="), Some((TokenType::COMPGT, ">"))),
            '<' => {
                self.bump();
                match self.current() {
                    Some('=') => {
                        self.bump();
                        Ok(Token::new(TokenType::COMPLE, "<=", line))
                    }
                    Some('<') => {
                        self.bump();
                        Ok(Token::new(TokenType::SHL, "<<", line))
                    }
                    _ => Ok(Token::new(TokenType::COMPLT, "<", line)),
                }
            }
            '&' => self.either(c, '&', (TokenType::COMPAND, "&&"), None),
            '|' => self.either(c, '|', (TokenType::COMPOR, "||"), None),
            c => Err(LexerError::UnexpectedChar { found: c, line }),
        }
    }
}
