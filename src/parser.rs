use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::{
    ast::{
        Assignment, BinOp, Block, Declaration, Ident, If, Node, Number, Print, StrLit, UnaryOp,
        While,
    },
    token::{Token, TokenStream, TokenType, VarType},
};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SyntaxError: {message} (line: {line})")]
pub struct SyntaxError {
    pub message: String,
    pub line: usize,
}

impl SyntaxError {
    fn new(message: impl Into<String>, line: usize) -> Self {
        Self {
            message: message.into(),
            line,
        }
    }
}

pub fn parse(tokens: Vec<Token>) -> Result<Block, SyntaxError> {
    Parser::new(tokens).parse()
}

fn is_arith(op: TokenType) -> bool {
    matches!(
        op,
        TokenType::ADD | TokenType::SUB | TokenType::MUL | TokenType::DIV | TokenType::MOD
    )
}

fn is_relop(op: TokenType) -> bool {
    matches!(
        op,
        TokenType::COMPEQ
            | TokenType::COMPNE
            | TokenType::COMPLT
            | TokenType::COMPLE
            | TokenType::COMPGT
            | TokenType::COMPGE
    )
}

/// Whether `node` computes an integer, as opposed to a truth value.
fn is_value(node: &Node) -> bool {
    match node {
        Node::Number(_) | Node::Ident(_) => true,
        Node::BinOp(bin) => {
            is_arith(bin.operator.token) && is_value(&bin.left) && is_value(&bin.right)
        }
        _ => false,
    }
}

#[derive(Debug)]
pub struct Parser {
    tokens: TokenStream,
    decls: HashMap<String, VarType>,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self {
            tokens: TokenStream::new(tokens),
            decls: HashMap::new(),
        }
    }

    pub fn declarations(&self) -> &HashMap<String, VarType> {
        &self.decls
    }

    pub fn parse(&mut self) -> Result<Block, SyntaxError> {
        let block = self.statements()?;
        if self.curr().token != TokenType::EOF {
            return Err(self.unexpected());
        }
        debug!(
            statements = block.body.len(),
            declared = self.decls.len(),
            "parsed program"
        );
        Ok(block)
    }

    fn curr(&self) -> &Token {
        self.tokens.curr_tok()
    }

    fn unexpected(&self) -> SyntaxError {
        let tok = self.curr();
        match tok.token {
            TokenType::EOF => SyntaxError::new("unexpected end of input", tok.line),
            _ => SyntaxError::new(format!("unexpected '{}'", tok.value), tok.line),
        }
    }

    fn expect(&mut self, token: TokenType, what: &str) -> Result<Token, SyntaxError> {
        let tok = self.curr().clone();
        if tok.token != token {
            let found = match tok.token {
                TokenType::EOF => "end of input".to_string(),
                _ => format!("'{}'", tok.value),
            };
            return Err(SyntaxError::new(
                format!("expected {}, found {}", what, found),
                tok.line,
            ));
        }
        self.tokens.next_token();
        Ok(tok)
    }

    fn require_value(&self, node: &Node, line: usize) -> Result<(), SyntaxError> {
        if is_value(node) {
            Ok(())
        } else {
            Err(SyntaxError::new("expected an arithmetic expression", line))
        }
    }

    fn statements(&mut self) -> Result<Block, SyntaxError> {
        let mut body = Vec::new();
        while !matches!(self.curr().token, TokenType::EOF | TokenType::RBRACE) {
            body.push(self.statement()?);
        }
        Ok(Block { body })
    }

    fn statement(&mut self) -> Result<Node, SyntaxError> {
        let token = self.curr().token;
        match token {
            TokenType::Type(typ) => {
                let decl = self.declaration(typ)?;
                self.expect(TokenType::SEMICOLON, "';'")?;
                Ok(decl)
            }
            TokenType::IF => self.if_stmt(),
            TokenType::WHILE => self.while_stmt(),
            TokenType::IDENT => {
                let asg = self.assignment()?;
                self.expect(TokenType::SEMICOLON, "';'")?;
                Ok(asg)
            }
            TokenType::OUT => {
                let print = self.print_stmt()?;
                self.expect(TokenType::SEMICOLON, "';'")?;
                Ok(print)
            }
            _ => Err(self.unexpected()),
        }
    }

    fn declaration(&mut self, typ: VarType) -> Result<Node, SyntaxError> {
        self.tokens.next_token();
        let identifier = self.expect(TokenType::IDENT, "identifier")?;
        if let Some(prev) = self.decls.insert(identifier.value.clone(), typ) {
            debug!(
                name = %identifier.value,
                %prev,
                now = %typ,
                line = identifier.line,
                "redeclaration overwrites previous type"
            );
        }
        Ok(Node::Decl(Declaration { typ, identifier }))
    }

    fn assignment(&mut self) -> Result<Node, SyntaxError> {
        let identifier = self.expect(TokenType::IDENT, "identifier")?;
        if !self.decls.contains_key(&identifier.value) {
            return Err(SyntaxError::new(
                format!("assignment to undeclared identifier '{}'", identifier.value),
                identifier.line,
            ));
        }
        let eq = self.expect(TokenType::EQ, "'='")?;
        let expression = self.additive()?;
        self.require_value(&expression, eq.line)?;
        Ok(Node::Assign(Assignment {
            identifier,
            expression: Box::new(expression),
        }))
    }

    fn print_stmt(&mut self) -> Result<Node, SyntaxError> {
        self.expect(TokenType::OUT, "'cout'")?;
        let shl = self.expect(TokenType::SHL, "'<<'")?;
        let value = if self.curr().token == TokenType::LITERAL(VarType::Str) {
            let token = self.curr().clone();
            self.tokens.next_token();
            Node::Str(StrLit { token })
        } else {
            let value = self.additive()?;
            self.require_value(&value, shl.line)?;
            value
        };
        Ok(Node::Print(Print {
            value: Box::new(value),
        }))
    }

    fn braced(&mut self) -> Result<Block, SyntaxError> {
        self.expect(TokenType::LBRACE, "'{'")?;
        let block = self.statements()?;
        self.expect(TokenType::RBRACE, "'}'")?;
        Ok(block)
    }

    fn condition(&mut self) -> Result<Node, SyntaxError> {
        self.expect(TokenType::LPAREN, "'('")?;
        let cond = self.logical_or()?;
        self.expect(TokenType::RPAREN, "')'")?;
        Ok(cond)
    }

    fn if_stmt(&mut self) -> Result<Node, SyntaxError> {
        self.expect(TokenType::IF, "'if'")?;
        let condition = self.condition()?;
        let then_branch = self.braced()?;
        let else_branch = if self.curr().token == TokenType::ELSE {
            self.tokens.next_token();
            Some(self.braced()?)
        } else {
            None
        };
        Ok(Node::If(If {
            condition: Box::new(condition),
            then_branch,
            else_branch,
        }))
    }

    fn while_stmt(&mut self) -> Result<Node, SyntaxError> {
        self.expect(TokenType::WHILE, "'while'")?;
        let condition = self.condition()?;
        let body = self.braced()?;
        Ok(Node::While(While {
            condition: Box::new(condition),
            body,
        }))
    }

    fn logical_or(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.logical_and()?;
        while self.curr().token == TokenType::COMPOR {
            let operator = self.curr().clone();
            self.tokens.next_token();
            let right = self.logical_and()?;
            left = Node::BinOp(BinOp {
                left: Box::new(left),
                right: Box::new(right),
                operator,
            });
        }
        Ok(left)
    }

    fn logical_and(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.unary()?;
        while self.curr().token == TokenType::COMPAND {
            let operator = self.curr().clone();
            self.tokens.next_token();
            let right = self.unary()?;
            left = Node::BinOp(BinOp {
                left: Box::new(left),
                right: Box::new(right),
                operator,
            });
        }
        Ok(left)
    }

    fn unary(&mut self) -> Result<Node, SyntaxError> {
        if self.curr().token == TokenType::LOGNOT {
            let operator = self.curr().clone();
            self.tokens.next_token();
            let argument = self.unary()?;
            return Ok(Node::UnaryOp(UnaryOp {
                operator,
                argument: Box::new(argument),
            }));
        }
        self.comparison()
    }

    fn comparison(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.additive()?;
        while is_relop(self.curr().token) {
            let operator = self.curr().clone();
            self.tokens.next_token();
            let right = self.additive()?;
            self.require_value(&left, operator.line)?;
            self.require_value(&right, operator.line)?;
            left = Node::BinOp(BinOp {
                left: Box::new(left),
                right: Box::new(right),
                operator,
            });
        }
        Ok(left)
    }

    fn additive(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.term()?;
        while matches!(self.curr().token, TokenType::ADD | TokenType::SUB) {
            let operator = self.curr().clone();
            self.tokens.next_token();
            let right = self.term()?;
            self.require_value(&left, operator.line)?;
            self.require_value(&right, operator.line)?;
            left = Node::BinOp(BinOp {
                left: Box::new(left),
                right: Box::new(right),
                operator,
            });
        }
        Ok(left)
    }

    fn term(&mut self) -> Result<Node, SyntaxError> {
        let mut left = self.factor()?;
        while matches!(
            self.curr().token,
            TokenType::MUL | TokenType::DIV | TokenType::MOD
        ) {
            let operator = self.curr().clone();
            self.tokens.next_token();
            let right = self.factor()?;
            self.require_value(&left, operator.line)?;
            self.require_value(&right, operator.line)?;
            left = Node::BinOp(BinOp {
                left: Box::new(left),
                right: Box::new(right),
                operator,
            });
        }
        Ok(left)
    }

    fn factor(&mut self) -> Result<Node, SyntaxError> {
        let tok = self.curr().clone();
        match tok.token {
            TokenType::LITERAL(VarType::Int) => {
                self.tokens.next_token();
                Ok(Node::Number(Number { token: tok }))
            }
            TokenType::IDENT => {
                if !self.decls.contains_key(&tok.value) {
                    return Err(SyntaxError::new(
                        format!("use of undeclared identifier '{}'", tok.value),
                        tok.line,
                    ));
                }
                self.tokens.next_token();
                Ok(Node::Ident(Ident { token: tok }))
            }
            TokenType::LPAREN => {
                self.tokens.next_token();
                let expr = self.logical_or()?;
                self.expect(TokenType::RPAREN, "')'")?;
                Ok(expr)
            }
            _ => Err(self.unexpected()),
        }
    }
}
