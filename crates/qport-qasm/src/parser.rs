//! Recursive-descent parser for `OpenQASM` 2.0.

use crate::ast::{Argument, BinOp, Expression, GateCall, GateDef, Operation, Program, Statement};
use crate::error::{ParseError, ParseResult};
use crate::lexer::{SpannedToken, Token, tokenize};

/// Parse source into a [`Program`].
pub fn parse_program(source: &str) -> ParseResult<Program> {
    Parser::new(source)?.program()
}

/// Parse a sequence of statements without the version header.
pub(crate) fn parse_statements(source: &str) -> ParseResult<Vec<Statement>> {
    let mut parser = Parser::new(source)?;
    let mut statements = Vec::new();
    while !parser.is_eof() {
        statements.push(parser.statement()?);
    }
    Ok(statements)
}

struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}

impl Parser {
    fn new(source: &str) -> ParseResult<Self> {
        let tokens = tokenize(source)
            .map_err(|(position, message)| ParseError::LexerError { position, message })?;
        Ok(Self { tokens, pos: 0 })
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos).map(|t| &t.token)
    }

    fn line(&self) -> usize {
        self.tokens
            .get(self.pos)
            .or_else(|| self.tokens.last())
            .map_or(1, |t| t.line)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos)?.token.clone();
        self.pos += 1;
        Some(token)
    }

    fn unexpected(&self, expected: &str, found: &Token) -> ParseError {
        ParseError::UnexpectedToken {
            line: self.line(),
            expected: expected.into(),
            found: found.to_string(),
        }
    }

    #[allow(clippy::needless_pass_by_value)]
    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        let line = self.line();
        let found = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof(format!("expected {expected}")))?;
        if std::mem::discriminant(&found) != std::mem::discriminant(&expected) {
            return Err(ParseError::UnexpectedToken {
                line,
                expected: expected.to_string(),
                found: found.to_string(),
            });
        }
        Ok(())
    }

    fn check(&self, token: &Token) -> bool {
        self.peek()
            .is_some_and(|t| std::mem::discriminant(t) == std::mem::discriminant(token))
    }

    fn consume(&mut self, token: &Token) -> bool {
        if self.check(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn program(&mut self) -> ParseResult<Program> {
        self.expect(Token::OpenQasm)?;
        let version = match self.advance() {
            Some(Token::Real(v)) if v.trunc() == 2.0 => format!("{v:.1}"),
            Some(Token::Integer(2)) => "2.0".to_string(),
            Some(other) => return Err(ParseError::InvalidVersion(other.to_string())),
            None => return Err(ParseError::UnexpectedEof("version number".into())),
        };
        self.expect(Token::Semicolon)?;

        let mut statements = Vec::new();
        while !self.is_eof() {
            statements.push(self.statement()?);
        }
        Ok(Program {
            version,
            statements,
        })
    }

    fn statement(&mut self) -> ParseResult<Statement> {
        let token = self
            .peek()
            .cloned()
            .ok_or_else(|| ParseError::UnexpectedEof("statement".into()))?;

        match token {
            Token::Include => {
                self.pos += 1;
                let path = match self.advance() {
                    Some(Token::Str(s)) => s,
                    Some(other) => return Err(self.unexpected("file name", &other)),
                    None => return Err(ParseError::UnexpectedEof("include path".into())),
                };
                self.expect(Token::Semicolon)?;
                Ok(Statement::Include(path))
            }
            Token::QReg | Token::CReg => {
                self.pos += 1;
                let name = self.identifier()?;
                self.expect(Token::LBracket)?;
                let size = self.index()?;
                self.expect(Token::RBracket)?;
                self.expect(Token::Semicolon)?;
                Ok(if token == Token::QReg {
                    Statement::QReg { name, size }
                } else {
                    Statement::CReg { name, size }
                })
            }
            Token::Gate => self.gate_def().map(Statement::GateDef),
            Token::Opaque => {
                self.pos += 1;
                let name = self.identifier()?;
                while !self.consume(&Token::Semicolon) {
                    if self.advance().is_none() {
                        return Err(ParseError::UnexpectedEof("opaque declaration".into()));
                    }
                }
                Ok(Statement::Opaque { name })
            }
            Token::If => {
                self.pos += 1;
                self.expect(Token::LParen)?;
                let register = self.identifier()?;
                self.expect(Token::EqEq)?;
                let value = self.integer()?;
                self.expect(Token::RParen)?;
                let op = self.operation()?;
                Ok(Statement::If {
                    register,
                    value,
                    op,
                })
            }
            _ => self.operation().map(Statement::Op),
        }
    }

    fn operation(&mut self) -> ParseResult<Operation> {
        let line = self.line();
        let token = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof("operation".into()))?;
        let op = match token {
            Token::Measure => {
                let qubit = self.argument()?;
                self.expect(Token::Arrow)?;
                let bit = self.argument()?;
                Operation::Measure { qubit, bit }
            }
            Token::Reset => Operation::Reset(self.argument()?),
            Token::Barrier => Operation::Barrier(self.arguments()?),
            Token::Identifier(name) => {
                let params = if self.consume(&Token::LParen) {
                    let params = self.expression_list()?;
                    self.expect(Token::RParen)?;
                    params
                } else {
                    vec![]
                };
                let args = self.arguments()?;
                Operation::Call(GateCall {
                    name,
                    params,
                    args,
                    line,
                })
            }
            other => return Err(self.unexpected("statement", &other)),
        };
        self.expect(Token::Semicolon)?;
        Ok(op)
    }

    fn gate_def(&mut self) -> ParseResult<GateDef> {
        self.expect(Token::Gate)?;
        let name = self.identifier()?;
        let params = if self.consume(&Token::LParen) {
            let params = if self.check(&Token::RParen) {
                vec![]
            } else {
                self.identifier_list()?
            };
            self.expect(Token::RParen)?;
            params
        } else {
            vec![]
        };
        let qubits = self.identifier_list()?;
        self.expect(Token::LBrace)?;
        let mut body = Vec::new();
        while !self.consume(&Token::RBrace) {
            if self.is_eof() {
                return Err(ParseError::UnexpectedEof(format!("body of gate '{name}'")));
            }
            body.push(self.operation()?);
        }
        Ok(GateDef {
            name,
            params,
            qubits,
            body,
        })
    }

    fn argument(&mut self) -> ParseResult<Argument> {
        let name = self.identifier()?;
        let index = if self.consume(&Token::LBracket) {
            let index = self.index()?;
            self.expect(Token::RBracket)?;
            Some(index)
        } else {
            None
        };
        Ok(Argument { name, index })
    }

    fn arguments(&mut self) -> ParseResult<Vec<Argument>> {
        let mut args = vec![self.argument()?];
        while self.consume(&Token::Comma) {
            args.push(self.argument()?);
        }
        Ok(args)
    }

    fn expression_list(&mut self) -> ParseResult<Vec<Expression>> {
        if self.check(&Token::RParen) {
            return Ok(vec![]);
        }
        let mut exprs = vec![self.expression()?];
        while self.consume(&Token::Comma) {
            exprs.push(self.expression()?);
        }
        Ok(exprs)
    }

    fn identifier_list(&mut self) -> ParseResult<Vec<String>> {
        let mut ids = vec![self.identifier()?];
        while self.consume(&Token::Comma) {
            ids.push(self.identifier()?);
        }
        Ok(ids)
    }

    fn identifier(&mut self) -> ParseResult<String> {
        match self.advance() {
            Some(Token::Identifier(s)) => Ok(s),
            Some(other) => Err(self.unexpected("identifier", &other)),
            None => Err(ParseError::UnexpectedEof("identifier".into())),
        }
    }

    fn integer(&mut self) -> ParseResult<u64> {
        match self.advance() {
            Some(Token::Integer(v)) => Ok(v),
            Some(other) => Err(self.unexpected("integer", &other)),
            None => Err(ParseError::UnexpectedEof("integer".into())),
        }
    }

    fn index(&mut self) -> ParseResult<u32> {
        let line = self.line();
        let value = self.integer()?;
        u32::try_from(value).map_err(|_| ParseError::UnexpectedToken {
            line,
            expected: "register index".into(),
            found: value.to_string(),
        })
    }

    fn expression(&mut self) -> ParseResult<Expression> {
        self.binary(0)
    }

    fn binary(&mut self, min_prec: u8) -> ParseResult<Expression> {
        let mut left = self.unary()?;
        while let Some(op) = self.peek_binary_op() {
            let prec = precedence(op);
            if prec < min_prec {
                break;
            }
            self.pos += 1;
            // `^` is right associative.
            let next = if op == BinOp::Pow { prec } else { prec + 1 };
            let right = self.binary(next)?;
            left = Expression::Binary(op, Box::new(left), Box::new(right));
        }
        Ok(left)
    }

    fn unary(&mut self) -> ParseResult<Expression> {
        if self.consume(&Token::Minus) {
            let operand = self.binary(precedence(BinOp::Mul) + 1)?;
            return Ok(Expression::Neg(Box::new(operand)));
        }
        if self.consume(&Token::Plus) {
            return self.unary();
        }
        self.primary()
    }

    fn primary(&mut self) -> ParseResult<Expression> {
        let token = self
            .advance()
            .ok_or_else(|| ParseError::UnexpectedEof("expression".into()))?;
        match token {
            Token::Real(v) => Ok(Expression::Real(v)),
            Token::Integer(v) => Ok(Expression::Integer(v)),
            Token::Pi => Ok(Expression::Pi),
            Token::Identifier(name) => {
                if self.consume(&Token::LParen) {
                    let arg = self.expression()?;
                    self.expect(Token::RParen)?;
                    Ok(Expression::Call(name, Box::new(arg)))
                } else {
                    Ok(Expression::Identifier(name))
                }
            }
            Token::LParen => {
                let expr = self.expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }
            other => Err(self.unexpected("expression", &other)),
        }
    }

    fn peek_binary_op(&self) -> Option<BinOp> {
        match self.peek()? {
            Token::Plus => Some(BinOp::Add),
            Token::Minus => Some(BinOp::Sub),
            Token::Star => Some(BinOp::Mul),
            Token::Slash => Some(BinOp::Div),
            Token::Caret => Some(BinOp::Pow),
            _ => None,
        }
    }
}

fn precedence(op: BinOp) -> u8 {
    match op {
        BinOp::Add | BinOp::Sub => 1,
        BinOp::Mul | BinOp::Div => 2,
        BinOp::Pow => 4,
    }
}
