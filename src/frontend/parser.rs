use super::ast::{BinaryOperator, Expression, Id, Program, Statement};
use super::lexer::{Token, TokenType};
use crate::parser_log;
use thiserror::Error;

/// Deepest expression tree the parser will build. Later stages recurse over
/// the tree, so this also bounds their stack use.
pub const MAX_NESTING_DEPTH: usize = 256;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    #[error("expected {expected}, found {found:?} at {line}:{column}")]
    UnexpectedToken {
        expected: &'static str,
        found: TokenType,
        line: usize,
        column: usize,
    },
    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEndOfInput { expected: &'static str },
    #[error("expression nested too deeply at {line}:{column}")]
    NestingTooDeep { line: usize, column: usize },
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
    depth: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser {
            tokens,
            current: 0,
            depth: 0,
        }
    }

    /// Parses newline-separated statements, skipping blank lines.
    pub fn parse(&mut self) -> Result<Program, ParseError> {
        let mut statements = Vec::new();

        while self.peek().is_some() {
            if self.match_token(&TokenType::Newline) {
                continue;
            }
            statements.push(self.parse_statement()?);
            self.expect_statement_end()?;
        }

        Ok(Program { statements })
    }

    /// Parses a single REPL line. Returns `None` when the line is blank.
    pub fn parse_line(&mut self) -> Result<Option<Statement>, ParseError> {
        while self.match_token(&TokenType::Newline) {}
        if self.peek().is_none() {
            return Ok(None);
        }

        let statement = self.parse_statement()?;
        self.expect_statement_end()?;
        while self.match_token(&TokenType::Newline) {}

        match self.next() {
            Some(token) => Err(unexpected("end of line", token)),
            None => Ok(Some(statement)),
        }
    }

    // Utility functions for token handling
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.current)
    }

    fn peek_nth(&self, n: usize) -> Option<&Token> {
        self.tokens.get(self.current + n)
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.current).cloned();
        if token.is_some() {
            self.current += 1;
        }
        token
    }

    fn match_token(&mut self, token_type: &TokenType) -> bool {
        if self.peek().map_or(false, |t| &t.token_type == token_type) {
            self.current += 1;
            return true;
        }
        false
    }

    fn expect(&mut self, expected: TokenType, description: &'static str) -> Result<Token, ParseError> {
        match self.next() {
            Some(token) if token.token_type == expected => Ok(token),
            Some(token) => Err(unexpected(description, token)),
            None => Err(ParseError::UnexpectedEndOfInput { expected: description }),
        }
    }

    fn expect_statement_end(&mut self) -> Result<(), ParseError> {
        match self.next() {
            None => Ok(()),
            Some(Token { token_type: TokenType::Newline, .. }) => Ok(()),
            Some(token) => Err(unexpected("operator or end of statement", token)),
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        parser_log!("Parsing statement at token {}", self.current);
        if self.match_token(&TokenType::Print) {
            let expr = self.parse_expression()?;
            return Ok(Statement::Print(expr));
        }

        let is_assignment = matches!(
            (self.peek().map(|t| &t.token_type), self.peek_nth(1).map(|t| &t.token_type)),
            (Some(TokenType::Identifier(_)), Some(TokenType::Assignment))
        );
        if is_assignment {
            return self.parse_variable_assignment();
        }

        Ok(Statement::Expression(self.parse_expression()?))
    }

    fn parse_variable_assignment(&mut self) -> Result<Statement, ParseError> {
        parser_log!("Parsing variable assignment");
        let id = match self.next() {
            Some(Token { token_type: TokenType::Identifier(name), .. }) => Id { name },
            Some(token) => return Err(unexpected("variable name", token)),
            None => return Err(ParseError::UnexpectedEndOfInput { expected: "variable name" }),
        };

        self.expect(TokenType::Assignment, "'='")?;
        let value = self.parse_expression()?;

        Ok(Statement::Assign { id, value })
    }

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        let (expr, _) = self.parse_binary_expression(0)?;
        Ok(expr)
    }

    // Precedence climbing over the operator table in `TokenType`. Returns the
    // expression along with the height of its tree.
    fn parse_binary_expression(&mut self, min_precedence: u8) -> Result<(Expression, usize), ParseError> {
        self.depth += 1;
        let result = if self.depth > MAX_NESTING_DEPTH {
            Err(self.nesting_too_deep())
        } else {
            self.parse_operator_chain(min_precedence)
        };
        self.depth -= 1;
        result
    }

    fn parse_operator_chain(&mut self, min_precedence: u8) -> Result<(Expression, usize), ParseError> {
        let (mut left, mut height) = self.parse_primary_expression()?;

        while let Some(token) = self.peek() {
            let precedence = match token.precedence() {
                Some(p) if p >= min_precedence => p,
                _ => break,
            };
            let operator = match token.token_type {
                TokenType::Plus => BinaryOperator::Add,
                TokenType::Minus => BinaryOperator::Subtract,
                TokenType::Asterisk => BinaryOperator::Multiply,
                TokenType::Slash => BinaryOperator::Divide,
                TokenType::Modulo => BinaryOperator::Modulo,
                TokenType::Carrot => BinaryOperator::Power,
                _ => break,
            };
            let next_min = if token.is_right_associative() { precedence } else { precedence + 1 };
            // Left-associative chains grow the tree without recursing
            if height >= MAX_NESTING_DEPTH {
                return Err(self.nesting_too_deep());
            }
            self.next(); // Consume operator token

            let (right, right_height) = self.parse_binary_expression(next_min)?;
            parser_log!("Binary {:?} at precedence {}", operator, precedence);
            height = height.max(right_height) + 1;
            left = Expression::BinaryOp {
                operator,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok((left, height))
    }

    fn parse_primary_expression(&mut self) -> Result<(Expression, usize), ParseError> {
        match self.next() {
            Some(token) => match token.token_type {
                TokenType::Number(literal) => Ok((Expression::Number { negative: false, literal }, 1)),
                // A sign only ever belongs to a numeric literal
                TokenType::Minus => match self.next() {
                    Some(Token { token_type: TokenType::Number(literal), .. }) => {
                        Ok((Expression::Number { negative: true, literal }, 1))
                    }
                    Some(token) => Err(unexpected("number after '-'", token)),
                    None => Err(ParseError::UnexpectedEndOfInput { expected: "number after '-'" }),
                },
                TokenType::Identifier(name) => Ok((Expression::Identifier(Id { name }), 1)),
                TokenType::LParen => {
                    let (inner, height) = self.parse_binary_expression(0)?;
                    self.expect(TokenType::RParen, "')'")?;
                    if height >= MAX_NESTING_DEPTH {
                        return Err(self.nesting_too_deep());
                    }
                    Ok((Expression::Parens(Box::new(inner)), height + 1))
                }
                _ => Err(unexpected("expression", token)),
            },
            None => Err(ParseError::UnexpectedEndOfInput { expected: "expression" }),
        }
    }

    fn nesting_too_deep(&self) -> ParseError {
        let (line, column) = self
            .peek()
            .or_else(|| self.tokens.last())
            .map_or((1, 1), |token| (token.line, token.column));
        ParseError::NestingTooDeep { line, column }
    }
}

fn unexpected(expected: &'static str, token: Token) -> ParseError {
    ParseError::UnexpectedToken {
        expected,
        found: token.token_type,
        line: token.line,
        column: token.column,
    }
}
