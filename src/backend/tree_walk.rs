use super::compiler::CompileError;
use super::environment::Environment;
use super::interpreter::{divide, modulo, RuntimeError};
use crate::compiler_debug;
use crate::frontend::ast::{BinaryOperator, Expression, Statement};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

/// Evaluates parse trees directly, without producing instructions.
///
/// Numeric rules and failures match the stack machine exactly, so either
/// engine can back a session.
#[derive(Debug, Default)]
pub struct TreeWalker;

impl TreeWalker {
    pub fn new() -> Self {
        TreeWalker
    }

    pub fn eval_statement(&self, statement: &Statement, env: &mut Environment) -> Result<f64, EvalError> {
        match statement {
            Statement::Expression(expr) | Statement::Print(expr) => self.eval_expression(expr, env),
            Statement::Assign { id, value } => {
                let value = self.eval_expression(value, env)?;
                compiler_debug!("TreeWalk| assigning {} = {}", id.name, value);
                env.define(id.name.as_str(), value);
                Ok(value)
            }
        }
    }

    pub fn eval_expression(&self, expr: &Expression, env: &Environment) -> Result<f64, EvalError> {
        match expr {
            Expression::Number { negative, literal } => {
                let value = literal.parse::<f64>().map_err(|_| CompileError::MalformedNumber {
                    literal: literal.clone(),
                })?;
                Ok(if *negative { -value } else { value })
            }
            Expression::Identifier(id) => env
                .get(&id.name)
                .ok_or_else(|| RuntimeError::UndefinedVariable(id.name.clone()).into()),
            Expression::Parens(inner) => self.eval_expression(inner, env),
            Expression::BinaryOp { operator, left, right } => {
                let lhs = self.eval_expression(left, env)?;
                let rhs = self.eval_expression(right, env)?;
                let value = match operator {
                    BinaryOperator::Add => lhs + rhs,
                    BinaryOperator::Subtract => lhs - rhs,
                    BinaryOperator::Multiply => lhs * rhs,
                    BinaryOperator::Divide => divide(lhs, rhs)?,
                    BinaryOperator::Modulo => modulo(lhs, rhs)?,
                    BinaryOperator::Power => lhs.powf(rhs),
                };
                Ok(value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::compiler::Compiler;
    use crate::backend::interpreter::Interpreter;
    use crate::frontend::lexer::Lexer;
    use crate::frontend::parser::Parser;

    fn statement(source: &str) -> Statement {
        let tokens = Lexer::new(source).lex().unwrap();
        Parser::new(tokens).parse_line().unwrap().unwrap()
    }

    #[test]
    fn agrees_with_stack_machine() {
        let sources = [
            "10 - 4 - 3",
            "2 ^ 3 ^ 2",
            "(1 + 2) * 3 / 4",
            "17 % 5 * 2",
            "-2 ^ 2",
            "x = 9 / 3",
        ];
        let mut compiler = Compiler::new();
        for source in sources {
            let stmt = statement(source);
            let mut walk_env = Environment::new();
            let mut vm_env = Environment::new();

            let walked = TreeWalker::new().eval_statement(&stmt, &mut walk_env).unwrap();
            let bytecode = compiler.compile(&stmt).unwrap();
            let executed = Interpreter::new().execute(bytecode, &mut vm_env).unwrap();

            assert_eq!(walked, executed, "{}", source);
        }
    }

    #[test]
    fn assignment_writes_environment() {
        let mut env = Environment::new();
        let walker = TreeWalker::new();
        assert_eq!(walker.eval_statement(&statement("n = 4"), &mut env), Ok(4.0));
        assert_eq!(walker.eval_statement(&statement("n * n"), &mut env), Ok(16.0));
    }

    #[test]
    fn errors_match_stack_machine() {
        let mut env = Environment::new();
        let walker = TreeWalker::new();
        assert_eq!(
            walker.eval_statement(&statement("1 / 0"), &mut env),
            Err(EvalError::Runtime(RuntimeError::DivisionByZero))
        );
        assert_eq!(
            walker.eval_statement(&statement("7.5 % 2"), &mut env),
            Err(EvalError::Runtime(RuntimeError::NonIntegralModulo { lhs: 7.5, rhs: 2.0 }))
        );
        assert_eq!(
            walker.eval_statement(&statement("y"), &mut env),
            Err(EvalError::Runtime(RuntimeError::UndefinedVariable("y".to_string())))
        );
        assert_eq!(
            walker.eval_statement(&statement("1..2"), &mut env),
            Err(EvalError::Compile(CompileError::MalformedNumber { literal: "1..2".to_string() }))
        );
    }
}
