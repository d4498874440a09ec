use crate::backend::bytecode::Bytecode;
use crate::backend::compiler::Compiler;
use crate::backend::environment::Environment;
use crate::backend::interpreter::Interpreter;
use crate::backend::tree_walk::TreeWalker;
use crate::error::CalcError;
use crate::frontend::ast::Statement;
use crate::frontend::lexer::Lexer;
use crate::frontend::parser::Parser;
use crate::{compiler_debug, compiler_info, compiler_trace};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Engine {
    /// Compile to instructions and run them on the stack machine.
    #[default]
    StackMachine,
    /// Evaluate the parse tree directly.
    TreeWalk,
}

/// One REPL's worth of state: the variable environment plus the compiler
/// whose instruction sequence is reused statement after statement.
///
/// Each call to [`Session::execute`] compiles and evaluates one line to
/// completion before returning.
#[derive(Debug, Default)]
pub struct Session {
    environment: Environment,
    compiler: Compiler,
    interpreter: Interpreter,
    walker: TreeWalker,
    engine: Engine,
}

impl Session {
    pub fn new(engine: Engine) -> Self {
        Session {
            engine,
            ..Default::default()
        }
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    /// Runs one line of input.
    ///
    /// Returns the value to show for expression and print statements,
    /// `None` for assignments and blank lines.
    pub fn execute(&mut self, line: &str) -> Result<Option<f64>, CalcError> {
        let statement = match parse_line(line)? {
            Some(statement) => statement,
            None => return Ok(None),
        };
        compiler_debug!("Session| statement: {}", statement);

        let value = self.execute_statement(&statement)?;
        compiler_info!("Session| {} => {}", statement, value);

        match statement {
            Statement::Assign { .. } => Ok(None),
            Statement::Expression(_) | Statement::Print(_) => Ok(Some(value)),
        }
    }

    pub fn execute_statement(&mut self, statement: &Statement) -> Result<f64, CalcError> {
        match self.engine {
            Engine::StackMachine => {
                let bytecode = self.compiler.compile(statement)?;
                compiler_trace!("Session| bytecode:\n{}", bytecode);
                Ok(self.interpreter.execute(bytecode, &mut self.environment)?)
            }
            Engine::TreeWalk => Ok(self.walker.eval_statement(statement, &mut self.environment)?),
        }
    }

    /// Compiles without evaluating, for listings.
    pub fn compile(&mut self, line: &str) -> Result<Option<&Bytecode>, CalcError> {
        match parse_line(line)? {
            Some(statement) => Ok(Some(self.compiler.compile(&statement)?)),
            None => Ok(None),
        }
    }

    /// The instruction sequence of the last compiled statement.
    pub fn bytecode(&self) -> &Bytecode {
        self.compiler.bytecode()
    }

    pub fn environment(&self) -> &Environment {
        &self.environment
    }
}

pub fn parse_line(line: &str) -> Result<Option<Statement>, CalcError> {
    let tokens = Lexer::new(line).lex()?;
    Ok(Parser::new(tokens).parse_line()?)
}
