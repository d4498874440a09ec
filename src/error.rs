use crate::backend::compiler::CompileError;
use crate::backend::interpreter::RuntimeError;
use crate::backend::tree_walk::EvalError;
use crate::frontend::lexer::LexError;
use crate::frontend::parser::ParseError;
use thiserror::Error;

/// Why a single statement failed. The session survives all of them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalcError {
    #[error("lex error: {0}")]
    Lex(#[from] LexError),
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),
    #[error("compile error: {0}")]
    Compile(#[from] CompileError),
    #[error("runtime error: {0}")]
    Runtime(#[from] RuntimeError),
}

impl From<EvalError> for CalcError {
    fn from(err: EvalError) -> Self {
        match err {
            EvalError::Compile(e) => CalcError::Compile(e),
            EvalError::Runtime(e) => CalcError::Runtime(e),
        }
    }
}
