pub mod lexer;
pub mod parser;
pub mod ast;

pub use lexer::*;
pub use parser::*;
pub use ast::*;
