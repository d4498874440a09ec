pub mod bytecode;
pub mod environment;
pub mod compiler;
pub mod interpreter;
pub mod tree_walk;
