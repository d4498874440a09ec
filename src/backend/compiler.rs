use super::bytecode::{Bytecode, Instruction};
use crate::codegen_log;
use crate::frontend::ast::{BinaryOperator, Expression, Statement};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error("malformed number literal '{literal}'")]
    MalformedNumber { literal: String },
}

/// Lowers one statement at a time into stack machine instructions.
///
/// Emission is post-order: every node emits after its children, so the
/// operands of an operator are already on the stack when it runs.
#[derive(Debug, Default)]
pub struct Compiler {
    bytecode: Bytecode,
}

impl Compiler {
    pub fn new() -> Self {
        Compiler {
            bytecode: Bytecode::new(),
        }
    }

    /// Compiles `statement` into a fresh sequence ending in `Return`.
    ///
    /// The previous statement's instructions are discarded first, even if
    /// compilation then fails. An assignment reloads the stored variable
    /// after its `Store`, so its `Return` surfaces the assigned value.
    pub fn compile(&mut self, statement: &Statement) -> Result<&Bytecode, CompileError> {
        self.bytecode.clear();

        match statement {
            Statement::Expression(expr) | Statement::Print(expr) => {
                self.compile_expression(expr)?;
            }
            Statement::Assign { id, value } => {
                self.compile_expression(value)?;
                self.emit(Instruction::Store(id.name.clone()));
                // Keep the assigned value as the statement result
                self.emit(Instruction::LoadVar(id.name.clone()));
            }
        }
        self.emit(Instruction::Return);

        Ok(&self.bytecode)
    }

    /// The most recently compiled sequence.
    pub fn bytecode(&self) -> &Bytecode {
        &self.bytecode
    }

    fn compile_expression(&mut self, expr: &Expression) -> Result<(), CompileError> {
        match expr {
            Expression::Number { negative, literal } => {
                let value = parse_literal(literal)?;
                self.emit(Instruction::LoadConst(if *negative { -value } else { value }));
            }
            Expression::Identifier(id) => self.emit(Instruction::LoadVar(id.name.clone())),
            Expression::Parens(inner) => self.compile_expression(inner)?,
            Expression::BinaryOp { operator, left, right } => {
                self.compile_expression(left)?;
                self.compile_expression(right)?;
                self.emit(binary_instruction(*operator));
            }
        }
        Ok(())
    }

    fn emit(&mut self, instruction: Instruction) {
        codegen_log!("emit {:04} {:?}", self.bytecode.len(), instruction);
        self.bytecode.push(instruction);
    }
}

fn binary_instruction(operator: BinaryOperator) -> Instruction {
    match operator {
        BinaryOperator::Add => Instruction::Add,
        BinaryOperator::Subtract => Instruction::Sub,
        BinaryOperator::Multiply => Instruction::Mul,
        BinaryOperator::Divide => Instruction::Div,
        BinaryOperator::Modulo => Instruction::Mod,
        BinaryOperator::Power => Instruction::Pow,
    }
}

fn parse_literal(literal: &str) -> Result<f64, CompileError> {
    literal.parse::<f64>().map_err(|_| CompileError::MalformedNumber {
        literal: literal.to_string(),
    })
}
