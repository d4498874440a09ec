use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpCode {
    LoadVar,
    LoadConst,
    Store,
    Add,
    Sub,
    Mul,
    Mod,
    Div,
    Pow,
    Return,
}

impl OpCode {
    pub fn mnemonic(&self) -> &'static str {
        match self {
            OpCode::LoadVar => "LDV",
            OpCode::LoadConst => "LDC",
            OpCode::Store => "DEF",
            OpCode::Add => "ADD",
            OpCode::Sub => "SUB",
            OpCode::Mul => "MUL",
            OpCode::Mod => "MOD",
            OpCode::Div => "DIV",
            OpCode::Pow => "POW",
            OpCode::Return => "RET",
        }
    }
}

/// One stack machine instruction. The payload lives on the variant that
/// uses it, so a `LoadConst` can never carry an identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum Instruction {
    /// Push the value bound to the identifier.
    LoadVar(String),
    /// Push a literal.
    LoadConst(f64),
    /// Pop one value into the identifier.
    Store(String),
    Add,
    Sub,
    Mul,
    Mod,
    Div,
    Pow,
    /// Pop the statement result and stop.
    Return,
}

impl Instruction {
    pub fn opcode(&self) -> OpCode {
        match self {
            Instruction::LoadVar(_) => OpCode::LoadVar,
            Instruction::LoadConst(_) => OpCode::LoadConst,
            Instruction::Store(_) => OpCode::Store,
            Instruction::Add => OpCode::Add,
            Instruction::Sub => OpCode::Sub,
            Instruction::Mul => OpCode::Mul,
            Instruction::Mod => OpCode::Mod,
            Instruction::Div => OpCode::Div,
            Instruction::Pow => OpCode::Pow,
            Instruction::Return => OpCode::Return,
        }
    }

    pub fn literal(&self) -> Option<f64> {
        match self {
            Instruction::LoadConst(value) => Some(*value),
            _ => None,
        }
    }

    pub fn identifier(&self) -> Option<&str> {
        match self {
            Instruction::LoadVar(id) | Instruction::Store(id) => Some(id),
            _ => None,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let value = self.literal().map(|v| v.to_string()).unwrap_or_default();
        write!(
            f,
            "{:>5} {:>8} {:>8}",
            self.opcode().mnemonic(),
            value,
            self.identifier().unwrap_or("")
        )
    }
}

/// The instruction sequence of a single statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bytecode {
    instructions: Vec<Instruction>,
}

impl Bytecode {
    pub fn new() -> Self {
        Bytecode {
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, instruction: Instruction) {
        self.instructions.push(instruction);
    }

    pub fn clear(&mut self) {
        self.instructions.clear();
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

impl From<Vec<Instruction>> for Bytecode {
    fn from(instructions: Vec<Instruction>) -> Self {
        Bytecode { instructions }
    }
}

impl fmt::Display for Bytecode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for (offset, instruction) in self.instructions.iter().enumerate() {
            writeln!(f, "{:04} {}", offset, instruction.to_string().trim_end())?;
        }
        Ok(())
    }
}
