use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Numeric literal as written, with its optional leading minus sign.
    Number {
        negative: bool,
        literal: String,
    },
    Identifier(Id),
    Parens(Box<Expression>),
    BinaryOp {
        operator: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Expression(Expression),
    Assign {
        id: Id,
        value: Expression,
    },
    Print(Expression),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Id {
    pub name: String,
}

impl Id {
    pub fn new(name: impl Into<String>) -> Self {
        Id { name: name.into() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub statements: Vec<Statement>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
}

impl BinaryOperator {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Modulo => "%",
            BinaryOperator::Power => "^",
        }
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expression::Number { negative: true, literal } => write!(f, "-{}", literal),
            Expression::Number { negative: false, literal } => write!(f, "{}", literal),
            Expression::Identifier(id) => write!(f, "{}", id.name),
            Expression::Parens(inner) => write!(f, "[{}]", inner),
            Expression::BinaryOp { operator, left, right } => {
                write!(f, "({} {} {})", left, operator.symbol(), right)
            }
        }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Statement::Expression(expr) => write!(f, "{}", expr),
            Statement::Assign { id, value } => write!(f, "{} = {}", id.name, value),
            Statement::Print(expr) => write!(f, "print({})", expr),
        }
    }
}

impl fmt::Display for Program {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for statement in &self.statements {
            writeln!(f, "{}", statement)?;
        }
        Ok(())
    }
}
