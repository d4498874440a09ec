use super::bytecode::{Bytecode, Instruction};
use super::environment::Environment;
use crate::vm_log;
use thiserror::Error;

/// Divisors with a smaller magnitude are treated as zero.
pub const DIVISION_EPSILON: f64 = 1e-6;
/// How far a modulo operand may sit from the nearest integer.
pub const INTEGER_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("stack underflow")]
    StackUnderflow,
    #[error("identifier '{0}' not defined")]
    UndefinedVariable(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("operands of '%' must be integers, got {lhs} and {rhs}")]
    NonIntegralModulo { lhs: f64, rhs: f64 },
    #[error("modulo by zero")]
    ModuloByZero,
    #[error("instruction sequence ended without a return")]
    MissingReturn,
}

/// Straight-line stack machine.
///
/// Holds no state between calls: every `execute` gets its own operand
/// stack and only the environment outlives it.
#[derive(Debug, Default)]
pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Interpreter
    }

    /// Runs `bytecode` to its `Return` and yields the returned value.
    ///
    /// Stops at the first failing instruction; stores made before it stay
    /// in the environment.
    pub fn execute(&self, bytecode: &Bytecode, env: &mut Environment) -> Result<f64, RuntimeError> {
        let mut stack = OperandStack::new();

        for (pc, instruction) in bytecode.instructions().iter().enumerate() {
            vm_log!("{:04} {:?} stack={:?}", pc, instruction, stack.values);
            match instruction {
                Instruction::LoadVar(id) => {
                    let value = env
                        .get(id)
                        .ok_or_else(|| RuntimeError::UndefinedVariable(id.clone()))?;
                    stack.push(value);
                }
                Instruction::LoadConst(value) => stack.push(*value),
                Instruction::Store(id) => {
                    let value = stack.pop()?;
                    env.define(id.as_str(), value);
                }
                Instruction::Add => stack.apply_binary_op(|lhs, rhs| Ok(lhs + rhs))?,
                Instruction::Sub => stack.apply_binary_op(|lhs, rhs| Ok(lhs - rhs))?,
                Instruction::Mul => stack.apply_binary_op(|lhs, rhs| Ok(lhs * rhs))?,
                Instruction::Div => stack.apply_binary_op(divide)?,
                Instruction::Mod => stack.apply_binary_op(modulo)?,
                Instruction::Pow => stack.apply_binary_op(|base, exponent| Ok(base.powf(exponent)))?,
                Instruction::Return => {
                    let result = stack.pop()?;
                    if !stack.values.is_empty() {
                        vm_log!("discarding {} leftover operand(s)", stack.values.len());
                    }
                    return Ok(result);
                }
            }
        }

        Err(RuntimeError::MissingReturn)
    }
}

pub(crate) fn divide(lhs: f64, rhs: f64) -> Result<f64, RuntimeError> {
    if rhs.abs() < DIVISION_EPSILON {
        return Err(RuntimeError::DivisionByZero);
    }
    Ok(lhs / rhs)
}

pub(crate) fn modulo(lhs: f64, rhs: f64) -> Result<f64, RuntimeError> {
    match (as_integer(lhs), as_integer(rhs)) {
        (Some(_), Some(r)) if r == 0.0 => Err(RuntimeError::ModuloByZero),
        // f64 remainder is exact on whole numbers of any magnitude and
        // takes the sign of the dividend
        (Some(l), Some(r)) => Ok(l % r),
        _ => Err(RuntimeError::NonIntegralModulo { lhs, rhs }),
    }
}

/// The nearest whole number, if `value` is within tolerance of it.
fn as_integer(value: f64) -> Option<f64> {
    let rounded = value.round();
    if (rounded - value).abs() < INTEGER_TOLERANCE {
        Some(rounded)
    } else {
        None
    }
}

struct OperandStack {
    values: Vec<f64>,
}

impl OperandStack {
    fn new() -> Self {
        OperandStack { values: Vec::new() }
    }

    #[inline]
    fn push(&mut self, value: f64) {
        self.values.push(value);
    }

    #[inline]
    fn pop(&mut self) -> Result<f64, RuntimeError> {
        self.values.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Pops the right operand, then the left one, and pushes `op(lhs, rhs)`.
    #[inline]
    fn apply_binary_op<F>(&mut self, op: F) -> Result<(), RuntimeError>
    where
        F: Fn(f64, f64) -> Result<f64, RuntimeError>,
    {
        let rhs = self.pop()?;
        let lhs = self.pop()?;
        self.push(op(lhs, rhs)?);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::bytecode::Instruction::*;
    use proptest::prelude::*;

    fn run(program: Vec<Instruction>) -> Result<f64, RuntimeError> {
        let mut env = Environment::new();
        Interpreter::new().execute(&Bytecode::from(program), &mut env)
    }

    #[test]
    fn test_add() {
        for (a, b) in [(1.0, 2.0), (-3.5, 3.5), (1e10, 0.25)] {
            assert_eq!(run(vec![LoadConst(a), LoadConst(b), Add, Return]), Ok(a + b));
        }
    }

    #[test]
    fn test_mul_is_order_independent() {
        let forward = run(vec![LoadConst(3.0), LoadConst(-4.0), Mul, Return]);
        let backward = run(vec![LoadConst(-4.0), LoadConst(3.0), Mul, Return]);
        assert_eq!(forward, Ok(-12.0));
        assert_eq!(forward, backward);
    }

    #[test]
    fn test_sub_and_div_use_source_order() {
        assert_eq!(run(vec![LoadConst(7.0), LoadConst(2.0), Sub, Return]), Ok(5.0));
        assert_eq!(run(vec![LoadConst(8.0), LoadConst(2.0), Div, Return]), Ok(4.0));
    }

    #[test]
    fn test_pow_base_is_pushed_first() {
        assert_eq!(run(vec![LoadConst(2.0), LoadConst(3.0), Pow, Return]), Ok(8.0));
        assert_eq!(run(vec![LoadConst(3.0), LoadConst(2.0), Pow, Return]), Ok(9.0));
    }

    #[test]
    fn test_division_by_near_zero() {
        for divisor in [0.0, -0.0, 5e-7, -9.99e-7] {
            for dividend in [0.0, 1.0, -1e9] {
                assert_eq!(
                    run(vec![LoadConst(dividend), LoadConst(divisor), Div, Return]),
                    Err(RuntimeError::DivisionByZero)
                );
            }
        }
        assert_eq!(run(vec![LoadConst(2e-6), LoadConst(2e-6), Div, Return]), Ok(1.0));
    }

    #[test]
    fn test_modulo() {
        assert_eq!(run(vec![LoadConst(7.0), LoadConst(2.0), Mod, Return]), Ok(1.0));
        assert_eq!(run(vec![LoadConst(-7.0), LoadConst(2.0), Mod, Return]), Ok(-1.0));
        assert_eq!(run(vec![LoadConst(6.9999999), LoadConst(4.0), Mod, Return]), Ok(3.0));
    }

    #[test]
    fn test_modulo_large_whole_numbers() {
        assert_eq!(run(vec![LoadConst(1e20), LoadConst(7.0), Mod, Return]), Ok(2.0));
        assert_eq!(run(vec![LoadConst(-1e20), LoadConst(7.0), Mod, Return]), Ok(-2.0));
        assert_eq!(run(vec![LoadConst(1e20), LoadConst(1e19), Mod, Return]), Ok(0.0));
    }

    #[test]
    fn test_modulo_continues_after_success() {
        assert_eq!(
            run(vec![LoadConst(7.0), LoadConst(4.0), Mod, LoadConst(10.0), Mul, Return]),
            Ok(30.0)
        );
    }

    #[test]
    fn test_modulo_rejects_fractions() {
        assert_eq!(
            run(vec![LoadConst(7.5), LoadConst(2.0), Mod, Return]),
            Err(RuntimeError::NonIntegralModulo { lhs: 7.5, rhs: 2.0 })
        );
        assert_eq!(
            run(vec![LoadConst(7.0), LoadConst(0.5), Mod, Return]),
            Err(RuntimeError::NonIntegralModulo { lhs: 7.0, rhs: 0.5 })
        );
    }

    #[test]
    fn test_modulo_by_zero() {
        assert_eq!(
            run(vec![LoadConst(7.0), LoadConst(0.0), Mod, Return]),
            Err(RuntimeError::ModuloByZero)
        );
    }

    #[test]
    fn test_store_persists_across_sequences() {
        let vm = Interpreter::new();
        let mut env = Environment::new();

        let store = Bytecode::from(vec![LoadConst(42.0), Store("x".into()), LoadVar("x".into()), Return]);
        assert_eq!(vm.execute(&store, &mut env), Ok(42.0));

        let load = Bytecode::from(vec![LoadVar("x".into()), LoadConst(1.0), Add, Return]);
        assert_eq!(vm.execute(&load, &mut env), Ok(43.0));
    }

    #[test]
    fn test_undefined_variable() {
        assert_eq!(
            run(vec![LoadVar("ghost".into()), Return]),
            Err(RuntimeError::UndefinedVariable("ghost".to_string()))
        );
    }

    #[test]
    fn test_stack_underflow() {
        assert_eq!(run(vec![Add]), Err(RuntimeError::StackUnderflow));
        assert_eq!(run(vec![LoadConst(1.0), Sub]), Err(RuntimeError::StackUnderflow));
        assert_eq!(run(vec![Store("x".into())]), Err(RuntimeError::StackUnderflow));
        assert_eq!(run(vec![Return]), Err(RuntimeError::StackUnderflow));
    }

    #[test]
    fn test_missing_return() {
        assert_eq!(run(vec![LoadConst(1.0)]), Err(RuntimeError::MissingReturn));
        assert_eq!(run(vec![]), Err(RuntimeError::MissingReturn));
    }

    #[test]
    fn test_failure_stops_execution() {
        let vm = Interpreter::new();
        let mut env = Environment::new();
        let program = Bytecode::from(vec![
            LoadConst(1.0),
            Store("before".into()),
            LoadConst(1.0),
            LoadConst(0.0),
            Div,
            Store("after".into()),
            LoadConst(0.0),
            Return,
        ]);
        assert_eq!(vm.execute(&program, &mut env), Err(RuntimeError::DivisionByZero));
        assert_eq!(env.get("before"), Some(1.0));
        assert!(!env.exists("after"));
    }

    #[test]
    fn test_return_ignores_leftovers() {
        assert_eq!(run(vec![LoadConst(5.0), LoadConst(99.0), Return]), Ok(99.0));
    }

    proptest! {
        #[test]
        fn prop_add_yields_sum(a in -1e12f64..1e12, b in -1e12f64..1e12) {
            prop_assert_eq!(run(vec![LoadConst(a), LoadConst(b), Add, Return]), Ok(a + b));
        }

        #[test]
        fn prop_sub_is_left_minus_right(a in -1e12f64..1e12, b in -1e12f64..1e12) {
            prop_assert_eq!(run(vec![LoadConst(a), LoadConst(b), Sub, Return]), Ok(a - b));
        }

        #[test]
        fn prop_mul_is_commutative(a in -1e6f64..1e6, b in -1e6f64..1e6) {
            let forward = run(vec![LoadConst(a), LoadConst(b), Mul, Return]);
            let backward = run(vec![LoadConst(b), LoadConst(a), Mul, Return]);
            prop_assert_eq!(forward.clone(), Ok(a * b));
            prop_assert_eq!(forward, backward);
        }

        #[test]
        fn prop_near_zero_divisor_always_fails(dividend in any::<f64>(), divisor in -9.99e-7f64..9.99e-7) {
            prop_assert_eq!(
                run(vec![LoadConst(dividend), LoadConst(divisor), Div, Return]),
                Err(RuntimeError::DivisionByZero)
            );
        }

        #[test]
        fn prop_integral_mod_matches_f64_rem(a in -1e22f64..1e22, b in -1e6f64..1e6) {
            let (a, b) = (a.round(), b.round());
            prop_assume!(b != 0.0);
            prop_assert_eq!(run(vec![LoadConst(a), LoadConst(b), Mod, Return]), Ok(a % b));
        }
    }
}
