//! Row-level expression evaluation for filter subgoals.
//!
//! Numeric model: binary arithmetic and comparison are computed in `f64`,
//! even when both operands are integers, so `7 / 2` is `3.5` and every
//! arithmetic result is a `Float`. Booleans feeding a binary operator are
//! coerced to `1`/`0` first. Strings support the six comparisons and `+`
//! (concatenation) only; mixing a string with a non-string operand is
//! fatal. Join-key equality elsewhere stays exact; only this evaluator
//! promotes.

use crate::ast::{BinOp, Expr, UnaryOp};
use crate::error::{Error, Result};
use crate::value::Value;

/// Evaluate a filter against one row; non-boolean results are fatal.
pub fn filter_row(row: &[Value], columns: &[String], expr: &Expr) -> Result<bool> {
    match eval(row, columns, expr)? {
        Operand::Bool(b) => Ok(b),
        Operand::Val(_) => Err(Error::NonBooleanFilter),
    }
}

/// Intermediate evaluation result. Rows never store booleans; they only
/// arise from comparisons and are coerced away when fed back into
/// arithmetic.
#[derive(Debug, PartialEq)]
enum Operand {
    Bool(bool),
    Val(Value),
}

fn eval(row: &[Value], columns: &[String], expr: &Expr) -> Result<Operand> {
    match expr {
        Expr::Const(value) => Ok(Operand::Val(value.clone())),

        // Leaf resolution happens per call: the variable names a column of
        // the current intermediate relation.
        Expr::Var(name) => {
            let position = columns
                .iter()
                .position(|c| c == name)
                .ok_or_else(|| Error::UnknownColumn(name.clone()))?;
            Ok(Operand::Val(row[position].clone()))
        }

        Expr::Unary { op, operand } => {
            let operand = eval(row, columns, operand)?;
            apply_unary(*op, operand)
        }

        Expr::Binary { op, lhs, rhs } => {
            let lhs = coerce_bool(eval(row, columns, lhs)?);
            let rhs = coerce_bool(eval(row, columns, rhs)?);
            apply_binary(*op, lhs, rhs)
        }
    }
}

fn coerce_bool(operand: Operand) -> Value {
    match operand {
        Operand::Bool(b) => Value::Int(b as i64),
        Operand::Val(value) => value,
    }
}

fn apply_unary(op: UnaryOp, operand: Operand) -> Result<Operand> {
    match op {
        UnaryOp::Not => match operand {
            Operand::Bool(b) => Ok(Operand::Bool(!b)),
            Operand::Val(_) => Err(Error::NonBooleanNot),
        },
        UnaryOp::Neg => match coerce_bool(operand) {
            Value::Int(n) => Ok(Operand::Val(Value::Int(-n))),
            Value::Float(x) => Ok(Operand::Val(Value::Float(-x))),
            Value::Text(_) => Err(Error::InvalidUnaryOperand),
        },
        UnaryOp::Plus => match coerce_bool(operand) {
            Value::Int(n) => Ok(Operand::Val(Value::Int(n.abs()))),
            Value::Float(x) => Ok(Operand::Val(Value::Float(x.abs()))),
            Value::Text(_) => Err(Error::InvalidUnaryOperand),
        },
    }
}

fn apply_binary(op: BinOp, lhs: Value, rhs: Value) -> Result<Operand> {
    match (lhs, rhs) {
        (Value::Text(a), Value::Text(b)) => string_op(op, a, b),
        (Value::Text(_), _) | (_, Value::Text(_)) => Err(Error::MixedStringOperands),
        (a, b) => Ok(numeric_op(op, widen(&a), widen(&b))),
    }
}

fn widen(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(x) => *x,
        Value::Text(_) => unreachable!("callers exclude text operands"),
    }
}

fn numeric_op(op: BinOp, a: f64, b: f64) -> Operand {
    match op {
        BinOp::Eq => Operand::Bool(a == b),
        BinOp::Ne => Operand::Bool(a != b),
        BinOp::Lt => Operand::Bool(a < b),
        BinOp::Le => Operand::Bool(a <= b),
        BinOp::Gt => Operand::Bool(a > b),
        BinOp::Ge => Operand::Bool(a >= b),
        BinOp::Add => Operand::Val(Value::Float(a + b)),
        BinOp::Sub => Operand::Val(Value::Float(a - b)),
        BinOp::Mul => Operand::Val(Value::Float(a * b)),
        BinOp::Div => Operand::Val(Value::Float(a / b)),
        BinOp::Mod => Operand::Val(Value::Float(a % b)),
    }
}

fn string_op(op: BinOp, a: String, b: String) -> Result<Operand> {
    match op {
        BinOp::Eq => Ok(Operand::Bool(a == b)),
        BinOp::Ne => Ok(Operand::Bool(a != b)),
        BinOp::Lt => Ok(Operand::Bool(a < b)),
        BinOp::Le => Ok(Operand::Bool(a <= b)),
        BinOp::Gt => Ok(Operand::Bool(a > b)),
        BinOp::Ge => Ok(Operand::Bool(a >= b)),
        BinOp::Add => Ok(Operand::Val(Value::Text(a + &b))),
        other => Err(Error::InvalidStringOperator(other.symbol())),
    }
}
