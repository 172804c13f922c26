//! The program model: rules, subgoals, and filter expressions.

use crate::value::Value;

pub type Identifier = String;
pub type RuleName = Identifier;

/// The anonymous variable: never bound, never safety-checked, drops a
/// column when used as a projection target.
pub const WILDCARD: &str = "_";

/// Rules in source order. Order is semantically significant: it defines
/// redefinition contiguity and the evaluation sequence.
#[derive(Clone, Debug)]
pub struct Program {
    pub rules: Vec<Rule>,
}

/// A rule. With no body it is a fact declaration naming a CSV-backed
/// relation; with a body it derives a relation from earlier ones.
#[derive(Clone, Debug)]
pub struct Rule {
    pub head: Head,
    pub body: Option<Vec<Subgoal>>,
}

impl Rule {
    pub fn is_fact(&self) -> bool {
        self.body.is_none()
    }

    pub fn name(&self) -> &str {
        &self.head.name
    }
}

#[derive(Clone, Debug)]
pub struct Head {
    pub name: RuleName,
    pub args: Vec<Identifier>,
}

/// One conjunct of a rule body.
#[derive(Clone, Debug)]
pub enum Subgoal {
    Invocation(Invocation),
    Negated(Invocation),
    Filter(Expr),
}

#[derive(Clone, Debug)]
pub struct Invocation {
    pub name: RuleName,
    /// Variable names positionally matching the target's columns; `_`
    /// entries are don't-cares.
    pub args: Vec<Identifier>,
}

/// A filter expression over the current intermediate row.
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// A variable naming a column of the intermediate relation.
    Var(Identifier),
    /// A literal constant. String literals arrive here already stripped
    /// of their quote delimiters.
    Const(Value),
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinOp, lhs: Box<Expr>, rhs: Box<Expr> },
}

impl Expr {
    pub fn unary(op: UnaryOp, operand: Expr) -> Expr {
        Expr::Unary {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn binary(op: BinOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnaryOp {
    /// `!`: logical negation of a boolean.
    Not,
    /// `-`: arithmetic negation.
    Neg,
    /// `+`: identity on non-negative numbers, absolute value otherwise.
    Plus,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BinOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Eq => "=",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
        }
    }
}
