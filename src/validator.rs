//! Static safety and consistency checking over the program model.
//!
//! Runs once, before any data is loaded. Checks are applied in program
//! order and the first violation wins; nothing downstream of a failed
//! validation executes.

use std::collections::HashSet;

use thiserror::Error;

use crate::ast::{Expr, Program, Subgoal, WILDCARD};

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum SemanticError {
    #[error("duplicate non-sequential rule \"{0}\"")]
    NonContiguousRule(String),

    #[error("redeclared rule variable count mismatch \"{0}\"")]
    HeadArityMismatch(String),

    #[error("rule invocation variable count mismatch \"{0}\"")]
    InvocationArityMismatch(String),

    #[error("recursive rule invocation \"{0}\"")]
    RecursiveRule(String),

    #[error("undeclared rule \"{0}\"")]
    UndeclaredRule(String),

    #[error("redeclared external rule \"{0}\"")]
    RedeclaredFact(String),

    #[error("unsafe variable \"{0}\"")]
    UnsafeVariable(String),
}

/// Check the whole program; `Ok(())` means it is safe to execute.
pub fn validate(program: &Program) -> Result<(), SemanticError> {
    let mut history: Vec<&str> = Vec::new();
    let mut arities: Vec<usize> = Vec::new();

    for rule in &program.rules {
        let name = rule.name();
        let head_arity = rule.head.args.len();

        let Some(body) = &rule.body else {
            // Fact declaration: the name must be fresh.
            if history.contains(&name) {
                return Err(SemanticError::RedeclaredFact(name.to_owned()));
            }
            history.push(name);
            arities.push(head_arity);
            continue;
        };

        // Repeated derived names must be adjacent, and every declaration
        // of a name keeps the arity of its first declaration.
        if let Some(first) = history.iter().position(|n| *n == name) {
            if history.last() != Some(&name) {
                return Err(SemanticError::NonContiguousRule(name.to_owned()));
            }
            if arities[first] != head_arity {
                return Err(SemanticError::HeadArityMismatch(name.to_owned()));
            }
        }

        let mut safe: HashSet<&str> = HashSet::new();
        let mut unbound_head: HashSet<&str> =
            rule.head.args.iter().map(String::as_str).collect();

        for subgoal in body {
            match subgoal {
                Subgoal::Invocation(inv) | Subgoal::Negated(inv) => {
                    if inv.name == name {
                        return Err(SemanticError::RecursiveRule(inv.name.clone()));
                    }
                    let Some(first) = history.iter().position(|n| *n == inv.name) else {
                        return Err(SemanticError::UndeclaredRule(inv.name.clone()));
                    };
                    if arities[first] != inv.args.len() {
                        return Err(SemanticError::InvocationArityMismatch(inv.name.clone()));
                    }
                }
                Subgoal::Filter(_) => {}
            }

            match subgoal {
                // A non-wildcard argument to a positive invocation makes
                // that variable safe from here on.
                Subgoal::Invocation(inv) => {
                    for arg in &inv.args {
                        if arg == WILDCARD {
                            continue;
                        }
                        unbound_head.remove(arg.as_str());
                        safe.insert(arg);
                    }
                }
                Subgoal::Negated(inv) => {
                    for arg in &inv.args {
                        if arg != WILDCARD && !safe.contains(arg.as_str()) {
                            return Err(SemanticError::UnsafeVariable(arg.clone()));
                        }
                    }
                }
                Subgoal::Filter(expr) => check_expr_safety(expr, &safe)?,
            }
        }

        // Head variables the body never bound.
        for arg in &rule.head.args {
            if unbound_head.contains(arg.as_str()) {
                return Err(SemanticError::UnsafeVariable(arg.clone()));
            }
        }

        history.push(name);
        arities.push(head_arity);
    }

    Ok(())
}

fn check_expr_safety(expr: &Expr, safe: &HashSet<&str>) -> Result<(), SemanticError> {
    match expr {
        Expr::Var(name) => {
            if safe.contains(name.as_str()) {
                Ok(())
            } else {
                Err(SemanticError::UnsafeVariable(name.clone()))
            }
        }
        Expr::Const(_) => Ok(()),
        Expr::Unary { operand, .. } => check_expr_safety(operand, safe),
        Expr::Binary { lhs, rhs, .. } => {
            check_expr_safety(lhs, safe)?;
            check_expr_safety(rhs, safe)
        }
    }
}
