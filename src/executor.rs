//! Query execution: evaluates a validated program rule by rule.
//!
//! Evaluation is single-threaded and synchronous. Each rule publishes its
//! relation to the loader's catalog; the program's result is the relation
//! of the final rule.

use std::collections::HashSet;

use log::debug;

use crate::algebra::{self, DataLoader};
use crate::ast::{Expr, Invocation, Program, Rule, Subgoal, WILDCARD};
use crate::dataset::DataSet;
use crate::error::{Error, Result};
use crate::operator;

/// Run a validated program; returns the final rule's relation.
pub fn execute(program: &Program, loader: &mut DataLoader) -> Result<DataSet> {
    let mut last: Option<DataSet> = None;

    for rule in &program.rules {
        let name = rule.name();
        let result = if rule.is_fact() {
            execute_fact(rule, loader)?
        } else {
            let contribution = execute_body(rule, loader)?;
            // A contiguous redefinition unions with the published relation.
            let merged = match loader.get(name) {
                Some(existing) => algebra::union(existing, &contribution),
                None => contribution,
            };
            loader.publish(name.to_owned(), merged.clone());
            merged
        };
        debug!("rule \"{name}\": {} rows", result.len());
        last = Some(result);
    }

    last.ok_or(Error::EmptyProgram)
}

/// A fact rule loads its CSV relation; the head arguments name columns
/// that must exist in the file. They verify, they do not project.
fn execute_fact(rule: &Rule, loader: &mut DataLoader) -> Result<DataSet> {
    let set = loader.load(rule.name())?;

    for column in &rule.head.args {
        if !set.columns.contains(column) {
            return Err(Error::UnknownColumn(column.clone()));
        }
    }

    Ok(set.clone())
}

fn execute_body(rule: &Rule, loader: &mut DataLoader) -> Result<DataSet> {
    let body = rule.body.as_deref().unwrap_or_default();
    let mut intermediate: Option<DataSet> = None;

    for subgoal in body {
        let next = match subgoal {
            Subgoal::Invocation(inv) => {
                let next = invoke(inv, loader)?;
                match intermediate {
                    None => next,
                    Some(current) => {
                        if algebra::has_common_columns(&current.columns, &next.columns) {
                            algebra::natural_join(&current, &next)
                        } else {
                            algebra::cartesian_product(&current, &next)
                        }
                    }
                }
            }
            Subgoal::Negated(inv) => {
                let current = seeded(intermediate, rule)?;
                let next = invoke(inv, loader)?;
                algebra::difference(&current, &next)?
            }
            Subgoal::Filter(expr) => {
                let current = seeded(intermediate, rule)?;
                filter(&current, expr)?
            }
        };
        intermediate = Some(next);
    }

    let current = seeded(intermediate, rule)?;

    // Project onto the head arguments, keeping the intermediate's column
    // order; columns the head does not mention become wildcards.
    let targets: Vec<String> = current
        .columns
        .iter()
        .map(|column| {
            if rule.head.args.contains(column) {
                column.clone()
            } else {
                WILDCARD.to_owned()
            }
        })
        .collect();

    Ok(algebra::project(&current, &targets))
}

/// Post-reorder, a valid body starts with a positive invocation; anything
/// else means the validator was bypassed.
fn seeded(intermediate: Option<DataSet>, rule: &Rule) -> Result<DataSet> {
    intermediate.ok_or_else(|| Error::NoPositiveInvocation(rule.name().to_owned()))
}

fn invoke(inv: &Invocation, loader: &DataLoader) -> Result<DataSet> {
    let relation = loader.relation(&inv.name)?;
    if inv.args.len() > relation.columns.len() {
        return Err(Error::InvocationWidth {
            name: inv.name.clone(),
            supplied: inv.args.len(),
            actual: relation.columns.len(),
        });
    }
    Ok(algebra::project(relation, &inv.args))
}

fn filter(set: &DataSet, expr: &Expr) -> Result<DataSet> {
    let mut rows = HashSet::new();
    for row in &set.rows {
        if operator::filter_row(row, &set.columns, expr)? {
            rows.insert(row.clone());
        }
    }
    Ok(DataSet::new(set.columns.clone(), rows))
}
