//! Grammar front-end and program builder.
//!
//! The pest grammar mirrors the language's layered expression productions
//! (equality over inequality over term over simple term over unary). The
//! builder flattens that tree into the program model: single-operand
//! levels collapse to their operand, operator chains fold left to right,
//! and each rule body is reordered to positive invocations, then negated
//! invocations, then filters (source order preserved within each class) so
//! that variables are bound before negation or filtering can mention them.

use anyhow::{Context, Result};
use pest::Parser as _;
use pest_derive::Parser;

use crate::ast::{
    BinOp, Expr, Head, Invocation, Program, Rule as QueryRule, Subgoal, UnaryOp,
};
use crate::value::Value;

#[derive(Parser)]
#[grammar = "nrdl.pest"]
struct Parser;

type Pair<'a> = pest::iterators::Pair<'a, Rule>;
type Pairs<'a> = pest::iterators::Pairs<'a, Rule>;

pub fn parse_program(code: &str) -> Result<Program> {
    let program = Parser::parse(Rule::program, code)
        .context("Failed to parse input")?
        .next()
        .expect("grammar produces a program pair");

    Ok(Program {
        rules: program
            .into_inner()
            .filter(|pair| pair.as_rule() == Rule::rule)
            .map(build_rule)
            .collect(),
    })
}

fn expect_next_rule<'a>(pairs: &mut Pairs<'a>, expected: Rule) -> Pair<'a> {
    let pair = pairs.next().expect("missing pair");
    assert_eq!(pair.as_rule(), expected);
    pair
}

fn convert_identifier(pair: Pair) -> String {
    assert_eq!(pair.as_rule(), Rule::identifier);
    pair.as_str().to_string()
}

fn convert_rule_name(pair: Pair) -> String {
    assert_eq!(pair.as_rule(), Rule::rule_name);
    pair.into_inner().next().expect("missing identifier").as_str().to_string()
}

fn build_rule(pair: Pair) -> QueryRule {
    let mut pairs = pair.into_inner();

    let head_pair = expect_next_rule(&mut pairs, Rule::rule_head);
    let mut head_pairs = head_pair.into_inner();
    let name = convert_rule_name(head_pairs.next().expect("missing rule name"));
    let args = expect_next_rule(&mut head_pairs, Rule::head_variable_list)
        .into_inner()
        .map(convert_identifier)
        .collect();

    let body = pairs.next().map(|body_pair| {
        assert_eq!(body_pair.as_rule(), Rule::rule_body);
        reorder_subgoals(body_pair.into_inner().map(build_subgoal).collect())
    });

    QueryRule {
        head: Head { name, args },
        body,
    }
}

/// Positive invocations first, then negated invocations, then filters.
fn reorder_subgoals(subgoals: Vec<Subgoal>) -> Vec<Subgoal> {
    let mut invocations = Vec::new();
    let mut negated = Vec::new();
    let mut filters = Vec::new();

    for subgoal in subgoals {
        match subgoal {
            Subgoal::Invocation(_) => invocations.push(subgoal),
            Subgoal::Negated(_) => negated.push(subgoal),
            Subgoal::Filter(_) => filters.push(subgoal),
        }
    }

    invocations.extend(negated);
    invocations.extend(filters);
    invocations
}

fn build_subgoal(pair: Pair) -> Subgoal {
    let pair = pair.into_inner().next().expect("empty subgoal");

    match pair.as_rule() {
        Rule::rule_invocation => Subgoal::Invocation(build_invocation(pair)),

        Rule::negated_rule_invocation => {
            let inner = pair.into_inner().next().expect("missing invocation");
            Subgoal::Negated(build_invocation(inner))
        }

        Rule::equality_relation => Subgoal::Filter(build_equality(pair)),

        _ => unreachable!(),
    }
}

fn build_invocation(pair: Pair) -> Invocation {
    let mut pairs = pair.into_inner();
    let name = convert_rule_name(pairs.next().expect("missing rule name"));

    let args = expect_next_rule(&mut pairs, Rule::body_variable_list)
        .into_inner()
        .map(|variable| {
            assert_eq!(variable.as_rule(), Rule::invocation_variable);
            variable.as_str().to_string()
        })
        .collect();

    Invocation { name, args }
}

/// Fold one `operand { operator operand }` level. A lone operand collapses
/// to itself, so the built tree carries no redundant wrapper nodes.
fn fold_binary(pair: Pair, build_operand: fn(Pair) -> Expr) -> Expr {
    let mut pairs = pair.into_inner();
    let mut expr = build_operand(pairs.next().expect("missing operand"));

    while let Some(op_pair) = pairs.next() {
        let rhs = build_operand(pairs.next().expect("missing right operand"));
        expr = Expr::binary(convert_bin_op(op_pair.as_str()), expr, rhs);
    }

    expr
}

fn build_equality(pair: Pair) -> Expr {
    fold_binary(pair, build_inequality)
}

fn build_inequality(pair: Pair) -> Expr {
    fold_binary(pair, build_term)
}

fn build_term(pair: Pair) -> Expr {
    fold_binary(pair, build_simple_term)
}

fn build_simple_term(pair: Pair) -> Expr {
    fold_binary(pair, build_unary)
}

fn build_unary(pair: Pair) -> Expr {
    let mut pairs = pair.into_inner();
    let first = pairs.next().expect("empty unary expression");

    match first.as_rule() {
        Rule::unary_operator => {
            let operand = build_unary(pairs.next().expect("missing unary operand"));
            Expr::unary(convert_unary_op(first.as_str()), operand)
        }
        Rule::primary_expression => build_primary(first),
        _ => unreachable!(),
    }
}

fn build_primary(pair: Pair) -> Expr {
    let pair = pair.into_inner().next().expect("empty primary expression");

    match pair.as_rule() {
        // Parenthesized sub-relation: the fold collapses it transparently.
        Rule::equality_relation => build_equality(pair),

        Rule::identifier => Expr::Var(pair.as_str().to_string()),

        Rule::constant => {
            let constant = pair.into_inner().next().expect("empty constant");
            match constant.as_rule() {
                // `Value::parse` keeps the int-then-float fallback, so an
                // integer literal too wide for i64 lands as a float.
                Rule::int_constant | Rule::float_constant => {
                    Expr::Const(Value::parse(constant.as_str()))
                }
                Rule::string_constant => {
                    let interior = constant
                        .into_inner()
                        .next()
                        .expect("missing string interior");
                    Expr::Const(Value::Text(interior.as_str().to_string()))
                }
                _ => unreachable!(),
            }
        }

        _ => unreachable!(),
    }
}

fn convert_bin_op(symbol: &str) -> BinOp {
    match symbol {
        "=" => BinOp::Eq,
        "!=" => BinOp::Ne,
        "<" => BinOp::Lt,
        "<=" => BinOp::Le,
        ">" => BinOp::Gt,
        ">=" => BinOp::Ge,
        "+" => BinOp::Add,
        "-" => BinOp::Sub,
        "*" => BinOp::Mul,
        "/" => BinOp::Div,
        "%" => BinOp::Mod,
        _ => unreachable!("unknown binary operator {symbol:?}"),
    }
}

fn convert_unary_op(symbol: &str) -> UnaryOp {
    match symbol {
        "!" => UnaryOp::Not,
        "-" => UnaryOp::Neg,
        "+" => UnaryOp::Plus,
        _ => unreachable!("unknown unary operator {symbol:?}"),
    }
}
