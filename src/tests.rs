use assert_fs::prelude::*;
use assert_fs::TempDir;
use hashbag::HashBag;

use crate::{execute, parse_program, validate, DataLoader, DataSet, Error, SemanticError, Value};

fn setup_data() -> TempDir {
    let dir = TempDir::new().unwrap();
    dir.child("Parent.csv")
        .write_str("parent,child\nann,bob\nbob,cid\n")
        .unwrap();
    dir.child("Emp.csv")
        .write_str("name,age\nal,30\nbo,40\n")
        .unwrap();
    dir.child("Num.csv").write_str("n\n1\n2\n3\n").unwrap();
    dir.child("Big.csv").write_str("n\n3\n").unwrap();
    dir.child("Color.csv").write_str("hue\nred\nblue\n").unwrap();
    dir
}

fn run_query(dir: &TempDir, code: &str) -> crate::Result<DataSet> {
    let program = parse_program(code).unwrap();
    validate(&program)?;
    let mut loader = DataLoader::new(dir.path());
    execute(&program, &mut loader)
}

fn check_query(dir: &TempDir, code: &str, columns: &[&str], expected: &[&[Value]]) {
    let result = run_query(dir, code).unwrap();
    assert_eq!(result.columns, columns);

    let result_rows: HashBag<&[Value]> = result.rows.iter().map(|row| row.as_slice()).collect();
    let expected_rows: HashBag<&[Value]> = expected.iter().copied().collect();
    assert_eq!(result_rows, expected_rows);
}

fn int(n: i64) -> Value {
    Value::Int(n)
}

fn text(s: &str) -> Value {
    Value::Text(s.to_owned())
}

#[test]
fn fact_rule_loads_and_returns_the_relation() {
    let dir = setup_data();
    check_query(
        &dir,
        "Emp(name, age)\n",
        &["name", "age"],
        &[&[text("al"), int(30)], &[text("bo"), int(40)]],
    );
}

#[test]
fn fact_rule_with_unknown_column_is_fatal() {
    let dir = setup_data();
    let err = run_query(&dir, "Emp(name, salary)\n").unwrap_err();
    assert!(matches!(err, Error::UnknownColumn(c) if c == "salary"));
}

#[test]
fn grandparent_join() {
    let dir = setup_data();
    check_query(
        &dir,
        "Parent(parent, child)\n\
         Grandparent(x, z) := Parent(x, y) AND Parent(y, z)\n",
        &["x", "z"],
        &[&[text("ann"), text("cid")]],
    );
}

#[test]
fn filter_on_numeric_column() {
    let dir = setup_data();
    check_query(
        &dir,
        "Emp(name, age)\n\
         Older(name) := Emp(name, age) AND age > 35\n",
        &["name"],
        &[&[text("bo")]],
    );
}

#[test]
fn filter_written_before_its_binding_invocation() {
    let dir = setup_data();
    check_query(
        &dir,
        "Emp(name, age)\n\
         Older(name) := age > 35 AND Emp(name, age)\n",
        &["name"],
        &[&[text("bo")]],
    );
}

#[test]
fn filter_with_arithmetic_widens_integers() {
    let dir = setup_data();
    // 30 / 4 is 7.5, not 7: integer operands compute in floating point.
    check_query(
        &dir,
        "Emp(name, age)\n\
         Fractional(name) := Emp(name, age) AND age / 4 = 7.5\n",
        &["name"],
        &[&[text("al")]],
    );
}

#[test]
fn filter_on_string_literal() {
    let dir = setup_data();
    check_query(
        &dir,
        "Emp(name, age)\n\
         Bo(name) := Emp(name, _) AND name = \"bo\"\n",
        &["name"],
        &[&[text("bo")]],
    );
}

#[test]
fn mixing_string_and_number_in_filter_is_fatal() {
    let dir = setup_data();
    let err = run_query(
        &dir,
        "Emp(name, age)\n\
         Bad(name) := Emp(name, age) AND name = 1\n",
    )
    .unwrap_err();
    assert!(matches!(err, Error::MixedStringOperands));
}

#[test]
fn negation_removes_matching_rows() {
    let dir = setup_data();
    check_query(
        &dir,
        "Num(n)\n\
         Big(n)\n\
         Small(n) := Num(n) AND NOT Big(n)\n",
        &["n"],
        &[&[int(1)], &[int(2)]],
    );
}

#[test]
fn negation_matches_on_subtrahend_columns_only() {
    let dir = setup_data();
    // NOT Big(age) strips employees whose age appears in Big, matching on
    // the single shared column rather than the whole row.
    dir.child("Big.csv").write_str("age\n40\n").unwrap();
    check_query(
        &dir,
        "Emp(name, age)\n\
         Big(age)\n\
         Young(name, age) := Emp(name, age) AND NOT Big(age)\n",
        &["name", "age"],
        &[&[text("al"), int(30)]],
    );
}

#[test]
fn unrelated_invocations_take_the_cartesian_product() {
    let dir = setup_data();
    let result = run_query(
        &dir,
        "Num(n)\n\
         Color(hue)\n\
         Pairs(n, hue) := Num(n) AND Color(hue)\n",
    )
    .unwrap();
    assert_eq!(result.columns, vec!["n", "hue"]);
    assert_eq!(result.rows.len(), 6);
}

#[test]
fn shared_variable_forces_a_natural_join() {
    let dir = setup_data();
    check_query(
        &dir,
        "Num(n)\n\
         Big(n)\n\
         Both(n) := Num(n) AND Big(n)\n",
        &["n"],
        &[&[int(3)]],
    );
}

#[test]
fn contiguous_redefinition_unions_without_duplicates() {
    let dir = setup_data();
    // Both definitions derive the same rows; the union must not double.
    check_query(
        &dir,
        "Parent(parent, child)\n\
         R(x, y) := Parent(x, y)\n\
         R(x, y) := Parent(x, y)\n",
        &["x", "y"],
        &[&[text("ann"), text("bob")], &[text("bob"), text("cid")]],
    );
}

#[test]
fn redefinition_merges_distinct_contributions() {
    let dir = setup_data();
    check_query(
        &dir,
        "Emp(name, age)\n\
         Pick(name) := Emp(name, _) AND name = \"al\"\n\
         Pick(name) := Emp(name, _) AND name = \"bo\"\n",
        &["name"],
        &[&[text("al")], &[text("bo")]],
    );
}

#[test]
fn wildcard_drops_a_column() {
    let dir = setup_data();
    check_query(
        &dir,
        "Parent(parent, child)\n\
         HasChild(x) := Parent(x, _)\n",
        &["x"],
        &[&[text("ann")], &[text("bob")]],
    );
}

#[test]
fn head_projection_collapses_duplicates() {
    let dir = setup_data();
    // Projecting away the child column leaves one row per parent even
    // when a parent has several children.
    dir.child("Parent.csv")
        .write_str("parent,child\nann,bob\nann,cal\n")
        .unwrap();
    check_query(
        &dir,
        "Parent(parent, child)\n\
         HasChild(x) := Parent(x, _)\n",
        &["x"],
        &[&[text("ann")]],
    );
}

#[test]
fn derived_rules_chain_through_the_catalog() {
    let dir = setup_data();
    check_query(
        &dir,
        "Parent(parent, child)\n\
         Grandparent(x, z) := Parent(x, y) AND Parent(y, z)\n\
         Ancestor(z) := Grandparent(_, z)\n",
        &["z"],
        &[&[text("cid")]],
    );
}

#[test]
fn unsafe_variable_is_rejected_before_loading() {
    let dir = setup_data();
    let err = run_query(
        &dir,
        "Num(n)\n\
         Big(n)\n\
         Bad(n) := Num(n) AND NOT Big(m)\n",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Semantic(SemanticError::UnsafeVariable(v)) if v == "m"
    ));
}

#[test]
fn non_contiguous_redefinition_is_rejected() {
    let dir = setup_data();
    let err = run_query(
        &dir,
        "Num(n)\n\
         R(a) := Num(a)\n\
         T(a) := Num(a)\n\
         R(a) := Num(a)\n",
    )
    .unwrap_err();
    assert!(matches!(
        err,
        Error::Semantic(SemanticError::NonContiguousRule(name)) if name == "R"
    ));
}

#[test]
fn result_prints_header_then_sorted_rows() {
    let dir = setup_data();
    let result = run_query(&dir, "Emp(name, age)\n").unwrap();
    assert_eq!(result.to_string(), "name age\nal 30\nbo 40\n");
}
