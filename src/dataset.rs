//! Relations: ordered columns over a set of rows.

use std::collections::HashSet;
use std::fmt;

use itertools::Itertools;

use crate::value::Value;

/// One row of a relation, one value per column.
pub type Row = Vec<Value>;

/// A named-column table with set semantics on its rows.
///
/// Every row has exactly one value per column; duplicate rows collapse.
/// Operations in [`crate::algebra`] never mutate a `DataSet` in place.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DataSet {
    pub columns: Vec<String>,
    pub rows: HashSet<Row>,
}

impl DataSet {
    pub fn new(columns: Vec<String>, rows: HashSet<Row>) -> Self {
        debug_assert!(rows.iter().all(|row| row.len() == columns.len()));
        Self { columns, rows }
    }

    /// Position of a column by name.
    pub fn position(&self, column: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == column)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for DataSet {
    /// Header line, then one line per row, space-joined. Rows print in
    /// sorted order so the output is stable across runs.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.iter().join(" "))?;
        let mut rows: Vec<&Row> = self.rows.iter().collect();
        rows.sort();
        for row in rows {
            writeln!(f, "{}", row.iter().join(" "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[Value]) -> Row {
        values.to_vec()
    }

    #[test]
    fn rows_deduplicate() {
        let mut rows = HashSet::new();
        rows.insert(row(&[Value::Int(1), Value::from("a")]));
        rows.insert(row(&[Value::Int(1), Value::from("a")]));
        let set = DataSet::new(vec!["x".into(), "y".into()], rows);
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn display_is_sorted_and_space_joined() {
        let mut rows = HashSet::new();
        rows.insert(row(&[Value::Int(2), Value::from("b")]));
        rows.insert(row(&[Value::Int(1), Value::from("a")]));
        let set = DataSet::new(vec!["n".into(), "s".into()], rows);
        assert_eq!(set.to_string(), "n s\n1 a\n2 b\n");
    }

    #[test]
    fn position_finds_columns() {
        let set = DataSet::new(vec!["a".into(), "b".into()], HashSet::new());
        assert_eq!(set.position("b"), Some(1));
        assert_eq!(set.position("z"), None);
    }
}
