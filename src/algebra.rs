//! Relational algebra over [`DataSet`]s and the relation catalog.
//!
//! The operations are pure: inputs are taken by reference and every result
//! is a freshly built `DataSet`. The [`DataLoader`] owns the name-indexed
//! catalog of fact and derived relations and lazily reads fact CSV files
//! from its data directory, one file per relation name.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use log::debug;

use crate::ast::WILDCARD;
use crate::dataset::{DataSet, Row};
use crate::error::{Error, Result};
use crate::value::Value;

#[derive(Debug, Default)]
pub struct DataLoader {
    data_path: PathBuf,
    catalog: HashMap<String, DataSet>,
}

impl DataLoader {
    pub fn new(data_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            catalog: HashMap::new(),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.catalog.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&DataSet> {
        self.catalog.get(name)
    }

    /// Catalog lookup for an invocation target. Validation guarantees the
    /// declaring rule ran first, so a miss is a fatal execution error.
    pub fn relation(&self, name: &str) -> Result<&DataSet> {
        self.catalog
            .get(name)
            .ok_or_else(|| Error::UndeclaredRelation(name.to_owned()))
    }

    /// Publish a derived relation, replacing any previous entry.
    pub fn publish(&mut self, name: String, set: DataSet) {
        self.catalog.insert(name, set);
    }

    /// Load a fact's CSV file, caching under its name. Repeated loads of
    /// the same name during one run reuse the first result.
    pub fn load(&mut self, name: &str) -> Result<&DataSet> {
        if !self.catalog.contains_key(name) {
            let path = self.data_path.join(format!("{name}.csv"));
            let set = read_csv(&path)?;
            debug!("loaded fact \"{name}\": {} rows from {}", set.len(), path.display());
            self.catalog.insert(name.to_owned(), set);
        }
        Ok(&self.catalog[name])
    }
}

fn read_csv(path: &Path) -> Result<DataSet> {
    let data_err = |source| Error::DataRead {
        path: path.to_owned(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)
        .map_err(data_err)?;

    let mut columns: Vec<String> = Vec::new();
    for field in reader.headers().map_err(data_err)?.iter() {
        if field.is_empty() {
            return Err(Error::EmptyColumnName(path.to_owned()));
        }
        if columns.iter().any(|c| c == field) {
            return Err(Error::DuplicateColumnName {
                path: path.to_owned(),
                name: field.to_owned(),
            });
        }
        columns.push(field.to_owned());
    }

    let mut rows = HashSet::new();
    for record in reader.records() {
        let record = record.map_err(data_err)?;
        rows.insert(record.iter().map(Value::parse).collect::<Row>());
    }

    Ok(DataSet::new(columns, rows))
}

/// Positional projection: target entry `i` renames column position `i`;
/// a `_` entry drops that position. The output is a set, so projecting
/// away a distinguishing column collapses duplicates.
pub fn project(set: &DataSet, targets: &[String]) -> DataSet {
    debug_assert!(targets.len() <= set.columns.len());

    let kept: Vec<usize> = targets
        .iter()
        .enumerate()
        .filter(|(_, target)| *target != WILDCARD)
        .map(|(position, _)| position)
        .collect();

    let columns = kept.iter().map(|&i| targets[i].clone()).collect();
    let rows = set
        .rows
        .iter()
        .map(|row| kept.iter().map(|&i| row[i].clone()).collect())
        .collect();

    DataSet::new(columns, rows)
}

/// Every pairing of a row from `a` with a row from `b`, concatenated.
/// Output columns may repeat names; the executor only products relations
/// with disjoint columns.
pub fn cartesian_product(a: &DataSet, b: &DataSet) -> DataSet {
    let mut columns = a.columns.clone();
    columns.extend(b.columns.iter().cloned());

    let mut rows = HashSet::new();
    for row_a in &a.rows {
        for row_b in &b.rows {
            let mut row = row_a.clone();
            row.extend(row_b.iter().cloned());
            rows.insert(row);
        }
    }

    DataSet::new(columns, rows)
}

/// Join on equality of all shared column names. Output columns are `a`'s
/// followed by `b`'s columns not already in `a`. Key equality is exact
/// per-variant `Value` equality.
pub fn natural_join(a: &DataSet, b: &DataSet) -> DataSet {
    let mut a_key = Vec::new();
    let mut b_key = Vec::new();
    for (position, column) in a.columns.iter().enumerate() {
        if let Some(in_b) = b.position(column) {
            a_key.push(position);
            b_key.push(in_b);
        }
    }

    let b_extra: Vec<usize> = b
        .columns
        .iter()
        .enumerate()
        .filter(|(_, c)| !a.columns.contains(c))
        .map(|(i, _)| i)
        .collect();

    let mut columns = a.columns.clone();
    columns.extend(b_extra.iter().map(|&i| b.columns[i].clone()));

    let mut by_key: HashMap<Vec<&Value>, Vec<&Row>> = HashMap::new();
    for row in &b.rows {
        let key = b_key.iter().map(|&i| &row[i]).collect();
        by_key.entry(key).or_default().push(row);
    }

    let mut rows = HashSet::new();
    for row_a in &a.rows {
        let key: Vec<&Value> = a_key.iter().map(|&i| &row_a[i]).collect();
        if let Some(matches) = by_key.get(&key) {
            for row_b in matches {
                let mut row = row_a.clone();
                row.extend(b_extra.iter().map(|&i| row_b[i].clone()));
                rows.insert(row);
            }
        }
    }

    DataSet::new(columns, rows)
}

/// Set union under `a`'s column order; the caller passes `b` already
/// aligned to it.
pub fn union(a: &DataSet, b: &DataSet) -> DataSet {
    let mut rows = a.rows.clone();
    rows.extend(b.rows.iter().cloned());
    DataSet::new(a.columns.clone(), rows)
}

/// Negation-as-failure: drop every row of `a` that agrees with some row
/// of `b` on all of `b`'s columns. This is deliberately not strict set
/// subtraction; `b` is usually a projection onto a subset of `a`'s
/// columns.
pub fn difference(a: &DataSet, b: &DataSet) -> Result<DataSet> {
    let positions: Vec<(usize, usize)> = b
        .columns
        .iter()
        .enumerate()
        .map(|(in_b, c)| match a.position(c) {
            Some(in_a) => Ok((in_a, in_b)),
            None => Err(Error::MissingColumn(c.clone())),
        })
        .collect::<Result<_>>()?;

    let restrictions: HashSet<Vec<&Value>> = b
        .rows
        .iter()
        .map(|row| positions.iter().map(|&(_, in_b)| &row[in_b]).collect())
        .collect();

    let rows = a
        .rows
        .iter()
        .filter(|row| {
            let restricted: Vec<&Value> =
                positions.iter().map(|&(in_a, _)| &row[in_a]).collect();
            !restrictions.contains(&restricted)
        })
        .cloned()
        .collect();

    Ok(DataSet::new(a.columns.clone(), rows))
}

/// Permute `set`'s columns into `new_order`, re-projecting every row.
pub fn reorder(set: &DataSet, new_order: &[String]) -> Result<DataSet> {
    let positions: Vec<usize> = new_order
        .iter()
        .map(|c| set.position(c).ok_or_else(|| Error::MissingColumn(c.clone())))
        .collect::<Result<_>>()?;

    let rows = set
        .rows
        .iter()
        .map(|row| positions.iter().map(|&i| row[i].clone()).collect())
        .collect();

    Ok(DataSet::new(new_order.to_vec(), rows))
}

pub fn has_common_columns(a: &[String], b: &[String]) -> bool {
    a.iter().any(|c| b.contains(c))
}
