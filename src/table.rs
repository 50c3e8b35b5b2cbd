use std::collections::HashSet;

use crate::error::{UploadError, UploadResult};

/// Homogeneous storage for one column's values. The closed set of variants is
/// what the type mapper dispatches on.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnData {
    Float(Vec<f64>),
    Int(Vec<i64>),
    Text(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            Self::Float(values) => values.len(),
            Self::Int(values) => values.len(),
            Self::Text(values) => values.len(),
        }
    }

    pub fn value_at(&self, row: usize) -> Value {
        match self {
            Self::Float(values) => Value::Float(values[row]),
            Self::Int(values) => Value::Int(values[row]),
            Self::Text(values) => Value::Text(values[row].clone()),
        }
    }

    /// Copy of the rows in `start..end`.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        match self {
            Self::Float(values) => Self::Float(values[start..end].to_vec()),
            Self::Int(values) => Self::Int(values[start..end].to_vec()),
            Self::Text(values) => Self::Text(values[start..end].to_vec()),
        }
    }

    fn retain_by_mask(&mut self, mask: &[bool]) {
        match self {
            Self::Float(values) => retain_masked(values, mask),
            Self::Int(values) => retain_masked(values, mask),
            Self::Text(values) => retain_masked(values, mask),
        }
    }
}

fn retain_masked<T>(values: &mut Vec<T>, mask: &[bool]) {
    let mut index = 0;
    values.retain(|_| {
        let keep = mask[index];
        index += 1;
        keep
    });
}

/// One scalar cell, as bound into an insert statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Float(f64),
    Int(i64),
    Text(String),
}

/// A named column of homogeneous values.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

impl Column {
    pub fn new(name: impl Into<String>, data: ColumnData) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

/// An ordered set of equal-length columns read from one input file.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    columns: Vec<Column>,
}

impl Table {
    /// Build a table, enforcing the shared-row-count invariant.
    pub fn new(columns: Vec<Column>) -> UploadResult<Self> {
        if let Some(first) = columns.first() {
            let row_count = first.data.len();
            for column in &columns {
                if column.data.len() != row_count {
                    return Err(UploadError::Config(format!(
                        "column {} has {} rows, expected {}",
                        column.name,
                        column.data.len(),
                        row_count
                    )));
                }
            }
        }
        Ok(Self { columns })
    }

    pub fn row_count(&self) -> usize {
        self.columns.first().map_or(0, |column| column.data.len())
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .map(|column| column.name.clone())
            .collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    /// Boolean selection vector keeping the first occurrence of each distinct
    /// primary-key tuple, in row order.
    pub fn duplicate_mask(&self, primary: &[String]) -> UploadResult<Vec<bool>> {
        let mut key_columns = Vec::with_capacity(primary.len());
        for name in primary {
            let column = self.column(name).ok_or_else(|| {
                UploadError::Config(format!("primary key column not found: {name}"))
            })?;
            key_columns.push(column);
        }

        let mut seen = HashSet::new();
        let mut mask = Vec::with_capacity(self.row_count());
        for row in 0..self.row_count() {
            let key: Vec<String> = key_columns
                .iter()
                .map(|column| key_token(&column.data, row))
                .collect();
            mask.push(seen.insert(key));
        }
        Ok(mask)
    }

    /// Drop every row whose mask entry is false.
    pub fn retain_rows(&mut self, mask: &[bool]) {
        for column in &mut self.columns {
            column.data.retain_by_mask(mask);
        }
    }

    /// Append a synthetic text column broadcasting one value across all rows.
    pub fn push_text_column(&mut self, name: impl Into<String>, value: &str) {
        let row_count = self.row_count();
        self.columns.push(Column::new(
            name,
            ColumnData::Text(vec![value.to_string(); row_count]),
        ));
    }
}

/// Hashable token for one cell of a primary-key tuple. Floats compare by their
/// bit pattern, matching exact-duplicate-row semantics.
fn key_token(data: &ColumnData, row: usize) -> String {
    match data {
        ColumnData::Float(values) => format!("f{:016x}", values[row].to_bits()),
        ColumnData::Int(values) => format!("i{}", values[row]),
        ColumnData::Text(values) => format!("t{}", values[row]),
    }
}
