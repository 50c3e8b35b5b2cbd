use std::fs;
use std::path::Path;

use crate::error::{UploadError, UploadResult};
use crate::table::{Column, ColumnData, Table};

/// Read a whitespace-separated text file: first line names the columns, every
/// following non-empty line is one data row.
pub fn read_ssv(path: &Path) -> UploadResult<Table> {
    let contents = fs::read_to_string(path)?;
    let mut lines = contents.lines();

    let header = lines
        .next()
        .ok_or_else(|| UploadError::format(path, "file is empty, expected a header line"))?;
    let names: Vec<&str> = header.split_whitespace().collect();
    if names.is_empty() {
        return Err(UploadError::format(path, "header line has no column names"));
    }

    let mut cells: Vec<Vec<String>> = vec![Vec::new(); names.len()];
    for (line_no, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split_whitespace().collect();
        if fields.len() != names.len() {
            return Err(UploadError::format(
                path,
                format!(
                    "line {} has {} fields, expected {}",
                    line_no + 2,
                    fields.len(),
                    names.len()
                ),
            ));
        }
        for (column, field) in cells.iter_mut().zip(&fields) {
            column.push((*field).to_string());
        }
    }

    let columns = names
        .iter()
        .zip(cells)
        .map(|(name, values)| Column::new(*name, infer_column(values)))
        .collect();
    Table::new(columns)
}

/// Narrowest type covering every value: all-i64 is integer, else all-f64 is
/// float, else text.
fn infer_column(values: Vec<String>) -> ColumnData {
    if !values.is_empty() && values.iter().all(|value| value.parse::<i64>().is_ok()) {
        return ColumnData::Int(
            values
                .iter()
                .map(|value| value.parse().unwrap_or_default())
                .collect(),
        );
    }
    if !values.is_empty() && values.iter().all(|value| value.parse::<f64>().is_ok()) {
        return ColumnData::Float(
            values
                .iter()
                .map(|value| value.parse().unwrap_or_default())
                .collect(),
        );
    }
    ColumnData::Text(values)
}
