use tracing::info;

use crate::db::SqlClient;
use crate::error::{UploadError, UploadResult};
use crate::table::{ColumnData, Table};

/// Largest number of rows bound into one insert round trip.
pub const MAX_BATCH_ROWS: usize = 250_000;

/// Per-table upload outcome, reported back to the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadStats {
    pub rows_read: usize,
    pub duplicates_dropped: usize,
    pub rows_uploaded: usize,
}

/// Upload one loaded table: optionally drop duplicate primary-key rows, append
/// the broadcast tag column, and hand the column arrays to [`insert_data`].
pub fn upload_table(
    client: &mut dyn SqlClient,
    table_name: &str,
    mut table: Table,
    primary: &[String],
    cut_duplicates: bool,
    tag: Option<(&str, &str)>,
) -> UploadResult<UploadStats> {
    let rows_read = table.row_count();

    if cut_duplicates {
        if primary.is_empty() {
            return Err(UploadError::Config(
                "a primary key is required to remove duplicates".to_string(),
            ));
        }
        let mask = table.duplicate_mask(primary)?;
        table.retain_rows(&mask);
    }
    let duplicates_dropped = rows_read - table.row_count();

    if let Some((name, value)) = tag {
        table.push_text_column(name, value);
    }

    let names = table.column_names();
    let columns: Vec<ColumnData> = table
        .columns()
        .iter()
        .map(|column| column.data.clone())
        .collect();
    let rows_uploaded = insert_data(client, table_name, &names, &columns)?;

    Ok(UploadStats {
        rows_read,
        duplicates_dropped,
        rows_uploaded,
    })
}

/// Insert column arrays into `table_name`, splitting anything larger than
/// [`MAX_BATCH_ROWS`] into consecutive per-batch commits.
pub fn insert_data(
    client: &mut dyn SqlClient,
    table_name: &str,
    names: &[String],
    columns: &[ColumnData],
) -> UploadResult<usize> {
    if names.len() != columns.len() {
        return Err(UploadError::Insert(format!(
            "{} column names for {} column arrays",
            names.len(),
            columns.len()
        )));
    }
    let row_count = columns.first().map_or(0, ColumnData::len);
    for (name, column) in names.iter().zip(columns) {
        if column.len() != row_count {
            return Err(UploadError::Insert(format!(
                "column {name} has {} rows, expected {row_count}",
                column.len()
            )));
        }
    }

    if row_count > MAX_BATCH_ROWS {
        let batch_count = row_count.div_ceil(MAX_BATCH_ROWS);
        info!(rows = row_count, batches = batch_count, "splitting upload");
        for batch in 0..batch_count {
            let start = batch * MAX_BATCH_ROWS;
            let end = (start + MAX_BATCH_ROWS).min(row_count);
            let subarrays: Vec<ColumnData> = columns
                .iter()
                .map(|column| column.slice(start, end))
                .collect();
            insert_data(client, table_name, names, &subarrays)?;
        }
        return Ok(row_count);
    }

    let rows: Vec<Vec<_>> = (0..row_count)
        .map(|row| columns.iter().map(|column| column.value_at(row)).collect())
        .collect();

    let placeholders: Vec<String> = (1..=names.len()).map(|i| format!("?{i}")).collect();
    let sql = format!(
        "insert into {table_name}({}) values ({})",
        names.join(", "),
        placeholders.join(", ")
    );

    info!(table = %table_name, rows = row_count, "inserting batch");
    client.insert_rows(&sql, &rows)?;
    Ok(row_count)
}
