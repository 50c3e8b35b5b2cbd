use tracing::info;

use crate::db::SqlClient;
use crate::error::UploadResult;
use crate::table::{Column, ColumnData, Table};

/// Smallest width a varchar column is ever declared with.
pub const MIN_VARCHAR_WIDTH: usize = 12;

/// Target type token for one column. Text widths are sized from the longest
/// observed value, floored at [`MIN_VARCHAR_WIDTH`].
pub fn target_type(column: &Column) -> String {
    match &column.data {
        ColumnData::Float(_) => "binary_double".to_string(),
        ColumnData::Int(_) => "integer".to_string(),
        ColumnData::Text(values) => {
            let observed = values.iter().map(String::len).max().unwrap_or(0);
            format!("varchar({})", observed.max(MIN_VARCHAR_WIDTH))
        }
    }
}

/// Map every column of a table to its target type token, in column order.
pub fn map_types(table: &Table) -> Vec<String> {
    table.columns().iter().map(target_type).collect()
}

/// Render the CREATE TABLE statement: every column NOT NULL, an optional
/// `<name>_pk` primary-key constraint, and the dialect's storage options.
pub fn build_create_table(
    name: &str,
    fields: &[(String, String)],
    primary: &[String],
    storage_options: &str,
) -> String {
    let columns: Vec<String> = fields
        .iter()
        .map(|(column, target)| format!("{column} {target} NOT NULL"))
        .collect();
    let constraint = if primary.is_empty() {
        String::new()
    } else {
        format!(
            ", CONSTRAINT {name}_pk PRIMARY KEY ({})",
            primary.join(",")
        )
    };

    let mut sql = format!("create table {name}({}{constraint})", columns.join(", "));
    if !storage_options.is_empty() {
        sql.push(' ');
        sql.push_str(storage_options);
    }
    sql
}

/// Issue the CREATE TABLE, plus the reader grant when the table is public.
pub fn create_table(
    client: &mut dyn SqlClient,
    name: &str,
    fields: &[(String, String)],
    primary: &[String],
    public: bool,
) -> UploadResult<()> {
    let sql = build_create_table(name, fields, primary, client.storage_options());
    info!(sql = %sql, "creating table");
    client.execute_ddl(&sql)?;

    if public {
        if let Some(grant) = client.reader_grant(name) {
            client.execute_ddl(&grant)?;
        }
    }
    Ok(())
}

/// Create the destination table from a loaded table's inferred schema plus any
/// synthetic columns.
pub fn create_table_from_table(
    client: &mut dyn SqlClient,
    table: &Table,
    table_name: &str,
    extra_cols: &[(String, String)],
    primary: &[String],
    public: bool,
) -> UploadResult<()> {
    let mut fields: Vec<(String, String)> = table
        .columns()
        .iter()
        .map(|column| (column.name.clone(), target_type(column)))
        .collect();
    fields.extend_from_slice(extra_cols);
    create_table(client, table_name, &fields, primary, public)
}

pub fn drop_table(client: &mut dyn SqlClient, name: &str) -> UploadResult<()> {
    info!(table = %name, "dropping table");
    client.execute_ddl(&format!("drop table {name}"))
}
