use std::path::Path;

use rusqlite::types::ToSqlOutput;
use rusqlite::{Connection, ToSql};

use crate::error::{UploadError, UploadResult};
use crate::table::Value;

/// Narrow seam over the database client. Schema and upload logic is written
/// against this trait so it can run against a recording fake in tests.
pub trait SqlClient {
    /// Execute one DDL statement and commit it.
    fn execute_ddl(&mut self, sql: &str) -> UploadResult<()>;

    /// Bind every row against `sql` inside one transaction and commit.
    fn insert_rows(&mut self, sql: &str, rows: &[Vec<Value>]) -> UploadResult<()>;

    /// Dialect storage options appended to CREATE TABLE statements. The Oracle
    /// heritage of this tool used `COMPRESS`; SQLite has none.
    fn storage_options(&self) -> &'static str {
        ""
    }

    /// Dialect statement granting read access to the fixed reader role, where
    /// the dialect has one.
    fn reader_grant(&self, _table_name: &str) -> Option<String> {
        None
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        match self {
            Value::Float(value) => Ok(ToSqlOutput::from(*value)),
            Value::Int(value) => Ok(ToSqlOutput::from(*value)),
            Value::Text(value) => Ok(ToSqlOutput::from(value.as_str())),
        }
    }
}

/// SQLite adapter over `rusqlite::Connection`, the shipped backend.
pub struct SqliteClient {
    connection: Connection,
}

impl SqliteClient {
    pub fn open(path: &Path) -> UploadResult<Self> {
        let connection = Connection::open(path)?;
        Ok(Self { connection })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> UploadResult<Self> {
        let connection = Connection::open_in_memory()?;
        Ok(Self { connection })
    }
}

impl SqlClient for SqliteClient {
    fn execute_ddl(&mut self, sql: &str) -> UploadResult<()> {
        self.connection
            .execute_batch(sql)
            .map_err(UploadError::Schema)
    }

    fn insert_rows(&mut self, sql: &str, rows: &[Vec<Value>]) -> UploadResult<()> {
        let tx = self
            .connection
            .transaction()
            .map_err(|err| UploadError::Insert(err.to_string()))?;
        {
            let mut statement = tx
                .prepare(sql)
                .map_err(|err| UploadError::Insert(err.to_string()))?;
            for row in rows {
                statement
                    .execute(rusqlite::params_from_iter(row.iter()))
                    .map_err(|err| UploadError::Insert(err.to_string()))?;
            }
        }
        tx.commit().map_err(|err| UploadError::Insert(err.to_string()))
    }
}
