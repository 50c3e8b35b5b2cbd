use anyhow::{Context, Result};

use crate::cli::DropTableArgs;
use crate::db::SqliteClient;
use crate::schema;

pub fn run(args: DropTableArgs) -> Result<()> {
    let mut client = SqliteClient::open(&args.db_path)
        .with_context(|| format!("failed to open database: {}", args.db_path.display()))?;
    schema::drop_table(&mut client, &args.table_name)
        .with_context(|| format!("failed to drop table {}", args.table_name))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;
    use crate::db::SqlClient;

    #[test]
    fn drops_an_existing_table_and_fails_on_a_missing_one() {
        let db_path = std::env::temp_dir().join(format!(
            "descat_drop_{}.sqlite",
            std::process::id()
        ));
        fs::remove_file(&db_path).ok();

        let mut client = SqliteClient::open(&db_path).expect("database should open");
        client
            .execute_ddl("create table catalog(ID integer NOT NULL)")
            .expect("DDL should run");
        drop(client);

        run(DropTableArgs {
            table_name: "catalog".to_string(),
            db_path: db_path.clone(),
        })
        .expect("drop should run");

        let result = run(DropTableArgs {
            table_name: "catalog".to_string(),
            db_path: db_path.clone(),
        });
        assert!(result.is_err());

        fs::remove_file(db_path).ok();
    }
}
