use std::path::PathBuf;

use regex::Regex;
use tracing::info;

use crate::db::SqlClient;
use crate::error::{UploadError, UploadResult};
use crate::formats::{self, FileFormat};
use crate::schema;
use crate::upload;

/// Tile names embedded in catalog filenames: `DES` + 4 digits + sign + 4 digits.
pub const TILE_PATTERN: &str = r"DES\d{4}[+-]\d{4}";

/// Synthetic tag column appended when tile tagging is requested.
pub const TILENAME_COLUMN: &str = "TILENAME";
const TILENAME_TYPE: &str = "varchar(12)";

/// Options driving one collection upload.
#[derive(Debug, Clone, Default)]
pub struct UploadOptions {
    pub format: Option<FileFormat>,
    pub create: bool,
    pub primary: Vec<String>,
    pub remove_duplicates: bool,
    pub extension: Option<usize>,
    pub tilename_col: bool,
    pub public: bool,
}

/// Per-file outcome of a collection upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileUploadStats {
    pub filename: String,
    pub rows_read: usize,
    pub duplicates_dropped: usize,
    pub rows_uploaded: usize,
    pub tilename: Option<String>,
}

/// Extract the tile name from a filename, e.g. `image_DES2143-5007_r.fits`
/// yields `DES2143-5007`.
pub fn extract_tilename<'a>(filename: &'a str, tile_regex: &Regex) -> UploadResult<&'a str> {
    tile_regex
        .find(filename)
        .map(|found| found.as_str())
        .ok_or_else(|| UploadError::Pattern {
            filename: filename.to_string(),
        })
}

/// Upload an ordered list of catalog files into `table_name`, one file at a
/// time. The first failure halts the remaining queue; files already committed
/// stay committed.
pub fn upload_collection(
    client: &mut dyn SqlClient,
    table_name: &str,
    filenames: &[PathBuf],
    options: &UploadOptions,
    tile_regex: &Regex,
) -> UploadResult<Vec<FileUploadStats>> {
    for filename in filenames {
        if !filename.exists() {
            return Err(UploadError::Config(format!(
                "input file does not exist: {}",
                filename.display()
            )));
        }
    }

    let mut stats = Vec::with_capacity(filenames.len());
    for (index, filename) in filenames.iter().enumerate() {
        // Long-standing quirk, kept as documented behavior: the table is
        // always loaded from the first filename in the list, so every file in
        // a collection uploads the first file's rows.
        let table = formats::read_table(&filenames[0], options.format, options.extension)?;

        let tilename = if options.tilename_col {
            let name = filename.to_string_lossy();
            Some(extract_tilename(&name, tile_regex)?.to_string())
        } else {
            None
        };

        if index == 0 && options.create {
            let extra_cols: Vec<(String, String)> = if options.tilename_col {
                vec![(TILENAME_COLUMN.to_string(), TILENAME_TYPE.to_string())]
            } else {
                Vec::new()
            };
            schema::create_table_from_table(
                client,
                &table,
                table_name,
                &extra_cols,
                &options.primary,
                options.public,
            )?;
        }

        info!(file = %filename.display(), table = %table_name, "uploading");
        let tag = tilename
            .as_deref()
            .map(|value| (TILENAME_COLUMN, value));
        let upload = upload::upload_table(
            client,
            table_name,
            table,
            &options.primary,
            options.remove_duplicates,
            tag,
        )?;

        stats.push(FileUploadStats {
            filename: filename.to_string_lossy().into_owned(),
            rows_read: upload.rows_read,
            duplicates_dropped: upload.duplicates_dropped,
            rows_uploaded: upload.rows_uploaded,
            tilename,
        });
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;

    use super::*;
    use crate::db::testing::RecordingClient;
    use crate::table::Value;

    fn tile_regex() -> Regex {
        Regex::new(TILE_PATTERN).expect("tile pattern should compile")
    }

    fn write_fixture(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("descat_coll_{}_{}", std::process::id(), name));
        fs::write(&path, contents).expect("fixture should write");
        path
    }

    #[test]
    fn extracts_tilename_from_filename() {
        let tile = extract_tilename("image_DES2143-5007_r.fits", &tile_regex())
            .expect("tile name should match");
        assert_eq!(tile, "DES2143-5007");
    }

    #[test]
    fn filename_without_tile_is_a_pattern_error() {
        let result = extract_tilename("catalog_final.fits", &tile_regex());
        assert!(matches!(result, Err(UploadError::Pattern { .. })));
    }

    #[test]
    fn missing_input_file_is_a_config_error() {
        let mut client = RecordingClient::default();
        let result = upload_collection(
            &mut client,
            "catalog",
            &[PathBuf::from("/nonexistent/descat_missing.ssv")],
            &UploadOptions::default(),
            &tile_regex(),
        );
        assert!(matches!(result, Err(UploadError::Config(_))));
    }

    #[test]
    fn first_file_drives_create_and_dedup_keeps_first_rows() {
        let path = write_fixture("dedup_DES0001+0001.ssv", "ID NAME\n1 a\n2 b\n2 b\n");
        let mut client = RecordingClient::default();
        let options = UploadOptions {
            create: true,
            primary: vec!["ID".to_string()],
            remove_duplicates: true,
            ..UploadOptions::default()
        };

        let stats = upload_collection(
            &mut client,
            "catalog",
            &[path.clone()],
            &options,
            &tile_regex(),
        )
        .expect("collection should upload");

        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].rows_read, 3);
        assert_eq!(stats[0].duplicates_dropped, 1);
        assert_eq!(stats[0].rows_uploaded, 2);

        assert_eq!(
            client.ddl,
            vec![
                "create table catalog(ID integer NOT NULL, NAME varchar(12) NOT NULL, \
                 CONSTRAINT catalog_pk PRIMARY KEY (ID))"
            ]
        );
        let (_, rows) = &client.inserts[0];
        assert_eq!(
            rows,
            &vec![
                vec![Value::Int(1), Value::Text("a".to_string())],
                vec![Value::Int(2), Value::Text("b".to_string())],
            ]
        );

        fs::remove_file(path).ok();
    }

    #[test]
    fn every_iteration_loads_the_first_file() {
        let first = write_fixture("quirk_first.ssv", "ID\n1\n");
        let second = write_fixture("quirk_second.ssv", "ID\n7\n8\n");
        let mut client = RecordingClient::default();

        let stats = upload_collection(
            &mut client,
            "catalog",
            &[first.clone(), second.clone()],
            &UploadOptions::default(),
            &tile_regex(),
        )
        .expect("collection should upload");

        // Both iterations read filenames[0], so both upload one row of ID=1.
        assert_eq!(stats[1].rows_read, 1);
        assert_eq!(client.inserts[1].1, vec![vec![Value::Int(1)]]);

        fs::remove_file(first).ok();
        fs::remove_file(second).ok();
    }

    #[test]
    fn tilename_tagging_creates_and_fills_the_tag_column() {
        let path = write_fixture("tag_DES2143-5007_r.ssv", "ID\n5\n6\n");
        let mut client = RecordingClient::default();
        let options = UploadOptions {
            create: true,
            tilename_col: true,
            ..UploadOptions::default()
        };

        let stats = upload_collection(
            &mut client,
            "catalog",
            &[path.clone()],
            &options,
            &tile_regex(),
        )
        .expect("collection should upload");

        assert_eq!(stats[0].tilename.as_deref(), Some("DES2143-5007"));
        assert!(client.ddl[0].contains("TILENAME varchar(12) NOT NULL"));

        let (sql, rows) = &client.inserts[0];
        assert_eq!(sql, "insert into catalog(ID, TILENAME) values (?1, ?2)");
        assert_eq!(
            rows[0],
            vec![Value::Int(5), Value::Text("DES2143-5007".to_string())]
        );

        fs::remove_file(path).ok();
    }

    #[test]
    fn pattern_failure_halts_before_any_upload_of_that_file() {
        let path = write_fixture("notile.ssv", "ID\n1\n");
        let mut client = RecordingClient::default();
        let options = UploadOptions {
            tilename_col: true,
            ..UploadOptions::default()
        };

        let result = upload_collection(
            &mut client,
            "catalog",
            &[path.clone()],
            &options,
            &tile_regex(),
        );
        assert!(matches!(result, Err(UploadError::Pattern { .. })));
        assert!(client.inserts.is_empty());

        fs::remove_file(path).ok();
    }
}
