use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use regex::Regex;
use tracing::info;

use crate::cli::UploadArgs;
use crate::collection::{self, UploadOptions};
use crate::db::SqliteClient;
use crate::model::{FileUploadRecord, UploadReport};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

pub fn run(args: UploadArgs) -> Result<()> {
    let filenames = matching_files(&args.filename_base, args.start, args.count)
        .context("failed to enumerate input files")?;
    if filenames.is_empty() {
        bail!("no files match prefix: {}", args.filename_base);
    }

    info!(
        table = %args.table_name,
        files = filenames.len(),
        db = %args.db_path.display(),
        "starting upload"
    );

    let tile_regex = Regex::new(collection::TILE_PATTERN)
        .context("failed to compile tile name regex")?;
    let options = UploadOptions {
        format: args.format,
        create: args.create,
        primary: args.primary.clone(),
        remove_duplicates: args.remove_duplicates,
        extension: args.extension,
        tilename_col: args.tilename_col,
        public: args.public,
    };

    let mut client = SqliteClient::open(&args.db_path)
        .with_context(|| format!("failed to open database: {}", args.db_path.display()))?;
    let stats = collection::upload_collection(
        &mut client,
        &args.table_name,
        &filenames,
        &options,
        &tile_regex,
    )?;

    let total_rows_uploaded: usize = stats.iter().map(|file| file.rows_uploaded).sum();
    info!(
        files = stats.len(),
        rows = total_rows_uploaded,
        "upload complete"
    );

    if let Some(report_path) = &args.report_path {
        let report = build_report(&args.table_name, &filenames, &stats)?;
        write_json_pretty(report_path, &report)?;
        info!(path = %report_path.display(), "wrote upload report");
    }

    Ok(())
}

/// Files matching `<filename_base>*`, sorted, sliced by `start`/`count`.
fn matching_files(
    filename_base: &str,
    start: usize,
    count: Option<usize>,
) -> Result<Vec<PathBuf>> {
    let pattern = format!("{filename_base}*");
    let mut filenames = Vec::new();
    for entry in glob::glob(&pattern)
        .with_context(|| format!("invalid file pattern: {pattern}"))?
    {
        filenames.push(entry.context("failed to read glob entry")?);
    }
    filenames.sort();

    let end = count.map_or(filenames.len(), |count| {
        (start + count).min(filenames.len())
    });
    if start >= filenames.len() {
        return Ok(Vec::new());
    }
    Ok(filenames[start..end].to_vec())
}

fn build_report(
    table_name: &str,
    filenames: &[PathBuf],
    stats: &[collection::FileUploadStats],
) -> Result<UploadReport> {
    let mut files = Vec::with_capacity(stats.len());
    for (path, file) in filenames.iter().zip(stats) {
        files.push(FileUploadRecord {
            filename: file.filename.clone(),
            sha256: sha256_file(path)?,
            rows_read: file.rows_read,
            duplicates_dropped: file.duplicates_dropped,
            rows_uploaded: file.rows_uploaded,
            tilename: file.tilename.clone(),
        });
    }

    Ok(UploadReport {
        generated_at: now_utc_string(),
        table_name: table_name.to_string(),
        file_count: files.len(),
        total_rows_uploaded: files.iter().map(|file| file.rows_uploaded).sum(),
        files,
    })
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn fixture_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "descat_upload_cmd_{}_{}",
            std::process::id(),
            name
        ));
        fs::create_dir_all(&dir).expect("fixture dir should create");
        dir
    }

    #[test]
    fn matching_files_sorts_and_slices_the_window() {
        let dir = fixture_dir("slice");
        for name in ["cat_03.ssv", "cat_01.ssv", "cat_02.ssv", "other.ssv"] {
            fs::write(dir.join(name), "ID\n1\n").expect("fixture should write");
        }
        let base = dir.join("cat_").to_string_lossy().into_owned();

        let all = matching_files(&base, 0, None).expect("glob should run");
        assert_eq!(all.len(), 3);
        assert!(all[0].ends_with("cat_01.ssv"));

        let window = matching_files(&base, 1, Some(1)).expect("glob should run");
        assert_eq!(window.len(), 1);
        assert!(window[0].ends_with("cat_02.ssv"));

        let past_end = matching_files(&base, 5, Some(2)).expect("glob should run");
        assert!(past_end.is_empty());

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn end_to_end_upload_with_dedup_lands_two_rows() {
        let dir = fixture_dir("e2e");
        let input = dir.join("cat_DES0001+0001.ssv");
        fs::write(&input, "ID NAME\n1 a\n2 b\n2 b\n").expect("fixture should write");
        let db_path = dir.join("e2e.sqlite");
        let report_path = dir.join("report.json");

        let args = UploadArgs {
            filename_base: dir.join("cat_").to_string_lossy().into_owned(),
            table_name: "catalog".to_string(),
            start: 0,
            count: None,
            create: true,
            primary: vec!["ID".to_string()],
            remove_duplicates: true,
            extension: None,
            tilename_col: false,
            public: false,
            format: None,
            db_path: db_path.clone(),
            report_path: Some(report_path.clone()),
        };
        run(args).expect("upload should run");

        let connection =
            rusqlite::Connection::open(&db_path).expect("database should open");
        let count: i64 = connection
            .query_row("SELECT COUNT(*) FROM catalog", [], |row| row.get(0))
            .expect("count should query");
        assert_eq!(count, 2);
        let name: String = connection
            .query_row("SELECT NAME FROM catalog WHERE ID = 2", [], |row| row.get(0))
            .expect("row should query");
        assert_eq!(name, "b");

        let raw = fs::read(&report_path).expect("report should read");
        let report: UploadReport =
            serde_json::from_slice(&raw).expect("report should parse");
        assert_eq!(report.table_name, "catalog");
        assert_eq!(report.file_count, 1);
        assert_eq!(report.total_rows_uploaded, 2);
        assert_eq!(report.files[0].duplicates_dropped, 1);
        assert_eq!(report.files[0].sha256.len(), 64);

        fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn no_matching_files_is_an_error() {
        let dir = fixture_dir("none");
        let base = dir.join("cat_").to_string_lossy().into_owned();

        let result = run(UploadArgs {
            filename_base: base,
            table_name: "catalog".to_string(),
            start: 0,
            count: None,
            create: false,
            primary: Vec::new(),
            remove_duplicates: false,
            extension: None,
            tilename_col: false,
            public: false,
            format: None,
            db_path: dir.join("none.sqlite"),
            report_path: None,
        });
        assert!(result.is_err());

        fs::remove_dir_all(dir).ok();
    }
}
