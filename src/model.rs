use serde::{Deserialize, Serialize};

/// Provenance manifest written after a collection upload (`--report-path`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadReport {
    pub generated_at: String,
    pub table_name: String,
    pub file_count: usize,
    pub total_rows_uploaded: usize,
    pub files: Vec<FileUploadRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileUploadRecord {
    pub filename: String,
    pub sha256: String,
    pub rows_read: usize,
    pub duplicates_dropped: usize,
    pub rows_uploaded: usize,
    pub tilename: Option<String>,
}
