mod fits;
mod ssv;

use std::path::Path;

use clap::ValueEnum;

use crate::error::UploadResult;
use crate::table::Table;

/// Input file format for the upload pipeline.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum FileFormat {
    Fits,
    Ssv,
}

/// Infer the format from the filename suffix: `fits`/`fit` (case-insensitive)
/// is a FITS binary table; anything else is whitespace-separated text.
pub fn guess_format(path: &Path) -> FileFormat {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if name.ends_with("fits") || name.ends_with("fit") {
        FileFormat::Fits
    } else {
        FileFormat::Ssv
    }
}

/// Read a table from `path`, inferring the format when no hint is given.
///
/// `extension` selects the HDU for FITS input; `None` picks the first binary
/// table in the file. It is ignored for SSV input.
pub fn read_table(
    path: &Path,
    format_hint: Option<FileFormat>,
    extension: Option<usize>,
) -> UploadResult<Table> {
    let format = format_hint.unwrap_or_else(|| guess_format(path));
    match format {
        FileFormat::Fits => fits::read_binary_table(path, extension),
        FileFormat::Ssv => ssv::read_ssv(path),
    }
}
