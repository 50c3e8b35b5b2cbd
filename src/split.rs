use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::{UploadError, UploadResult};

/// Split a delimited text file into chunks of at most `max_lines` data lines,
/// repeating the input's header line at the top of every chunk. Output files
/// are `<output_base>_0001.ssv`, `<output_base>_0002.ssv`, and so on.
pub fn split_file(input: &Path, output_base: &str, max_lines: usize) -> UploadResult<Vec<PathBuf>> {
    if max_lines == 0 {
        return Err(UploadError::Config(
            "max_lines must be at least 1".to_string(),
        ));
    }

    let reader = BufReader::new(File::open(input)?);
    let mut lines = reader.lines();

    let Some(header) = lines.next().transpose()? else {
        // Nothing to split: an empty input produces no chunks.
        return Ok(Vec::new());
    };

    let mut outputs = Vec::new();
    let mut writer: Option<BufWriter<File>> = None;
    let mut data_lines_in_chunk = 0;

    for line in lines {
        let line = line?;
        if writer.is_none() || data_lines_in_chunk == max_lines {
            if let Some(mut previous) = writer.take() {
                previous.flush()?;
            }
            let path = PathBuf::from(format!("{output_base}_{:04}.ssv", outputs.len() + 1));
            let mut chunk = BufWriter::new(File::create(&path)?);
            writeln!(chunk, "{header}")?;
            outputs.push(path);
            writer = Some(chunk);
            data_lines_in_chunk = 0;
        }
        if let Some(chunk) = writer.as_mut() {
            writeln!(chunk, "{line}")?;
            data_lines_in_chunk += 1;
        }
    }
    if let Some(mut last) = writer.take() {
        last.flush()?;
    }

    info!(input = %input.display(), chunks = outputs.len(), "split complete");
    Ok(outputs)
}
