use anyhow::{Context, Result};
use tracing::info;

use crate::cli::SplitArgs;
use crate::split::split_file;

pub fn run(args: SplitArgs) -> Result<()> {
    info!(
        input = %args.input_file.display(),
        output_base = %args.output_base,
        max_lines = args.max_lines,
        "splitting file"
    );

    let outputs = split_file(&args.input_file, &args.output_base, args.max_lines)
        .with_context(|| format!("failed to split {}", args.input_file.display()))?;

    info!(chunks = outputs.len(), "wrote chunk files");
    Ok(())
}
