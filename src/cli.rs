use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::formats::FileFormat;

#[derive(Parser, Debug)]
#[command(
    name = "descat",
    version,
    about = "Split DES catalog files and upload them into a database table"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Upload every matching catalog file into a table
    Upload(UploadArgs),
    /// Split a delimited text file into header-bearing chunks
    Split(SplitArgs),
    /// Drop an upload target table
    DropTable(DropTableArgs),
}

#[derive(Args, Debug, Clone)]
pub struct UploadArgs {
    /// Upload all files whose names start with this prefix
    pub filename_base: String,

    /// Name of the destination table
    pub table_name: String,

    /// First file in the sorted matching list to process
    #[arg(short = 's', long, default_value_t = 0)]
    pub start: usize,

    /// Number of files to process (default: all remaining)
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Create the table from the first file's inferred schema
    #[arg(long, default_value_t = false)]
    pub create: bool,

    /// Primary key column(s)
    #[arg(short = 'p', long = "primary")]
    pub primary: Vec<String>,

    /// Keep only the first row per distinct primary-key tuple
    #[arg(short = 'k', long, default_value_t = false)]
    pub remove_duplicates: bool,

    /// FITS HDU index to read the table from (default: first binary table)
    #[arg(short = 'j', long)]
    pub extension: Option<usize>,

    /// Add a TILENAME column derived from each filename
    #[arg(short = 't', long, default_value_t = false)]
    pub tilename_col: bool,

    /// Grant read access to the reader role when creating the table
    #[arg(short = 'u', long, default_value_t = false)]
    pub public: bool,

    /// Force the input format instead of inferring it from the suffix
    #[arg(long, value_enum)]
    pub format: Option<FileFormat>,

    #[arg(long, default_value = "descat.sqlite")]
    pub db_path: PathBuf,

    /// Write a JSON upload report here after a successful run
    #[arg(long)]
    pub report_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct SplitArgs {
    pub input_file: PathBuf,

    /// Prefix for the numbered `<output_base>_NNNN.ssv` chunk files
    pub output_base: String,

    /// Maximum data lines per chunk
    pub max_lines: usize,
}

#[derive(Args, Debug, Clone)]
pub struct DropTableArgs {
    pub table_name: String,

    #[arg(long, default_value = "descat.sqlite")]
    pub db_path: PathBuf,
}
