use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "cptariff",
    version,
    about = "CP tariff OCR extraction and normalization tooling"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Process(ProcessArgs),
    Ingest(IngestArgs),
    Status(StatusArgs),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum InputMode {
    Text,
    Table,
}

impl InputMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Table => "table",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct ProcessArgs {
    /// Raw OCR text file, or a JSON array of row arrays with `--input-mode table`.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = InputMode::Text)]
    pub input_mode: InputMode,

    /// Pre-fetched AI extraction payload (JSON) to reconcile with the
    /// rule-based result.
    #[arg(long)]
    pub ai_result: Option<PathBuf>,

    #[arg(long, default_value = ".cache/cptariff")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    /// Where to write the processed record JSON; defaults to stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Extract only, skip the database save.
    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    /// Directory of `.txt` OCR dumps, one document per file.
    #[arg(long)]
    pub input_dir: PathBuf,

    #[arg(long, default_value = ".cache/cptariff")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub max_docs: Option<usize>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/cptariff")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
