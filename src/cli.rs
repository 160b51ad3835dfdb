//! CLI argument parsing for the feedback tagger.
use crate::model::Provider;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Root CLI entrypoint.
#[derive(Parser, Debug)]
#[command(
    name = "ftag",
    version,
    about = "Tag spreadsheet feedback rows with topic labels using a hosted language model",
    after_help = "Commands:\n  classify --input <file>     Classify every Feedback row and write an annotated .xlsx\n  prompt --feedback <text>    Print the prompt that would be sent for one feedback\n  labels                      Show the labels and sentinels in effect\n\nEnvironment:\n  FTAG_PROVIDER, FTAG_ENDPOINT, FTAG_API_KEY, FTAG_MODEL fill settings not given as flags\n\nExamples:\n  ftag classify --input feedback.xlsx --provider gemini --endpoint https://generativelanguage.googleapis.com/v1beta/models/gemini-pro:generateContent\n  ftag classify --input feedback.csv --output tagged.xlsx --report run.json\n  ftag prompt --feedback \"Tagihan saya dobel\"\n  ftag labels --json",
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct RootArgs {
    /// Log debug detail to stderr (RUST_LOG overrides)
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    Classify(ClassifyArgs),
    Prompt(PromptArgs),
    Labels(LabelsArgs),
}

/// Classify command inputs.
#[derive(Parser, Debug)]
#[command(about = "Classify each feedback row and write an annotated spreadsheet")]
pub struct ClassifyArgs {
    /// Spreadsheet to read (.xlsx, .xls, .ods, .csv, ...)
    #[arg(long, value_name = "FILE")]
    pub input: PathBuf,

    /// Output workbook (defaults to hasil_kategorisasi_feedback.xlsx next to the input)
    #[arg(long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Config file (defaults to the per-user config if present)
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Model provider
    #[arg(long, value_enum)]
    pub provider: Option<Provider>,

    /// Provider endpoint URL
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Provider credential (prefer FTAG_API_KEY)
    #[arg(long, value_name = "KEY")]
    pub api_key: Option<String>,

    /// Model identifier (defaults per provider)
    #[arg(long, value_name = "ID")]
    pub model: Option<String>,

    /// Write a JSON run report
    #[arg(long, value_name = "FILE")]
    pub report: Option<PathBuf>,

    /// Write one JSON line per model call
    #[arg(long, value_name = "FILE")]
    pub call_log: Option<PathBuf>,
}

/// Prompt preview inputs.
#[derive(Parser, Debug)]
#[command(about = "Print the composed prompt for one feedback string")]
pub struct PromptArgs {
    /// Feedback text to embed
    #[arg(long, value_name = "TEXT")]
    pub feedback: String,

    /// Config file supplying labels and descriptions
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Label listing inputs.
#[derive(Parser, Debug)]
#[command(about = "Show the canonical labels, descriptions and sentinels")]
pub struct LabelsArgs {
    /// Config file supplying labels and descriptions
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Emit machine-readable JSON output
    #[arg(long)]
    pub json: bool,
}
