pub mod report;

use crate::config::AppConfig;
use crate::model::DEFAULT_MODEL_NAME;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Patient name recorded for manually entered lab values
pub const MANUAL_ENTRY: &str = "Manual Entry";

/// Command-line arguments for pancdx
#[derive(Parser, Debug)]
#[command(name = "pancdx")]
#[command(about = "Pancreatic cancer screening from lab values and CT scans")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Directory holding the model artifacts
    #[arg(long, env = "PANCDX_HOME", default_value = ".", global = true)]
    pub base_path: PathBuf,

    /// History store file (default: analysis_history.json under the base path)
    #[arg(long, global = true)]
    pub history: Option<PathBuf>,

    /// Directory for result CSV files (default: the base path)
    #[arg(long, global = true)]
    pub results_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

impl Cli {
    /// Builds the path layout from the global flags
    pub fn config(&self) -> AppConfig {
        let mut config = AppConfig::new(&self.base_path);
        if let Some(history) = &self.history {
            config = config.with_history_path(history);
        }
        if let Some(dir) = &self.results_dir {
            config = config.with_results_dir(dir);
        }
        config
    }
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text format
    Text,
    /// JSON format
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the registered lab-test models
    Models,

    /// Predict from manually entered lab values
    Predict(PredictArgs),

    /// Predict every patient in a CSV or spreadsheet file
    Batch(BatchArgs),

    /// Classify one CT image (DICOM or raster)
    Ct(CtArgs),

    /// Classify several CT images
    CtBatch(CtBatchArgs),

    /// Classify every DICOM file under a folder, recursively
    CtFolder(CtFolderArgs),

    /// Inspect or manage the analysis history
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

/// Lab values are taken as text and parsed by the core
#[derive(Args, Debug)]
pub struct PredictArgs {
    #[arg(long)]
    pub age: String,

    /// 1/0, or a label such as M, male, F, female
    #[arg(long)]
    pub sex: String,

    #[arg(long)]
    pub creatinine: String,

    #[arg(long)]
    pub bilirubin: String,

    #[arg(long)]
    pub glucose: String,

    #[arg(long)]
    pub urine_volume: String,

    #[arg(long = "urine-ph")]
    pub urine_ph: String,

    /// Registered model name (see `pancdx models`)
    #[arg(short, long, default_value = DEFAULT_MODEL_NAME)]
    pub model: String,

    /// Name recorded in the history
    #[arg(short, long, default_value = MANUAL_ENTRY)]
    pub patient: String,

    /// Do not record the result in the history
    #[arg(long)]
    pub no_history: bool,
}

#[derive(Args, Debug)]
pub struct BatchArgs {
    /// Patient file (.csv, .xlsx, .xls, .xlsm, .xlsb, .ods)
    #[arg(value_name = "FILE")]
    pub file: PathBuf,

    /// Registered model name (see `pancdx models`)
    #[arg(short, long, default_value = DEFAULT_MODEL_NAME)]
    pub model: String,

    /// Values in the file are already z-scored
    #[arg(long)]
    pub pre_normalized: bool,

    /// Do not write a results CSV
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Args, Debug)]
pub struct CtArgs {
    #[arg(value_name = "IMAGE")]
    pub image: PathBuf,

    /// CT model artifact (default: models/ct_scans/final_model.onnx under the base path)
    #[arg(long)]
    pub model_path: Option<PathBuf>,

    /// Do not record the result in the history
    #[arg(long)]
    pub no_history: bool,
}

#[derive(Args, Debug)]
pub struct CtBatchArgs {
    #[arg(value_name = "IMAGE", required = true)]
    pub images: Vec<PathBuf>,

    #[arg(long)]
    pub model_path: Option<PathBuf>,

    /// Do not write a results CSV
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Args, Debug)]
pub struct CtFolderArgs {
    #[arg(value_name = "DIRECTORY")]
    pub directory: PathBuf,

    #[arg(long)]
    pub model_path: Option<PathBuf>,

    /// Do not write a results CSV
    #[arg(long)]
    pub no_save: bool,
}

#[derive(Subcommand, Debug)]
pub enum HistoryAction {
    /// Show the most recent records, newest first
    List {
        #[arg(short = 'n', long, default_value_t = 50)]
        limit: usize,
    },
    /// Print the number of records
    Count,
    /// Export the full history to CSV
    Export,
    /// Delete every record
    Clear {
        /// Required to confirm deletion
        #[arg(long)]
        yes: bool,
    },
}
