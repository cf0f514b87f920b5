use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::align::DEFAULT_FUZZY_CUTOFF;
use crate::detect::{DEFAULT_TEXTUAL_CUTOFF, DEFAULT_THRESHOLD_FALLBACK, DEFAULT_THRESHOLD_MAIN};
use crate::semantic::DEFAULT_EMBEDDING_DIM;

#[derive(Parser, Debug)]
#[command(
    name = "tapdiff",
    version,
    about = "Compare TAP logs between two build runs and classify the differences"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Compare(CompareArgs),
    Suites(SuitesArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CompareArgs {
    #[arg(long)]
    pub baseline: String,

    #[arg(long)]
    pub current: String,

    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, default_value = "tap")]
    pub extension: String,

    #[arg(long, default_value_t = DEFAULT_THRESHOLD_MAIN)]
    pub threshold_main: f64,

    #[arg(long, default_value_t = DEFAULT_THRESHOLD_FALLBACK)]
    pub threshold_fallback: f64,

    #[arg(long, default_value_t = DEFAULT_TEXTUAL_CUTOFF)]
    pub textual_cutoff: f64,

    #[arg(long, default_value_t = DEFAULT_FUZZY_CUTOFF)]
    pub fuzzy_cutoff: f64,

    #[arg(long, default_value_t = DEFAULT_EMBEDDING_DIM)]
    pub embedding_dim: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct SuitesArgs {
    #[arg(long)]
    pub log_path: PathBuf,

    #[arg(long, default_value_t = false)]
    pub keep_passing: bool,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
