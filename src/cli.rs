use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use killlist::analysis::classify::{
    EXPOSURE_NO_ENGAGEMENT_MIN_IMPRESSIONS, SPEND_NO_RETURN_MIN_COST,
};
use killlist::source::Delimiter;

#[derive(Parser, Debug)]
#[command(
    name = "killlist",
    version,
    about = "Flag wasted ad spend in loosely structured report exports"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Analyze(AnalyzeArgs),
    Inspect(InspectArgs),
}

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = Delimiter::Auto)]
    pub delimiter: Delimiter,

    #[arg(long, default_value = ".cache/killlist")]
    pub out_dir: PathBuf,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long, default_value_t = SPEND_NO_RETURN_MIN_COST)]
    pub min_cost: f64,

    #[arg(long, default_value_t = EXPOSURE_NO_ENGAGEMENT_MIN_IMPRESSIONS)]
    pub min_impressions: f64,

    #[arg(long = "column")]
    pub columns: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct InspectArgs {
    pub input: PathBuf,

    #[arg(long, value_enum, default_value_t = Delimiter::Auto)]
    pub delimiter: Delimiter,

    #[arg(long, default_value_t = 5)]
    pub preview_rows: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}
