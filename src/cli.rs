use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::aggregation::AggregationType;
use crate::source::SourceType;

#[derive(Debug, Parser)]
#[command(
    name = "tile-widgets",
    version,
    about = "Viewport feature resolution and widget aggregation over tiled data"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level (error|warn|info|debug|trace)
    #[arg(long, default_value = "info", global = true)]
    pub log: String,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Features(FeaturesArgs),
    Histogram(HistogramArgs),
    Category(CategoryArgs),
}

#[derive(Debug, Args)]
pub struct ViewportArgs {
    #[arg(long)]
    pub tiles: Option<PathBuf>,

    /// minx,miny,maxx,maxy
    #[arg(long, allow_hyphen_values = true)]
    pub viewport: Option<String>,

    #[arg(long, default_value = "cartodb_id")]
    pub unique_id: String,
}

#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Pre-resolved feature properties (JSON array or FeatureCollection)
    #[arg(long, conflicts_with_all = ["db", "query"])]
    pub features: Option<PathBuf>,

    #[command(flatten)]
    pub viewport: ViewportArgs,

    /// SQLite database used for the global path
    #[arg(long, requires = "query")]
    pub db: Option<PathBuf>,

    #[arg(long, requires = "db")]
    pub query: Option<String>,

    #[arg(long, value_enum, default_value_t = SourceTypeArg::Sql)]
    pub source_type: SourceTypeArg,

    #[arg(long)]
    pub filters: Option<PathBuf>,

    /// Widget id; filters owned by it are ignored
    #[arg(long)]
    pub owner: Option<String>,
}

#[derive(Debug, Args)]
pub struct FeaturesArgs {
    #[arg(long)]
    pub tiles: PathBuf,

    /// minx,miny,maxx,maxy
    #[arg(long, allow_hyphen_values = true)]
    pub viewport: String,

    #[arg(long, default_value = "cartodb_id")]
    pub unique_id: String,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub output: ReportFormat,
}

#[derive(Debug, Args)]
pub struct HistogramArgs {
    #[arg(long)]
    pub column: String,

    #[arg(long)]
    pub operation_column: Option<String>,

    #[arg(long, value_enum, default_value_t = OperationArg::Count)]
    pub operation: OperationArg,

    /// Comma separated thresholds
    #[arg(long, allow_hyphen_values = true)]
    pub ticks: String,

    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub output: ReportFormat,
}

#[derive(Debug, Args)]
pub struct CategoryArgs {
    #[arg(long)]
    pub column: String,

    #[arg(long)]
    pub operation_column: Option<String>,

    #[arg(long, value_enum, default_value_t = OperationArg::Count)]
    pub operation: OperationArg,

    #[arg(long, default_value = "name")]
    pub alias: String,

    #[command(flatten)]
    pub source: SourceArgs,

    #[arg(long, value_enum, default_value_t = ReportFormat::Text)]
    pub output: ReportFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    Text,
    Json,
    Ndjson,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OperationArg {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceTypeArg {
    Sql,
    #[value(name = "bigquery")]
    BigQuery,
}

impl From<OperationArg> for AggregationType {
    fn from(value: OperationArg) -> Self {
        match value {
            OperationArg::Count => AggregationType::Count,
            OperationArg::Sum => AggregationType::Sum,
            OperationArg::Avg => AggregationType::Avg,
            OperationArg::Min => AggregationType::Min,
            OperationArg::Max => AggregationType::Max,
        }
    }
}

impl From<SourceTypeArg> for SourceType {
    fn from(value: SourceTypeArg) -> Self {
        match value {
            SourceTypeArg::Sql => SourceType::Sql,
            SourceTypeArg::BigQuery => SourceType::BigQuery,
        }
    }
}
