use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use tile_widgets::aggregation::{CategoryParams, HistogramParams, get_categories, get_histogram};
use tile_widgets::cli::{Cli, Command, ReportFormat, SourceArgs};
use tile_widgets::executor::{QueryExecutor, QueryOptions, QueryRow, SqliteExecutor};
use tile_widgets::filter::FilterSet;
use tile_widgets::input::{parse_ticks, parse_viewport, read_features, read_filters, read_tiles};
use tile_widgets::output::{
    CategoryReport, category_ndjson, category_text, features_ndjson, histogram_ndjson,
    histogram_report, histogram_text,
};
use tile_widgets::source::SourceData;
use tile_widgets::viewport::{Properties, viewport_features};

struct NoDatabase;

impl QueryExecutor for NoDatabase {
    fn execute(
        &self,
        _query: &str,
        _options: &QueryOptions,
    ) -> tile_widgets::Result<Vec<QueryRow>> {
        Err(tile_widgets::Error::Query(
            "global mode requires --db and --query".to_string(),
        ))
    }
}

struct ResolvedSource {
    data: SourceData,
    viewport_filter: bool,
    viewport_features: Option<Vec<Properties>>,
    filters: FilterSet,
    executor: Box<dyn QueryExecutor>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli.log);

    match cli.command {
        Command::Features(args) => {
            let mut tiles = read_tiles(&args.tiles)?;
            let viewport = parse_viewport(&args.viewport)?;
            let features = viewport_features(&mut tiles, &viewport, &args.unique_id);
            info!(tiles = tiles.len(), features = features.len(), "features resolved");
            match args.output {
                ReportFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&features)?);
                }
                ReportFormat::Ndjson => {
                    for line in features_ndjson(&features)? {
                        println!("{}", line);
                    }
                }
                ReportFormat::Text => {
                    println!("features: {}", features.len());
                    for properties in features.iter() {
                        let id = properties
                            .get(&args.unique_id)
                            .map(|value| value.to_string())
                            .unwrap_or_else(|| "null".to_string());
                        println!("{}={} properties={}", args.unique_id, id, properties.len());
                    }
                }
            }
        }
        Command::Histogram(args) => {
            let ticks = parse_ticks(&args.ticks)?;
            let source = resolve_source(&args.source)?;
            let params = HistogramParams {
                data: source.data,
                column: args.column.clone(),
                operation_column: args.operation_column.clone(),
                operation: args.operation.into(),
                ticks: ticks.clone(),
                filters: source.filters,
                viewport_filter: source.viewport_filter,
                viewport_features: source.viewport_features,
                source_type: args.source.source_type.into(),
                options: QueryOptions::default(),
            };
            let values =
                get_histogram(&params, source.executor.as_ref()).context("compute histogram")?;
            let report = histogram_report(&args.column, params.operation, &ticks, &values);
            match args.output {
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                ReportFormat::Ndjson => {
                    for line in histogram_ndjson(&report)? {
                        println!("{}", line);
                    }
                }
                ReportFormat::Text => {
                    for line in histogram_text(&report) {
                        println!("{}", line);
                    }
                }
            }
        }
        Command::Category(args) => {
            let source = resolve_source(&args.source)?;
            let params = CategoryParams {
                data: source.data,
                column: args.column.clone(),
                operation_column: args.operation_column.clone(),
                operation: args.operation.into(),
                filters: source.filters,
                viewport_filter: source.viewport_filter,
                viewport_features: source.viewport_features,
                source_type: args.source.source_type.into(),
                alias: args.alias.clone(),
                options: QueryOptions::default(),
            };
            let categories =
                get_categories(&params, source.executor.as_ref()).context("compute categories")?;
            let report = CategoryReport {
                column: args.column.clone(),
                operation: params.operation,
                categories,
            };
            match args.output {
                ReportFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
                ReportFormat::Ndjson => {
                    for line in category_ndjson(&report)? {
                        println!("{}", line);
                    }
                }
                ReportFormat::Text => {
                    for line in category_text(&report) {
                        println!("{}", line);
                    }
                }
            }
        }
    }

    Ok(())
}

fn resolve_source(args: &SourceArgs) -> Result<ResolvedSource> {
    let filters = match args.filters.as_deref() {
        Some(path) => read_filters(path)?,
        None => FilterSet::new(),
    };
    let filters = filters.applicable(args.owner.as_deref());

    if let (Some(db), Some(query)) = (args.db.as_deref(), args.query.as_deref()) {
        let executor = SqliteExecutor::open_readonly(db)
            .with_context(|| format!("failed to open database: {}", db.display()))?;
        return Ok(ResolvedSource {
            data: SourceData::query(query),
            viewport_filter: false,
            viewport_features: None,
            filters,
            executor: Box::new(executor),
        });
    }

    let features = if let Some(path) = args.features.as_deref() {
        read_features(path)?
    } else {
        let tiles_path = args
            .viewport
            .tiles
            .as_deref()
            .context("--features, --tiles with --viewport, or --db with --query is required")?;
        let viewport = args
            .viewport
            .viewport
            .as_deref()
            .context("--tiles requires --viewport")?;
        let mut tiles = read_tiles(tiles_path)?;
        let viewport = parse_viewport(viewport)?;
        viewport_features(&mut tiles, &viewport, &args.viewport.unique_id)
    };

    Ok(ResolvedSource {
        data: SourceData::default(),
        viewport_filter: true,
        viewport_features: Some(features),
        filters,
        executor: Box::new(NoDatabase),
    })
}

fn init_tracing(level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_new(level)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
