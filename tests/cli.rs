use std::path::Path;

use clap::{CommandFactory, Parser};

use tile_widgets::aggregation::AggregationType;
use tile_widgets::cli::{Cli, Command, OperationArg, ReportFormat, SourceTypeArg};
use tile_widgets::source::SourceType;

#[test]
fn parse_features_minimal() {
    let cli = Cli::parse_from([
        "tile-widgets",
        "features",
        "--tiles",
        "tiles.json",
        "--viewport",
        "-10,-5,10,5",
    ]);
    assert_eq!(cli.log, "info");
    match cli.command {
        Command::Features(args) => {
            assert_eq!(args.tiles.as_os_str(), "tiles.json");
            assert_eq!(args.viewport, "-10,-5,10,5");
            assert_eq!(args.unique_id, "cartodb_id");
            assert_eq!(args.output, ReportFormat::Text);
        }
        _ => panic!("expected features command"),
    }
}

#[test]
fn parse_histogram_global() {
    let cli = Cli::parse_from([
        "tile-widgets",
        "histogram",
        "--column",
        "revenue",
        "--operation",
        "avg",
        "--operation-column",
        "size",
        "--ticks",
        "10,20,30",
        "--db",
        "stores.sqlite",
        "--query",
        "SELECT * FROM stores",
        "--filters",
        "filters.json",
        "--owner",
        "hist-1",
        "--output",
        "ndjson",
        "--log",
        "debug",
    ]);
    assert_eq!(cli.log, "debug");
    match cli.command {
        Command::Histogram(args) => {
            assert_eq!(args.column, "revenue");
            assert_eq!(args.operation, OperationArg::Avg);
            assert_eq!(AggregationType::from(args.operation), AggregationType::Avg);
            assert_eq!(args.operation_column.as_deref(), Some("size"));
            assert_eq!(args.ticks, "10,20,30");
            assert_eq!(args.source.db.as_deref(), Some(Path::new("stores.sqlite")));
            assert_eq!(args.source.query.as_deref(), Some("SELECT * FROM stores"));
            assert_eq!(args.source.owner.as_deref(), Some("hist-1"));
            assert_eq!(args.source.source_type, SourceTypeArg::Sql);
            assert_eq!(args.output, ReportFormat::Ndjson);
        }
        _ => panic!("expected histogram command"),
    }
}

#[test]
fn parse_category_viewport_mode() {
    let cli = Cli::parse_from([
        "tile-widgets",
        "category",
        "--column",
        "storetype",
        "--tiles",
        "tiles.json",
        "--viewport",
        "0,0,1,1",
        "--unique-id",
        "id",
        "--source-type",
        "bigquery",
        "--alias",
        "label",
    ]);
    match cli.command {
        Command::Category(args) => {
            assert_eq!(args.column, "storetype");
            assert_eq!(args.operation, OperationArg::Count);
            assert_eq!(args.alias, "label");
            assert_eq!(args.source.viewport.unique_id, "id");
            assert_eq!(args.source.viewport.viewport.as_deref(), Some("0,0,1,1"));
            assert_eq!(SourceType::from(args.source.source_type), SourceType::BigQuery);
            assert_eq!(args.output, ReportFormat::Text);
        }
        _ => panic!("expected category command"),
    }
}

#[test]
fn db_and_query_go_together() {
    let missing_query = Cli::try_parse_from([
        "tile-widgets",
        "histogram",
        "--column",
        "v",
        "--ticks",
        "1",
        "--db",
        "stores.sqlite",
    ]);
    assert!(missing_query.is_err());

    let with_features = Cli::try_parse_from([
        "tile-widgets",
        "category",
        "--column",
        "v",
        "--features",
        "rows.json",
        "--db",
        "stores.sqlite",
        "--query",
        "SELECT 1",
    ]);
    assert!(with_features.is_err());
}

#[test]
fn histogram_help_describes_fields() {
    Cli::command().debug_assert();
    let mut cmd = Cli::command();
    let histogram = cmd
        .find_subcommand_mut("histogram")
        .expect("histogram command");
    let mut buffer = Vec::new();
    histogram.write_long_help(&mut buffer).expect("help");
    let help = String::from_utf8(buffer).expect("utf8");

    assert!(help.contains("Comma separated thresholds"));
    assert!(help.contains("SQLite database"));
    assert!(help.contains("filters owned by it are ignored"));
}
