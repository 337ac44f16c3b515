use std::path::Path;
use std::thread;

use rusqlite::Connection;
use serde_json::json;

use tile_widgets::aggregation::{AggregationType, HistogramParams, get_histogram};
use tile_widgets::executor::{AbortSignal, QueryExecutor, QueryOptions, SqliteExecutor};
use tile_widgets::source::SourceData;
use tile_widgets::{Error, discard_aborted};

fn create_sample_db(path: &Path) {
    let conn = Connection::open(path).expect("open");
    conn.execute_batch(
        "
        CREATE TABLE stores (storetype TEXT, revenue INTEGER);
        INSERT INTO stores VALUES ('a', 1);
        INSERT INTO stores VALUES ('a', 15);
        INSERT INTO stores VALUES ('b', 25);
        INSERT INTO stores VALUES ('b', 26);
        ",
    )
    .expect("schema");
}

fn histogram_params(options: QueryOptions) -> HistogramParams {
    HistogramParams {
        data: SourceData::query("SELECT * FROM stores"),
        column: "revenue".to_string(),
        operation: AggregationType::Count,
        ticks: vec![10.0, 20.0],
        options,
        ..Default::default()
    }
}

#[test]
fn executes_against_readonly_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stores.sqlite");
    create_sample_db(&path);

    let executor = SqliteExecutor::open_readonly(&path).expect("open executor");
    let rows = executor
        .execute(
            "SELECT storetype, COUNT(*) as n FROM stores GROUP BY storetype ORDER BY storetype",
            &QueryOptions::default(),
        )
        .expect("rows");
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].get("storetype"), Some(&json!("a")));
    assert_eq!(rows[0].get("n"), Some(&json!(2)));

    let values = get_histogram(&histogram_params(QueryOptions::default()), &executor)
        .expect("histogram");
    assert_eq!(values, vec![Some(1.0), Some(1.0), Some(2.0)]);
}

#[test]
fn readonly_executor_refuses_writes() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stores.sqlite");
    create_sample_db(&path);

    let executor = SqliteExecutor::open_readonly(&path).expect("open executor");
    let err = executor
        .execute("DELETE FROM stores", &QueryOptions::default())
        .expect_err("should error");
    assert!(matches!(err, Error::Sqlite(_)));
}

#[test]
fn aborted_request_is_not_executed() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stores.sqlite");
    create_sample_db(&path);
    let executor = SqliteExecutor::open_readonly(&path).expect("open executor");

    let signal = AbortSignal::new();
    signal.abort();
    let result = get_histogram(&histogram_params(QueryOptions::with_abort(signal)), &executor);
    let err = result.expect_err("should abort");
    assert!(err.is_aborted());

    let result = get_histogram(
        &histogram_params(QueryOptions::with_abort({
            let signal = AbortSignal::new();
            signal.abort();
            signal
        })),
        &executor,
    );
    assert_eq!(discard_aborted(result).expect("not an error"), None);
}

#[test]
fn live_signal_lets_request_through() {
    let conn = Connection::open_in_memory().expect("open");
    conn.execute_batch("CREATE TABLE stores (storetype TEXT, revenue INTEGER);")
        .expect("schema");
    let executor = SqliteExecutor::new(conn);

    let signal = AbortSignal::new();
    let values = get_histogram(
        &histogram_params(QueryOptions::with_abort(signal.clone())),
        &executor,
    )
    .expect("histogram");
    assert_eq!(values, vec![None, None, None]);
    assert!(!signal.is_aborted());
}

#[test]
fn discard_aborted_passes_real_failures_through() {
    let executor = SqliteExecutor::new(Connection::open_in_memory().expect("open"));
    let result = executor.execute("SELECT * FROM missing_table", &QueryOptions::default());
    let err = discard_aborted(result).expect_err("real failure");
    assert!(matches!(err, Error::Sqlite(_)));
}

#[test]
fn concurrent_requests_do_not_interfere() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stores.sqlite");
    create_sample_db(&path);
    let executor = SqliteExecutor::open_readonly(&path).expect("open executor");

    let expected: Vec<Vec<Option<f64>>> = AggregationType::ALL
        .iter()
        .map(|operation| {
            let params = HistogramParams {
                operation: *operation,
                ..histogram_params(QueryOptions::default())
            };
            get_histogram(&params, &executor).expect("sequential")
        })
        .collect();

    thread::scope(|scope| {
        let handles: Vec<_> = AggregationType::ALL
            .iter()
            .map(|operation| {
                let executor = &executor;
                scope.spawn(move || {
                    let params = HistogramParams {
                        operation: *operation,
                        ..histogram_params(QueryOptions::default())
                    };
                    get_histogram(&params, executor).expect("concurrent")
                })
            })
            .collect();
        for (handle, expected) in handles.into_iter().zip(expected.iter()) {
            assert_eq!(&handle.join().expect("join"), expected);
        }
    });
}

#[test]
fn interrupt_stops_running_query() {
    let executor = SqliteExecutor::new(Connection::open_in_memory().expect("open"));
    let done = std::sync::atomic::AtomicBool::new(false);

    thread::scope(|scope| {
        let handle = scope.spawn(|| {
            let result = executor.execute(
                "WITH RECURSIVE c(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM c) \
                 SELECT max(x) FROM c",
                &QueryOptions::default(),
            );
            done.store(true, std::sync::atomic::Ordering::SeqCst);
            result
        });
        while !done.load(std::sync::atomic::Ordering::SeqCst) {
            executor.interrupt();
            thread::sleep(std::time::Duration::from_millis(10));
        }
        let err = handle.join().expect("join").expect_err("should be interrupted");
        assert!(err.is_aborted());
    });
}
