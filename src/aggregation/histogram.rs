use serde_json::Value;
use tracing::debug;

use crate::aggregation::types::{AggregationType, TickLadder, tick_label};
use crate::error::{Error, Result, Widget};
use crate::executor::{QueryExecutor, QueryOptions, QueryRow};
use crate::filter::FilterSet;
use crate::source::{SourceData, SourceType};
use crate::viewport::Properties;

#[derive(Debug, Clone, Default)]
pub struct HistogramParams {
    pub data: SourceData,
    pub column: String,
    pub operation_column: Option<String>,
    pub operation: AggregationType,
    pub ticks: Vec<f64>,
    pub filters: FilterSet,
    pub viewport_filter: bool,
    pub viewport_features: Option<Vec<Properties>>,
    pub source_type: SourceType,
    pub options: QueryOptions,
}

impl HistogramParams {
    pub fn operation_column(&self) -> &str {
        self.operation_column.as_deref().unwrap_or(&self.column)
    }
}

pub fn histogram(
    features: &[Properties],
    column: &str,
    operation_column: &str,
    ticks: &[f64],
    operation: AggregationType,
) -> Vec<Option<f64>> {
    let ladder = TickLadder::new(ticks);
    let mut buckets: Vec<Vec<&Value>> = vec![Vec::new(); ladder.bucket_count()];
    for properties in features {
        let bucket = ladder.classify(properties.get(column));
        buckets[bucket].push(properties.get(operation_column).unwrap_or(&Value::Null));
    }
    buckets
        .into_iter()
        .map(|operands| {
            if operands.is_empty() {
                None
            } else {
                operation.apply(operands)
            }
        })
        .collect()
}

pub fn build_histogram_query(
    data: &str,
    column: &str,
    operation_column: &str,
    operation: AggregationType,
    ticks: &[f64],
    filters: &FilterSet,
) -> String {
    let case = TickLadder::new(ticks).to_sql(column);
    let aggregate = operation.to_sql(operation_column);
    let filter_clause = filters.to_sql();
    let filter_clause = if filter_clause.is_empty() {
        String::new()
    } else {
        format!(" {filter_clause}")
    };
    format!(
        "SELECT tick, {aggregate} as value \
         FROM (SELECT {case} as tick, {operation_column} \
         FROM (SELECT * FROM ({data}) as q2{filter_clause}) as q1) as q \
         GROUP BY tick"
    )
}

pub fn project_ticks(rows: &[QueryRow], tick_count: usize) -> Vec<Option<f64>> {
    (0..=tick_count)
        .map(|index| {
            let label = tick_label(index);
            rows.iter()
                .find(|row| row.get("tick").and_then(Value::as_str) == Some(label.as_str()))
                .and_then(|row| row.get("value"))
                .and_then(Value::as_f64)
        })
        .collect()
}

pub fn get_histogram<E>(params: &HistogramParams, executor: &E) -> Result<Vec<Option<f64>>>
where
    E: QueryExecutor + ?Sized,
{
    let data = match &params.data {
        SourceData::Rows(_) => return Err(Error::InvalidInputType(Widget::Histogram)),
        SourceData::Query(text) => text,
    };

    if params.source_type.requires_viewport_filter() && !params.viewport_filter {
        return Err(Error::MissingViewportFilter {
            widget: Widget::Histogram,
            source_type: params.source_type,
        });
    }

    if params.viewport_filter {
        let features = params.viewport_features.as_deref().unwrap_or_default();
        let filtered = params.filters.apply(features);
        return Ok(histogram(
            &filtered,
            &params.column,
            params.operation_column(),
            &params.ticks,
            params.operation,
        ));
    }

    let query = build_histogram_query(
        data,
        &params.column,
        params.operation_column(),
        params.operation,
        &params.ticks,
        &params.filters,
    );
    debug!(%query, "dispatching histogram query");
    let rows = executor.execute(&query, &params.options)?;
    Ok(project_ticks(&rows, params.ticks.len()))
}
