use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::aggregation::types::AggregationType;
use crate::error::{Error, Result, Widget};
use crate::executor::{QueryExecutor, QueryOptions, QueryRow};
use crate::filter::{FilterSet, numeric};
use crate::source::{SourceData, SourceType};
use crate::viewport::Properties;

pub const DEFAULT_ALIAS: &str = "name";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBucket {
    pub name: Value,
    pub value: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CategoryParams {
    pub data: SourceData,
    pub column: String,
    pub operation_column: Option<String>,
    pub operation: AggregationType,
    pub filters: FilterSet,
    pub viewport_filter: bool,
    pub viewport_features: Option<Vec<Properties>>,
    pub source_type: SourceType,
    pub alias: String,
    pub options: QueryOptions,
}

impl Default for CategoryParams {
    fn default() -> Self {
        Self {
            data: SourceData::default(),
            column: String::new(),
            operation_column: None,
            operation: AggregationType::default(),
            filters: FilterSet::default(),
            viewport_filter: false,
            viewport_features: None,
            source_type: SourceType::default(),
            alias: DEFAULT_ALIAS.to_string(),
            options: QueryOptions::default(),
        }
    }
}

impl CategoryParams {
    pub fn operation_column(&self) -> &str {
        self.operation_column.as_deref().unwrap_or(&self.column)
    }
}

// 1, 1.0 and true land in one group, as they do under SQL GROUP BY.
fn group_key(value: &Value) -> String {
    match (value, numeric(value)) {
        (Value::String(text), _) => format!("s:{text}"),
        (_, Some(number)) => format!("n:{}", number + 0.0),
        (other, None) => other.to_string(),
    }
}

pub fn group_values_by_column(
    features: &[Properties],
    column: &str,
    operation_column: &str,
    operation: AggregationType,
) -> Vec<CategoryBucket> {
    let mut order: Vec<&Value> = Vec::new();
    let mut groups: HashMap<String, Vec<&Value>> = HashMap::new();
    for properties in features {
        let name = properties.get(column).unwrap_or(&Value::Null);
        let operand = properties.get(operation_column).unwrap_or(&Value::Null);
        groups
            .entry(group_key(name))
            .or_insert_with(|| {
                order.push(name);
                Vec::new()
            })
            .push(operand);
    }
    order
        .into_iter()
        .map(|name| {
            let operands = groups.remove(&group_key(name)).unwrap_or_default();
            CategoryBucket {
                name: name.clone(),
                value: operation.apply(operands),
            }
        })
        .collect()
}

pub fn build_categories_query(
    data: &str,
    column: &str,
    operation_column: &str,
    operation: AggregationType,
    filters: &FilterSet,
    alias: &str,
) -> String {
    let aggregate = operation.to_sql(operation_column);
    let filter_clause = filters.to_sql();
    let filter_clause = if filter_clause.is_empty() {
        String::new()
    } else {
        format!(" {filter_clause}")
    };
    format!(
        "WITH all_categories as (SELECT {column} as {alias} FROM ({data}) as q GROUP BY {alias}), \
         categories as (SELECT {column} as {alias}, {aggregate} as value \
         FROM ({data}) as q{filter_clause} GROUP BY {alias}) \
         SELECT a.{alias}, b.value FROM all_categories a \
         LEFT JOIN categories b ON a.{alias}=b.{alias}"
    )
}

fn categories_from_rows(rows: &[QueryRow], alias: &str) -> Vec<CategoryBucket> {
    rows.iter()
        .map(|row| CategoryBucket {
            name: row.get(alias).cloned().unwrap_or(Value::Null),
            value: row.get("value").and_then(Value::as_f64),
        })
        .collect()
}

pub fn get_categories<E>(params: &CategoryParams, executor: &E) -> Result<Vec<CategoryBucket>>
where
    E: QueryExecutor + ?Sized,
{
    let data = match &params.data {
        SourceData::Rows(_) => return Err(Error::InvalidInputType(Widget::Category)),
        SourceData::Query(text) => text,
    };

    if params.source_type.requires_viewport_filter() && !params.viewport_filter {
        return Err(Error::MissingViewportFilter {
            widget: Widget::Category,
            source_type: params.source_type,
        });
    }

    if params.viewport_filter {
        let features = params.viewport_features.as_deref().unwrap_or_default();
        let filtered = params.filters.apply(features);
        return Ok(group_values_by_column(
            &filtered,
            &params.column,
            params.operation_column(),
            params.operation,
        ));
    }

    let query = build_categories_query(
        data,
        &params.column,
        params.operation_column(),
        params.operation,
        &params.filters,
        &params.alias,
    );
    debug!(%query, "dispatching category query");
    let rows = executor.execute(&query, &params.options)?;
    Ok(categories_from_rows(&rows, &params.alias))
}
