use anyhow::Result;
use serde::Serialize;
use serde_json::{Value, json};

use crate::aggregation::{AggregationType, CategoryBucket, tick_label};
use crate::viewport::Properties;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramBin {
    pub tick: String,
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistogramReport {
    pub column: String,
    pub operation: AggregationType,
    pub bins: Vec<HistogramBin>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryReport {
    pub column: String,
    pub operation: AggregationType,
    pub categories: Vec<CategoryBucket>,
}

pub fn histogram_report(
    column: &str,
    operation: AggregationType,
    ticks: &[f64],
    values: &[Option<f64>],
) -> HistogramReport {
    let bins = values
        .iter()
        .enumerate()
        .map(|(idx, value)| HistogramBin {
            tick: tick_label(idx),
            min: if idx == 0 { None } else { ticks.get(idx - 1).copied() },
            max: ticks.get(idx).copied(),
            value: *value,
        })
        .collect();
    HistogramReport {
        column: column.to_string(),
        operation,
        bins,
    }
}

fn format_value(value: Option<f64>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "null".to_string(),
    }
}

fn format_name(name: &Value) -> String {
    match name {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn format_bound(bound: Option<f64>) -> String {
    match bound {
        Some(bound) => bound.to_string(),
        None => "-".to_string(),
    }
}

pub fn histogram_text(report: &HistogramReport) -> Vec<String> {
    let mut lines = vec![format!(
        "histogram: column={} operation={} bins={}",
        report.column,
        report.operation,
        report.bins.len()
    )];
    for bin in report.bins.iter() {
        lines.push(format!(
            "{}: min={} max={} value={}",
            bin.tick,
            format_bound(bin.min),
            format_bound(bin.max),
            format_value(bin.value)
        ));
    }
    lines
}

pub fn histogram_ndjson(report: &HistogramReport) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    lines.push(serde_json::to_string(&json!({
        "type": "summary",
        "column": report.column,
        "operation": report.operation,
        "bins": report.bins.len(),
    }))?);
    for bin in report.bins.iter() {
        lines.push(serde_json::to_string(&json!({
            "type": "bin",
            "bin": bin,
        }))?);
    }
    Ok(lines)
}

pub fn category_text(report: &CategoryReport) -> Vec<String> {
    let mut lines = vec![format!(
        "categories: column={} operation={} count={}",
        report.column,
        report.operation,
        report.categories.len()
    )];
    for category in report.categories.iter() {
        lines.push(format!(
            "{}: {}",
            format_name(&category.name),
            format_value(category.value)
        ));
    }
    lines
}

pub fn category_ndjson(report: &CategoryReport) -> Result<Vec<String>> {
    let mut lines = Vec::new();
    lines.push(serde_json::to_string(&json!({
        "type": "summary",
        "column": report.column,
        "operation": report.operation,
        "count": report.categories.len(),
    }))?);
    for category in report.categories.iter() {
        lines.push(serde_json::to_string(&json!({
            "type": "category",
            "category": category,
        }))?);
    }
    Ok(lines)
}

pub fn features_ndjson(features: &[Properties]) -> Result<Vec<String>> {
    features
        .iter()
        .map(|properties| serde_json::to_string(properties).map_err(anyhow::Error::from))
        .collect()
}
