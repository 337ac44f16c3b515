use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::viewport::Properties;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterType {
    In,
    Between,
    ClosedOpen,
}

impl FilterType {
    pub fn from_str(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "in" => Some(FilterType::In),
            "between" => Some(FilterType::Between),
            "closed_open" => Some(FilterType::ClosedOpen),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSpec {
    pub values: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
}

pub type ColumnFilters = BTreeMap<FilterType, FilterSpec>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterSet {
    columns: BTreeMap<String, ColumnFilters>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Range {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Self {
        Self { min, max }
    }

    fn from_value(value: &Value) -> Option<Self> {
        let pair = value.as_array()?;
        if pair.len() != 2 {
            return None;
        }
        let bound = |v: &Value| -> Option<Option<f64>> {
            if v.is_null() {
                Some(None)
            } else {
                v.as_f64().map(Some)
            }
        };
        Some(Range {
            min: bound(&pair[0])?,
            max: bound(&pair[1])?,
        })
    }

    pub fn to_value(&self) -> Value {
        Value::Array(vec![bound_value(self.min), bound_value(self.max)])
    }

    fn contains(&self, value: f64, closed_max: bool) -> bool {
        let above = self.min.is_none_or(|min| value >= min);
        let below = self.max.is_none_or(|max| {
            if closed_max { value <= max } else { value < max }
        });
        above && below
    }

    fn to_sql(&self, column: &str, closed_max: bool) -> String {
        let mut parts = vec![numeric_sql(column)];
        if let Some(min) = self.min {
            parts.push(format!("{column} >= {min}"));
        }
        if let Some(max) = self.max {
            let op = if closed_max { "<=" } else { "<" };
            parts.push(format!("{column} {op} {max}"));
        }
        parts.join(" AND ")
    }
}

fn bound_value(bound: Option<f64>) -> Value {
    bound
        .and_then(serde_json::Number::from_f64)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[derive(Debug, Clone, PartialEq)]
enum Condition {
    In(Vec<Value>),
    Between(Vec<Range>),
    ClosedOpen(Vec<Range>),
}

impl Condition {
    fn build(filter_type: FilterType, spec: &FilterSpec) -> Option<Self> {
        let condition = match filter_type {
            FilterType::In => {
                let values: Vec<Value> = spec
                    .values
                    .iter()
                    .filter(|v| !v.is_null())
                    .cloned()
                    .collect();
                if values.is_empty() {
                    return None;
                }
                Condition::In(values)
            }
            FilterType::Between | FilterType::ClosedOpen => {
                let ranges: Vec<Range> = spec.values.iter().filter_map(Range::from_value).collect();
                if ranges.is_empty() {
                    return None;
                }
                if filter_type == FilterType::Between {
                    Condition::Between(ranges)
                } else {
                    Condition::ClosedOpen(ranges)
                }
            }
        };
        Some(condition)
    }

    fn passes(&self, value: &Value) -> bool {
        match self {
            Condition::In(values) => values.iter().any(|candidate| values_equal(value, candidate)),
            Condition::Between(ranges) => numeric(value)
                .is_some_and(|v| ranges.iter().any(|range| range.contains(v, true))),
            Condition::ClosedOpen(ranges) => numeric(value)
                .is_some_and(|v| ranges.iter().any(|range| range.contains(v, false))),
        }
    }

    fn to_sql(&self, column: &str) -> String {
        match self {
            Condition::In(values) => {
                let list: Vec<String> = values.iter().map(sql_literal).collect();
                format!("{column} IN ({})", list.join(", "))
            }
            Condition::Between(ranges) => ranges_to_sql(column, ranges, true),
            Condition::ClosedOpen(ranges) => ranges_to_sql(column, ranges, false),
        }
    }
}

fn ranges_to_sql(column: &str, ranges: &[Range], closed_max: bool) -> String {
    ranges
        .iter()
        .map(|range| format!("({})", range.to_sql(column, closed_max)))
        .collect::<Vec<_>>()
        .join(" OR ")
}

pub fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// SQL condition that holds only where [`numeric`] would return a value.
pub fn numeric_sql(column: &str) -> String {
    format!("typeof({column}) IN ('integer', 'real')")
}

fn values_equal(actual: &Value, expected: &Value) -> bool {
    match (actual, expected) {
        (Value::Null, _) | (_, Value::Null) => false,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::String(_), _) | (_, Value::String(_)) => false,
        _ => match (numeric(actual), numeric(expected)) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        },
    }
}

pub fn sql_literal(value: &Value) -> String {
    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(flag) => if *flag { "1" } else { "0" }.to_string(),
        Value::Number(number) => number.to_string(),
        Value::String(text) => format!("'{}'", text.replace('\'', "''")),
        other => format!("'{}'", other.to_string().replace('\'', "''")),
    }
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn get(&self, column: &str, filter_type: FilterType) -> Option<&FilterSpec> {
        self.columns.get(column)?.get(&filter_type)
    }

    pub fn add_filter(
        &mut self,
        column: &str,
        filter_type: FilterType,
        values: Vec<Value>,
        owner: Option<&str>,
    ) {
        self.columns.entry(column.to_string()).or_default().insert(
            filter_type,
            FilterSpec {
                values,
                owner: owner.map(str::to_string),
            },
        );
    }

    pub fn remove_filter(&mut self, column: &str) {
        self.columns.remove(column);
    }

    pub fn clear(&mut self) {
        self.columns.clear();
    }

    pub fn applicable(&self, owner: Option<&str>) -> FilterSet {
        let Some(owner) = owner else {
            return self.clone();
        };
        let mut columns = BTreeMap::new();
        for (column, filters) in self.columns.iter() {
            let kept: ColumnFilters = filters
                .iter()
                .filter(|(_, spec)| spec.owner.as_deref() != Some(owner))
                .map(|(filter_type, spec)| (*filter_type, spec.clone()))
                .collect();
            if !kept.is_empty() {
                columns.insert(column.clone(), kept);
            }
        }
        FilterSet { columns }
    }

    fn conditions(&self) -> impl Iterator<Item = (&str, Condition)> {
        self.columns.iter().flat_map(|(column, filters)| {
            filters.iter().filter_map(move |(filter_type, spec)| {
                Condition::build(*filter_type, spec).map(|condition| (column.as_str(), condition))
            })
        })
    }

    pub fn passes(&self, properties: &Properties) -> bool {
        self.conditions().all(|(column, condition)| {
            properties
                .get(column)
                .is_some_and(|value| condition.passes(value))
        })
    }

    pub fn apply(&self, features: &[Properties]) -> Vec<Properties> {
        features
            .iter()
            .filter(|properties| self.passes(properties))
            .cloned()
            .collect()
    }

    pub fn to_sql(&self) -> String {
        let clauses: Vec<String> = self
            .conditions()
            .map(|(column, condition)| format!("({})", condition.to_sql(column)))
            .collect();
        if clauses.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", clauses.join(" AND "))
        }
    }
}
