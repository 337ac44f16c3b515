use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::filter::{numeric, numeric_sql};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationType {
    #[default]
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregationType {
    pub const ALL: [AggregationType; 5] = [
        AggregationType::Count,
        AggregationType::Sum,
        AggregationType::Avg,
        AggregationType::Min,
        AggregationType::Max,
    ];

    pub fn as_sql(self) -> &'static str {
        match self {
            AggregationType::Count => "COUNT",
            AggregationType::Sum => "SUM",
            AggregationType::Avg => "AVG",
            AggregationType::Min => "MIN",
            AggregationType::Max => "MAX",
        }
    }

    pub fn to_sql(self, column: &str) -> String {
        let sql = self.as_sql();
        match self {
            AggregationType::Count => format!("{sql}({column})"),
            _ => format!("{sql}(CASE WHEN {} THEN {column} END)", numeric_sql(column)),
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "count" => Some(AggregationType::Count),
            "sum" => Some(AggregationType::Sum),
            "avg" => Some(AggregationType::Avg),
            "min" => Some(AggregationType::Min),
            "max" => Some(AggregationType::Max),
            _ => None,
        }
    }

    pub fn apply<'a, I>(self, operands: I) -> Option<f64>
    where
        I: IntoIterator<Item = &'a Value>,
    {
        if self == AggregationType::Count {
            let count = operands.into_iter().filter(|v| !v.is_null()).count();
            return Some(count as f64);
        }

        let mut count = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        for value in operands.into_iter().filter_map(numeric) {
            count += 1;
            sum += value;
            min = min.min(value);
            max = max.max(value);
        }
        if count == 0 {
            return None;
        }
        match self {
            AggregationType::Count => Some(count as f64),
            AggregationType::Sum => Some(sum),
            AggregationType::Avg => Some(sum / count as f64),
            AggregationType::Min => Some(min),
            AggregationType::Max => Some(max),
        }
    }
}

impl fmt::Display for AggregationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

pub fn tick_label(index: usize) -> String {
    format!("cat_{index}")
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickLadder<'a> {
    ticks: &'a [f64],
}

impl<'a> TickLadder<'a> {
    pub fn new(ticks: &'a [f64]) -> Self {
        Self { ticks }
    }

    pub fn bucket_count(&self) -> usize {
        self.ticks.len() + 1
    }

    pub fn classify(&self, value: Option<&Value>) -> usize {
        let Some(value) = value.and_then(numeric) else {
            return self.ticks.len();
        };
        self.ticks
            .iter()
            .position(|tick| value < *tick)
            .unwrap_or(self.ticks.len())
    }

    pub fn to_sql(&self, column: &str) -> String {
        let mut cases: Vec<String> = self
            .ticks
            .iter()
            .enumerate()
            .map(|(index, tick)| format!("WHEN {column} < {tick} THEN '{}'", tick_label(index)))
            .collect();
        cases.push(format!("ELSE '{}'", tick_label(self.ticks.len())));
        format!("CASE {} END", cases.join(" "))
    }
}
