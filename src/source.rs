use serde::{Deserialize, Serialize};

use crate::viewport::Properties;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceType {
    #[default]
    Sql,
    #[serde(rename = "bigquery")]
    BigQuery,
}

impl SourceType {
    pub fn requires_viewport_filter(self) -> bool {
        matches!(self, SourceType::BigQuery)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            SourceType::Sql => "SQL",
            SourceType::BigQuery => "BigQuery",
        }
    }

    pub fn from_str(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sql" => Some(SourceType::Sql),
            "bigquery" | "bq" => Some(SourceType::BigQuery),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SourceData {
    Query(String),
    Rows(Vec<Properties>),
}

impl Default for SourceData {
    fn default() -> Self {
        SourceData::Query(String::new())
    }
}

impl SourceData {
    pub fn query(text: impl Into<String>) -> Self {
        SourceData::Query(text.into())
    }
}
