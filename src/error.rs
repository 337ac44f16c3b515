use std::fmt;

use tracing::debug;

use crate::source::SourceType;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Widget {
    Histogram,
    Category,
}

impl Widget {
    fn target(self) -> &'static str {
        match self {
            Widget::Histogram => "histogram",
            Widget::Category => "categories",
        }
    }
}

impl fmt::Display for Widget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Widget::Histogram => f.write_str("Histogram"),
            Widget::Category => f.write_str("Category"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Array is not a valid type to get {}", .0.target())]
    InvalidInputType(Widget),

    #[error("{}", missing_viewport_filter_message(.widget, .source_type))]
    MissingViewportFilter {
        widget: Widget,
        source_type: SourceType,
    },

    #[error("request aborted")]
    Aborted,

    #[error("query failed: {0}")]
    Query(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

fn missing_viewport_filter_message(widget: &Widget, source_type: &SourceType) -> String {
    // The category widget words it in the plural.
    let subject = match widget {
        Widget::Histogram => "layer needs",
        Widget::Category => "layers need",
    };
    format!(
        "{widget} Widget error: {} {subject} \"viewportFilter\" prop set to true.",
        source_type.display_name()
    )
}

pub fn discard_aborted<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(Error::Aborted) => {
            debug!("discarding result of aborted request");
            Ok(None)
        }
        Err(err) => Err(err),
    }
}
