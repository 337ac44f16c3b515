use serde_json::Value;

use crate::filter::{FilterSet, FilterType, Range};

pub fn histogram_selection(ticks: &[f64], bars: &[usize]) -> Vec<Range> {
    bars.iter()
        .filter(|bar| **bar <= ticks.len())
        .map(|bar| {
            let min = if *bar == 0 { None } else { Some(ticks[bar - 1]) };
            let max = ticks.get(*bar).copied();
            Range::new(min, max)
        })
        .collect()
}

pub fn apply_histogram_selection(
    filters: &mut FilterSet,
    column: &str,
    ticks: &[f64],
    bars: &[usize],
    owner: &str,
) {
    let ranges = histogram_selection(ticks, bars);
    if ranges.is_empty() {
        filters.remove_filter(column);
        return;
    }
    let values = ranges.iter().map(Range::to_value).collect();
    filters.add_filter(column, FilterType::ClosedOpen, values, Some(owner));
}

pub fn apply_category_selection(
    filters: &mut FilterSet,
    column: &str,
    categories: &[Value],
    owner: &str,
) {
    if categories.is_empty() {
        filters.remove_filter(column);
    } else {
        filters.add_filter(column, FilterType::In, categories.to_vec(), Some(owner));
    }
}
