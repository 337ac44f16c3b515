use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use geo_types::Geometry;
use serde::Deserialize;
use serde_json::Value;

use crate::filter::FilterSet;
use crate::viewport::{Feature, Properties, Tile, TileBBox, Viewport};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TileRecord {
    bbox: TileBBox,
    #[serde(default = "default_visible")]
    is_visible: bool,
    #[serde(default)]
    data: Vec<geojson::Feature>,
}

fn default_visible() -> bool {
    true
}

fn convert_feature(feature: geojson::Feature) -> Result<Feature> {
    let geometry = match feature.geometry {
        Some(geometry) => Some(
            Geometry::<f64>::try_from(geometry.value).context("convert feature geometry")?,
        ),
        None => None,
    };
    Ok(Feature::new(geometry, feature.properties.unwrap_or_default()))
}

pub fn parse_tiles(contents: &str) -> Result<Vec<Tile>> {
    let records: Vec<TileRecord> = serde_json::from_str(contents).context("parse tiles json")?;
    let mut tiles = Vec::with_capacity(records.len());
    for record in records {
        let data = record
            .data
            .into_iter()
            .map(convert_feature)
            .collect::<Result<Vec<_>>>()?;
        let mut tile = Tile::new(record.bbox, data);
        tile.is_visible = record.is_visible;
        tiles.push(tile);
    }
    Ok(tiles)
}

pub fn read_tiles(path: &Path) -> Result<Vec<Tile>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read tiles file: {}", path.display()))?;
    parse_tiles(&contents)
}

pub fn parse_features(contents: &str) -> Result<Vec<Properties>> {
    let value: Value = serde_json::from_str(contents).context("parse features json")?;
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => anyhow::bail!("feature must be a JSON object, got {other}"),
            })
            .collect(),
        Value::Object(_) => {
            let collection: geojson::FeatureCollection =
                serde_json::from_value(value).context("parse feature collection")?;
            Ok(collection
                .features
                .into_iter()
                .map(|feature| feature.properties.unwrap_or_default())
                .collect())
        }
        _ => anyhow::bail!("features json must be an array or a FeatureCollection"),
    }
}

pub fn read_features(path: &Path) -> Result<Vec<Properties>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read features file: {}", path.display()))?;
    parse_features(&contents)
}

pub fn read_filters(path: &Path) -> Result<FilterSet> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read filters file: {}", path.display()))?;
    serde_json::from_str(&contents).context("parse filters json")
}

pub fn parse_viewport(value: &str) -> Result<Viewport> {
    let parts = parse_numbers(value).context("invalid viewport")?;
    if parts.len() != 4 {
        anyhow::bail!("viewport must be in minx,miny,maxx,maxy format");
    }
    Ok(Viewport::new(parts[0], parts[1], parts[2], parts[3]))
}

pub fn parse_ticks(value: &str) -> Result<Vec<f64>> {
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    let ticks = parse_numbers(value).context("invalid ticks")?;
    if let Some(tick) = ticks.iter().find(|tick| !tick.is_finite()) {
        anyhow::bail!("tick must be finite, got {tick}");
    }
    Ok(ticks)
}

fn parse_numbers(value: &str) -> Result<Vec<f64>> {
    value
        .split(',')
        .map(|part| {
            let trimmed = part.trim();
            trimmed
                .parse::<f64>()
                .with_context(|| format!("invalid number: {trimmed}"))
        })
        .collect()
}
